use std::{
    path::{Path, PathBuf},
    process::exit,
};

pub fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|e| {
        eprintln!("Failed to get current dir: {}", e);
        exit(1);
    })
}

pub fn replace_homedir_to_tilde(path: impl Into<PathBuf>) -> PathBuf {
    let path = path.into();
    let Some(home_dir) = ::dirs::home_dir() else {
        return path
    };
    path.strip_prefix(home_dir)
        .map(|path| Path::new("~").join(path))
        .unwrap_or(path)
}

/// `~/x` => `$HOME/x`. Other paths are returned as is.
pub fn expand_tilde(path: impl Into<PathBuf>) -> PathBuf {
    let path = path.into();
    let Ok(rest) = path.strip_prefix("~") else {
        return path
    };
    match ::dirs::home_dir() {
        Some(home_dir) => home_dir.join(rest),
        None => path,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tilde_round_trip() {
        let Some(home) = ::dirs::home_dir() else {
            return;
        };
        let lib = home.join("lib/include");
        assert_eq!(expand_tilde("~/lib/include"), lib);
        assert_eq!(replace_homedir_to_tilde(&lib), Path::new("~/lib/include"));
        assert_eq!(expand_tilde("/opt/lib"), Path::new("/opt/lib"));
        assert_eq!(expand_tilde("lib/~"), Path::new("lib/~"));
    }
}
