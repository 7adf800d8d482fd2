use std::path::PathBuf;

use anyhow::Context as _;
use cph_core::Config;

use crate::{cmd::GlobalArgs, util};

pub const APP_NAME: &str = "cph";

/// `--config`, or `<user config dir>/cph/cph.toml`.
pub fn filepath(args: &GlobalArgs) -> anyhow::Result<PathBuf> {
    if let Some(path) = &args.config {
        return Ok(path.clone());
    }
    let dir = dirs::config_dir().context("Failed to get user's config dir path")?;
    Ok(dir.join(APP_NAME).join(Config::FILENAME))
}

pub fn load(args: &GlobalArgs) -> anyhow::Result<Config> {
    let path = self::filepath(args)?;
    if args.config.is_some() && !path.is_file() {
        anyhow::bail!("Config file not found: {:?}", path);
    }

    let mut cfg = Config::from_toml_file_or_default(path.clone()).with_context(|| {
        format!(
            "Invalid config '{:?}'",
            util::replace_homedir_to_tilde(&path)
        )
    })?;
    cfg.cpp_lib_location = cfg.cpp_lib_location.map(util::expand_tilde);
    log::debug!("Config: {:?}", cfg);
    Ok(cfg)
}
