use std::{
    io,
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use async_trait::async_trait;
use tokio::process::Command;

use super::process::{self, Execution, ProcessIo};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    Cpp,
    C,
    Java,
    Python,
    Rust,
}

impl Lang {
    /// Guesses the language from the file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        use Lang::*;
        let ext = path.as_ref().extension()?.to_str()?;
        match ext {
            "cpp" | "cc" | "cxx" => Some(Cpp),
            "c" => Some(C),
            "java" => Some(Java),
            "py" => Some(Python),
            "rs" => Some(Rust),
            _ => None,
        }
    }

    pub fn default_task_file(self) -> &'static str {
        use Lang::*;
        match self {
            Cpp => "main.cpp",
            C => "main.c",
            Java => "Main.java",
            Python => "main.py",
            Rust => "main.rs",
        }
    }

    /// Whether sources of this language can go through the `#include` expander.
    pub fn supports_library_inlining(self) -> bool {
        matches!(self, Lang::Cpp | Lang::C)
    }

    /// The runner registry: one entry per language.
    pub fn runner(self) -> Box<dyn CodeRunner> {
        use Lang::*;
        match self {
            Cpp => Box::new(NativeRunner {
                lang: self,
                compiler: "g++",
                flags: &[
                    "--std=c++17",
                    "-Wall",
                    "-Wextra",
                    "-Wshadow",
                    "-D_GLIBCXX_DEBUG",
                    "-D_GLIBCXX_DEBUG_PEDANTIC",
                ],
            }),
            C => Box::new(NativeRunner {
                lang: self,
                compiler: "gcc",
                flags: &["-std=c11", "-Wall", "-Wextra", "-Wshadow", "-O2"],
            }),
            Rust => Box::new(NativeRunner {
                lang: self,
                compiler: "rustc",
                flags: &["--edition=2021", "-O"],
            }),
            Java => Box::new(JavaRunner),
            Python => Box::new(PythonRunner),
        }
    }
}

/// What a successful compilation leaves behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    Binary(PathBuf),
    JvmClass {
        class_path: PathBuf,
        main_class: String,
    },
    Script(PathBuf),
}

impl Artifact {
    pub fn path(&self) -> &Path {
        match self {
            Self::Binary(p) | Self::Script(p) => p,
            Self::JvmClass { class_path, .. } => class_path,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,

        #[source]
        source: io::Error,
    },

    #[error("Compile error ({status}): {program}\n{stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error(transparent)]
    Fs(#[from] fsutil::Error),
}

#[async_trait]
pub trait CodeRunner: Send + Sync {
    fn lang(&self) -> Lang;

    /// Builds `source` into `out_dir`. `binary_name` names the produced
    /// executable where the toolchain lets us choose it.
    async fn compile(
        &self,
        source: &Path,
        out_dir: &Path,
        binary_name: &str,
    ) -> Result<Artifact, CompileError>;

    /// The command that launches `artifact`, without stdio wiring.
    fn command(&self, artifact: &Artifact) -> Command;

    async fn run(
        &self,
        artifact: &Artifact,
        io: ProcessIo,
        args: &[String],
        limit: Option<Duration>,
    ) -> io::Result<Execution> {
        let mut cmd = self.command(artifact);
        cmd.args(args);
        match limit {
            Some(limit) => process::execute_with_timeout(cmd, io, limit).await,
            None => process::execute(cmd, io).await,
        }
    }
}

/// Compiled to a native executable (C, C++, Rust).
#[derive(Debug, Clone)]
pub struct NativeRunner {
    lang: Lang,
    compiler: &'static str,
    flags: &'static [&'static str],
}

#[derive(Debug, Clone, Copy)]
pub struct JavaRunner;

#[derive(Debug, Clone, Copy)]
pub struct PythonRunner;

#[async_trait]
impl CodeRunner for NativeRunner {
    fn lang(&self) -> Lang {
        self.lang
    }

    async fn compile(
        &self,
        source: &Path,
        out_dir: &Path,
        binary_name: &str,
    ) -> Result<Artifact, CompileError> {
        let binary = out_dir.join(binary_name);
        let mut cmd = Command::new(self.compiler);
        cmd.args(self.flags).arg("-o").arg(&binary).arg(source);
        self::run_compiler(cmd).await?;
        Ok(Artifact::Binary(binary))
    }

    fn command(&self, artifact: &Artifact) -> Command {
        Command::new(self::launchable(artifact.path()))
    }
}

#[async_trait]
impl CodeRunner for JavaRunner {
    fn lang(&self) -> Lang {
        Lang::Java
    }

    async fn compile(
        &self,
        source: &Path,
        out_dir: &Path,
        _binary_name: &str,
    ) -> Result<Artifact, CompileError> {
        let mut cmd = Command::new("javac");
        cmd.arg("-d").arg(out_dir).arg(source);
        self::run_compiler(cmd).await?;

        // The class holding `main` is named after the source file.
        let main_class = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Main".to_owned());
        Ok(Artifact::JvmClass {
            class_path: out_dir.to_owned(),
            main_class,
        })
    }

    fn command(&self, artifact: &Artifact) -> Command {
        let mut cmd = Command::new("java");
        match artifact {
            Artifact::JvmClass {
                class_path,
                main_class,
            } => cmd.arg("-cp").arg(class_path).arg(main_class),
            other => cmd.arg(other.path()),
        };
        cmd
    }
}

#[async_trait]
impl CodeRunner for PythonRunner {
    fn lang(&self) -> Lang {
        Lang::Python
    }

    async fn compile(
        &self,
        source: &Path,
        _out_dir: &Path,
        _binary_name: &str,
    ) -> Result<Artifact, CompileError> {
        // Nothing to build; just make sure the script is there.
        let script = fsutil::canonicalize_path(source)?;
        Ok(Artifact::Script(script))
    }

    fn command(&self, artifact: &Artifact) -> Command {
        let mut cmd = Command::new("python3");
        cmd.arg(artifact.path());
        cmd
    }
}

async fn run_compiler(mut cmd: Command) -> Result<(), CompileError> {
    let program = format!("{:?}", cmd.as_std());
    log::info!("Compiling: {}", program);

    let output = cmd
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|source| CompileError::Spawn {
            program: program.clone(),
            source,
        })?;

    if output.status.success() {
        return Ok(());
    }
    let mut stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    stderr += &String::from_utf8_lossy(&output.stdout);
    Err(CompileError::Failed {
        program,
        status: output.status.to_string(),
        stderr,
    })
}

/// A bare file name would be looked up in `PATH`, so anchor it to the current dir.
fn launchable(path: &Path) -> PathBuf {
    if path.is_absolute() || path.components().count() > 1 {
        path.to_owned()
    } else {
        Path::new(".").join(path)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn lang_names_round_trip() {
        for lang in Lang::iter() {
            assert_eq!(lang.to_string().parse::<Lang>().unwrap(), lang);
        }
        assert!("haskell".parse::<Lang>().is_err());
    }

    #[test]
    fn lang_from_extension() {
        assert_eq!(Lang::from_path("gen.cpp"), Some(Lang::Cpp));
        assert_eq!(Lang::from_path("dir/main_brute.cc"), Some(Lang::Cpp));
        assert_eq!(Lang::from_path("Main.java"), Some(Lang::Java));
        assert_eq!(Lang::from_path("main.py"), Some(Lang::Python));
        assert_eq!(Lang::from_path("main.rs"), Some(Lang::Rust));
        assert_eq!(Lang::from_path("main.c"), Some(Lang::C));
        assert_eq!(Lang::from_path("main.hs"), None);
        assert_eq!(Lang::from_path("Makefile"), None);
    }

    #[test]
    fn every_lang_has_a_runner() {
        for lang in Lang::iter() {
            assert_eq!(lang.runner().lang(), lang);
            assert_eq!(Lang::from_path(lang.default_task_file()), Some(lang));
        }
    }

    #[test]
    fn bare_binary_name_is_anchored() {
        assert_eq!(launchable(Path::new("sol")), Path::new("./sol"));
        assert_eq!(launchable(Path::new("work/sol")), Path::new("work/sol"));
        assert_eq!(launchable(Path::new("/tmp/sol")), Path::new("/tmp/sol"));
    }

    #[tokio::test]
    async fn python_compile_is_a_noop_that_checks_the_script() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("main.py");
        fsutil::write(&script, "print(input())\n").unwrap();

        let runner = Lang::Python.runner();
        let artifact = runner.compile(&script, dir.path(), "sol").await.unwrap();
        assert!(matches!(artifact, Artifact::Script(_)));

        let res = runner
            .run(
                &artifact,
                ProcessIo::captured(process::Input::Bytes(b"hello\n".to_vec())),
                &[],
                None,
            )
            .await
            .unwrap();
        assert_eq!(res.stdout_lossy(), "hello\n");

        let missing = runner
            .compile(&dir.path().join("nope.py"), dir.path(), "sol")
            .await;
        assert!(matches!(missing, Err(CompileError::Fs(_))));
    }

    #[tokio::test]
    async fn missing_compiler_is_a_spawn_error() {
        let runner = NativeRunner {
            lang: Lang::Cpp,
            compiler: "/no/such/compiler",
            flags: &[],
        };
        let dir = tempfile::tempdir().unwrap();
        let res = runner
            .compile(&dir.path().join("main.cpp"), dir.path(), "sol")
            .await;
        assert!(matches!(res, Err(CompileError::Spawn { .. })));
    }
}
