use std::path::PathBuf;
use std::result::Result as StdResult;
use std::time::Duration;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::assets;
use crate::testing::batch::{DEFAULT_ROUNDS, DEFAULT_SEED_BOUND};
use crate::testing::process::DEFAULT_TIME_OUT_DELTA;
use crate::testing::{CheckerKind, JudgeOptions};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip)]
    pub source_config_file: Option<PathBuf>,
    pub meta_file_name: String,
    pub checker: CheckerKind,
    pub time_out_delta_ms: u64,
    pub cpp_lib_location: Option<PathBuf>,
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub rounds: usize,
    pub checker: CheckerKind,
    pub seed_bound: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_config_file: None,
            meta_file_name: Self::DEFAULT_META_FILE_NAME.to_owned(),
            checker: CheckerKind::Diff,
            time_out_delta_ms: DEFAULT_TIME_OUT_DELTA.as_millis() as u64,
            cpp_lib_location: None,
            batch: BatchConfig::default(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_ROUNDS,
            checker: CheckerKind::Token,
            seed_bound: DEFAULT_SEED_BOUND,
        }
    }
}

impl Config {
    pub const FILENAME: &str = "cph.toml";
    pub const DEFAULT_META_FILE_NAME: &str = "task-meta.json";

    pub fn example_toml() -> anyhow::Result<String> {
        assets::text(Self::FILENAME).context("Example config is not bundled")
    }

    pub fn from_toml(s: &str) -> StdResult<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn from_toml_file(filepath: PathBuf) -> anyhow::Result<Self> {
        let toml = fsutil::read_to_string(&filepath).context("Cannot read a file")?;
        let mut cfg = Self::from_toml(&toml)
            .with_context(|| format!("Invalid config TOML: {:?}", filepath))?;
        cfg.source_config_file = Some(filepath);
        Ok(cfg)
    }

    /// Reads `filepath` if it exists, otherwise falls back to the defaults.
    pub fn from_toml_file_or_default(filepath: PathBuf) -> anyhow::Result<Self> {
        if filepath.is_file() {
            Self::from_toml_file(filepath)
        } else {
            log::debug!("No config at {:?}; using defaults", filepath);
            Ok(Self::default())
        }
    }

    pub fn time_out_delta(&self) -> Duration {
        Duration::from_millis(self.time_out_delta_ms)
    }

    pub fn judge_options(&self, checker: Option<CheckerKind>) -> JudgeOptions {
        JudgeOptions {
            checker: checker.unwrap_or(self.checker),
            time_out_delta: self.time_out_delta(),
            library_dir: self.cpp_lib_location.clone(),
        }
    }
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use super::*;

    #[test]
    fn example_toml_should_be_parsable() {
        let toml = Config::example_toml().unwrap();
        let cfg = dbg!(Config::from_toml(&toml)).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn missing_keys_take_defaults() {
        let cfg = Config::from_toml(
            r#"
            checker = "token"
            cpp_lib_location = "/opt/lib"

            [batch]
            rounds = 7
            "#,
        )
        .unwrap();

        assert_eq!(cfg.meta_file_name, "task-meta.json");
        assert_eq!(cfg.checker, CheckerKind::Token);
        assert_eq!(cfg.time_out_delta(), Duration::from_millis(25));
        assert_eq!(cfg.cpp_lib_location.as_deref(), Some(Path::new("/opt/lib")));
        assert_eq!(cfg.batch.rounds, 7);
        assert_eq!(cfg.batch.checker, CheckerKind::Token);
        assert_eq!(cfg.batch.seed_bound, 1 << 30);
    }

    #[test]
    fn unknown_checker_is_rejected() {
        assert!(Config::from_toml(r#"checker = "fuzzy""#).is_err());
    }

    #[test]
    fn command_line_checker_wins() {
        let cfg = Config::default();
        assert_eq!(cfg.judge_options(None).checker, CheckerKind::Diff);
        assert_eq!(
            cfg.judge_options(Some(CheckerKind::Token)).checker,
            CheckerKind::Token
        );
    }

    #[test]
    fn absent_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::from_toml_file_or_default(dir.path().join("cph.toml")).unwrap();
        assert_eq!(cfg, Config::default());

        let path = dir.path().join("custom.toml");
        fsutil::write(&path, "time_out_delta_ms = 100\n").unwrap();
        let cfg = Config::from_toml_file_or_default(path.clone()).unwrap();
        assert_eq!(cfg.time_out_delta_ms, 100);
        assert_eq!(cfg.source_config_file, Some(path));
    }
}
