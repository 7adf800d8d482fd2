use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Everything needed to run one test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseDescription {
    pub name: String,
    pub input: PathBuf,

    /// `None` for input-only cases: the program runs but nothing is checked.
    pub expected_output: Option<PathBuf>,

    /// Where the judged program's stdout goes. Truncated on every run.
    pub scratch_output: PathBuf,
    pub custom: bool,
    pub time_limit: Duration,
}

impl CaseDescription {
    const SCRATCH_SUFFIX: &str = "-ex.out";

    pub fn new(
        name: impl Into<String>,
        input: impl Into<PathBuf>,
        expected_output: impl Into<PathBuf>,
        custom: bool,
        time_limit: Duration,
    ) -> Self {
        let input = input.into();
        Self {
            name: name.into(),
            scratch_output: Self::scratch_output_path(&input),
            input,
            expected_output: Some(expected_output.into()),
            custom,
            time_limit,
        }
    }

    pub fn input_only(
        name: impl Into<String>,
        input: impl Into<PathBuf>,
        custom: bool,
        time_limit: Duration,
    ) -> Self {
        let input = input.into();
        Self {
            name: name.into(),
            scratch_output: Self::scratch_output_path(&input),
            input,
            expected_output: None,
            custom,
            time_limit,
        }
    }

    /// `dir/X.ext` => `dir/X-ex.out`
    pub fn scratch_output_path(input: impl AsRef<Path>) -> PathBuf {
        let input = input.as_ref();
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "case".to_owned());
        input.with_file_name(format!("{}{}", stem, Self::SCRATCH_SUFFIX))
    }
}
