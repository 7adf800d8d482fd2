use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;

use super::{
    checker::{Checker, CheckerKind},
    lang::{Artifact, CodeRunner, CompileError, Lang},
    process::{Input, ProcessIo, DEFAULT_TIME_OUT_DELTA},
    testcase::CaseDescription,
    verdict::CaseStatus,
};

#[derive(Debug, thiserror::Error)]
pub enum JudgeError {
    #[error("No judge available for language '{0}'")]
    UnsupportedLang(String),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("Failed to inline library headers: {0}")]
    Expand(#[from] cph_expander::ExpanderError),

    #[error(transparent)]
    Fs(#[from] fsutil::Error),
}

/// Compile once, judge many cases, clean up.
///
/// `run_test_case` must only be called between a successful `setup` and
/// `cleanup`.
#[async_trait]
pub trait Judge: Send + Sync {
    /// Prepares the working dir and compiles the task's source file.
    /// On failure the working dir is left in place for diagnosis.
    async fn setup(&mut self) -> Result<(), JudgeError>;

    async fn run_test_case(&self, desc: &CaseDescription) -> CaseStatus;

    /// Removes the working dir. Calling it again is a no-op.
    fn cleanup(&mut self) -> Result<(), JudgeError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgeOptions {
    pub checker: CheckerKind,
    pub time_out_delta: Duration,

    /// When set, C/C++ sources are inlined against this dir before compiling.
    pub library_dir: Option<PathBuf>,
}

impl Default for JudgeOptions {
    fn default() -> Self {
        Self {
            checker: CheckerKind::default(),
            time_out_delta: DEFAULT_TIME_OUT_DELTA,
            library_dir: None,
        }
    }
}

/// Judge for a single task, generic over the language runner.
pub struct TaskJudge {
    runner: Box<dyn CodeRunner>,
    checker: Box<dyn Checker>,
    source: PathBuf,
    work_dir: PathBuf,
    library_dir: Option<PathBuf>,
    time_out_delta: Duration,
    artifact: Option<Artifact>,
}

/// Builds the judge for `lang`, failing on languages nobody can judge.
pub fn new_judge_for(
    lang: &str,
    task_dir: impl AsRef<Path>,
    source: impl Into<PathBuf>,
    opts: &JudgeOptions,
) -> Result<TaskJudge, JudgeError> {
    let lang: Lang = lang
        .parse()
        .map_err(|_| JudgeError::UnsupportedLang(lang.to_owned()))?;

    Ok(TaskJudge::new(lang.runner(), opts.checker.build(), task_dir, source)
        .time_out_delta(opts.time_out_delta)
        .library_dir(opts.library_dir.clone()))
}

impl TaskJudge {
    pub const WORK_DIR_NAME: &str = "work";
    pub const BINARY_NAME: &str = "sol";

    /// File stem of the single-file source produced by library inlining.
    pub const INLINED_SOURCE_STEM: &str = "main_gen";

    pub fn new(
        runner: Box<dyn CodeRunner>,
        checker: Box<dyn Checker>,
        task_dir: impl AsRef<Path>,
        source: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            checker,
            source: source.into(),
            work_dir: task_dir.as_ref().join(Self::WORK_DIR_NAME),
            library_dir: None,
            time_out_delta: DEFAULT_TIME_OUT_DELTA,
            artifact: None,
        }
    }

    pub fn time_out_delta(mut self, delta: Duration) -> Self {
        self.time_out_delta = delta;
        self
    }

    pub fn library_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.library_dir = dir;
        self
    }

    pub fn lang(&self) -> Lang {
        self.runner.lang()
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    /// Path of the generated single-file source for `source`.
    pub fn inlined_source_path(source: &Path) -> PathBuf {
        let ext = source.extension().and_then(|e| e.to_str()).unwrap_or("cpp");
        source.with_file_name(format!("{}.{}", Self::INLINED_SOURCE_STEM, ext))
    }

    /// Returns the file that actually gets compiled.
    fn prepare_source(&self) -> Result<PathBuf, JudgeError> {
        let Some(lib) = &self.library_dir else {
            return Ok(self.source.clone())
        };
        if !self.lang().supports_library_inlining() {
            log::debug!("Library inlining is not supported for {}", self.lang());
            return Ok(self.source.clone());
        }

        let code = cph_expander::expand_file(&self.source, std::slice::from_ref(lib))?;
        let generated = Self::inlined_source_path(&self.source);
        fsutil::write(&generated, code)?;
        log::info!("Inlined library headers into {:?}", generated);
        Ok(generated)
    }
}

#[async_trait]
impl Judge for TaskJudge {
    async fn setup(&mut self) -> Result<(), JudgeError> {
        fsutil::mkdir_all(&self.work_dir)?;
        let source = self.prepare_source()?;
        let artifact = self
            .runner
            .compile(&source, &self.work_dir, Self::BINARY_NAME)
            .await?;
        self.artifact = Some(artifact);
        Ok(())
    }

    async fn run_test_case(&self, desc: &CaseDescription) -> CaseStatus {
        let Some(artifact) = &self.artifact else {
            return CaseStatus::runtime_error("judge is not set up".to_owned(), Duration::ZERO)
        };

        let input = match fsutil::open_file(&desc.input) {
            Ok(f) => f,
            Err(e) => return CaseStatus::runtime_error(e.to_string(), Duration::ZERO),
        };
        let scratch = match fsutil::create_truncate(&desc.scratch_output) {
            Ok(f) => f,
            Err(e) => return CaseStatus::runtime_error(e.to_string(), Duration::ZERO),
        };

        let limit = desc.time_limit + self.time_out_delta;
        let exec = match self
            .runner
            .run(
                artifact,
                ProcessIo::into_file(Input::File(input), scratch),
                &[],
                Some(limit),
            )
            .await
        {
            Ok(exec) => exec,
            Err(e) => {
                log::warn!("Failed to launch {:?}: {}", artifact.path(), e);
                return CaseStatus::runtime_error(e.to_string(), Duration::ZERO);
            }
        };

        let stderr = exec.stderr_lossy();
        let duration = exec.elapsed;

        if exec.is_timed_out() {
            return CaseStatus::time_limit_exceeded(stderr, duration);
        }
        if let Some(reason) = exec.exit_error() {
            log::debug!("Testcase {} exited abnormally: {}", desc.name, reason);
            return CaseStatus::runtime_error(stderr, duration);
        }

        let Some(expected_output) = &desc.expected_output else {
            log::debug!("Testcase {} has no expected output; not checked", desc.name);
            return CaseStatus::not_checked(stderr, duration);
        };

        let read_both = fsutil::read_to_string_lossy(expected_output).and_then(|expected| {
            fsutil::read_to_string_lossy(&desc.scratch_output).map(|got| (got, expected))
        });
        let (got, expected) = match read_both {
            Ok(pair) => pair,
            Err(e) => {
                log::warn!("{}", e);
                return CaseStatus::runtime_error(stderr, duration);
            }
        };

        match self.checker.check(&got, &expected) {
            Ok(()) => CaseStatus::accepted(stderr, duration),
            Err(mismatch) => CaseStatus::wrong_answer(mismatch, stderr, duration),
        }
    }

    fn cleanup(&mut self) -> Result<(), JudgeError> {
        self.artifact = None;
        fsutil::remove_dir_all_if_exists(&self.work_dir)?;
        Ok(())
    }
}
