pub mod error {
    #[allow(unused_imports)]
    pub(crate) use anyhow::{anyhow, bail, ensure, Context as _};
    pub use anyhow::{Error, Result};
}
use std::path::{Path, PathBuf};
use std::time::Duration;

use colored::Colorize;
use error::*;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::assets;
use crate::config::Config;
use crate::style;
use crate::task::TaskMeta;
use crate::testing::{
    new_judge_for, Batch, BatchError, BatchOutcome, BatchPlan, CaseDescription, CaseStatus,
    CheckerKind, Judge, JudgeReport, Lang, ReportEntry, TaskJudge,
};

pub const BATCH_WORK_DIR_NAME: &str = "batch-work";

pub fn load_task(task_dir: impl AsRef<Path>, cfg: &Config) -> Result<TaskMeta> {
    let task_dir = task_dir.as_ref();
    TaskMeta::load(task_dir, &cfg.meta_file_name).with_context(|| {
        format!(
            "Not a task dir: cannot load '{}' in {:?}",
            cfg.meta_file_name, task_dir
        )
    })
}

/// Compiles the task's solution, judges every case in order and prints the report.
pub async fn run_tests(
    task_dir: impl AsRef<Path>,
    cfg: &Config,
    checker: Option<CheckerKind>,
) -> Result<JudgeReport> {
    let task_dir = task_dir.as_ref();
    let meta = self::load_task(task_dir, cfg)?;
    let cases = meta.case_descriptions(task_dir);
    ensure!(!cases.is_empty(), "No test cases are saved in {:?}", task_dir);

    let mut opts = cfg.judge_options(checker);
    if !meta.inline_library {
        opts.library_dir = None;
    }
    let mut judge = new_judge_for(
        &meta.task_lang,
        task_dir,
        meta.task_file_path(task_dir),
        &opts,
    )?;

    log::info!("Compiling {:?} ({})", meta.task_file, judge.lang());
    if let Err(e) = judge.setup().await {
        style::print_report_summary(&self::skipped_report(&cases));
        return Err(e).with_context(|| format!("Failed to compile {:?}", meta.task_file));
    }

    let report = self::judge_cases(&judge, &cases, &MultiProgress::new()).await;

    if let Err(e) = judge.cleanup() {
        log::warn!("Failed to clean up {:?}: {}", judge.work_dir(), e);
    }

    println!();
    style::print_report(&report);
    Ok(report)
}

/// Runs `cases` one after another, with a spinner per case.
pub async fn judge_cases(
    judge: &dyn Judge,
    cases: &[CaseDescription],
    progress: &MultiProgress,
) -> JudgeReport {
    let style = ProgressStyle::default_spinner()
        .template("{spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());

    let bars: Vec<ProgressBar> = cases
        .iter()
        .enumerate()
        .map(|(i, case)| {
            progress
                .add(ProgressBar::new_spinner())
                .with_style(style.clone())
                .with_message(format!("#{} Testcase {} ...", i, case.name))
        })
        .collect();

    let mut report = JudgeReport::new();
    for (i, (case, bar)) in cases.iter().zip(&bars).enumerate() {
        bar.enable_steady_tick(Duration::from_millis(50));
        let status = judge.run_test_case(case).await;
        log::debug!("{}: {}", case.name, status.verdict());

        let entry = ReportEntry {
            case: case.clone(),
            status,
        };
        bar.finish_with_message(style::case_line(i, &entry).cyan().to_string());
        report.add(entry.status, entry.case);
    }
    report
}

/// Single-file source for `source`, inlining the library when the task asks for it.
fn solution_source(task_dir: &Path, meta: &TaskMeta, cfg: &Config) -> Result<PathBuf> {
    let source = meta.task_file_path(task_dir);
    let lang = meta.lang()?;
    let lib = match &cfg.cpp_lib_location {
        Some(lib) if meta.inline_library && lang.supports_library_inlining() => lib,
        _ => return Ok(source),
    };

    let code = cph_expander::expand_file(&source, std::slice::from_ref(lib))
        .with_context(|| format!("Failed to inline library into {:?}", source))?;
    let generated = TaskJudge::inlined_source_path(&source);
    fsutil::write(&generated, code)?;
    Ok(generated)
}

pub fn batch_plan(
    task_dir: impl AsRef<Path>,
    meta: &TaskMeta,
    cfg: &Config,
    rounds: Option<usize>,
) -> Result<BatchPlan> {
    let task_dir = task_dir.as_ref();
    let generator = meta
        .batch_file_path(task_dir)
        .filter(|_| meta.has_batch(task_dir))
        .context("The task has no batch; create one with `cph batch create`")?;

    let brute = meta.brute_file_path(task_dir);
    ensure!(brute.is_file(), "Brute-force solution not found: {:?}", brute);

    Ok(BatchPlan {
        work_dir: task_dir.join(BATCH_WORK_DIR_NAME),
        generator,
        solution: self::solution_source(task_dir, meta, cfg)?,
        brute,
        solution_lang: meta.lang()?,
        rounds: rounds.unwrap_or(cfg.batch.rounds),
        solution_time_limit: meta.time_limit() + cfg.time_out_delta(),
        seed_bound: cfg.batch.seed_bound,
    })
}

/// Stress-tests the task's solution against its brute force.
///
/// A counterexample is printed and returned as `Ok(BatchOutcome::Mismatch)`.
pub async fn run_batch(
    task_dir: impl AsRef<Path>,
    cfg: &Config,
    rounds: Option<usize>,
) -> Result<BatchOutcome> {
    let task_dir = task_dir.as_ref();
    let meta = self::load_task(task_dir, cfg)?;
    let plan = self::batch_plan(task_dir, &meta, cfg, rounds)?;

    let bar = ProgressBar::new(plan.rounds as u64).with_style(
        ProgressStyle::default_bar()
            .template("{spinner} Round {pos}/{len} {wide_bar}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    let tick = bar.clone();

    let outcome = Batch::new(plan)
        .checker(cfg.batch.checker.build())
        .on_round(move |round| tick.set_position(round as u64))
        .run()
        .await;
    bar.finish_and_clear();

    match outcome {
        Ok(BatchOutcome::Passed { rounds }) => {
            println!("{}", format!("All {} rounds passed ✨", rounds).green());
            Ok(BatchOutcome::Passed { rounds })
        }
        Ok(BatchOutcome::Mismatch(c)) => {
            style::print_counterexample(&c);
            Ok(BatchOutcome::Mismatch(c))
        }
        Err(e) => {
            if let BatchError::ProgramFailed { stderr, input, .. } = &e {
                if !input.is_empty() {
                    eprintln!("{}\n{}", "[input]".cyan().bold(), input);
                }
                if !stderr.is_empty() {
                    eprintln!("{}\n{}", "[stderr]".cyan().bold(), stderr);
                }
            }
            Err(e).context("Batch aborted")
        }
    }
}

/// Writes the generator template (plus `rand.h` and a brute-force stub when
/// `with_brute`) into the task dir and records the generator in the metadata.
pub fn create_batch(
    task_dir: impl AsRef<Path>,
    cfg: &Config,
    with_brute: bool,
) -> Result<Vec<PathBuf>> {
    let task_dir = task_dir.as_ref();
    let mut meta = self::load_task(task_dir, cfg)?;
    ensure!(
        !meta.has_batch(task_dir),
        "The task already has a batch: {:?}",
        meta.batch_file.as_deref().unwrap_or(Path::new(""))
    );

    let mut files = vec![(TaskMeta::GENERATOR_FILE, assets::GENERATOR_TEMPLATE)];
    if with_brute {
        files.push((TaskMeta::RAND_HEADER_FILE, assets::RAND_HEADER_TEMPLATE));
        files.push((TaskMeta::BRUTE_FILE, assets::BRUTE_TEMPLATE));
    }

    let mut created = Vec::new();
    for (filename, asset) in files {
        let content =
            assets::text(asset).with_context(|| format!("Template '{}' is not bundled", asset))?;
        let path = task_dir.join(filename);
        if fsutil::write_if_absent(&path, content)? {
            created.push(path);
        } else {
            log::info!("Keeping existing {:?}", path);
        }
    }

    meta.batch_file = Some(PathBuf::from(TaskMeta::GENERATOR_FILE));
    if with_brute {
        meta.brute_file = PathBuf::from(TaskMeta::BRUTE_FILE);
    }
    meta.save(task_dir, &cfg.meta_file_name)?;
    Ok(created)
}

/// Copies a custom case into the task and returns its name.
///
/// Without `output` the case is input-only and its result is never checked.
pub fn add_case(
    task_dir: impl AsRef<Path>,
    cfg: &Config,
    input: impl AsRef<Path>,
    output: Option<&Path>,
) -> Result<String> {
    let task_dir = task_dir.as_ref();
    let mut meta = self::load_task(task_dir, cfg)?;
    let name = meta
        .add_custom_case(task_dir, input, output)
        .context("Failed to add the case")?;
    meta.save(task_dir, &cfg.meta_file_name)?;
    Ok(name)
}

/// Saved input and expected output of one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseContent {
    pub name: String,
    pub input: String,
    pub expected_output: Option<String>,
}

/// Reads the case named `test-<id>`.
pub fn read_case(task_dir: impl AsRef<Path>, cfg: &Config, id: usize) -> Result<CaseContent> {
    let task_dir = task_dir.as_ref();
    let meta = self::load_task(task_dir, cfg)?;
    let case = meta
        .find_case(task_dir, id)
        .with_context(|| format!("No test case with ID {} (see `cph cases`)", id))?;

    let input = fsutil::read_to_string_lossy(&case.input)?;
    let expected_output = case
        .expected_output
        .as_ref()
        .map(fsutil::read_to_string_lossy)
        .transpose()?;
    Ok(CaseContent {
        name: case.name,
        input,
        expected_output,
    })
}

pub fn expand_source_code(filepath: impl AsRef<Path>, cfg: &Config) -> Result<String> {
    let filepath = filepath.as_ref();
    let library_dirs: Vec<PathBuf> = cfg.cpp_lib_location.iter().cloned().collect();
    ensure!(
        Lang::from_path(filepath).map_or(false, Lang::supports_library_inlining),
        "Only C/C++ sources can be expanded: {:?}",
        filepath
    );
    cph_expander::expand_file(filepath, &library_dirs)
        .with_context(|| format!("Failed to expand {:?}", filepath))
}

/// Status to report for every case when the solution never got to run.
fn skipped_report(cases: &[CaseDescription]) -> JudgeReport {
    let mut report = JudgeReport::new();
    for case in cases {
        report.add(CaseStatus::skipped(), case.clone());
    }
    report
}
