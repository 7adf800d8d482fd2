use std::{
    collections::HashSet,
    io,
    path::{Path, PathBuf},
    time::Duration,
};

use rand::{rngs::StdRng, Rng, SeedableRng};

use super::{
    checker::{Checker, Mismatch, TokenChecker},
    lang::{Artifact, CodeRunner, CompileError, Lang},
    process::{Input, ProcessIo},
};

pub const DEFAULT_ROUNDS: usize = 100;
pub const DEFAULT_SEED_BOUND: u32 = 1 << 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Generator,
    Solution,
    Brute,
}

impl Role {
    fn binary_name(self) -> &'static str {
        use Role::*;
        match self {
            Generator => "gen",
            Solution => "sol",
            Brute => "brute",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    /// Scratch dir for compiled programs; removed when the batch ends.
    pub work_dir: PathBuf,
    pub generator: PathBuf,
    pub solution: PathBuf,
    pub brute: PathBuf,
    pub solution_lang: Lang,
    pub rounds: usize,

    /// Wall-clock limit for the solution, slack included.
    pub solution_time_limit: Duration,
    pub seed_bound: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("No runner found for the {role} ({path:?})")]
    NoRunner { role: Role, path: PathBuf },

    #[error("Failed to compile the {role}: {source}")]
    Compile {
        role: Role,

        #[source]
        source: CompileError,
    },

    #[error("Could not run the {role} on round {round}: {source}")]
    Spawn {
        role: Role,
        round: usize,

        #[source]
        source: io::Error,
    },

    #[error("The {role} failed on round {round} ({reason})")]
    ProgramFailed {
        role: Role,
        round: usize,
        reason: String,
        stderr: String,

        /// The generated input; empty when the generator itself failed.
        input: String,
    },

    #[error(transparent)]
    Fs(#[from] fsutil::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counterexample {
    pub round: usize,
    pub seed: u32,
    pub input: String,

    /// Output of the brute-force reference.
    pub expected: String,

    /// Output of the solution.
    pub got: String,
    pub detail: Mismatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    Passed { rounds: usize },
    Mismatch(Counterexample),
}

pub type RunnerResolver = Box<dyn Fn(Lang) -> Option<Box<dyn CodeRunner>> + Send + Sync>;

pub fn default_resolver() -> RunnerResolver {
    Box::new(|lang| Some(lang.runner()))
}

struct Program {
    role: Role,
    runner: Box<dyn CodeRunner>,
    artifact: Artifact,
}

/// Differential tester: generator -> (solution, brute) -> checker, N times.
///
/// Stops at the first disagreement. Any program failure aborts the whole batch.
pub struct Batch {
    plan: BatchPlan,
    resolve: RunnerResolver,
    checker: Box<dyn Checker>,
    on_round: Option<Box<dyn Fn(usize) + Send + Sync>>,
}

impl Batch {
    pub fn new(plan: BatchPlan) -> Self {
        Self {
            plan,
            resolve: self::default_resolver(),
            checker: Box::new(TokenChecker),
            on_round: None,
        }
    }

    pub fn resolver(mut self, resolve: RunnerResolver) -> Self {
        self.resolve = resolve;
        self
    }

    pub fn checker(mut self, checker: Box<dyn Checker>) -> Self {
        self.checker = checker;
        self
    }

    /// Called with the 1-based round number before each round starts.
    pub fn on_round(mut self, f: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.on_round = Some(Box::new(f));
        self
    }

    pub fn plan(&self) -> &BatchPlan {
        &self.plan
    }

    pub async fn run(&self) -> Result<BatchOutcome, BatchError> {
        let res = self.run_rounds().await;
        if let Err(e) = fsutil::remove_dir_all_if_exists(&self.plan.work_dir) {
            log::warn!("Failed to clean up batch binaries: {}", e);
        }
        res
    }

    async fn run_rounds(&self) -> Result<BatchOutcome, BatchError> {
        let plan = &self.plan;
        let generator = self
            .prepare(Role::Generator, &plan.generator, Lang::from_path(&plan.generator))
            .await?;
        let solution = self
            .prepare(Role::Solution, &plan.solution, Some(plan.solution_lang))
            .await?;
        let brute = self
            .prepare(Role::Brute, &plan.brute, Lang::from_path(&plan.brute))
            .await?;

        let mut seeds = SeedSource::new(plan.seed_bound);

        for round in 1..=plan.rounds {
            if let Some(f) = &self.on_round {
                f(round);
            }
            let seed = seeds.draw();
            log::info!("Round {}: seed={}", round, seed);

            let input = self
                .execute(&generator, round, Input::Null, &[seed.to_string()], None, "")
                .await?;
            log::debug!("Generator output:\n{}", String::from_utf8_lossy(&input));
            let input_text = String::from_utf8_lossy(&input).into_owned();

            let got = self
                .execute(
                    &solution,
                    round,
                    Input::Bytes(input.clone()),
                    &[],
                    Some(plan.solution_time_limit),
                    &input_text,
                )
                .await?;
            let expected = self
                .execute(&brute, round, Input::Bytes(input), &[], None, &input_text)
                .await?;

            let got = String::from_utf8_lossy(&got).into_owned();
            let expected = String::from_utf8_lossy(&expected).into_owned();

            if let Err(detail) = self.checker.check(&got, &expected) {
                log::info!("Found diff on round {}", round);
                return Ok(BatchOutcome::Mismatch(Counterexample {
                    round,
                    seed,
                    input: input_text,
                    expected,
                    got,
                    detail,
                }));
            }
        }

        Ok(BatchOutcome::Passed {
            rounds: plan.rounds,
        })
    }

    async fn prepare(
        &self,
        role: Role,
        source: &Path,
        lang: Option<Lang>,
    ) -> Result<Program, BatchError> {
        let runner = lang
            .and_then(|lang| (self.resolve)(lang))
            .ok_or_else(|| BatchError::NoRunner {
                role,
                path: source.to_owned(),
            })?;

        let out_dir = self.plan.work_dir.join(role.to_string());
        fsutil::mkdir_all(&out_dir)?;

        log::info!("Compiling the {} ...", role);
        let artifact = runner
            .compile(source, &out_dir, role.binary_name())
            .await
            .map_err(|source| BatchError::Compile { role, source })?;
        log::info!("Finished compiling the {}", role);

        Ok(Program {
            role,
            runner,
            artifact,
        })
    }

    async fn execute(
        &self,
        program: &Program,
        round: usize,
        stdin: Input,
        args: &[String],
        limit: Option<Duration>,
        input_text: &str,
    ) -> Result<Vec<u8>, BatchError> {
        let role = program.role;
        let exec = program
            .runner
            .run(&program.artifact, ProcessIo::captured(stdin), args, limit)
            .await
            .map_err(|source| BatchError::Spawn {
                role,
                round,
                source,
            })?;

        let reason = if exec.is_timed_out() {
            Some(format!(
                "time limit exceeded, {}ms",
                exec.elapsed.as_millis()
            ))
        } else {
            exec.exit_error()
        };

        match reason {
            None => Ok(exec.stdout),
            Some(reason) => Err(BatchError::ProgramFailed {
                role,
                round,
                reason,
                stderr: exec.stderr_lossy(),
                input: input_text.to_owned(),
            }),
        }
    }
}

/// Uniform seeds in `[0, bound)`, never repeating within one batch.
struct SeedSource {
    rng: StdRng,
    bound: u32,
    used: HashSet<u32>,
}

impl SeedSource {
    fn new(bound: u32) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            bound: bound.max(1),
            used: HashSet::new(),
        }
    }

    fn draw(&mut self) -> u32 {
        if self.used.len() >= self.bound as usize {
            log::warn!("All {} seeds are used up; seeds will repeat", self.bound);
            self.used.clear();
        }
        loop {
            let seed = self.rng.gen_range(0..self.bound);
            if self.used.insert(seed) {
                return seed;
            }
        }
    }
}
