pub mod batch;
pub mod checker;
pub mod judge;
pub mod lang;
pub mod process;
pub mod report;
pub mod testcase;
pub mod verdict;

pub use batch::{Batch, BatchError, BatchOutcome, BatchPlan, Counterexample};
pub use checker::{Checker, CheckerKind, DiffChecker, Mismatch, TokenChecker};
pub use judge::{new_judge_for, Judge, JudgeError, JudgeOptions, TaskJudge};
pub use lang::{Artifact, CodeRunner, CompileError, Lang};
pub use report::{JudgeReport, ReportEntry};
pub use testcase::CaseDescription;
pub use verdict::{CaseStatus, Verdict};
