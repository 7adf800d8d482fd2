use anyhow::ensure;
use cph_core::{action, testing::CheckerKind};

use crate::{config, util};

use super::{GlobalArgs, SubcmdResult};

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Output checker: diff or token. Defaults to the configured one.
    #[arg(short, long)]
    pub checker: Option<CheckerKind>,
}

pub async fn exec(args: &Args, global_args: &GlobalArgs) -> SubcmdResult {
    let cfg = config::load(global_args)?;
    let report = action::run_tests(util::current_dir(), &cfg, args.checker).await?;

    let num_failed = report
        .entries()
        .iter()
        .filter(|e| e.status.verdict().is_failure())
        .count();
    ensure!(
        report.passed(),
        "{} of {} test cases did not pass",
        num_failed,
        report.len()
    );
    Ok(())
}
