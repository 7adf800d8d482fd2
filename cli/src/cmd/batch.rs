use anyhow::bail;
use cph_core::{action, print_success, testing::BatchOutcome};

use crate::{config, util};

use super::{GlobalArgs, SubcmdResult};

#[derive(Debug, clap::Args)]
pub struct Args {
    #[command(subcommand)]
    pub action: Action,
}

#[derive(Debug, clap::Subcommand)]
pub enum Action {
    /// Stress-test the solution against the brute force
    #[command(alias("r"))]
    Run {
        /// Number of rounds. Defaults to `batch.rounds` from the config.
        #[arg(short = 't', long)]
        rounds: Option<usize>,
    },

    /// Create a generator (and brute force) from templates
    #[command(alias("c"))]
    Create {
        #[arg(long)]
        no_brute: bool,
    },
}

pub async fn exec(args: &Args, global_args: &GlobalArgs) -> SubcmdResult {
    let cfg = config::load(global_args)?;
    let task_dir = util::current_dir();

    match &args.action {
        Action::Run { rounds } => match action::run_batch(&task_dir, &cfg, *rounds).await? {
            BatchOutcome::Passed { .. } => Ok(()),
            BatchOutcome::Mismatch(c) => bail!("Found a counterexample on round {}", c.round),
        },
        Action::Create { no_brute } => {
            let created = action::create_batch(&task_dir, &cfg, !no_brute)?;
            for path in created {
                print_success!("Created {}", path.to_string_lossy());
            }
            Ok(())
        }
    }
}
