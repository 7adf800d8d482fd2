use cph_core::{action, style};

use crate::{config, util};

use super::{GlobalArgs, SubcmdResult};

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Case ID, as in `test-<ID>`
    #[arg()]
    pub id: usize,

    #[arg(long, conflicts_with = "output_only")]
    pub input_only: bool,

    #[arg(long)]
    pub output_only: bool,
}

pub fn exec(args: &Args, global_args: &GlobalArgs) -> SubcmdResult {
    let cfg = config::load(global_args)?;
    let content = action::read_case(util::current_dir(), &cfg, args.id)?;
    style::print_case_content(&content, !args.output_only, !args.input_only);
    Ok(())
}
