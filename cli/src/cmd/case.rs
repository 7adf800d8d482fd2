use std::path::PathBuf;

use cph_core::{action, print_success};

use crate::{config, util};

use super::{GlobalArgs, SubcmdResult};

#[derive(Debug, clap::Args)]
pub struct Args {
    /// File to copy in as the case input
    #[arg()] // positional argument
    pub input: PathBuf,

    /// File to copy in as the expected output
    #[arg(required_unless_present = "no_output", conflicts_with = "no_output")]
    pub output: Option<PathBuf>,

    /// Add an input-only case; it is run but its output is not checked
    #[arg(long)]
    pub no_output: bool,
}

pub fn exec(args: &Args, global_args: &GlobalArgs) -> SubcmdResult {
    let cfg = config::load(global_args)?;
    let name = action::add_case(
        util::current_dir(),
        &cfg,
        &args.input,
        args.output.as_deref(),
    )?;
    print_success!("Added custom case {}", name);
    Ok(())
}
