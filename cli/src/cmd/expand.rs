use std::path::PathBuf;

use cph_core::action;

use super::{GlobalArgs, SubcmdResult};
use crate::config;

#[derive(Debug, clap::Args)]
pub struct Args {
    #[arg()] // positional argument
    pub filepath: PathBuf,

    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub fn exec(args: &Args, global_args: &GlobalArgs) -> SubcmdResult {
    let cfg = config::load(global_args)?;
    let code = action::expand_source_code(&args.filepath, &cfg)?;

    if let Some(out_path) = &args.out {
        fsutil::write(out_path, code)?;
    } else {
        print!("{}", code);
    }

    Ok(())
}
