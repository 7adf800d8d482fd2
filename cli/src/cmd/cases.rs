use colored::Colorize;
use cph_core::action;

use crate::{config, util};

use super::{GlobalArgs, SubcmdResult};

#[derive(Debug, clap::Args)]
pub struct Args {}

pub fn exec(_args: &Args, global_args: &GlobalArgs) -> SubcmdResult {
    let cfg = config::load(global_args)?;
    let task_dir = util::current_dir();
    let meta = action::load_task(&task_dir, &cfg)?;

    println!(
        "{} [{}] {}ms, {} case(s)",
        meta.task_name.bright_yellow().bold(),
        meta.task_lang,
        meta.time_limit_ms,
        meta.count_test_cases()
    );
    for (i, case) in meta.case_descriptions(&task_dir).iter().enumerate() {
        let custom = if case.custom { "custom" } else { "" };
        let unchecked = if case.expected_output.is_none() { "no-out" } else { "" };
        println!(
            "{:>3}  {:<10} {:>6}ms  {:<6}  {:<6}  {}",
            i,
            case.name.cyan(),
            case.time_limit.as_millis(),
            custom.magenta(),
            unchecked.yellow(),
            util::replace_homedir_to_tilde(&case.input).to_string_lossy(),
        );
    }
    if let Some(generator) = meta.batch_file.as_ref().filter(|_| meta.has_batch(&task_dir)) {
        println!("batch: {:?} vs {:?}", generator, meta.brute_file);
    }
    Ok(())
}
