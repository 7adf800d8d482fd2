use std::io::Write as _;

use colored::Colorize;
use cph_core::style::ColorTheme;
use log::LevelFilter;

/// `warn` by default, `debug` with `--dev`. `RUST_LOG` overrides both.
pub fn init(dev: bool) {
    let level = if dev {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            let level = record.level();
            writeln!(
                buf,
                "[{}] {}",
                level.to_string().color(level.color()).bold(),
                record.args()
            )
        })
        .init();
}
