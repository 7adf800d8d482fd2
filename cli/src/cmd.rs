pub mod batch;
pub mod case;
pub mod cases;
pub mod expand;
pub mod printcase;
pub mod test;

use std::path::PathBuf;

#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct GlobalArgs {
    #[command(subcommand)]
    pub subcmd: Subcommand,

    /// Print debug logs
    #[arg(long, global = true)]
    pub dev: bool,

    /// Config file to use instead of the one in the user config dir
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
pub enum Subcommand {
    #[command(alias("t"))]
    Test(test::Args),

    #[command(alias("b"))]
    Batch(batch::Args),

    Case(case::Args),
    Cases(cases::Args),

    #[command(alias("pc"))]
    Printcase(printcase::Args),

    Expand(expand::Args),
}

pub type SubcmdResult = anyhow::Result<()>;

impl GlobalArgs {
    pub async fn exec_subcmd(&self) -> SubcmdResult {
        use Subcommand::*;
        match &self.subcmd {
            Test(args) => test::exec(args, self).await,
            Batch(args) => batch::exec(args, self).await,
            Case(args) => case::exec(args, self),
            Cases(args) => cases::exec(args, self),
            Printcase(args) => printcase::exec(args, self),
            Expand(args) => expand::exec(args, self),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn parse(args: &[&str]) -> GlobalArgs {
        GlobalArgs::try_parse_from(std::iter::once("cph").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn aliases_and_global_flags() {
        let app = parse(&["t", "--checker", "token", "--dev"]);
        assert!(app.dev);
        let Subcommand::Test(args) = app.subcmd else {
            panic!("not a test command")
        };
        assert_eq!(args.checker, Some(cph_core::testing::CheckerKind::Token));

        let app = parse(&["--config", "/tmp/x.toml", "b", "r", "-t", "7"]);
        assert_eq!(app.config, Some(PathBuf::from("/tmp/x.toml")));
        let Subcommand::Batch(batch::Args {
            action: batch::Action::Run { rounds },
        }) = app.subcmd
        else {
            panic!("not a batch run command")
        };
        assert_eq!(rounds, Some(7));
    }

    #[test]
    fn unknown_checker_is_rejected() {
        let res = GlobalArgs::try_parse_from(["cph", "test", "--checker", "fuzzy"]);
        assert!(res.is_err());
    }

    #[test]
    fn printcase_takes_an_id_and_one_filter() {
        let app = parse(&["pc", "3", "--input-only"]);
        let Subcommand::Printcase(args) = app.subcmd else {
            panic!("not a printcase command")
        };
        assert_eq!(args.id, 3);
        assert!(args.input_only && !args.output_only);

        let res =
            GlobalArgs::try_parse_from(["cph", "printcase", "3", "--input-only", "--output-only"]);
        assert!(res.is_err());
        assert!(GlobalArgs::try_parse_from(["cph", "printcase"]).is_err());
    }

    #[test]
    fn case_needs_an_output_or_no_output() {
        let app = parse(&["case", "a.in", "--no-output"]);
        let Subcommand::Case(args) = app.subcmd else {
            panic!("not a case command")
        };
        assert!(args.no_output);
        assert_eq!(args.output, None);

        let app = parse(&["case", "a.in", "a.out"]);
        let Subcommand::Case(args) = app.subcmd else {
            panic!("not a case command")
        };
        assert_eq!(args.output, Some(PathBuf::from("a.out")));

        assert!(GlobalArgs::try_parse_from(["cph", "case", "a.in"]).is_err());
        assert!(GlobalArgs::try_parse_from(["cph", "case", "a.in", "a.out", "--no-output"]).is_err());
    }
}
