use std::{path::PathBuf, time::Duration};

use colored::{Color, ColoredString, Colorize};
use crossterm::terminal;

use crate::action::CaseContent;
use crate::testing::{Counterexample, JudgeReport, ReportEntry, Verdict};

#[macro_export]
macro_rules! print_success {
    ($fmt:literal, $($e:tt)*) => {
        use ::colored::Colorize as _;
        println!("{}", format!($fmt, $($e)*).green())
    }
}

pub fn is_truecolor_supported() -> bool {
    let Ok(v) = std::env::var("COLORTERM") else {
        return false
    };
    matches!(v.as_str(), "truecolor" | "24bit")
}

pub trait ColorTheme {
    fn color(&self) -> Color;
}

impl ColorTheme for log::Level {
    fn color(&self) -> Color {
        use log::Level::*;
        match self {
            Error => Color::BrightRed,
            Warn => Color::BrightYellow,
            Info => Color::Cyan,
            Debug => Color::Magenta,
            Trace => Color::Blue,
        }
    }
}

impl ColorTheme for Verdict {
    fn color(&self) -> Color {
        use Verdict::*;
        if !self::is_truecolor_supported() {
            return match self {
                AC => Color::Green,
                WA => Color::Yellow,
                TLE => Color::Red,
                RE => Color::Magenta,
                SK => Color::BrightBlack,
            };
        }

        let (r, g, b) = match self {
            AC => (30, 180, 40),
            WA => (210, 138, 4),
            TLE => (220, 42, 42),
            RE => (171, 40, 200),
            SK => (110, 110, 110),
        };
        Color::TrueColor { r, g, b }
    }
}

pub fn verdict_icon(verdict: Verdict) -> ColoredString {
    let fg = if is_truecolor_supported() {
        Color::TrueColor {
            r: 255,
            g: 255,
            b: 255,
        }
    } else {
        Color::BrightBlack
    };
    format!(" {:<3} ", verdict)
        .on_color(verdict.color())
        .bold()
        .color(fg)
}

/// One-line status as shown next to a finished spinner. `index` is the
/// case's position in the run.
pub fn case_line(index: usize, entry: &ReportEntry) -> String {
    let custom = if entry.case.custom { " (custom)" } else { "" };
    format!(
        "#{} Testcase {}{} ... {} [{}ms]",
        index,
        entry.case.name,
        custom,
        self::verdict_icon(entry.status.verdict()),
        entry.status.duration().as_millis(),
    )
}

pub fn print_report_summary(report: &JudgeReport) {
    let bar = "-".repeat(5);
    print!("{} ", bar);

    let num_total = report.len();
    let num_failed = report
        .entries()
        .iter()
        .filter(|e| e.status.verdict().is_failure())
        .count();
    let num_passed = num_total - num_failed;
    let num_unchecked = report.count(Verdict::SK);

    if num_failed == 0 && num_unchecked == 0 {
        let msg = format!("All {} tests passed ✨", num_total);
        print!("{}", msg.green());
    } else if num_failed == 0 {
        let msg = format!(
            "{} tests passed, {} not checked",
            num_total - num_unchecked,
            num_unchecked
        );
        print!("{}", msg.bright_yellow());
    } else {
        let summary_msg = if num_passed > 0 {
            format!("{}/{} tests failed 💣", num_failed, num_total)
        } else {
            format!("All {} tests failed 💀", num_total)
        };

        let detail_msg = report
            .verdict_counts()
            .into_iter()
            .filter(|(verdict, _)| !verdict.is_accepted())
            .map(|(verdict, cnt)| {
                format!(
                    "{}{}{}",
                    self::verdict_icon(verdict),
                    "x".dimmed(),
                    cnt.to_string().bold().bright_white(),
                )
            })
            .collect::<Vec<String>>()
            .join(", ");

        print!("{} ({})", summary_msg.bright_red(), detail_msg);
    }

    println!(" {}", bar);
}

const BOLD_LINE: &str = "━";
const THIN_LINE: &str = "─";

fn term_cols() -> usize {
    terminal::size().map(|(cols, _)| cols as usize).unwrap_or(40)
}

fn print_sub_title(s: &str, cols: usize) {
    println!(
        "{}{}",
        s.cyan().bold(),
        THIN_LINE
            .repeat(cols.saturating_sub(s.len() + 1))
            .bright_black(),
    )
}

fn print_lines(text: &str) {
    let lines: Vec<_> = text.lines().collect();
    if lines.is_empty() {
        println!("{}", "<EMPTY>".magenta().dimmed());
        return;
    }
    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim_end();
        print!("{}", trimmed);

        let num_trailing_whitespace = line.len() - trimmed.len();
        if num_trailing_whitespace > 0 {
            print!(
                "{}{}",
                " ".repeat(num_trailing_whitespace).on_red(),
                "(Trailing whitespace)".bright_red().bold()
            );
        }

        let is_last_line = i + 1 == lines.len();
        if is_last_line && !text.ends_with('\n') {
            print!("{}", " Missing new line ".on_yellow().black().bold());
        }

        println!();
    }
}

/// Expected output, actual output and stderr of a case that was not accepted.
pub fn print_case_detail(entry: &ReportEntry) {
    let cols = self::term_cols();
    let bold_bar = BOLD_LINE.repeat(cols).blue().bold();
    let status = &entry.status;

    println!(
        "\n{}: {} {} [{}ms]\n{}",
        entry.case.name.bright_yellow().bold(),
        self::verdict_icon(status.verdict()),
        status.verdict().describe(),
        status.duration().as_millis(),
        bold_bar,
    );

    if let Some(mismatch) = status.checker_error() {
        println!("{}", mismatch.to_string().bright_red());
    }

    let read = |path: &PathBuf| fsutil::read_to_string_lossy(path).unwrap_or_default();
    match (status.verdict(), &entry.case.expected_output) {
        (Verdict::WA, Some(expected)) => {
            print_sub_title("[expected]", cols);
            print_lines(&read(expected));

            print_sub_title("[stdout]", cols);
            print_lines(&read(&entry.case.scratch_output));
        }
        (Verdict::SK, None) if status.duration() > Duration::ZERO => {
            print_sub_title("[stdout] (no expected output)", cols);
            print_lines(&read(&entry.case.scratch_output));
        }
        _ => {}
    }

    if !status.stderr().is_empty() {
        print_sub_title("[stderr]", cols);
        print!("{}", status.stderr());
        if !status.stderr().ends_with('\n') {
            println!();
        }
    }

    println!("{}", bold_bar);
}

pub fn print_report(report: &JudgeReport) {
    report
        .entries()
        .iter()
        .filter(|e| !e.status.verdict().is_accepted())
        .for_each(print_case_detail);

    print_report_summary(report);
}

/// Prints the saved files of one case; either part can be left out.
pub fn print_case_content(content: &CaseContent, with_input: bool, with_output: bool) {
    let cols = self::term_cols();
    println!("{}", content.name.bright_yellow().bold());

    if with_input {
        print_sub_title("[input]", cols);
        print_lines(&content.input);
    }
    if with_output {
        print_sub_title("[expected]", cols);
        match &content.expected_output {
            Some(output) => print_lines(output),
            None => println!("{}", "<NO EXPECTED OUTPUT>".magenta().dimmed()),
        }
    }
}

pub fn print_counterexample(c: &Counterexample) {
    let cols = self::term_cols();
    let bold_bar = BOLD_LINE.repeat(cols).blue().bold();

    println!(
        "\n{} on round {} (seed {})\n{}",
        "Found a counterexample".bright_red().bold(),
        c.round.to_string().bold(),
        c.seed,
        bold_bar,
    );
    println!("{}", c.detail.to_string().bright_red());

    print_sub_title("[input]", cols);
    print_lines(&c.input);

    print_sub_title("[brute]", cols);
    print_lines(&c.expected);

    print_sub_title("[solution]", cols);
    print_lines(&c.got);

    println!("{}", bold_bar);
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing::{CaseDescription, CaseStatus};

    #[test]
    fn case_line_starts_with_the_index() {
        let entry = ReportEntry {
            case: CaseDescription::new(
                "test-4",
                "inputs/test-4.in",
                "outputs/test-4.ans",
                true,
                Duration::from_secs(1),
            ),
            status: CaseStatus::accepted(String::new(), Duration::from_millis(12)),
        };

        let line = case_line(3, &entry);
        assert!(line.starts_with("#3 Testcase test-4 (custom) ... "), "{}", line);
        assert!(line.ends_with("[12ms]"), "{}", line);
    }
}
