use strum::IntoEnumIterator;

use super::{
    testcase::CaseDescription,
    verdict::{CaseStatus, Verdict},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub case: CaseDescription,
    pub status: CaseStatus,
}

/// Verdicts in the order the cases were run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JudgeReport {
    entries: Vec<ReportEntry>,
}

impl JudgeReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, status: CaseStatus, case: CaseDescription) {
        self.entries.push(ReportEntry { case, status })
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, verdict: Verdict) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status.verdict() == verdict)
            .count()
    }

    /// Non-zero counts per verdict, in declaration order of `Verdict`.
    pub fn verdict_counts(&self) -> Vec<(Verdict, usize)> {
        Verdict::iter()
            .map(|v| (v, self.count(v)))
            .filter(|&(_, n)| n > 0)
            .collect()
    }

    pub fn all_accepted(&self) -> bool {
        self.entries.iter().all(|e| e.status.verdict().is_accepted())
    }

    /// No case failed. Unchecked cases count as passing.
    pub fn passed(&self) -> bool {
        !self.entries.iter().any(|e| e.status.verdict().is_failure())
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::*;

    fn case(name: &str) -> CaseDescription {
        CaseDescription::new(
            name,
            format!("inputs/{}.in", name),
            format!("outputs/{}.ans", name),
            name.starts_with("custom"),
            Duration::from_secs(1),
        )
    }

    #[test]
    fn keeps_insertion_order() {
        let ms = Duration::from_millis(1);
        let mut report = JudgeReport::new();
        report.add(CaseStatus::accepted(String::new(), ms), case("test-2"));
        report.add(CaseStatus::runtime_error("x".into(), ms), case("test-0"));
        report.add(CaseStatus::accepted(String::new(), ms), case("custom-1"));

        let names: Vec<_> = report.entries().iter().map(|e| e.case.name.as_str()).collect();
        assert_eq!(names, ["test-2", "test-0", "custom-1"]);
        assert!(report.entries()[2].case.custom);
        assert_eq!(report.entries()[1].status.stderr(), "x");
    }

    #[test]
    fn counts_verdicts() {
        let ms = Duration::from_millis(1);
        let mut report = JudgeReport::new();
        assert!(report.all_accepted());

        report.add(CaseStatus::accepted(String::new(), ms), case("test-0"));
        assert!(report.all_accepted());

        report.add(CaseStatus::time_limit_exceeded(String::new(), ms), case("test-1"));
        report.add(CaseStatus::time_limit_exceeded(String::new(), ms), case("test-2"));
        assert!(!report.all_accepted());
        assert!(!report.passed());
        assert_eq!(report.len(), 3);
        assert_eq!(
            report.verdict_counts(),
            [(Verdict::AC, 1), (Verdict::TLE, 2)]
        );
    }

    #[test]
    fn unchecked_cases_pass_but_are_not_accepted() {
        let ms = Duration::from_millis(1);
        let mut report = JudgeReport::new();
        report.add(CaseStatus::accepted(String::new(), ms), case("test-0"));
        report.add(CaseStatus::not_checked(String::new(), ms), case("test-1"));

        assert!(report.passed());
        assert!(!report.all_accepted());
        assert_eq!(report.verdict_counts(), [(Verdict::AC, 1), (Verdict::SK, 1)]);
    }
}
