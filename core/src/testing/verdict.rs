use std::time::Duration;

use super::checker::Mismatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum Verdict {
    AC,
    WA,
    RE,
    TLE,
    SK,
}

impl Verdict {
    pub fn is_accepted(self) -> bool {
        self == Verdict::AC
    }

    /// The solution misbehaved. `SK` is neither a failure nor accepted.
    pub fn is_failure(self) -> bool {
        matches!(self, Verdict::WA | Verdict::RE | Verdict::TLE)
    }

    pub fn describe(self) -> &'static str {
        use Verdict::*;
        match self {
            AC => "Accepted",
            WA => "Wrong answer",
            RE => "Runtime error",
            TLE => "Time limit exceeded",
            SK => "Skipped",
        }
    }
}

/// Outcome of judging one test case.
///
/// `checker_error` is present iff the verdict is `WA`; the constructors are
/// the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseStatus {
    verdict: Verdict,
    checker_error: Option<Mismatch>,
    stderr: String,
    duration: Duration,
}

impl CaseStatus {
    pub fn accepted(stderr: String, duration: Duration) -> Self {
        Self::new(Verdict::AC, None, stderr, duration)
    }

    pub fn wrong_answer(mismatch: Mismatch, stderr: String, duration: Duration) -> Self {
        Self::new(Verdict::WA, Some(mismatch), stderr, duration)
    }

    pub fn runtime_error(stderr: String, duration: Duration) -> Self {
        Self::new(Verdict::RE, None, stderr, duration)
    }

    pub fn time_limit_exceeded(stderr: String, duration: Duration) -> Self {
        Self::new(Verdict::TLE, None, stderr, duration)
    }

    pub fn skipped() -> Self {
        Self::new(Verdict::SK, None, String::new(), Duration::ZERO)
    }

    /// The program ran cleanly but the case has no expected output to check.
    pub fn not_checked(stderr: String, duration: Duration) -> Self {
        Self::new(Verdict::SK, None, stderr, duration)
    }

    fn new(
        verdict: Verdict,
        checker_error: Option<Mismatch>,
        stderr: String,
        duration: Duration,
    ) -> Self {
        Self {
            verdict,
            checker_error,
            stderr,
            duration,
        }
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn checker_error(&self) -> Option<&Mismatch> {
        self.checker_error.as_ref()
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn every_verdict_is_described() {
        let described: Vec<_> = Verdict::iter()
            .map(|v| match v {
                Verdict::AC | Verdict::WA | Verdict::RE | Verdict::TLE | Verdict::SK => {
                    v.describe()
                }
            })
            .collect();
        assert_eq!(described.len(), 5);
        assert_eq!(Verdict::iter().filter(|v| v.is_accepted()).count(), 1);
        assert_eq!(Verdict::iter().filter(|v| v.is_failure()).count(), 3);
        assert!(!Verdict::SK.is_failure() && !Verdict::SK.is_accepted());
    }

    #[test]
    fn checker_error_only_on_wrong_answer() {
        let ms = Duration::from_millis(3);
        let mismatch = Mismatch::TokenCount {
            got: 1,
            expected: 2,
        };

        for status in [
            CaseStatus::accepted(String::new(), ms),
            CaseStatus::runtime_error("boom".into(), ms),
            CaseStatus::time_limit_exceeded(String::new(), ms),
            CaseStatus::skipped(),
            CaseStatus::not_checked("note".into(), ms),
        ] {
            assert_eq!(status.checker_error(), None);
        }

        let wa = CaseStatus::wrong_answer(mismatch.clone(), "warn\n".into(), ms);
        assert_eq!(wa.verdict(), Verdict::WA);
        assert_eq!(wa.checker_error(), Some(&mismatch));
        assert_eq!(wa.stderr(), "warn\n");
        assert_eq!(wa.duration(), ms);
    }
}
