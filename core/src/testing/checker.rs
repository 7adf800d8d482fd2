use serde::{Deserialize, Serialize};

/// Why a produced output was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Mismatch {
    #[error("Checker failed, expected '{expected}', found '{got}'")]
    Diff { expected: String, got: String },

    #[error("Checker failed, token count mismatch: found {got} token(s), expected {expected}")]
    TokenCount { got: usize, expected: usize },

    #[error("Checker failed at token #{index}: expected '{expected}', found '{got}'")]
    Token {
        index: usize,
        expected: String,
        got: String,
    },
}

/// Compares the output of a program against the expected output.
pub trait Checker: Send + Sync {
    fn check(&self, got: &str, expected: &str) -> Result<(), Mismatch>;
}

/// Byte-for-byte comparison, ignoring trailing whitespace and newlines.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffChecker;

/// Compares whitespace-separated tokens, ignoring all spacing and line breaks.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenChecker;

impl Checker for DiffChecker {
    fn check(&self, got: &str, expected: &str) -> Result<(), Mismatch> {
        let (got, expected) = (got.trim_end(), expected.trim_end());
        if got == expected {
            return Ok(());
        }
        Err(Mismatch::Diff {
            expected: expected.to_owned(),
            got: got.to_owned(),
        })
    }
}

impl Checker for TokenChecker {
    fn check(&self, got: &str, expected: &str) -> Result<(), Mismatch> {
        let got_tokens: Vec<&str> = got.split_whitespace().collect();
        let expected_tokens: Vec<&str> = expected.split_whitespace().collect();

        if got_tokens.len() != expected_tokens.len() {
            return Err(Mismatch::TokenCount {
                got: got_tokens.len(),
                expected: expected_tokens.len(),
            });
        }

        match got_tokens
            .iter()
            .zip(&expected_tokens)
            .position(|(g, e)| g != e)
        {
            None => Ok(()),
            Some(index) => Err(Mismatch::Token {
                index,
                expected: expected_tokens[index].to_owned(),
                got: got_tokens[index].to_owned(),
            }),
        }
    }
}

/// Checker selection by name, as written in the config (`diff` or `token`).
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CheckerKind {
    #[default]
    Diff,
    Token,
}

impl CheckerKind {
    pub fn build(self) -> Box<dyn Checker> {
        use CheckerKind::*;
        match self {
            Diff => Box::new(DiffChecker),
            Token => Box::new(TokenChecker),
        }
    }
}
