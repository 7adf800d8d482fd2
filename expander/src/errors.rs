use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ExpanderError {
    #[error("expander: Unsupported language (given: {0})")]
    UnsupportedLang(PathBuf),

    #[error("expander: {0}")]
    Fs(#[from] fsutil::Error),
}

pub type Result<T> = ::std::result::Result<T, ExpanderError>;
