// src/error.rs
use thiserror::Error;

/// Fatal outcomes of a curation run.
#[derive(Debug, Error)]
pub enum CurationError {
    /// Every source yielded zero items: upstream is broken, not a quiet news day.
    #[error("all {sources} sources yielded zero items")]
    NoInput { sources: usize },

    #[error("invalid curation config: {0}")]
    Config(String),
}
