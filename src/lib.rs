// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod categorize;
pub mod config;
pub mod dedup;
pub mod diversity;
pub mod error;
pub mod ingest;
pub mod interleave;
pub mod keywords;
pub mod lexicon;
pub mod model;
pub mod pipeline;
pub mod registry;
pub mod relevance;
pub mod report;
pub mod routing;
pub mod scoring;

// ---- Re-exports for stable public API ----
pub use crate::config::CurationConfig;
pub use crate::error::CurationError;
pub use crate::ingest::types::{FeedProvider, RawRecord, SourceBatch};
pub use crate::model::{DedupGroup, FeedItem, OutputFeed, RawItem, ReviewQueue, ScoredItem};
pub use crate::pipeline::{Pipeline, RunOutcome};
pub use crate::report::RunReport;
pub use crate::scoring::{KeywordScorer, Scorer};
