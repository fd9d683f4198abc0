// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One record as delivered by the fetch/parse step. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "link")]
    pub url: Option<String>,
    #[serde(default, alias = "summary")]
    pub description: Option<String>,
    #[serde(default, alias = "content")]
    pub body: Option<String>,
    /// RFC 3339, RFC 2822 or `YYYY-MM-DD`.
    #[serde(default, alias = "pubDate", alias = "published_at")]
    pub published: Option<String>,
}

/// Everything one source yielded in this run (possibly nothing).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceBatch {
    pub source: String,
    #[serde(default)]
    pub records: Vec<RawRecord>,
}

impl SourceBatch {
    pub fn empty(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            records: Vec::new(),
        }
    }
}

#[async_trait::async_trait]
pub trait FeedProvider: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<RawRecord>>;
    fn name(&self) -> &str;
}
