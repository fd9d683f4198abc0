//! model.rs: item shapes flowing through the curation pipeline.
//!
//! `RawItem` → `ScoredItem` → `DedupGroup` → `FeedItem` (serialized output).
//! Everything here is plain data; stage logic lives in its own module.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Output feed truncation (chars) for description and body excerpt.
pub const FEED_DESCRIPTION_CHARS: usize = 300;
pub const FEED_BODY_CHARS: usize = 600;

/// A validated feed item. Immutable once produced by ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawItem {
    /// Stable id derived from the canonical URL (see `ingest::stable_id`).
    pub id: String,
    pub source: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub body: String,
    pub published_at: DateTime<Utc>,
    pub url: String,
}

impl RawItem {
    /// Lower-cased title.
    pub fn title_lc(&self) -> String {
        self.title.to_lowercase()
    }

    /// Lower-cased description + body (everything except the title).
    pub fn rest_lc(&self) -> String {
        format!("{} {}", self.description, self.body).to_lowercase()
    }

    /// Lower-cased title + description + body.
    pub fn full_text_lc(&self) -> String {
        format!("{} {} {}", self.title, self.description, self.body).to_lowercase()
    }
}

/// Which relevance pathway admitted an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pathway {
    /// Core-topic keyword present.
    Core,
    /// Macro term + geography term co-occurrence (lower priority).
    Macro,
}

/// An item that passed the relevance filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredItem {
    pub item: RawItem,
    pub pathway: Pathway,
}

/// Routing decision for a scored item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionState {
    Approved,
    PendingReview,
    Rejected,
}

/// How a score was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMethod {
    Keyword,
    Semantic,
}

/// RawItem + score, rationale, categories and decision.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredItem {
    pub item: RawItem,
    pub pathway: Pathway,
    pub score: i32,
    pub rationale: String,
    pub method: ScoreMethod,
    pub primary_category: String,
    pub secondary_categories: Vec<String>,
    pub decision: DecisionState,
    pub approved_on: Option<NaiveDate>,
}

/// A folded duplicate: who else reported the story.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AlsoReported {
    pub id: String,
    pub source: String,
    pub url: String,
}

/// One real-world story: a representative plus the items folded into it.
#[derive(Debug, Clone, PartialEq)]
pub struct DedupGroup {
    pub representative: ScoredItem,
    pub also_reported_by: Vec<AlsoReported>,
}

impl DedupGroup {
    pub fn single(item: ScoredItem) -> Self {
        Self {
            representative: item,
            also_reported_by: Vec::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.representative.item.source
    }

    pub fn score(&self) -> i32 {
        self.representative.score
    }

    pub fn published_at(&self) -> DateTime<Utc> {
        self.representative.item.published_at
    }

    /// Every item id carried by this group (representative first).
    pub fn member_ids(&self) -> Vec<&str> {
        std::iter::once(self.representative.item.id.as_str())
            .chain(self.also_reported_by.iter().map(|a| a.id.as_str()))
            .collect()
    }

    /// Every source that carried the story, representative first.
    pub fn reported_by(&self) -> Vec<&str> {
        std::iter::once(self.source())
            .chain(self.also_reported_by.iter().map(|a| a.source.as_str()))
            .collect()
    }
}

/// Serialized item shape shared by the output feed and the review queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: String,
    pub source: String,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub body: String,
    pub published_at: DateTime<Utc>,
    pub score: i32,
    #[serde(default)]
    pub rationale: String,
    pub method: ScoreMethod,
    pub pathway: Pathway,
    pub decision: DecisionState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_on: Option<NaiveDate>,
    pub category: String,
    #[serde(default)]
    pub secondary_categories: Vec<String>,
    #[serde(default)]
    pub also_reported_by: Vec<AlsoReported>,
}

impl From<&DedupGroup> for FeedItem {
    fn from(g: &DedupGroup) -> Self {
        let rep = &g.representative;
        Self {
            id: rep.item.id.clone(),
            source: rep.item.source.clone(),
            title: rep.item.title.clone(),
            url: rep.item.url.clone(),
            description: truncate_chars(&rep.item.description, FEED_DESCRIPTION_CHARS),
            body: truncate_chars(&rep.item.body, FEED_BODY_CHARS),
            published_at: rep.item.published_at,
            score: rep.score,
            rationale: rep.rationale.clone(),
            method: rep.method,
            pathway: rep.pathway,
            decision: rep.decision,
            approved_on: rep.approved_on,
            category: rep.primary_category.clone(),
            secondary_categories: rep.secondary_categories.clone(),
            also_reported_by: g.also_reported_by.clone(),
        }
    }
}

impl FeedItem {
    /// Rebuild a group from a previously published item.
    pub fn into_group(self) -> DedupGroup {
        DedupGroup {
            representative: ScoredItem {
                item: RawItem {
                    id: self.id,
                    source: self.source,
                    title: self.title,
                    description: self.description,
                    body: self.body,
                    published_at: self.published_at,
                    url: self.url,
                },
                pathway: self.pathway,
                score: self.score,
                rationale: self.rationale,
                method: self.method,
                primary_category: self.category,
                secondary_categories: self.secondary_categories,
                decision: self.decision,
                approved_on: self.approved_on,
            },
            also_reported_by: self.also_reported_by,
        }
    }
}

/// The published feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputFeed {
    pub generated_at: DateTime<Utc>,
    pub total_items: usize,
    pub scoring_method: ScoreMethod,
    pub items: Vec<FeedItem>,
}

impl OutputFeed {
    /// Ids already published; used to skip re-ingesting them.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.items
            .iter()
            .flat_map(|it| std::iter::once(it.id.as_str()).chain(it.also_reported_by.iter().map(|a| a.id.as_str())))
    }
}

/// Items routed to human audit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewQueue {
    pub pending: Vec<FeedItem>,
    pub rejected: Vec<FeedItem>,
}

pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}
