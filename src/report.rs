// src/report.rs
//! Run report: per-stage in/out counts, drop reasons, decisions and empty sources.
//!
//! Stages never touch the report; the pipeline threads it through and records
//! each stage's counts from the stage's return value. `publish_metrics` mirrors
//! the finished report into `metrics` counters/gauges.

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::model::ScoreMethod;

pub const STAGE_INGEST: &str = "ingest";
pub const STAGE_RELEVANCE: &str = "relevance";
pub const STAGE_PRE_CAP: &str = "pre_scoring_cap";
pub const STAGE_SCORING_BUDGET: &str = "scoring_budget";
pub const STAGE_SCORING: &str = "scoring";
pub const STAGE_ROUTING: &str = "routing";
pub const STAGE_DEDUP: &str = "dedup";
pub const STAGE_OUTPUT_CAP: &str = "output_cap";
pub const STAGE_INTERLEAVE: &str = "interleave";

/// One-time metrics registration (so series show up in the exposition).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("curation_items_in_total", "Raw records received from sources.");
        describe_counter!(
            "curation_items_out_total",
            "Items leaving each pipeline stage."
        );
        describe_counter!(
            "curation_dropped_total",
            "Records dropped at ingestion, by reason."
        );
        describe_counter!(
            "curation_decisions_total",
            "Routing decisions, by decision."
        );
        describe_counter!(
            "curation_semantic_fallbacks_total",
            "Semantic scoring attempts that fell back to keywords."
        );
        describe_gauge!(
            "curation_empty_sources",
            "Sources that yielded zero items in the last run."
        );
        describe_gauge!("curation_last_run_ts", "Unix ts of the last curation run.");
    });
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCount {
    pub stage: String,
    pub entered: usize,
    pub left: usize,
}

/// Ingestion drop reasons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropCounts {
    pub missing_title: usize,
    pub missing_url: usize,
    pub bad_date: usize,
    pub duplicate_id: usize,
    pub already_seen: usize,
}

impl DropCounts {
    pub fn total(&self) -> usize {
        self.missing_title + self.missing_url + self.bad_date + self.duplicate_id + self.already_seen
    }

    pub fn add(&mut self, other: &DropCounts) {
        self.missing_title += other.missing_title;
        self.missing_url += other.missing_url;
        self.bad_date += other.bad_date;
        self.duplicate_id += other.duplicate_id;
        self.already_seen += other.already_seen;
    }

    fn pairs(&self) -> [(&'static str, usize); 5] {
        [
            ("missing_title", self.missing_title),
            ("missing_url", self.missing_url),
            ("bad_date", self.bad_date),
            ("duplicate_id", self.duplicate_id),
            ("already_seen", self.already_seen),
        ]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionCounts {
    pub approved: usize,
    pub pending: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub scoring_method: ScoreMethod,
    pub stages: Vec<StageCount>,
    pub drops: DropCounts,
    pub macro_pathway: usize,
    pub decisions: DecisionCounts,
    pub semantic_fallbacks: usize,
    pub duplicates_folded: usize,
    /// Sources that yielded zero usable items this run (health signal).
    pub empty_sources: Vec<String>,
}

impl RunReport {
    pub fn new(generated_at: DateTime<Utc>, scoring_method: ScoreMethod) -> Self {
        Self {
            generated_at,
            scoring_method,
            stages: Vec::new(),
            drops: DropCounts::default(),
            macro_pathway: 0,
            decisions: DecisionCounts::default(),
            semantic_fallbacks: 0,
            duplicates_folded: 0,
            empty_sources: Vec::new(),
        }
    }

    pub fn record(&mut self, stage: &str, entered: usize, left: usize) {
        self.stages.push(StageCount {
            stage: stage.to_string(),
            entered,
            left,
        });
    }

    pub fn stage(&self, stage: &str) -> Option<&StageCount> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    /// Mirror the report into the installed metrics recorder (no-op without one).
    pub fn publish_metrics(&self) {
        ensure_metrics_described();

        if let Some(s) = self.stage(STAGE_INGEST) {
            counter!("curation_items_in_total").increment(s.entered as u64);
        }
        for s in &self.stages {
            counter!("curation_items_out_total", "stage" => s.stage.clone()).increment(s.left as u64);
        }
        for (reason, n) in self.drops.pairs() {
            counter!("curation_dropped_total", "reason" => reason).increment(n as u64);
        }
        let d = &self.decisions;
        for (decision, n) in [
            ("approved", d.approved),
            ("pending_review", d.pending),
            ("rejected", d.rejected),
        ] {
            counter!("curation_decisions_total", "decision" => decision).increment(n as u64);
        }
        counter!("curation_semantic_fallbacks_total").increment(self.semantic_fallbacks as u64);
        gauge!("curation_empty_sources").set(self.empty_sources.len() as f64);
        gauge!("curation_last_run_ts").set(self.generated_at.timestamp().max(0) as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn records_stages_in_order() {
        let mut r = RunReport::new(
            Utc.with_ymd_and_hms(2026, 1, 1, 6, 0, 0).unwrap(),
            ScoreMethod::Keyword,
        );
        r.record(STAGE_INGEST, 10, 8);
        r.record(STAGE_RELEVANCE, 8, 5);
        assert_eq!(r.stages.len(), 2);
        assert_eq!(r.stage(STAGE_RELEVANCE).unwrap().left, 5);
        assert!(r.stage(STAGE_DEDUP).is_none());
    }

    #[test]
    fn drop_totals_add_up() {
        let mut a = DropCounts {
            missing_title: 1,
            bad_date: 2,
            ..Default::default()
        };
        a.add(&DropCounts {
            already_seen: 3,
            ..Default::default()
        });
        assert_eq!(a.total(), 6);
    }

    #[test]
    fn serializes_for_the_report_file() {
        let r = RunReport::new(
            Utc.with_ymd_and_hms(2026, 1, 1, 6, 0, 0).unwrap(),
            ScoreMethod::Semantic,
        );
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["scoring_method"], serde_json::json!("semantic"));
        assert!(v["empty_sources"].as_array().unwrap().is_empty());
        // without a recorder installed this is a no-op
        r.publish_metrics();
    }
}
