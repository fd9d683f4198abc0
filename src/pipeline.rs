// src/pipeline.rs
//! The curation run: a pure function from (source batches, previous feed, now)
//! to (feed, review queue, run report).
//!
//! ingest → relevance → pre-scoring cap → scoring budget → score + categorize
//! → dedup (with the previous feed) → route → output cap → interleave.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::categorize::Categorizer;
use crate::config::CurationConfig;
use crate::dedup::Deduplicator;
use crate::diversity::{cap_filtered, cap_groups};
use crate::error::CurationError;
use crate::ingest::ingest_batches;
use crate::ingest::types::SourceBatch;
use crate::interleave::interleave;
use crate::model::{
    DecisionState, DedupGroup, FeedItem, FilteredItem, OutputFeed, Pathway, ReviewQueue,
    ScoredItem,
};
use crate::registry::SourceRegistry;
use crate::relevance::RelevanceFilter;
use crate::report::{self, RunReport};
use crate::routing::route;
use crate::scoring::{build_scorer, Scorer};

/// Everything one run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub feed: OutputFeed,
    pub review: ReviewQueue,
    pub report: RunReport,
}

pub struct Pipeline {
    config: CurationConfig,
    registry: SourceRegistry,
    relevance: RelevanceFilter,
    categorizer: Categorizer,
    dedup: Deduplicator,
    scorer: Box<dyn Scorer>,
}

impl Pipeline {
    /// Build every stage from config; the scorer is chosen by `config.semantic`.
    pub fn from_config(config: CurationConfig) -> anyhow::Result<Self> {
        let scorer = build_scorer(&config)?;
        Self::with_scorer(config, scorer)
    }

    pub fn with_scorer(config: CurationConfig, scorer: Box<dyn Scorer>) -> anyhow::Result<Self> {
        let registry = config.registry();
        Ok(Self {
            relevance: RelevanceFilter::from_lexicon(&config.lexicon)?,
            categorizer: Categorizer::from_lexicon(&config.lexicon)?,
            dedup: Deduplicator::new(&config.dedup, &registry),
            registry,
            scorer,
            config,
        })
    }

    pub fn config(&self) -> &CurationConfig {
        &self.config
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Spend the scoring budget on core items first, then the newest.
    fn apply_scoring_budget(&self, mut items: Vec<FilteredItem>) -> Vec<FilteredItem> {
        items.sort_by(|a, b| {
            a.pathway
                .cmp(&b.pathway)
                .then(b.item.published_at.cmp(&a.item.published_at))
                .then(a.item.id.cmp(&b.item.id))
        });
        items.truncate(self.config.scoring.max_scored_per_run);
        items
    }

    /// Score and categorize sequentially; returns the items and the semantic fallback count.
    async fn score_all(
        &self,
        items: Vec<FilteredItem>,
        now: DateTime<Utc>,
    ) -> (Vec<ScoredItem>, usize) {
        let today = now.date_naive();
        self.scorer.begin_run();

        let mut fallbacks = 0usize;
        let mut scored = Vec::with_capacity(items.len());
        for f in items {
            let outcome = self.scorer.score(&f, today).await;
            if outcome.fell_back {
                fallbacks += 1;
            }
            let mut cats = self.categorizer.categorize(&f.item);
            if let Some(suggested) = outcome.suggested_category.as_deref() {
                cats.promote(suggested);
            }
            scored.push(ScoredItem {
                item: f.item,
                pathway: f.pathway,
                score: outcome.score,
                rationale: outcome.rationale,
                method: outcome.method,
                primary_category: cats.primary,
                secondary_categories: cats.secondary,
                decision: DecisionState::PendingReview,
                approved_on: None,
            });
        }
        (scored, fallbacks)
    }

    pub async fn run(
        &self,
        batches: &[SourceBatch],
        previous: Option<&OutputFeed>,
        now: DateTime<Utc>,
    ) -> Result<RunOutcome, CurationError> {
        if batches.iter().all(|b| b.records.is_empty()) {
            return Err(CurationError::NoInput {
                sources: batches.len(),
            });
        }

        let cfg = &self.config;
        let mut rep = RunReport::new(now, self.scorer.method());

        // ingest
        let seen: HashSet<String> = previous
            .map(|p| p.ids().map(str::to_string).collect())
            .unwrap_or_default();
        let ingested = ingest_batches(batches, &seen, &self.registry);
        rep.record(report::STAGE_INGEST, ingested.records_in, ingested.items.len());
        rep.drops = ingested.drops;
        rep.empty_sources = ingested.empty_sources;

        // relevance
        let entered = ingested.items.len();
        let relevant = self.relevance.filter(ingested.items);
        rep.record(report::STAGE_RELEVANCE, entered, relevant.len());
        rep.macro_pathway = relevant
            .iter()
            .filter(|f| f.pathway == Pathway::Macro)
            .count();

        // pre-scoring cap + budget
        let entered = relevant.len();
        let (capped, _) = cap_filtered(relevant, cfg.diversity.max_per_source);
        rep.record(report::STAGE_PRE_CAP, entered, capped.len());

        let entered = capped.len();
        let budgeted = self.apply_scoring_budget(capped);
        rep.record(report::STAGE_SCORING_BUDGET, entered, budgeted.len());

        // score + categorize
        let entered = budgeted.len();
        let (scored, fallbacks) = self.score_all(budgeted, now).await;
        rep.record(report::STAGE_SCORING, entered, scored.len());
        rep.semantic_fallbacks = fallbacks;

        // fold duplicates across this run and the previous feed (new wins on id)
        let fresh_ids: HashSet<&str> = scored.iter().map(|s| s.item.id.as_str()).collect();
        let carried: Vec<DedupGroup> = previous
            .map(|prev| {
                prev.items
                    .iter()
                    .filter(|it| !fresh_ids.contains(it.id.as_str()))
                    .cloned()
                    .map(FeedItem::into_group)
                    .collect()
            })
            .unwrap_or_default();
        let mut union: Vec<DedupGroup> = scored.into_iter().map(DedupGroup::single).collect();
        union.extend(carried);
        let entered = union.len();
        let (groups, stats) = self.dedup.deduplicate(union);
        rep.duplicates_folded = stats.folded;
        rep.record(report::STAGE_DEDUP, entered, groups.len());

        // route each story once, by its representative
        let entered = groups.len();
        let routed = route(
            groups,
            &seen,
            &cfg.scoring.thresholds,
            now.date_naive(),
            cfg.output.max_pending,
            cfg.output.max_rejected,
        );
        rep.decisions.approved = routed.approved.len() - routed.carried;
        rep.decisions.pending = routed.pending.len() + routed.pending_overflow;
        rep.decisions.rejected = routed.rejected.len() + routed.rejected_overflow;
        rep.record(report::STAGE_ROUTING, entered, routed.approved.len());

        // output cap + interleave
        let entered = routed.approved.len();
        let (capped, _) = cap_groups(routed.approved, cfg.diversity.max_per_source_output);
        rep.record(report::STAGE_OUTPUT_CAP, entered, capped.len());

        let entered = capped.len();
        let ordered = interleave(capped, cfg.output.max_items);
        rep.record(report::STAGE_INTERLEAVE, entered, ordered.len());

        let items: Vec<FeedItem> = ordered.iter().map(FeedItem::from).collect();
        let feed = OutputFeed {
            generated_at: now,
            total_items: items.len(),
            scoring_method: self.scorer.method(),
            items,
        };
        let review = ReviewQueue {
            pending: routed.pending.iter().map(FeedItem::from).collect(),
            rejected: routed.rejected.iter().map(FeedItem::from).collect(),
        };

        info!(
            target: "pipeline",
            records = rep.stage(report::STAGE_INGEST).map(|s| s.entered).unwrap_or(0),
            approved = rep.decisions.approved,
            pending = rep.decisions.pending,
            rejected = rep.decisions.rejected,
            feed_items = feed.total_items,
            empty_sources = rep.empty_sources.len(),
            "curation run complete"
        );

        Ok(RunOutcome {
            feed,
            review,
            report: rep,
        })
    }
}
