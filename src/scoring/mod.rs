// src/scoring/mod.rs
//! Scoring: integer quality score in `SCORE_MIN..=SCORE_MAX` plus an auditable rationale.
//!
//! `Scorer` is the seam between the keyword scorer and the optional semantic
//! scorer; the pipeline picks one at construction time.

pub mod semantic;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::config::{CurationConfig, FocusTopic};
use crate::keywords::{KeywordSet, PatternSet, Phrase};
use crate::lexicon::Lexicon;
use crate::model::{FilteredItem, Pathway, ScoreMethod};
use crate::registry::SourceRegistry;

pub use semantic::{build_scorer, SemanticProvider, SemanticScorer};

pub const SCORE_MIN: i32 = 1;
pub const SCORE_MAX: i32 = 10;
pub const BASE_SCORE: i32 = 5;
pub const MACRO_BASE_SCORE: i32 = 4;

/// What a scorer says about one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreOutcome {
    pub score: i32,
    pub rationale: String,
    pub method: ScoreMethod,
    /// Category suggested by an external scorer, if any.
    pub suggested_category: Option<String>,
    /// True when a semantic attempt failed and the keyword score was used.
    pub fell_back: bool,
}

#[async_trait]
pub trait Scorer: Send + Sync {
    /// Score one filtered item. Never fails; `today` decides focus-topic expiry.
    async fn score(&self, item: &FilteredItem, today: NaiveDate) -> ScoreOutcome;

    fn method(&self) -> ScoreMethod;

    /// Reset per-run state (call budgets). Called once at the start of every run.
    fn begin_run(&self) {}
}

#[derive(Debug, Clone)]
struct Booster {
    id: String,
    title_points: i32,
    body_points: i32,
    keywords: KeywordSet,
}

#[derive(Debug, Clone)]
struct Penalty {
    id: String,
    points: i32,
    patterns: PatternSet,
    unless: PatternSet,
}

#[derive(Debug, Clone)]
struct Focus {
    topic: FocusTopic,
    phrase: Phrase,
}

/// Deterministic keyword scorer.
#[derive(Debug, Clone)]
pub struct KeywordScorer {
    boosters: Vec<Booster>,
    penalties: Vec<Penalty>,
    focus: Vec<Focus>,
    registry: SourceRegistry,
}

impl KeywordScorer {
    pub fn new(
        lexicon: &Lexicon,
        focus_topics: &[FocusTopic],
        registry: SourceRegistry,
    ) -> anyhow::Result<Self> {
        let boosters = lexicon
            .boosters
            .iter()
            .map(|b| {
                Ok(Booster {
                    id: b.id.clone(),
                    title_points: b.title_points,
                    body_points: b.body_points,
                    keywords: KeywordSet::new(&b.keywords)?,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        let penalties = lexicon
            .penalties
            .iter()
            .map(|p| {
                Ok(Penalty {
                    id: p.id.clone(),
                    points: p.points.abs(),
                    patterns: PatternSet::new(&p.patterns)?,
                    unless: PatternSet::new(&p.unless)?,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        let focus = focus_topics
            .iter()
            .map(|f| {
                Ok(Focus {
                    topic: f.clone(),
                    phrase: Phrase::new(&f.phrase)?,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self {
            boosters,
            penalties,
            focus,
            registry,
        })
    }

    pub fn from_config(cfg: &CurationConfig) -> anyhow::Result<Self> {
        Self::new(&cfg.lexicon, &cfg.scoring.focus_topics, cfg.registry())
    }

    /// Core algorithm: base, boosters, penalties, source boost, focus topics, clamp.
    pub fn score_item(&self, item: &FilteredItem, today: NaiveDate) -> (i32, String) {
        let title = item.item.title_lc();
        let rest = item.item.rest_lc();
        let full = item.item.full_text_lc();

        let mut parts: Vec<String> = Vec::new();
        let mut score = match item.pathway {
            Pathway::Core => {
                parts.push(format!("base {BASE_SCORE} (core)"));
                BASE_SCORE
            }
            Pathway::Macro => {
                parts.push(format!("base {MACRO_BASE_SCORE} (macro)"));
                MACRO_BASE_SCORE
            }
        };

        for b in &self.boosters {
            if b.keywords.matches_any(&title) {
                score += b.title_points;
                parts.push(format!("+{} {} (title)", b.title_points, b.id));
            } else if b.keywords.matches_any(&rest) {
                score += b.body_points;
                parts.push(format!("+{} {} (body)", b.body_points, b.id));
            }
        }

        for p in &self.penalties {
            if p.patterns.matches_any(&full) && !p.unless.matches_any(&full) {
                score -= p.points;
                parts.push(format!("-{} {}", p.points, p.id));
            }
        }

        let boost = self.registry.boost_for(&item.item.source);
        score += boost;
        parts.push(format!("source +{boost}"));

        // strongest active focus topic only
        let best = self
            .focus
            .iter()
            .filter(|f| f.topic.is_active(today))
            .filter_map(|f| {
                if f.phrase.is_match(&title) {
                    Some((f.topic.weight + 1, f, true))
                } else if f.phrase.is_match(&rest) {
                    Some((f.topic.weight, f, false))
                } else {
                    None
                }
            })
            .max_by_key(|(points, _, _)| *points);
        if let Some((points, f, in_title)) = best {
            score += points;
            parts.push(format!(
                "focus {:+} '{}'{}",
                points,
                f.phrase.text,
                if in_title { " (title)" } else { "" }
            ));
        }

        let clamped = score.clamp(SCORE_MIN, SCORE_MAX);
        if clamped != score {
            parts.push(format!("clamped {clamped} from {score}"));
        }
        (clamped, parts.join("; "))
    }
}

#[async_trait]
impl Scorer for KeywordScorer {
    async fn score(&self, item: &FilteredItem, today: NaiveDate) -> ScoreOutcome {
        let (score, rationale) = self.score_item(item, today);
        ScoreOutcome {
            score,
            rationale,
            method: ScoreMethod::Keyword,
            suggested_category: None,
            fell_back: false,
        }
    }

    fn method(&self) -> ScoreMethod {
        ScoreMethod::Keyword
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawItem;
    use crate::registry::SourceDescriptor;
    use chrono::{TimeZone, Utc};

    fn registry() -> SourceRegistry {
        SourceRegistry::new(vec![
            SourceDescriptor {
                name: "Trusted Wire".into(),
                endpoint: "https://trusted.test/rss".into(),
                category: "business".into(),
                boost: 2,
            },
            SourceDescriptor {
                name: "Plain Blog".into(),
                endpoint: "https://plain.test/rss".into(),
                category: "news".into(),
                boost: 0,
            },
        ])
    }

    fn scorer(focus: Vec<FocusTopic>) -> KeywordScorer {
        KeywordScorer::new(&Lexicon::default(), &focus, registry()).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 20).unwrap()
    }

    fn fi(source: &str, title: &str, description: &str, pathway: Pathway) -> FilteredItem {
        FilteredItem {
            item: RawItem {
                id: "id".into(),
                source: source.into(),
                title: title.into(),
                description: description.into(),
                body: String::new(),
                published_at: Utc.with_ymd_and_hms(2026, 1, 19, 9, 0, 0).unwrap(),
                url: "https://example.test/a".into(),
            },
            pathway,
        }
    }

    #[test]
    fn business_title_with_trusted_source_scores_high() {
        let (s, why) = scorer(vec![]).score_item(
            &fi(
                "Trusted Wire",
                "Resort Co. announces $40M investment in new lift",
                "",
                Pathway::Core,
            ),
            today(),
        );
        assert!(s >= 8, "score {s}: {why}");
        assert!(why.contains("+3 business-finance (title)"));
        assert!(why.contains("source +2"));
    }

    #[test]
    fn listicle_product_review_scores_low() {
        let (s, why) = scorer(vec![]).score_item(
            &fi("Plain Blog", "10 best ski jackets this season", "", Pathway::Core),
            today(),
        );
        assert!(s <= 2, "score {s}: {why}");
        assert!(why.contains("-4 listicle"));
        assert!(why.contains("clamped 1 from"));
    }

    #[test]
    fn penalty_exception_cancels_listicle() {
        let (_, why) = scorer(vec![]).score_item(
            &fi(
                "Plain Blog",
                "Top 3 takeaways as Vail posts best season on record",
                "",
                Pathway::Core,
            ),
            today(),
        );
        assert!(!why.contains("listicle"), "{why}");
    }

    #[test]
    fn body_only_booster_gets_smaller_increment() {
        let (s, why) = scorer(vec![]).score_item(
            &fi("Plain Blog", "Ski area news", "The hotel occupancy rose", Pathway::Core),
            today(),
        );
        assert!(why.contains("+1 lodging (body)"), "{why}");
        assert_eq!(s, 6);
    }

    #[test]
    fn macro_pathway_starts_lower() {
        let (s, why) = scorer(vec![]).score_item(
            &fi("Plain Blog", "Drought tightens", "Utah reservoirs fall", Pathway::Macro),
            today(),
        );
        assert!(why.starts_with("base 4 (macro)"));
        assert_eq!(s, 4);
    }

    #[test]
    fn focus_topic_title_bonus_and_expiry() {
        let topics = vec![
            FocusTopic {
                phrase: "Winter Olympics".into(),
                weight: 2,
                expires: NaiveDate::from_ymd_opt(2026, 2, 28),
            },
            FocusTopic {
                phrase: "night skiing".into(),
                weight: 3,
                expires: NaiveDate::from_ymd_opt(2025, 12, 31),
            },
        ];
        let s = scorer(topics);
        let item = fi(
            "Plain Blog",
            "Winter Olympics venues finalize night skiing plans",
            "",
            Pathway::Core,
        );
        let (score, why) = s.score_item(&item, today());
        assert!(why.contains("focus +3 'winter olympics' (title)"), "{why}");
        assert_eq!(score, 8);

        let after = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let (score, why) = s.score_item(&item, after);
        assert!(!why.contains("focus"), "{why}");
        assert_eq!(score, 5);
    }

    #[test]
    fn rationale_is_deterministic() {
        let s = scorer(vec![]);
        let item = fi(
            "Trusted Wire",
            "Alterra acquires resort near the airport",
            "Hotel occupancy in Colorado",
            Pathway::Core,
        );
        assert_eq!(s.score_item(&item, today()), s.score_item(&item, today()));
    }

    #[tokio::test]
    async fn trait_object_reports_keyword_method() {
        let s: Box<dyn Scorer> = Box::new(scorer(vec![]));
        let out = s
            .score(&fi("Plain Blog", "Ski lift upgrade", "", Pathway::Core), today())
            .await;
        assert_eq!(out.method, ScoreMethod::Keyword);
        assert!(!out.fell_back);
        assert_eq!(s.method(), ScoreMethod::Keyword);
    }
}
