// src/relevance.rs
//! Relevance gate: decides whether an item is in-domain at all.
//!
//! Two pathways over the case-folded title + description + body:
//! - **core**: any core-topic phrase (subject, synonyms, well-known entities);
//! - **macro**: a macro term *and* a geography term together (lower priority).
//!
//! Anything else is dropped with reason `"no core relevance detected"` before
//! scoring; it never reaches the decision router.

use tracing::info;

use crate::keywords::KeywordSet;
use crate::lexicon::Lexicon;
use crate::model::{FilteredItem, Pathway, RawItem};

pub const REASON_NO_CORE: &str = "no core relevance detected";

// Dev logging gate: CURATION_DEV_LOG=1 AND a debug build (or CURATION_ENV in {local,dev,development})
pub(crate) fn dev_logging_enabled() -> bool {
    let on = std::env::var("CURATION_DEV_LOG").ok().as_deref() == Some("1");
    if !on {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("CURATION_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

pub(crate) fn truncate_vec<T: ToString>(v: &[T], max: usize) -> Vec<String> {
    v.iter().take(max).map(|x| x.to_string()).collect()
}

/// Per-item relevance log. Never logs raw text; the id is a URL digest.
fn dev_log_relevance(item: &RawItem, rel: &Relevance) {
    if !dev_logging_enabled() {
        return;
    }
    let matched_short = truncate_vec(&rel.matched, 5);
    info!(
        target: "relevance",
        id = %item.id,
        source = %item.source,
        pathway = ?rel.pathway,
        matched = ?matched_short,
        reason = rel.reason.unwrap_or("")
    );
}

/// Result of relevance evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Relevance {
    /// `None` means filtered out.
    pub pathway: Option<Pathway>,
    /// Phrases that admitted the item (core terms, or macro + geography terms).
    pub matched: Vec<String>,
    pub reason: Option<&'static str>,
}

impl Relevance {
    pub fn is_relevant(&self) -> bool {
        self.pathway.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    core: KeywordSet,
    macro_terms: KeywordSet,
    geography: KeywordSet,
}

impl RelevanceFilter {
    pub fn from_lexicon(lexicon: &Lexicon) -> anyhow::Result<Self> {
        Ok(Self {
            core: KeywordSet::new(&lexicon.core_terms)?,
            macro_terms: KeywordSet::new(&lexicon.macro_terms)?,
            geography: KeywordSet::new(&lexicon.geography_terms)?,
        })
    }

    /// Evaluate one item. Core pathway wins when both would admit it.
    pub fn evaluate(&self, item: &RawItem) -> Relevance {
        let text = item.full_text_lc();

        let core = self.core.matched(&text);
        if !core.is_empty() {
            return Relevance {
                pathway: Some(Pathway::Core),
                matched: core.into_iter().map(str::to_string).collect(),
                reason: None,
            };
        }

        let macros = self.macro_terms.matched(&text);
        if !macros.is_empty() {
            let geo = self.geography.matched(&text);
            if !geo.is_empty() {
                return Relevance {
                    pathway: Some(Pathway::Macro),
                    matched: macros.into_iter().chain(geo).map(str::to_string).collect(),
                    reason: None,
                };
            }
        }

        Relevance {
            pathway: None,
            matched: Vec::new(),
            reason: Some(REASON_NO_CORE),
        }
    }

    pub fn is_relevant(&self, item: &RawItem) -> bool {
        self.evaluate(item).is_relevant()
    }

    /// Keep relevant items, tagged with their pathway. Input order is preserved.
    pub fn filter(&self, items: Vec<RawItem>) -> Vec<FilteredItem> {
        items
            .into_iter()
            .filter_map(|item| {
                let rel = self.evaluate(&item);
                dev_log_relevance(&item, &rel);
                rel.pathway.map(|pathway| FilteredItem { item, pathway })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn filt() -> RelevanceFilter {
        RelevanceFilter::from_lexicon(&Lexicon::default()).unwrap()
    }

    fn item(title: &str, description: &str) -> RawItem {
        RawItem {
            id: "x".into(),
            source: "Test".into(),
            title: title.into(),
            description: description.into(),
            body: String::new(),
            published_at: Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap(),
            url: "https://example.test/x".into(),
        }
    }

    #[test]
    fn core_term_in_any_field_admits() {
        let f = filt();
        assert_eq!(
            f.evaluate(&item("Vail Resorts reports earnings", "")).pathway,
            Some(Pathway::Core)
        );
        assert_eq!(
            f.evaluate(&item("Quarterly results", "Skiers flocked to Breckenridge")).pathway,
            Some(Pathway::Core)
        );
    }

    #[test]
    fn macro_requires_geography() {
        let f = filt();
        let with_geo = f.evaluate(&item("Drought deepens", "Water managers in Colorado warn"));
        assert_eq!(with_geo.pathway, Some(Pathway::Macro));
        assert!(with_geo.matched.contains(&"drought".to_string()));
        assert!(with_geo.matched.contains(&"colorado".to_string()));

        let without = f.evaluate(&item("Drought deepens", "Farmers in Kansas worry"));
        assert!(!without.is_relevant());
        assert_eq!(without.reason, Some(REASON_NO_CORE));
    }

    #[test]
    fn geography_alone_is_not_enough() {
        assert!(!filt().is_relevant(&item("Colorado legislature adjourns", "Budget passes")));
    }

    #[test]
    fn core_takes_precedence_over_macro() {
        let r = filt().evaluate(&item("Snowpack in Utah lifts ski resort hopes", ""));
        assert_eq!(r.pathway, Some(Pathway::Core));
    }

    #[test]
    fn substring_of_core_term_does_not_count() {
        // "skip" / "skim" must not trip "ski"
        assert!(!filt().is_relevant(&item("Investors skip the skim milk rally", "")));
    }

    #[test]
    fn filter_keeps_order_and_tags() {
        let f = filt();
        let out = f.filter(vec![
            item("Off topic", "Nothing"),
            item("Whistler opens early", ""),
            item("Climate change hits the Alps", ""),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].pathway, Pathway::Core);
        assert_eq!(out[1].pathway, Pathway::Macro);
    }
}
