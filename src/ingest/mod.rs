// src/ingest/mod.rs
//! Ingestion: turn per-source record batches into validated, normalized `RawItem`s.
//!
//! Malformed records are dropped with a counted reason; nothing here aborts the run.

pub mod providers;
pub mod types;

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use crate::model::RawItem;
use crate::registry::SourceRegistry;
use crate::report::DropCounts;
use crate::ingest::types::{FeedProvider, RawRecord, SourceBatch};

pub const MAX_DESCRIPTION_CHARS: usize = 500;
pub const MAX_BODY_CHARS: usize = 1000;

/// One-time metrics registration for the fetch boundary.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("curation_records_fetched_total", "Records returned by feed providers.");
        describe_counter!(
            "curation_provider_errors_total",
            "Feed provider fetch/parse errors."
        );
        describe_histogram!("curation_parse_ms", "Feed parse time in milliseconds.");
    });
}

/// Normalize text: decode entities, strip tags, ASCII quotes, collapse whitespace, cap length.
pub fn normalize_text(s: &str, max_chars: usize) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("whitespace regex"));
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 5) Length cap
    if out.chars().count() > max_chars {
        out = out.chars().take(max_chars).collect::<String>().trim_end().to_string();
    }
    out
}

/// Canonical URL: trimmed, fragment removed.
pub fn canonical_url(url: &str) -> String {
    let u = url.trim();
    u.split_once('#').map(|(head, _)| head).unwrap_or(u).to_string()
}

/// Stable id: first 6 bytes of SHA-256 over the canonical URL, hex.
pub fn stable_id(url: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(canonical_url(url).as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// RFC 3339, RFC 2822 or bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc())
}

/// Outcome of ingesting one run's batches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ingested {
    pub items: Vec<RawItem>,
    /// Records received across all batches.
    pub records_in: usize,
    pub drops: DropCounts,
    /// Registry sources and batch sources with zero usable items, sorted.
    pub empty_sources: Vec<String>,
}

enum Verdict {
    Keep(RawItem),
    MissingTitle,
    MissingUrl,
    BadDate,
}

fn validate(source: &str, rec: &RawRecord) -> Verdict {
    let title = normalize_text(rec.title.as_deref().unwrap_or(""), MAX_DESCRIPTION_CHARS);
    if title.is_empty() {
        return Verdict::MissingTitle;
    }
    let url = canonical_url(rec.url.as_deref().unwrap_or(""));
    if url.is_empty() {
        return Verdict::MissingUrl;
    }
    let Some(published_at) = rec.published.as_deref().and_then(parse_published) else {
        return Verdict::BadDate;
    };
    Verdict::Keep(RawItem {
        id: stable_id(&url),
        source: source.to_string(),
        title,
        description: normalize_text(rec.description.as_deref().unwrap_or(""), MAX_DESCRIPTION_CHARS),
        body: normalize_text(rec.body.as_deref().unwrap_or(""), MAX_BODY_CHARS),
        published_at,
        url,
    })
}

/// Validate and normalize every record. Duplicate URLs keep the first occurrence;
/// ids in `seen` (already published) are skipped.
pub fn ingest_batches(
    batches: &[SourceBatch],
    seen: &HashSet<String>,
    registry: &SourceRegistry,
) -> Ingested {
    let mut out = Ingested::default();
    let mut ids: HashSet<String> = HashSet::new();
    let mut healthy: HashSet<&str> = HashSet::new();

    for batch in batches {
        out.records_in += batch.records.len();
        for rec in &batch.records {
            let item = match validate(&batch.source, rec) {
                Verdict::Keep(item) => item,
                Verdict::MissingTitle => {
                    out.drops.missing_title += 1;
                    continue;
                }
                Verdict::MissingUrl => {
                    out.drops.missing_url += 1;
                    continue;
                }
                Verdict::BadDate => {
                    out.drops.bad_date += 1;
                    debug!(target: "ingest", source = %batch.source, "dropped record with unparseable date");
                    continue;
                }
            };
            healthy.insert(batch.source.as_str());
            if seen.contains(&item.id) {
                out.drops.already_seen += 1;
                continue;
            }
            if !ids.insert(item.id.clone()) {
                out.drops.duplicate_id += 1;
                continue;
            }
            out.items.push(item);
        }
    }

    let all_sources: BTreeSet<&str> = registry
        .sources()
        .iter()
        .map(|s| s.name.as_str())
        .chain(batches.iter().map(|b| b.source.as_str()))
        .collect();
    out.empty_sources = all_sources
        .into_iter()
        .filter(|s| !healthy.contains(s))
        .map(str::to_string)
        .collect();

    if out.drops.total() > 0 {
        warn!(
            target: "ingest",
            missing_title = out.drops.missing_title,
            missing_url = out.drops.missing_url,
            bad_date = out.drops.bad_date,
            duplicate_id = out.drops.duplicate_id,
            already_seen = out.drops.already_seen,
            "records dropped at ingestion"
        );
    }
    out
}

/// Fetch every provider once. Failures yield an empty batch, never an error.
pub async fn collect_batches(providers: &[Box<dyn FeedProvider>]) -> Vec<SourceBatch> {
    ensure_metrics_described();

    let mut batches = Vec::with_capacity(providers.len());
    for p in providers {
        match p.fetch_latest().await {
            Ok(records) => {
                counter!("curation_records_fetched_total").increment(records.len() as u64);
                batches.push(SourceBatch {
                    source: p.name().to_string(),
                    records,
                });
            }
            Err(e) => {
                warn!(target: "ingest", error = ?e, provider = p.name(), "provider error");
                counter!("curation_provider_errors_total").increment(1);
                batches.push(SourceBatch::empty(p.name()));
            }
        }
    }
    batches
}
