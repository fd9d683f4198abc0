// src/dedup.rs
//! Near-duplicate folding across sources.
//!
//! 1. Title normalization: strip a trailing publisher suffix (" - Vail Daily"),
//!    lower-case, drop punctuation.
//! 2. Blocking: items only meet when they share a leading significant token of
//!    the title (or of the lead, for lead-eligible items).
//! 3. Title similarity >= `title_similarity` merges; otherwise, when both leads
//!    are long enough, lead similarity >= `lead_similarity` merges.
//!
//! Merges go through a disjoint set, so A~B and B~C always land in one group.
//! Input and output are `DedupGroup`s, which makes the stage idempotent and lets
//! it fold fresh items into an already-published feed.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use strsim::normalized_levenshtein;
use tracing::{debug, info};

use crate::config::DedupCfg;
use crate::model::{AlsoReported, DedupGroup, RawItem};
use crate::registry::{normalize, SourceRegistry};

/// Leading significant tokens used as blocking keys.
const BLOCK_TOKENS: usize = 3;
/// Characters of the lead compared for similarity.
const LEAD_COMPARE_CHARS: usize = 100;
const SUFFIX_SEPARATORS: [&str; 4] = [" - ", " | ", " — ", " – "];

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "of", "in", "on", "for", "to", "and", "at", "with", "by", "from", "as",
    "is", "are", "its", "it", "new", "after", "over", "into",
];

/// Disjoint set over item indices with path compression.
#[derive(Debug, Clone)]
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut current = i;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    /// Smaller index becomes the root so group order follows input order.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }
        let (root, child) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[child] = root;
        true
    }
}

/// Why two items were merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Title,
    Lead,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupStats {
    pub candidate_pairs: usize,
    pub title_merges: usize,
    pub lead_merges: usize,
    /// Items folded into another group's representative.
    pub folded: usize,
}

#[derive(Debug, Clone)]
struct Prepared {
    title: String,
    lead: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Deduplicator {
    title_similarity: f64,
    lead_similarity: f64,
    min_lead_length: usize,
    known_sources: HashSet<String>,
}

impl Deduplicator {
    pub fn new(cfg: &DedupCfg, registry: &SourceRegistry) -> Self {
        Self {
            title_similarity: cfg.title_similarity,
            lead_similarity: cfg.lead_similarity,
            min_lead_length: cfg.min_lead_length,
            known_sources: registry.sources().iter().map(|s| normalize(&s.name)).collect(),
        }
    }

    /// Remove a trailing " - Publisher" style suffix.
    ///
    /// The suffix goes when it names the item's own source or any registered
    /// source, or when it is short (<= 4 words, <= 40 chars, no digits) and
    /// follows a title of at least 3 words.
    pub fn strip_source_suffix<'a>(&self, title: &'a str, source: &str) -> &'a str {
        let cut = SUFFIX_SEPARATORS
            .iter()
            .filter_map(|sep| title.rfind(sep).map(|i| (i, sep.len())))
            .max_by_key(|(i, _)| *i);
        let Some((at, sep_len)) = cut else {
            return title;
        };
        let head = title[..at].trim_end();
        let tail = title[at + sep_len..].trim();
        if head.is_empty() || tail.is_empty() {
            return title;
        }

        let tail_key = normalize(tail);
        let names_source = tail_key == normalize(source) || self.known_sources.contains(&tail_key);
        let generic_short = tail.split_whitespace().count() <= 4
            && tail.chars().count() <= 40
            && !tail.chars().any(|c| c.is_ascii_digit())
            && head.split_whitespace().count() >= 3;
        if names_source || generic_short {
            head
        } else {
            title
        }
    }

    /// Suffix-stripped, lower-cased, punctuation-free title.
    pub fn normalize_title(&self, title: &str, source: &str) -> String {
        simplify(self.strip_source_suffix(title, source))
    }

    /// Description (or body when empty), simplified; `None` if shorter than the minimum.
    fn lead(&self, item: &RawItem) -> Option<String> {
        let raw = if item.description.trim().is_empty() {
            &item.body
        } else {
            &item.description
        };
        let lead = raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        if lead.is_empty() || lead.chars().count() < self.min_lead_length {
            return None;
        }
        Some(lead.chars().take(LEAD_COMPARE_CHARS).collect())
    }

    fn prepare(&self, g: &DedupGroup) -> Prepared {
        let it = &g.representative.item;
        Prepared {
            title: self.normalize_title(&it.title, &it.source),
            lead: self.lead(it),
        }
    }

    /// Compare two prepared items; title first, lead as fallback.
    fn matches(&self, a: &Prepared, b: &Prepared) -> Option<MatchKind> {
        if !a.title.is_empty() && normalized_levenshtein(&a.title, &b.title) >= self.title_similarity {
            return Some(MatchKind::Title);
        }
        match (&a.lead, &b.lead) {
            (Some(la), Some(lb)) if normalized_levenshtein(la, lb) >= self.lead_similarity => {
                Some(MatchKind::Lead)
            }
            _ => None,
        }
    }

    /// Fold near-duplicates. Output order follows the first member's input position.
    pub fn deduplicate(&self, groups: Vec<DedupGroup>) -> (Vec<DedupGroup>, DedupStats) {
        let mut stats = DedupStats::default();
        let n = groups.len();
        if n < 2 {
            return (groups, stats);
        }

        let prepared: Vec<Prepared> = groups.iter().map(|g| self.prepare(g)).collect();

        // blocking key -> member indices
        let mut blocks: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (i, p) in prepared.iter().enumerate() {
            for key in block_keys(p) {
                blocks.entry(key).or_default().push(i);
            }
        }
        let mut pairs: BTreeSet<(usize, usize)> = BTreeSet::new();
        for members in blocks.values() {
            for (x, &a) in members.iter().enumerate() {
                for &b in &members[x + 1..] {
                    if a != b {
                        pairs.insert((a.min(b), a.max(b)));
                    }
                }
            }
        }
        stats.candidate_pairs = pairs.len();

        let mut set = DisjointSet::new(n);
        for &(a, b) in &pairs {
            let Some(kind) = self.matches(&prepared[a], &prepared[b]) else {
                continue;
            };
            if set.union(a, b) {
                match kind {
                    MatchKind::Title => stats.title_merges += 1,
                    MatchKind::Lead => stats.lead_merges += 1,
                }
                debug!(
                    target: "dedup",
                    a = %groups[a].representative.item.id,
                    b = %groups[b].representative.item.id,
                    kind = ?kind,
                    "merged near-duplicates"
                );
            }
        }

        // root -> members (roots are the smallest index of their set)
        let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for i in 0..n {
            let r = set.find(i);
            members.entry(r).or_default().push(i);
        }

        let mut slots: Vec<Option<DedupGroup>> = groups.into_iter().map(Some).collect();
        let mut out = Vec::with_capacity(members.len());
        for idxs in members.into_values() {
            let mut parts: Vec<DedupGroup> = idxs.iter().filter_map(|&i| slots[i].take()).collect();
            if parts.len() > 1 {
                stats.folded += parts.len() - 1;
            }
            out.push(merge_groups(&mut parts));
        }

        info!(
            target: "dedup",
            input = n,
            output = out.len(),
            candidate_pairs = stats.candidate_pairs,
            title_merges = stats.title_merges,
            lead_merges = stats.lead_merges,
            "deduplication complete"
        );
        (out, stats)
    }
}

/// Highest score wins, then most recent, then smallest id.
fn rank(a: &DedupGroup, b: &DedupGroup) -> std::cmp::Ordering {
    b.score()
        .cmp(&a.score())
        .then(b.published_at().cmp(&a.published_at()))
        .then(a.representative.item.id.cmp(&b.representative.item.id))
}

/// Merge member groups into one; every non-representative is kept as "also reported by".
fn merge_groups(parts: &mut Vec<DedupGroup>) -> DedupGroup {
    parts.sort_by(rank);
    let mut iter = parts.drain(..);
    let Some(mut head) = iter.next() else {
        unreachable!("disjoint-set groups are never empty")
    };

    let mut seen: HashSet<String> = head.member_ids().into_iter().map(str::to_string).collect();
    let mut also = std::mem::take(&mut head.also_reported_by);
    for g in iter {
        let rep = g.representative.item;
        let folded = std::iter::once(AlsoReported {
            id: rep.id,
            source: rep.source,
            url: rep.url,
        })
        .chain(g.also_reported_by);
        for a in folded {
            if seen.insert(a.id.clone()) {
                also.push(a);
            }
        }
    }
    head.also_reported_by = also;
    head
}

/// Lower-case, apostrophes dropped, other punctuation to spaces, whitespace collapsed.
pub fn simplify(s: &str) -> String {
    let mapped: String = s
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '\'' | '’'))
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn significant_tokens(s: &str) -> impl Iterator<Item = &str> {
    s.split_whitespace().filter(|t| !STOPWORDS.contains(t))
}

fn block_keys(p: &Prepared) -> Vec<String> {
    let mut keys: Vec<String> = significant_tokens(&p.title)
        .take(BLOCK_TOKENS)
        .map(|t| format!("t:{t}"))
        .collect();
    if keys.is_empty() && !p.title.is_empty() {
        keys.push(format!("t:{}", p.title));
    }
    if let Some(lead) = &p.lead {
        let simple = simplify(lead);
        keys.extend(
            significant_tokens(&simple)
                .take(BLOCK_TOKENS)
                .map(|t| format!("l:{t}")),
        );
    }
    keys.sort();
    keys.dedup();
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DecisionState, Pathway, ScoreMethod, ScoredItem};
    use crate::registry::SourceDescriptor;
    use chrono::{Duration, TimeZone, Utc};

    fn dd() -> Deduplicator {
        let reg = SourceRegistry::new(vec![SourceDescriptor {
            name: "Summit Daily News".into(),
            endpoint: "https://summit.test/feed".into(),
            category: "local".into(),
            boost: 1,
        }]);
        Deduplicator::new(&DedupCfg::default(), &reg)
    }

    fn g(id: &str, source: &str, title: &str, desc: &str, score: i32, hours_ago: i64) -> DedupGroup {
        let now = Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap();
        DedupGroup::single(ScoredItem {
            item: RawItem {
                id: id.into(),
                source: source.into(),
                title: title.into(),
                description: desc.into(),
                body: String::new(),
                published_at: now - Duration::hours(hours_ago),
                url: format!("https://{id}.test/story"),
            },
            pathway: Pathway::Core,
            score,
            rationale: String::new(),
            method: ScoreMethod::Keyword,
            primary_category: "business-investment".into(),
            secondary_categories: vec![],
            decision: DecisionState::Approved,
            approved_on: None,
        })
    }

    #[test]
    fn suffix_stripping_rules() {
        let d = dd();
        assert_eq!(
            d.strip_source_suffix("Mountain Co. posts record Q3 - Source A", "Source A"),
            "Mountain Co. posts record Q3"
        );
        assert_eq!(
            d.strip_source_suffix("Snow returns to Breck | Summit Daily News", "Other"),
            "Snow returns to Breck"
        );
        // two-word head: not a suffix
        assert_eq!(d.strip_source_suffix("Vail Resorts - Q3 Results", "X"), "Vail Resorts - Q3 Results");
        assert_eq!(d.normalize_title("Vail's $40M bet - Aspen Times", "Aspen Times"), "vails 40m bet");
    }

    #[test]
    fn numbered_tails_are_part_of_the_title() {
        let d = dd();
        assert_eq!(
            d.strip_source_suffix("Alterra buys new resort - Day 1", "Ski Blog"),
            "Alterra buys new resort - Day 1"
        );
        assert_ne!(
            d.normalize_title("Alterra buys new resort - Day 1", "Ski Blog"),
            d.normalize_title("Alterra buys new resort - Day 2", "Ski Blog")
        );
        // unregistered, digit-free publisher names still go
        assert_eq!(
            d.strip_source_suffix("Alterra buys new resort - Powder Notes", "Ski Blog"),
            "Alterra buys new resort"
        );
    }

    #[test]
    fn suffix_variants_merge_into_one_group() {
        let (out, stats) = dd().deduplicate(vec![
            g("a", "Source A", "Mountain Co. posts record Q3 - Source A", "", 7, 2),
            g("b", "Source B", "Mountain Co. posts record Q3 - Source B", "", 7, 1),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(stats.title_merges, 1);
        // tie on score: most recent (b) represents
        assert_eq!(out[0].representative.item.id, "b");
        assert_eq!(out[0].also_reported_by.len(), 1);
        assert_eq!(out[0].reported_by(), vec!["Source B", "Source A"]);
    }

    #[test]
    fn lead_fallback_catches_different_headlines() {
        let lead = "Vail Resorts said Thursday it will acquire Crystal Mountain in Washington for an undisclosed sum.";
        let (out, stats) = dd().deduplicate(vec![
            g("a", "A", "Vail buys Crystal Mountain", lead, 8, 3),
            g("b", "B", "Epic Pass adds another resort in Washington state", lead, 6, 1),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(stats.lead_merges, 1);
        assert_eq!(out[0].representative.item.id, "a");
    }

    #[test]
    fn short_leads_are_not_compared() {
        let lead = "Short blurb.";
        let (out, _) = dd().deduplicate(vec![
            g("a", "A", "Vail buys Crystal Mountain", lead, 8, 3),
            g("b", "B", "Epic Pass adds another resort in Washington state", lead, 6, 1),
        ]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn merging_is_transitive() {
        // a~b and b~c by title, a and c alone are below threshold
        let (out, _) = dd().deduplicate(vec![
            g("a", "A", "Alterra Mountain Company announces new chairlift at Steamboat", "", 6, 5),
            g("b", "B", "Alterra Mountain Company announces new chairlifts at Steamboat resort", "", 6, 4),
            g("c", "C", "Alterra Mountain Company announces two chairlifts at Steamboat resort", "", 9, 3),
            g("d", "D", "Completely unrelated avalanche story", "", 6, 1),
        ]);
        assert_eq!(out.len(), 2);
        let big = out.iter().find(|x| x.also_reported_by.len() == 2).unwrap();
        assert_eq!(big.representative.item.id, "c");
        let mut ids = big.member_ids();
        ids.sort();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let d = dd();
        let input = vec![
            g("a", "Source A", "Mountain Co. posts record Q3 - Source A", "", 7, 2),
            g("b", "Source B", "Mountain Co. posts record Q3 - Source B", "", 7, 1),
            g("c", "C", "Snowfall totals climb across Utah resorts", "", 5, 1),
        ];
        let (once, _) = d.deduplicate(input);
        let (twice, stats) = d.deduplicate(once.clone());
        assert_eq!(once, twice);
        assert_eq!(stats.folded, 0);
    }

    #[test]
    fn previously_folded_members_are_carried_over() {
        let mut existing = g("a", "A", "Mountain Co. posts record Q3", "", 9, 24);
        existing.also_reported_by.push(AlsoReported {
            id: "z".into(),
            source: "Z".into(),
            url: "https://z.test/story".into(),
        });
        let (out, _) = dd().deduplicate(vec![existing, g("b", "B", "Mountain Co. posts record Q3 - B", "", 7, 1)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].representative.item.id, "a");
        let ids: Vec<_> = out[0].also_reported_by.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "b"]);
    }
}
