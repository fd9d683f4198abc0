// src/interleave.rs
//! Round-robin interleaving across sources.
//!
//! Sources are visited freshest-first (by their most recent item); each pass
//! takes one item per source until everything is placed or `max_items` is hit.

use std::collections::BTreeMap;

use crate::model::DedupGroup;

pub fn interleave(groups: Vec<DedupGroup>, max_items: usize) -> Vec<DedupGroup> {
    let mut by_source: BTreeMap<String, Vec<DedupGroup>> = BTreeMap::new();
    for g in groups {
        by_source.entry(g.source().to_string()).or_default().push(g);
    }

    let mut queues: Vec<(String, Vec<DedupGroup>)> = by_source
        .into_iter()
        .map(|(source, mut items)| {
            // newest first, then score, then id; reversed so `pop` yields the head
            items.sort_by(|a, b| {
                b.published_at()
                    .cmp(&a.published_at())
                    .then(b.score().cmp(&a.score()))
                    .then(a.representative.item.id.cmp(&b.representative.item.id))
            });
            items.reverse();
            (source, items)
        })
        .collect();

    // freshest source first (its newest item is the queue tail); stable sort keeps name order on ties
    queues.sort_by(|(_, a), (_, b)| {
        let newest = |q: &[DedupGroup]| q.last().map(|g| g.published_at());
        newest(b).cmp(&newest(a))
    });

    let total: usize = queues.iter().map(|(_, q)| q.len()).sum();
    let cap = total.min(max_items);
    let mut out = Vec::with_capacity(cap);
    while out.len() < cap {
        let mut placed = false;
        for (_, q) in queues.iter_mut() {
            if out.len() >= cap {
                break;
            }
            if let Some(g) = q.pop() {
                out.push(g);
                placed = true;
            }
        }
        if !placed {
            break;
        }
    }
    out
}

/// Longest run of consecutive items from one source.
pub fn longest_source_run(groups: &[DedupGroup]) -> usize {
    let mut best = 0;
    let mut run = 0;
    let mut prev: Option<&str> = None;
    for g in groups {
        if prev == Some(g.source()) {
            run += 1;
        } else {
            run = 1;
            prev = Some(g.source());
        }
        best = best.max(run);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DecisionState, Pathway, RawItem, ScoreMethod, ScoredItem};
    use chrono::{Duration, TimeZone, Utc};

    fn g(id: &str, source: &str, hours_ago: i64) -> DedupGroup {
        let now = Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap();
        DedupGroup::single(ScoredItem {
            item: RawItem {
                id: id.into(),
                source: source.into(),
                title: id.into(),
                description: String::new(),
                body: String::new(),
                published_at: now - Duration::hours(hours_ago),
                url: format!("https://example.test/{id}"),
            },
            pathway: Pathway::Core,
            score: 7,
            rationale: String::new(),
            method: ScoreMethod::Keyword,
            primary_category: "resort-operations".into(),
            secondary_categories: vec![],
            decision: DecisionState::Approved,
            approved_on: None,
        })
    }

    fn ids(v: &[DedupGroup]) -> Vec<&str> {
        v.iter().map(|g| g.representative.item.id.as_str()).collect()
    }

    #[test]
    fn round_robin_freshest_source_first() {
        let out = interleave(
            vec![
                g("x1", "X", 1),
                g("x2", "X", 2),
                g("x3", "X", 3),
                g("y1", "Y", 5),
                g("z1", "Z", 0),
                g("z2", "Z", 9),
            ],
            10,
        );
        assert_eq!(ids(&out), vec!["z1", "x1", "y1", "z2", "x2", "x3"]);
        assert_eq!(longest_source_run(&out), 2);
    }

    #[test]
    fn respects_max_items() {
        let out = interleave(vec![g("x1", "X", 1), g("y1", "Y", 2), g("x2", "X", 3)], 2);
        assert_eq!(ids(&out), vec!["x1", "y1"]);
    }

    #[test]
    fn equally_fresh_sources_order_by_name() {
        let out = interleave(vec![g("b1", "B", 1), g("a1", "A", 1)], 10);
        assert_eq!(ids(&out), vec!["a1", "b1"]);
    }

    #[test]
    fn empty_input() {
        assert!(interleave(Vec::new(), 5).is_empty());
    }
}
