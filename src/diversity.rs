// src/diversity.rs
//! Source-diversity capper. Applied twice: a generous cap before scoring and a
//! strict cap on the approved set before interleaving.
//!
//! Kept items retain their input order; only the per-source selection is ranked.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::model::{DedupGroup, FilteredItem};

/// Keep at most `max_per_source` items per source, choosing by `rank`
/// (`Ordering::Less` = keep first). Returns kept items and the number dropped.
pub fn cap_by<T, S, R>(items: Vec<T>, max_per_source: usize, source_of: S, rank: R) -> (Vec<T>, usize)
where
    S: Fn(&T) -> &str,
    R: Fn(&T, &T) -> Ordering,
{
    let mut by_source: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, it) in items.iter().enumerate() {
        by_source.entry(source_of(it)).or_default().push(i);
    }

    let mut keep = vec![false; items.len()];
    for idxs in by_source.values_mut() {
        idxs.sort_by(|&a, &b| rank(&items[a], &items[b]).then(a.cmp(&b)));
        for &i in idxs.iter().take(max_per_source) {
            keep[i] = true;
        }
    }

    let before = items.len();
    let kept: Vec<T> = items
        .into_iter()
        .zip(keep)
        .filter_map(|(it, k)| k.then_some(it))
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

/// Pre-scoring cap: core pathway first, then newest, then id.
pub fn cap_filtered(items: Vec<FilteredItem>, max_per_source: usize) -> (Vec<FilteredItem>, usize) {
    cap_by(
        items,
        max_per_source,
        |f| f.item.source.as_str(),
        |a, b| {
            a.pathway
                .cmp(&b.pathway)
                .then(b.item.published_at.cmp(&a.item.published_at))
                .then(a.item.id.cmp(&b.item.id))
        },
    )
}

/// Output cap on ranked groups: higher score first, then newest, then id.
pub fn cap_groups(groups: Vec<DedupGroup>, max_per_source: usize) -> (Vec<DedupGroup>, usize) {
    cap_by(
        groups,
        max_per_source,
        |g| g.source(),
        |a, b| {
            b.score()
                .cmp(&a.score())
                .then(b.published_at().cmp(&a.published_at()))
                .then(a.representative.item.id.cmp(&b.representative.item.id))
        },
    )
}

/// Count of items per source (diagnostics / tests).
pub fn per_source_counts<'a, T, S>(items: &'a [T], source_of: S) -> HashMap<&'a str, usize>
where
    S: Fn(&'a T) -> &'a str,
{
    let mut m = HashMap::new();
    for it in items {
        *m.entry(source_of(it)).or_insert(0) += 1;
    }
    m
}
