// src/routing.rs
//! Decision router: approve (score >= A), reject (score <= R), otherwise pending review.
//!
//! Runs on deduplicated groups, so a story is decided once by its representative.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::config::{ThresholdSets, Thresholds};
use crate::model::{DecisionState, DedupGroup};

pub fn decide(score: i32, t: Thresholds) -> DecisionState {
    if score >= t.approve {
        DecisionState::Approved
    } else if score <= t.reject {
        DecisionState::Rejected
    } else {
        DecisionState::PendingReview
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Routed {
    pub approved: Vec<DedupGroup>,
    pub pending: Vec<DedupGroup>,
    pub rejected: Vec<DedupGroup>,
    /// Approved groups that already were in the previous feed.
    pub carried: usize,
    /// Groups cut from the side channels by their caps.
    pub pending_overflow: usize,
    pub rejected_overflow: usize,
}

/// Newest first, then id; keeps the first `max`.
fn keep_most_recent(groups: &mut Vec<DedupGroup>, max: usize) -> usize {
    groups.sort_by(|a, b| {
        b.published_at()
            .cmp(&a.published_at())
            .then(a.representative.item.id.cmp(&b.representative.item.id))
    });
    let over = groups.len().saturating_sub(max);
    groups.truncate(max);
    over
}

/// Stamp decisions and partition.
///
/// A group holding any id from `published` stays approved. Everything else is
/// decided by its representative's score against the band for the method that
/// produced it. Approved groups get `approved_on = today` unless already dated.
pub fn route(
    groups: Vec<DedupGroup>,
    published: &HashSet<String>,
    thresholds: &ThresholdSets,
    today: NaiveDate,
    max_pending: usize,
    max_rejected: usize,
) -> Routed {
    let mut out = Routed::default();
    for mut g in groups {
        let carried = g.member_ids().iter().any(|id| published.contains(*id));
        let rep = &mut g.representative;
        rep.decision = if carried {
            out.carried += 1;
            DecisionState::Approved
        } else {
            decide(rep.score, thresholds.for_method(rep.method))
        };
        match rep.decision {
            DecisionState::Approved => {
                rep.approved_on.get_or_insert(today);
                out.approved.push(g);
            }
            DecisionState::PendingReview => {
                rep.approved_on = None;
                out.pending.push(g);
            }
            DecisionState::Rejected => {
                rep.approved_on = None;
                out.rejected.push(g);
            }
        }
    }
    out.pending_overflow = keep_most_recent(&mut out.pending, max_pending);
    out.rejected_overflow = keep_most_recent(&mut out.rejected, max_rejected);
    out
}
