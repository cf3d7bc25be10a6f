//! Removal of near-duplicate detections.
//!
//! Recognition services often report the same region twice (once per
//! detector pass). Two fragments on the same page are duplicates when either
//! box covers more than `overlap_threshold` of the other. The fragment with
//! the higher confidence survives; on an exact tie the one earlier in reading
//! order survives.

use crate::fragment::{compare_position, Fragment};
use crate::pipeline::logging::StageLog;

/// Surviving fragments plus the number removed.
#[derive(Debug, Clone)]
pub struct DedupOutcome {
    /// Survivors, in their original relative order
    pub fragments: Vec<Fragment>,
    /// Number of fragments removed
    pub removed: usize,
}

/// Overlap-based deduplicator.
#[derive(Debug, Clone, Copy)]
pub struct Deduplicator {
    overlap_threshold: f32,
}

impl Deduplicator {
    /// Create a deduplicator with an overlap threshold in `[0, 1]`.
    pub fn new(overlap_threshold: f32) -> Self {
        Self { overlap_threshold }
    }

    /// Whether `a` and `b` are duplicates of each other.
    ///
    /// Fragments on different pages or in different coordinate spaces are
    /// never duplicates.
    pub fn is_duplicate(&self, a: &Fragment, b: &Fragment) -> bool {
        a.page() == b.page()
            && a.space() == b.space()
            && (a.bbox().overlaps(b.bbox(), self.overlap_threshold)
                || b.bbox().overlaps(a.bbox(), self.overlap_threshold))
    }

    /// Drop duplicates from `fragments` (any order).
    ///
    /// Candidates are visited from highest confidence down (ties broken by
    /// reading order); a candidate is kept unless it duplicates a fragment
    /// already kept.
    pub fn deduplicate(&self, fragments: Vec<Fragment>, log: &StageLog) -> DedupOutcome {
        let log = log.for_stage("dedup");
        if fragments.len() < 2 {
            return DedupOutcome {
                fragments,
                removed: 0,
            };
        }

        let mut order: Vec<usize> = (0..fragments.len()).collect();
        order.sort_by(|&i, &j| {
            let (a, b) = (&fragments[i], &fragments[j]);
            b.confidence()
                .total_cmp(&a.confidence())
                .then_with(|| compare_position(a, b))
                .then_with(|| i.cmp(&j))
        });

        let mut keep = vec![false; fragments.len()];
        let mut kept: Vec<usize> = Vec::with_capacity(fragments.len());
        for &candidate in &order {
            let winner = kept
                .iter()
                .copied()
                .find(|&k| self.is_duplicate(&fragments[k], &fragments[candidate]));
            match winner {
                Some(k) => log.trace(format_args!(
                    "dropping {} ({:.2}) in favour of {} ({:.2})",
                    fragments[candidate].id(),
                    fragments[candidate].confidence(),
                    fragments[k].id(),
                    fragments[k].confidence()
                )),
                None => {
                    keep[candidate] = true;
                    kept.push(candidate);
                }
            }
        }

        let total = fragments.len();
        let survivors: Vec<Fragment> = fragments
            .into_iter()
            .zip(keep)
            .filter_map(|(f, k)| k.then_some(f))
            .collect();
        let removed = total - survivors.len();
        if removed > 0 {
            log.debug(format_args!("removed {} of {} fragments", removed, total));
        }

        DedupOutcome {
            fragments: survivors,
            removed,
        }
    }
}
