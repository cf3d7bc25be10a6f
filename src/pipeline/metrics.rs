//! Run statistics.
//!
//! [`PipelineStats`] is the plain record returned to the host.
//! [`StatsAggregator`] is the single shared mutable resource of a run: pages
//! may be processed on several threads, so every update is serialized behind
//! a mutex (counters that are bumped per fragment use atomics instead).

use indexmap::IndexMap;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Counts and timings collected over one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineStats {
    /// Pages processed
    pub pages: usize,
    /// Fragments received from the producer
    pub total_fragments: usize,
    /// Fragments removed as duplicates
    pub deduplicated: usize,
    /// Merge operations performed (each removes one fragment)
    pub merged: usize,
    /// Fragments classified as running headers
    pub headers: usize,
    /// Fragments classified as running footers
    pub footers: usize,
    /// Header/footer fragments removed in drop mode
    pub dropped: usize,
    /// Headings per pattern category
    pub headings: IndexMap<String, usize>,
    /// List items per pattern category
    pub list_items: IndexMap<String, usize>,
    /// Fragments in the final sequence
    pub output_fragments: usize,
    /// Accumulated wall time per stage
    pub stage_timings: IndexMap<String, Duration>,
}

impl PipelineStats {
    /// Fold another record into this one.
    pub fn absorb(&mut self, other: &PipelineStats) {
        self.pages += other.pages;
        self.total_fragments += other.total_fragments;
        self.deduplicated += other.deduplicated;
        self.merged += other.merged;
        self.headers += other.headers;
        self.footers += other.footers;
        self.dropped += other.dropped;
        self.output_fragments += other.output_fragments;
        for (category, count) in &other.headings {
            *self.headings.entry(category.clone()).or_default() += count;
        }
        for (category, count) in &other.list_items {
            *self.list_items.entry(category.clone()).or_default() += count;
        }
        for (stage, elapsed) in &other.stage_timings {
            *self.stage_timings.entry(stage.clone()).or_default() += *elapsed;
        }
    }

    /// Total headings across categories.
    pub fn total_headings(&self) -> usize {
        self.headings.values().sum()
    }

    /// Total list items across categories.
    pub fn total_list_items(&self) -> usize {
        self.list_items.values().sum()
    }
}

/// Thread-safe accumulator for [`PipelineStats`].
#[derive(Debug, Default)]
pub struct StatsAggregator {
    pages: AtomicUsize,
    total_fragments: AtomicUsize,
    inner: Mutex<PipelineStats>,
}

impl StatsAggregator {
    /// Create an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one page and its incoming fragments.
    pub fn record_page(&self, fragments: usize) {
        self.pages.fetch_add(1, Ordering::Relaxed);
        self.total_fragments.fetch_add(fragments, Ordering::Relaxed);
    }

    /// Apply an update under the lock.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut PipelineStats),
    {
        let mut guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard);
    }

    /// Add wall time for a stage.
    pub fn record_timing(&self, stage: &str, elapsed: Duration) {
        self.update(|stats| {
            *stats.stage_timings.entry(stage.to_string()).or_default() += elapsed;
        });
    }

    /// Copy out the current totals.
    pub fn snapshot(&self) -> PipelineStats {
        let mut stats = match self.inner.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        stats.pages = self.pages.load(Ordering::Relaxed);
        stats.total_fragments = self.total_fragments.load(Ordering::Relaxed);
        stats
    }
}
