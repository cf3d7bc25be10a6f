//! Fragment-to-Markdown pipeline.
//!
//! ```text
//! raw fragments (per page, from a FragmentSource)
//!     ↓
//! sort_by_position → Deduplicator → Merger          (per page, independent)
//!     ↓
//! FrequencyTable::build                              (barrier, all pages)
//!     ↓
//! HeaderFooterClassifier → PatternClassifier         (per page, independent)
//!     ↓
//! concatenate in reading order
//!     ↓
//! [OutputConverter] (Markdown)
//!     ↓
//! output string + PipelineStats
//! ```
//!
//! Every stage takes an immutable sequence and returns a new one. The only
//! shared mutable state of a run is the [`StatsAggregator`], which is safe to
//! update from several threads. The two per-page phases are exposed
//! separately so a host can run pages concurrently around the barrier.

pub mod config;
pub mod logging;
pub mod metrics;

// Re-export main types
pub use config::{DistanceThreshold, LogLevel, PipelineConfig, ValidatedConfig};
pub use logging::StageLog;
pub use metrics::{PipelineStats, StatsAggregator};

use crate::converters::{MarkdownAssembler, OutputConverter};
use crate::error::Result;
use crate::fragment::{sort_by_position, Fragment};
use crate::layout::{
    Deduplicator, FrequencyTable, HeaderFooterClassifier, Merger, PatternClassifier,
};
use crate::source::FragmentSource;
use std::time::Instant;

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Rendered document
    pub markdown: String,
    /// Final fragment sequence, in reading order
    pub fragments: Vec<Fragment>,
    /// Counts and timings
    pub stats: PipelineStats,
}

/// The fragment pipeline - orchestrates the full flow.
pub struct FragmentPipeline {
    config: ValidatedConfig,
    converter: Box<dyn OutputConverter>,
    log: StageLog,
}

impl FragmentPipeline {
    /// Create a pipeline rendering Markdown.
    pub fn new(config: ValidatedConfig) -> Self {
        let log = StageLog::new(config.config().log_level);
        Self {
            config,
            converter: Box::new(MarkdownAssembler::new()),
            log,
        }
    }

    /// Replace the output converter.
    pub fn with_converter(mut self, converter: Box<dyn OutputConverter>) -> Self {
        self.converter = converter;
        self
    }

    /// Get the current configuration.
    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    /// The logging handle handed to every stage.
    pub fn log(&self) -> &StageLog {
        &self.log
    }

    fn timed<T>(&self, stats: &StatsAggregator, stage: &str, f: impl FnOnce() -> T) -> T {
        if !self.config.config().collect_metrics {
            return f();
        }
        let start = Instant::now();
        let out = f();
        stats.record_timing(stage, start.elapsed());
        out
    }

    /// First per-page phase: reading order, deduplication, merging.
    pub fn prepare_page(
        &self,
        mut fragments: Vec<Fragment>,
        stats: &StatsAggregator,
    ) -> Result<Vec<Fragment>> {
        let processing = &self.config.config().processing;
        stats.record_page(fragments.len());

        self.timed(stats, "sort", || sort_by_position(&mut fragments));

        if processing.deduplicate {
            let outcome = self.timed(stats, "dedup", || {
                Deduplicator::new(processing.overlap_threshold).deduplicate(fragments, &self.log)
            });
            stats.update(|s| s.deduplicated += outcome.removed);
            fragments = outcome.fragments;
        }

        if processing.merge {
            let outcome = self.timed(stats, "merge", || {
                Merger::new(processing).merge(fragments, &self.log)
            })?;
            stats.update(|s| s.merged += outcome.merged);
            fragments = outcome.fragments;
        }

        Ok(fragments)
    }

    /// Reduce phase: cross-page text frequencies over prepared pages.
    pub fn build_frequency_table(&self, pages: &[Vec<Fragment>]) -> FrequencyTable {
        FrequencyTable::build(
            pages.iter().map(Vec::as_slice),
            self.config.config().header_footer.frequency.ignore_digits,
        )
    }

    /// Second per-page phase: header/footer and pattern classification.
    pub fn classify_page(
        &self,
        fragments: Vec<Fragment>,
        frequency: Option<&FrequencyTable>,
        stats: &StatsAggregator,
    ) -> Vec<Fragment> {
        let cfg = self.config.config();

        let mut hf = HeaderFooterClassifier::new(&cfg.header_footer, cfg.processing.page_height);
        if let Some(table) = frequency {
            hf = hf.with_frequency(table);
        }
        let tagged = self.timed(stats, "header_footer", || hf.classify(fragments, &self.log));
        stats.update(|s| {
            s.headers += tagged.headers;
            s.footers += tagged.footers;
            s.dropped += tagged.dropped;
        });

        let classified = self.timed(stats, "classify", || {
            PatternClassifier::new(&self.config).classify(tagged.fragments, &self.log)
        });
        stats.update(|s| {
            for (category, count) in &classified.headings {
                *s.headings.entry(category.clone()).or_default() += count;
            }
            for (category, count) in &classified.list_items {
                *s.list_items.entry(category.clone()).or_default() += count;
            }
        });

        classified.fragments
    }

    /// Render a final sequence with the configured converter.
    pub fn render(&self, fragments: &[Fragment]) -> Result<String> {
        self.converter.convert(fragments, &self.config, &self.log)
    }

    /// Run a single page on its own.
    ///
    /// Frequency-based header/footer detection needs more than one page and
    /// is skipped.
    pub fn process_page(&self, fragments: Vec<Fragment>) -> Result<PipelineOutput> {
        let stats = StatsAggregator::new();
        let prepared = self.prepare_page(fragments, &stats)?;
        let classified = self.classify_page(prepared, None, &stats);
        self.finish(classified, &stats)
    }

    /// Run a whole document, one fragment list per page.
    pub fn process_document(&self, pages: Vec<Vec<Fragment>>) -> Result<PipelineOutput> {
        let stats = StatsAggregator::new();
        self.log.info(format_args!(
            "processing {} pages with {}",
            pages.len(),
            self.converter.name()
        ));

        let prepared = pages
            .into_iter()
            .map(|page| self.prepare_page(page, &stats))
            .collect::<Result<Vec<_>>>()?;

        let table = self.timed(&stats, "frequency", || self.build_frequency_table(&prepared));
        self.log.debug(format_args!(
            "frequency table: {} texts over {} pages",
            table.len(),
            table.pages()
        ));

        let fragments: Vec<Fragment> = prepared
            .into_iter()
            .flat_map(|page| self.classify_page(page, Some(&table), &stats))
            .collect();

        self.finish(fragments, &stats)
    }

    /// Pull every page from `source` and run the document.
    pub fn process_source(&self, source: &dyn FragmentSource) -> Result<PipelineOutput> {
        let count = source.page_count()?;
        self.log.debug(format_args!(
            "reading {} pages from {}",
            count,
            source.name()
        ));
        let pages = (1..=count)
            .map(|page| source.fragments(page))
            .collect::<Result<Vec<_>>>()?;
        self.process_document(pages)
    }

    fn finish(&self, fragments: Vec<Fragment>, stats: &StatsAggregator) -> Result<PipelineOutput> {
        let markdown = self.timed(stats, "render", || self.render(&fragments))?;
        stats.update(|s| s.output_fragments += fragments.len());
        let stats = stats.snapshot();
        self.log.info(format_args!(
            "{} fragments in, {} out ({} deduplicated, {} merged)",
            stats.total_fragments, stats.output_fragments, stats.deduplicated, stats.merged
        ));
        Ok(PipelineOutput {
            markdown,
            fragments,
            stats,
        })
    }
}
