//! Layout analysis over fragment sequences.
//!
//! Each stage consumes an ordered fragment sequence and returns a new one:
//! - [`Deduplicator`]: overlap-based removal of repeated detections
//! - [`Merger`]: distance-threshold merging of split fragments
//! - [`HeaderFooterClassifier`]: region, percentage, boilerplate and
//!   cross-page frequency detection of running headers/footers
//! - [`PatternClassifier`]: pattern-driven heading and list item detection
//!   with level computation

pub mod classifier;
pub mod deduplicator;
pub mod header_footer;
pub mod heading_detector;
pub mod list_detector;
pub mod merger;
pub mod patterns;

// Re-export main types
pub use classifier::{ClassificationOutcome, PatternClassifier};
pub use deduplicator::{DedupOutcome, Deduplicator};
pub use header_footer::{FrequencyTable, HeaderFooterClassifier, HeaderFooterOutcome};
pub use heading_detector::{HeaderDetection, HeadingDetector};
pub use list_detector::{ListDetector, ListItemDetection};
pub use merger::{merge_pair, MergeOutcome, Merger};
pub use patterns::{HeaderCategory, HeaderPatterns, ListCategory, ListPatterns};
