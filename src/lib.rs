// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::type_complexity)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::neg_cmp_op_on_partial_ord)]
#![allow(clippy::manual_range_contains)]

//! # fragdown
//!
//! Layout analysis and Markdown assembly for classified document fragments.
//!
//! An external OCR/document-structure service recognizes pages and delivers
//! typed fragments (titles, paragraphs, tables, list items, ...) with
//! bounding boxes and confidences. This crate turns that stream into clean
//! Markdown.
//!
//! ## Stages
//!
//! - **Reading order**: page, then top to bottom, then left to right
//! - **Deduplication**: overlapping repeat detections collapse to the most
//!   confident one
//! - **Merging**: split pieces of the same paragraph or list item are joined
//!   using directional, unit-aware distance thresholds
//! - **Header/footer detection**: positional bands, boilerplate lists and
//!   cross-page text frequency
//! - **Pattern classification**: configurable heading and list patterns with
//!   level computation
//! - **Markdown assembly**: per-kind rendering with an optional table of
//!   contents
//!
//! ## Quick Start
//!
//! ```
//! use fragdown::fragment::{Fragment, FragmentKind};
//! use fragdown::geometry::Rect;
//! use fragdown::pipeline::{FragmentPipeline, PipelineConfig};
//!
//! # fn main() -> fragdown::Result<()> {
//! let mut config = PipelineConfig::default();
//! config.headers.enabled = true;
//! config.headers.numbered = vec![r"^(\d+(?:\.\d+)*)\s+\S".to_string()];
//! let pipeline = FragmentPipeline::new(config.validate()?);
//!
//! let page = vec![
//!     Fragment::new(FragmentKind::TextBlock, Rect::new(0.1, 0.20, 0.8, 0.04), 1)
//!         .with_text("1.1 Background"),
//!     Fragment::new(FragmentKind::Paragraph, Rect::new(0.1, 0.30, 0.8, 0.10), 1)
//!         .with_text("Fragments arrive from the recognizer."),
//! ];
//!
//! let output = pipeline.process_document(vec![page])?;
//! assert_eq!(
//!     output.markdown,
//!     "## 1.1 Background\n\nFragments arrive from the recognizer."
//! );
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Core model
pub mod fragment;
pub mod geometry;

// Layout analysis
pub mod layout;

// Format converters
pub mod converters;

// Pipeline architecture
pub mod pipeline;

// Fragment producers
pub mod source;

// Re-export main types
pub use error::{Error, Result};
pub use fragment::{Fragment, FragmentKind};
pub use pipeline::{FragmentPipeline, PipelineConfig, PipelineOutput};
