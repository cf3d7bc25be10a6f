//! Output converters for classified fragment sequences.
//!
//! - **Markdown**: ATX headings, lists, fenced tables, footnotes and an
//!   optional table of contents
//!
//! # Examples
//!
//! ```
//! use fragdown::converters::{MarkdownAssembler, OutputConverter};
//! use fragdown::fragment::{Fragment, FragmentKind};
//! use fragdown::geometry::Rect;
//! use fragdown::pipeline::config::PipelineConfig;
//! use fragdown::pipeline::logging::StageLog;
//!
//! # fn main() -> fragdown::Result<()> {
//! let config = PipelineConfig::default().validate()?;
//! let fragments = vec![
//!     Fragment::new(FragmentKind::Header, Rect::new(0.1, 0.1, 0.8, 0.04), 1)
//!         .with_text("Results")
//!         .with_level(2),
//!     Fragment::new(FragmentKind::Paragraph, Rect::new(0.1, 0.2, 0.8, 0.1), 1)
//!         .with_text("All tests passed."),
//! ];
//!
//! let converter = MarkdownAssembler::new();
//! let markdown = converter.convert(&fragments, &config, &StageLog::quiet())?;
//! assert_eq!(markdown, "## Results\n\nAll tests passed.");
//! # Ok(())
//! # }
//! ```

pub mod markdown;
pub mod toc;

// Re-export main types
pub use markdown::{heading_level, MarkdownAssembler};
pub use toc::{slugify, TocBuilder, TocEntry};

use crate::error::Result;
use crate::fragment::Fragment;
use crate::pipeline::config::ValidatedConfig;
use crate::pipeline::logging::StageLog;

/// Trait for rendering a final fragment sequence to text.
///
/// Implementations must be stateless between calls so one converter can be
/// shared across documents and threads.
pub trait OutputConverter: Send + Sync {
    /// Render fragments, already in reading order, to text.
    ///
    /// # Errors
    ///
    /// [`Error::NoElements`](crate::error::Error::NoElements) when
    /// `fragments` is empty.
    fn convert(
        &self,
        fragments: &[Fragment],
        config: &ValidatedConfig,
        log: &StageLog,
    ) -> Result<String>;

    /// Return the name of this converter for debugging.
    fn name(&self) -> &'static str;
}
