//! Fragment producers.
//!
//! The OCR/document-structure service that recognizes pages is external.
//! [`FragmentSource`] is the seam through which the pipeline pulls its
//! output, one page at a time; [`InMemorySource`] serves pre-built pages.

use crate::error::{Error, Result};
use crate::fragment::Fragment;

/// Supplier of raw fragments, page by page.
pub trait FragmentSource: Send + Sync {
    /// Number of pages available.
    fn page_count(&self) -> Result<u32>;

    /// Raw fragments of a 1-based page, in producer order.
    fn fragments(&self, page: u32) -> Result<Vec<Fragment>>;

    /// Return the name of this source for debugging.
    fn name(&self) -> &'static str;
}

/// Pages held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    pages: Vec<Vec<Fragment>>,
}

impl InMemorySource {
    /// An empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// A source over the given pages (index 0 is page 1).
    pub fn from_pages(pages: Vec<Vec<Fragment>>) -> Self {
        Self { pages }
    }

    /// Append a page.
    pub fn push_page(&mut self, fragments: Vec<Fragment>) {
        self.pages.push(fragments);
    }
}

impl FragmentSource for InMemorySource {
    fn page_count(&self) -> Result<u32> {
        u32::try_from(self.pages.len())
            .map_err(|_| Error::Source(format!("too many pages: {}", self.pages.len())))
    }

    fn fragments(&self, page: u32) -> Result<Vec<Fragment>> {
        page.checked_sub(1)
            .and_then(|i| self.pages.get(i as usize))
            .cloned()
            .ok_or_else(|| {
                Error::Source(format!(
                    "page {} out of range (1..={})",
                    page,
                    self.pages.len()
                ))
            })
    }

    fn name(&self) -> &'static str {
        "in_memory"
    }
}
