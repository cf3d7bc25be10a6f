//! The document fragment model.
//!
//! A [`Fragment`] is one classified region of a page as delivered by the
//! document-structure producer. Fragments are never mutated in place: each
//! pipeline stage either drops a fragment or replaces it with an updated copy
//! built through [`Fragment::updated`], which keeps identity (`id`,
//! `created_at`) unless explicitly overridden.

use crate::geometry::Rect;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Ordered string metadata attached to a fragment.
pub type Metadata = IndexMap<String, String>;

/// Structural role of a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FragmentKind {
    /// Document title
    Title,
    /// Generic block of text
    TextBlock,
    /// Body paragraph
    Paragraph,
    /// Heading or running page header
    Header,
    /// Running page footer
    Footer,
    /// Table region
    Table,
    /// List container
    List,
    /// Single list entry
    ListItem,
    /// Barcode or QR code
    Barcode,
    /// Picture or figure
    Image,
    /// Footnote text
    Footnote,
    /// Page number label
    PageNumber,
    /// Not yet classified
    #[default]
    Unknown,
}

impl FragmentKind {
    /// Every variant, in declaration order.
    pub const ALL: [FragmentKind; 13] = [
        FragmentKind::Title,
        FragmentKind::TextBlock,
        FragmentKind::Paragraph,
        FragmentKind::Header,
        FragmentKind::Footer,
        FragmentKind::Table,
        FragmentKind::List,
        FragmentKind::ListItem,
        FragmentKind::Barcode,
        FragmentKind::Image,
        FragmentKind::Footnote,
        FragmentKind::PageNumber,
        FragmentKind::Unknown,
    ];

    /// Kinds whose split pieces may be merged back together.
    pub fn is_mergeable(&self) -> bool {
        matches!(
            self,
            FragmentKind::TextBlock | FragmentKind::Paragraph | FragmentKind::ListItem
        )
    }

    /// Kinds that carry running prose and may be reclassified by pattern.
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            FragmentKind::Title
                | FragmentKind::TextBlock
                | FragmentKind::Paragraph
                | FragmentKind::Header
                | FragmentKind::Unknown
        )
    }

    /// Stable name for logs and metadata.
    pub fn name(&self) -> &'static str {
        match self {
            FragmentKind::Title => "title",
            FragmentKind::TextBlock => "text_block",
            FragmentKind::Paragraph => "paragraph",
            FragmentKind::Header => "header",
            FragmentKind::Footer => "footer",
            FragmentKind::Table => "table",
            FragmentKind::List => "list",
            FragmentKind::ListItem => "list_item",
            FragmentKind::Barcode => "barcode",
            FragmentKind::Image => "image",
            FragmentKind::Footnote => "footnote",
            FragmentKind::PageNumber => "page_number",
            FragmentKind::Unknown => "unknown",
        }
    }
}

/// Unit system of a fragment's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CoordinateSpace {
    /// Fractions of page width/height in `[0, 1]`
    #[default]
    Normalized,
    /// Absolute points
    Absolute,
}

impl CoordinateSpace {
    /// Whether this is the normalized space.
    pub fn is_normalized(&self) -> bool {
        matches!(self, CoordinateSpace::Normalized)
    }

    /// Name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            CoordinateSpace::Normalized => "normalized",
            CoordinateSpace::Absolute => "absolute",
        }
    }
}

/// One classified piece of a page.
///
/// Equality and hashing use `id` only: two fragments with identical content
/// but different ids are distinct. Deserialized fragments go through the same
/// confidence clamp and page bump as [`Fragment::new`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "FragmentRecord")]
pub struct Fragment {
    id: Uuid,
    kind: FragmentKind,
    bbox: Rect,
    space: CoordinateSpace,
    raw_bytes: Vec<u8>,
    text: Option<String>,
    confidence: f32,
    page: u32,
    level: Option<u8>,
    metadata: Metadata,
    created_at: DateTime<Utc>,
}

impl Fragment {
    /// Create a fragment with a fresh identity, full confidence and no text.
    ///
    /// Page numbers are 1-based; `0` is bumped to `1`.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragdown::fragment::{Fragment, FragmentKind};
    /// use fragdown::geometry::Rect;
    ///
    /// let f = Fragment::new(FragmentKind::Paragraph, Rect::new(0.1, 0.2, 0.5, 0.05), 1)
    ///     .with_text("Hello")
    ///     .with_confidence(0.9);
    /// assert_eq!(f.text(), Some("Hello"));
    /// assert_eq!(f.page(), 1);
    /// ```
    pub fn new(kind: FragmentKind, bbox: Rect, page: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            bbox,
            space: CoordinateSpace::Normalized,
            raw_bytes: Vec::new(),
            text: None,
            confidence: 1.0,
            page: page.max(1),
            level: None,
            metadata: Metadata::new(),
            created_at: Utc::now(),
        }
    }

    /// Set decoded text (construction-time builder).
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set the original encoded payload.
    pub fn with_raw_bytes(mut self, raw: impl Into<Vec<u8>>) -> Self {
        self.raw_bytes = raw.into();
        self
    }

    /// Set recognition confidence, clamped to `[0, 1]` (NaN becomes `0`).
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = clamp_confidence(confidence);
        self
    }

    /// Declare the coordinate space of the bounding box.
    pub fn with_space(mut self, space: CoordinateSpace) -> Self {
        self.space = space;
        self
    }

    /// Set the structural level (heading depth or list nesting).
    pub fn with_level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }

    /// Add one metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Stable identity.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Structural role.
    pub fn kind(&self) -> FragmentKind {
        self.kind
    }

    /// Bounding box.
    pub fn bbox(&self) -> &Rect {
        &self.bbox
    }

    /// Coordinate space of the bounding box.
    pub fn space(&self) -> CoordinateSpace {
        self.space
    }

    /// Original encoded content.
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw_bytes
    }

    /// Decoded text, if any.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Decoded text or the empty string.
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Recognition confidence in `[0, 1]`.
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// 1-based page number.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Structural level, when one has been assigned.
    pub fn level(&self) -> Option<u8> {
        self.level
    }

    /// Ordered metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Vertical center as a fraction of page height.
    ///
    /// Normalized fragments already are fractions; absolute ones are divided
    /// by `page_height`.
    pub fn vertical_fraction(&self, page_height: f32) -> f32 {
        let y = self.bbox.center().y;
        match self.space {
            CoordinateSpace::Normalized => y,
            CoordinateSpace::Absolute if page_height > 0.0 => y / page_height,
            CoordinateSpace::Absolute => 0.0,
        }
    }

    /// Vertical center in absolute points.
    pub fn vertical_points(&self, page_height: f32) -> f32 {
        let y = self.bbox.center().y;
        match self.space {
            CoordinateSpace::Normalized => y * page_height,
            CoordinateSpace::Absolute => y,
        }
    }

    /// Copy every field, overriding only what `update` specifies.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragdown::fragment::{Fragment, FragmentKind, FragmentUpdate};
    /// use fragdown::geometry::Rect;
    ///
    /// let original = Fragment::new(FragmentKind::TextBlock, Rect::new(0.0, 0.0, 1.0, 0.1), 1)
    ///     .with_text("1. Intro");
    /// let heading = original.updated(FragmentUpdate::new().kind(FragmentKind::Header).level(1));
    ///
    /// assert_eq!(heading.id(), original.id());
    /// assert_eq!(heading.kind(), FragmentKind::Header);
    /// assert_eq!(heading.text(), Some("1. Intro"));
    /// ```
    pub fn updated(&self, update: FragmentUpdate) -> Fragment {
        let mut metadata = self.metadata.clone();
        for (key, value) in update.metadata {
            metadata.insert(key, value);
        }

        Fragment {
            id: update.id.unwrap_or(self.id),
            kind: update.kind.unwrap_or(self.kind),
            bbox: update.bbox.unwrap_or(self.bbox),
            space: update.space.unwrap_or(self.space),
            raw_bytes: update.raw_bytes.unwrap_or_else(|| self.raw_bytes.clone()),
            text: update.text.unwrap_or_else(|| self.text.clone()),
            confidence: update
                .confidence
                .map(clamp_confidence)
                .unwrap_or(self.confidence),
            page: update.page.map(|p| p.max(1)).unwrap_or(self.page),
            level: update.level.unwrap_or(self.level),
            metadata,
            created_at: update.created_at.unwrap_or(self.created_at),
        }
    }
}

/// Wire shape of a fragment, checked on the way in.
#[derive(Deserialize)]
struct FragmentRecord {
    id: Uuid,
    kind: FragmentKind,
    bbox: Rect,
    #[serde(default)]
    space: CoordinateSpace,
    #[serde(default)]
    raw_bytes: Vec<u8>,
    #[serde(default)]
    text: Option<String>,
    confidence: f32,
    page: u32,
    #[serde(default)]
    level: Option<u8>,
    #[serde(default)]
    metadata: Metadata,
    created_at: DateTime<Utc>,
}

impl From<FragmentRecord> for Fragment {
    fn from(record: FragmentRecord) -> Self {
        Fragment {
            id: record.id,
            kind: record.kind,
            bbox: record.bbox,
            space: record.space,
            raw_bytes: record.raw_bytes,
            text: record.text,
            confidence: clamp_confidence(record.confidence),
            page: record.page.max(1),
            level: record.level,
            metadata: record.metadata,
            created_at: record.created_at,
        }
    }
}

impl PartialEq for Fragment {
    fn eq(&self, other: &Self) -> bool {
        same_identity(self, other)
    }
}

impl Eq for Fragment {}

impl Hash for Fragment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Field overrides for [`Fragment::updated`].
///
/// Unset fields keep the original's value. Metadata entries are merged into
/// the original map (overrides win) rather than replacing it.
#[derive(Debug, Clone, Default)]
pub struct FragmentUpdate {
    id: Option<Uuid>,
    kind: Option<FragmentKind>,
    bbox: Option<Rect>,
    space: Option<CoordinateSpace>,
    raw_bytes: Option<Vec<u8>>,
    text: Option<Option<String>>,
    confidence: Option<f32>,
    page: Option<u32>,
    level: Option<Option<u8>>,
    metadata: Metadata,
    created_at: Option<DateTime<Utc>>,
}

impl FragmentUpdate {
    /// An update that changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the identity.
    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    /// Override the kind.
    pub fn kind(mut self, kind: FragmentKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Override the bounding box.
    pub fn bbox(mut self, bbox: Rect) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Override the coordinate space.
    pub fn space(mut self, space: CoordinateSpace) -> Self {
        self.space = Some(space);
        self
    }

    /// Override the raw payload.
    pub fn raw_bytes(mut self, raw: Vec<u8>) -> Self {
        self.raw_bytes = Some(raw);
        self
    }

    /// Override the text (`None` clears it).
    pub fn text(mut self, text: Option<String>) -> Self {
        self.text = Some(text);
        self
    }

    /// Override the confidence.
    pub fn confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Override the page.
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Set the level.
    pub fn level(mut self, level: u8) -> Self {
        self.level = Some(Some(level));
        self
    }

    /// Remove the level.
    pub fn clear_level(mut self) -> Self {
        self.level = Some(None);
        self
    }

    /// Add or replace one metadata entry.
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Override the creation timestamp.
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

fn clamp_confidence(confidence: f32) -> f32 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

/// Identity comparison: true iff both fragments carry the same `id`.
pub fn same_identity(a: &Fragment, b: &Fragment) -> bool {
    a.id == b.id
}

/// Reading-order comparator: page, then top edge, then left edge.
pub fn compare_position(a: &Fragment, b: &Fragment) -> Ordering {
    a.page
        .cmp(&b.page)
        .then_with(|| a.bbox.min_y().total_cmp(&b.bbox.min_y()))
        .then_with(|| a.bbox.min_x().total_cmp(&b.bbox.min_x()))
}

/// Sort fragments into canonical reading order (stable).
pub fn sort_by_position(fragments: &mut [Fragment]) {
    fragments.sort_by(compare_position);
}
