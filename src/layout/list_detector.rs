//! List item detection using configured marker patterns.

use crate::fragment::Fragment;
use crate::layout::patterns::{ListCategory, ListPatterns};
use crate::pipeline::config::ListPatternConfig;

/// Result of list item detection for one fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct ListItemDetection {
    /// Whether the text is a list item
    pub is_list_item: bool,
    /// Nesting level (`0` when not a list item)
    pub level: u8,
    /// Marker token, e.g. `"1"` or `"•"`
    pub marker: Option<String>,
    /// Full matched prefix, used to strip the marker when re-rendering
    pub marker_span: Option<String>,
    /// Matching category
    pub category: Option<ListCategory>,
    /// Confidence in `[0, 1]`
    pub confidence: f32,
}

impl ListItemDetection {
    /// The negative result.
    pub fn none() -> Self {
        Self {
            is_list_item: false,
            level: 0,
            marker: None,
            marker_span: None,
            category: None,
            confidence: 0.0,
        }
    }
}

/// Pattern-based list item detector.
#[derive(Debug, Clone, Copy)]
pub struct ListDetector<'a> {
    config: &'a ListPatternConfig,
    patterns: &'a ListPatterns,
}

impl<'a> ListDetector<'a> {
    /// Create a detector over validated settings.
    pub fn new(config: &'a ListPatternConfig, patterns: &'a ListPatterns) -> Self {
        Self { config, patterns }
    }

    /// Classify a fragment as a list item.
    ///
    /// With indentation analysis enabled the nesting level is
    /// `floor((x - base_indentation) / level_threshold)`, never below 1;
    /// otherwise every match is level 1.
    pub fn detect_list_item(&self, fragment: &Fragment) -> ListItemDetection {
        if !self.config.enabled {
            return ListItemDetection::none();
        }
        let text = fragment.text_or_empty().trim();
        if text.is_empty() {
            return ListItemDetection::none();
        }

        for (category, set) in self.patterns.by_priority() {
            if let Some(m) = set.find(text) {
                return ListItemDetection {
                    is_list_item: true,
                    level: self.nesting_level(fragment),
                    marker: Some(m.token.trim().to_string()),
                    marker_span: text.starts_with(m.matched).then(|| m.matched.to_string()),
                    category: Some(category),
                    confidence: category.confidence(),
                };
            }
        }

        ListItemDetection::none()
    }

    fn nesting_level(&self, fragment: &Fragment) -> u8 {
        let max = self.config.max_level.max(1) as f32;
        if !self.config.use_indentation || self.config.level_threshold <= 0.0 {
            return 1;
        }
        let offset = fragment.bbox().min_x() - self.config.base_indentation;
        let raw = (offset / self.config.level_threshold).floor();
        raw.clamp(1.0, max) as u8
    }
}
