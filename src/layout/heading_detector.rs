//! Heading detection using configured text patterns.
//!
//! This module classifies a fragment's text as a heading and computes its
//! level from the matched token:
//! - numbered: one level per numeric component ("1.2.3" → 3)
//! - named: looked up in the configured level table ("Chapter" → 2)
//! - lettered / roman: level 1 unless the level table overrides
//! - heuristic (opt-in): short all-caps text, level 1
//!
//! The configured `level_offset` is added afterwards and the result is
//! clamped to `1..=max_level`. Unmatched text yields a negative result with
//! zero confidence; detection never fails.

use crate::fragment::Fragment;
use crate::layout::patterns::{HeaderCategory, HeaderPatterns};
use crate::pipeline::config::HeaderPatternConfig;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Runs of digits inside a numbered heading token
    static ref RE_NUMERIC_COMPONENT: Regex = Regex::new(r"\d+").unwrap();
}

/// Result of heading detection for one fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaderDetection {
    /// Whether the text is a heading
    pub is_header: bool,
    /// Heading level (`0` when not a heading)
    pub level: u8,
    /// Matching category
    pub category: Option<HeaderCategory>,
    /// Confidence in `[0, 1]`
    pub confidence: f32,
}

impl HeaderDetection {
    /// The negative result.
    pub fn none() -> Self {
        Self {
            is_header: false,
            level: 0,
            category: None,
            confidence: 0.0,
        }
    }

    fn matched(category: HeaderCategory, level: u8) -> Self {
        Self {
            is_header: true,
            level,
            category: Some(category),
            confidence: category.confidence(),
        }
    }
}

/// Pattern-based heading detector.
#[derive(Debug, Clone, Copy)]
pub struct HeadingDetector<'a> {
    config: &'a HeaderPatternConfig,
    patterns: &'a HeaderPatterns,
}

impl<'a> HeadingDetector<'a> {
    /// Create a detector over validated settings.
    pub fn new(config: &'a HeaderPatternConfig, patterns: &'a HeaderPatterns) -> Self {
        Self { config, patterns }
    }

    /// Classify a fragment's text as a heading.
    pub fn detect_header(&self, fragment: &Fragment) -> HeaderDetection {
        self.detect_text(fragment.text_or_empty())
    }

    /// Classify raw text as a heading.
    pub fn detect_text(&self, text: &str) -> HeaderDetection {
        if !self.config.enabled {
            return HeaderDetection::none();
        }
        let text = text.trim();
        if text.is_empty() {
            return HeaderDetection::none();
        }

        for (category, set) in self.patterns.by_priority() {
            if let Some(m) = set.find(text) {
                let base = self.base_level(category, m.token);
                return HeaderDetection::matched(category, self.finish_level(base));
            }
        }

        if self.config.heuristic_fallback
            && is_all_caps_heading(text, self.config.heuristic_max_length)
        {
            return HeaderDetection::matched(HeaderCategory::Heuristic, self.finish_level(1));
        }

        HeaderDetection::none()
    }

    fn base_level(&self, category: HeaderCategory, token: &str) -> i32 {
        match category {
            HeaderCategory::Numbered => numeric_depth(token).max(1) as i32,
            HeaderCategory::Named => self.lookup_level(token).unwrap_or(1) as i32,
            HeaderCategory::Lettered | HeaderCategory::Roman => self
                .lookup_level(token)
                .or_else(|| self.lookup_level(category.name()))
                .unwrap_or(1) as i32,
            HeaderCategory::Heuristic => 1,
        }
    }

    /// Level-table lookup: exact key first (case-insensitive), then the
    /// longest key the token starts with.
    fn lookup_level(&self, token: &str) -> Option<u8> {
        let token = token.trim().to_lowercase();
        let levels = &self.config.named_levels;

        if let Some((_, level)) = levels.iter().find(|(k, _)| k.to_lowercase() == token) {
            return Some(*level);
        }

        levels
            .iter()
            .filter(|(k, _)| !k.is_empty() && token.starts_with(&k.to_lowercase()))
            .max_by_key(|(k, _)| k.len())
            .map(|(_, level)| *level)
    }

    fn finish_level(&self, base: i32) -> u8 {
        let max = self.config.max_level.max(1) as i32;
        base.saturating_add(self.config.level_offset).clamp(1, max) as u8
    }
}

/// Number of numeric components in a token ("1.2.3" → 3).
pub fn numeric_depth(token: &str) -> usize {
    RE_NUMERIC_COMPONENT.find_iter(token).count()
}

/// Short text whose letters are all uppercase.
fn is_all_caps_heading(text: &str, max_length: usize) -> bool {
    if text.chars().count() > max_length {
        return false;
    }
    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase()) && !text.ends_with('.')
}
