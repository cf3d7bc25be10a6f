//! Merging of fragments that were split by the recognizer.
//!
//! Two neighbouring fragments of the same mergeable kind on the same page are
//! merged when the gap between their boxes is strictly below a threshold.
//! Fragments on the same visual row use the (more permissive) horizontal
//! threshold, everything else uses the general one.

use crate::error::Result;
use crate::fragment::{Fragment, FragmentUpdate};
use crate::pipeline::config::ProcessingConfig;
use crate::pipeline::logging::StageLog;
use chrono::Utc;
use uuid::Uuid;

/// Merged sequence plus the number of merges performed.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// Fragments after merging, in reading order
    pub fragments: Vec<Fragment>,
    /// Merge operations performed
    pub merged: usize,
}

/// Distance-threshold merger.
#[derive(Debug, Clone, Copy)]
pub struct Merger<'a> {
    config: &'a ProcessingConfig,
}

impl<'a> Merger<'a> {
    /// Create a merger over validated processing settings.
    pub fn new(config: &'a ProcessingConfig) -> Self {
        Self { config }
    }

    /// Whether `a` and `b` may be merged.
    ///
    /// Fails with [`Error::CoordinateSpaceMismatch`](crate::error::Error::CoordinateSpaceMismatch)
    /// when a threshold's unit flag does not match the fragments' space.
    pub fn can_merge(&self, a: &Fragment, b: &Fragment) -> Result<bool> {
        if a.kind() != b.kind() || !a.kind().is_mergeable() || a.page() != b.page() {
            return Ok(false);
        }

        let cfg = self.config;
        cfg.same_line_tolerance
            .check_space("same_line_tolerance", a.space())?;
        cfg.same_line_tolerance
            .check_space("same_line_tolerance", b.space())?;

        let (name, threshold) = if a
            .bbox()
            .is_vertically_aligned(b.bbox(), cfg.same_line_tolerance.value)
        {
            ("horizontal_merge_threshold", cfg.horizontal_merge_threshold)
        } else {
            ("merge_threshold", cfg.merge_threshold)
        };
        threshold.check_space(name, a.space())?;

        Ok(a.bbox().distance(b.bbox()) < threshold.value)
    }

    /// Collapse mergeable neighbours in a reading-ordered sequence.
    ///
    /// Each pass walks the sequence once, folding every fragment into its
    /// predecessor when [`can_merge`](Self::can_merge) holds. Passes repeat
    /// until one performs no merge.
    pub fn merge(&self, fragments: Vec<Fragment>, log: &StageLog) -> Result<MergeOutcome> {
        let log = log.for_stage("merge");
        let mut current = fragments;
        let mut merged = 0;

        loop {
            let mut out: Vec<Fragment> = Vec::with_capacity(current.len());
            let mut pass_merges = 0;

            for fragment in current {
                let joined = match out.last() {
                    Some(previous) if self.can_merge(previous, &fragment)? => {
                        Some(merge_pair(previous, &fragment))
                    }
                    _ => None,
                };
                match joined {
                    Some(joined) => {
                        log.trace(format_args!(
                            "merged {} into {}",
                            fragment.id(),
                            joined.id()
                        ));
                        if let Some(last) = out.last_mut() {
                            *last = joined;
                        }
                        pass_merges += 1;
                    }
                    None => out.push(fragment),
                }
            }

            current = out;
            merged += pass_merges;
            if pass_merges == 0 {
                break;
            }
        }

        if merged > 0 {
            log.debug(format_args!(
                "{} merges, {} fragments remain",
                merged,
                current.len()
            ));
        }
        Ok(MergeOutcome {
            fragments: current,
            merged,
        })
    }
}

/// Combine two fragments into a new one.
///
/// The result has a fresh identity, the union box, the lower confidence,
/// both payloads concatenated and both metadata maps (`second` wins on key
/// conflicts). Kind, page, space and level come from `first`.
pub fn merge_pair(first: &Fragment, second: &Fragment) -> Fragment {
    let mut raw = first.raw_bytes().to_vec();
    raw.extend_from_slice(second.raw_bytes());

    let mut update = FragmentUpdate::new()
        .id(Uuid::new_v4())
        .created_at(Utc::now())
        .bbox(first.bbox().union(second.bbox()))
        .text(join_text(first.text(), second.text()))
        .confidence(first.confidence().min(second.confidence()))
        .raw_bytes(raw);
    if first.level().is_none() {
        if let Some(level) = second.level() {
            update = update.level(level);
        }
    }
    for (key, value) in second.metadata() {
        update = update.metadata(key.clone(), value.clone());
    }

    first.updated(update)
}

/// Join two optional texts with a single space unless either side already
/// has whitespace at the seam.
pub fn join_text(first: Option<&str>, second: Option<&str>) -> Option<String> {
    match (first, second) {
        (None, None) => None,
        (Some(a), None) => Some(a.to_string()),
        (None, Some(b)) => Some(b.to_string()),
        (Some(a), Some(b)) => {
            let seam_has_space = a.is_empty()
                || b.is_empty()
                || a.ends_with(char::is_whitespace)
                || b.starts_with(char::is_whitespace);
            if seam_has_space {
                Some(format!("{}{}", a, b))
            } else {
                Some(format!("{} {}", a, b))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::fragment::{CoordinateSpace, FragmentKind};
    use crate::geometry::Rect;
    use crate::pipeline::config::DistanceThreshold;

    fn absolute_config(threshold: f32) -> ProcessingConfig {
        ProcessingConfig {
            merge_threshold: DistanceThreshold::absolute(threshold),
            horizontal_merge_threshold: DistanceThreshold::absolute(threshold),
            same_line_tolerance: DistanceThreshold::absolute(5.0),
            ..Default::default()
        }
    }

    fn abs(kind: FragmentKind, rect: Rect, text: &str) -> Fragment {
        Fragment::new(kind, rect, 1)
            .with_space(CoordinateSpace::Absolute)
            .with_text(text)
    }

    #[test]
    fn test_gap_at_threshold_is_not_merged() {
        let config = absolute_config(10.0);
        let merger = Merger::new(&config);
        let a = abs(FragmentKind::Paragraph, Rect::new(100.0, 100.0, 100.0, 50.0), "a");
        let at = abs(FragmentKind::Paragraph, Rect::new(210.0, 100.0, 100.0, 50.0), "b");
        let below = abs(FragmentKind::Paragraph, Rect::new(209.0, 100.0, 100.0, 50.0), "b");

        assert!(!merger.can_merge(&a, &at).unwrap());
        assert!(merger.can_merge(&a, &below).unwrap());
    }

    #[test]
    fn test_union_box() {
        let config = absolute_config(25.0);
        let merger = Merger::new(&config);
        let a = abs(FragmentKind::TextBlock, Rect::new(100.0, 100.0, 100.0, 50.0), "left");
        let b = abs(FragmentKind::TextBlock, Rect::new(220.0, 100.0, 100.0, 50.0), "right");

        let out = merger.merge(vec![a, b], &StageLog::quiet()).unwrap();
        assert_eq!(out.merged, 1);
        let merged = &out.fragments[0];
        assert_eq!(merged.bbox().min_x(), 100.0);
        assert_eq!(merged.bbox().max_x(), 320.0);
        assert_eq!(merged.text(), Some("left right"));
    }

    #[test]
    fn test_kind_and_page_gates() {
        let config = absolute_config(50.0);
        let merger = Merger::new(&config);
        let p = abs(FragmentKind::Paragraph, Rect::new(0.0, 0.0, 10.0, 10.0), "p");
        let t = abs(FragmentKind::TextBlock, Rect::new(12.0, 0.0, 10.0, 10.0), "t");
        assert!(!merger.can_merge(&p, &t).unwrap());

        let title_a = abs(FragmentKind::Title, Rect::new(0.0, 0.0, 10.0, 10.0), "x");
        let title_b = abs(FragmentKind::Title, Rect::new(12.0, 0.0, 10.0, 10.0), "y");
        assert!(!merger.can_merge(&title_a, &title_b).unwrap());

        let other_page = Fragment::new(FragmentKind::Paragraph, Rect::new(12.0, 0.0, 10.0, 10.0), 2)
            .with_space(CoordinateSpace::Absolute);
        assert!(!merger.can_merge(&p, &other_page).unwrap());
    }

    #[test]
    fn test_same_line_uses_horizontal_threshold() {
        let config = ProcessingConfig {
            merge_threshold: DistanceThreshold::absolute(5.0),
            horizontal_merge_threshold: DistanceThreshold::absolute(30.0),
            same_line_tolerance: DistanceThreshold::absolute(3.0),
            ..Default::default()
        };
        let merger = Merger::new(&config);
        let marker = abs(FragmentKind::ListItem, Rect::new(50.0, 200.0, 10.0, 12.0), "1.");
        let body = abs(FragmentKind::ListItem, Rect::new(80.0, 200.0, 200.0, 12.0), "Item");
        assert!(merger.can_merge(&marker, &body).unwrap());

        // Same gap, different rows: the general threshold applies.
        let below = abs(FragmentKind::ListItem, Rect::new(50.0, 232.0, 10.0, 12.0), "x");
        assert!(!merger.can_merge(&marker, &below).unwrap());
    }

    #[test]
    fn test_space_mismatch_is_an_error() {
        let config = ProcessingConfig::default();
        let merger = Merger::new(&config);
        let a = abs(FragmentKind::Paragraph, Rect::new(0.0, 0.0, 10.0, 10.0), "a");
        let b = abs(FragmentKind::Paragraph, Rect::new(11.0, 0.0, 10.0, 10.0), "b");
        let err = merger.can_merge(&a, &b).unwrap_err();
        assert!(matches!(err, Error::CoordinateSpaceMismatch { .. }));
    }

    #[test]
    fn test_chain_collapses() {
        let config = absolute_config(5.0);
        let merger = Merger::new(&config);
        let fragments = vec![
            abs(FragmentKind::Paragraph, Rect::new(0.0, 0.0, 100.0, 10.0), "one"),
            abs(FragmentKind::Paragraph, Rect::new(0.0, 12.0, 100.0, 10.0), "two"),
            abs(FragmentKind::Paragraph, Rect::new(0.0, 24.0, 100.0, 10.0), "three"),
            abs(FragmentKind::Paragraph, Rect::new(0.0, 200.0, 100.0, 10.0), "far"),
        ];
        let out = merger.merge(fragments, &StageLog::quiet()).unwrap();
        assert_eq!(out.merged, 2);
        assert_eq!(out.fragments.len(), 2);
        assert_eq!(out.fragments[0].text(), Some("one two three"));
        assert_eq!(out.fragments[1].text(), Some("far"));
    }

    #[test]
    fn test_merge_pair_fields() {
        let a = abs(FragmentKind::Paragraph, Rect::new(0.0, 0.0, 10.0, 10.0), "Hello ")
            .with_confidence(0.9)
            .with_raw_bytes(vec![1])
            .with_metadata("method", "ocr")
            .with_metadata("lang", "en");
        let b = abs(FragmentKind::Paragraph, Rect::new(12.0, 0.0, 10.0, 10.0), "world")
            .with_confidence(0.7)
            .with_raw_bytes(vec![2])
            .with_metadata("method", "layout");

        let m = merge_pair(&a, &b);
        assert_ne!(m.id(), a.id());
        assert_ne!(m.id(), b.id());
        assert_eq!(m.text(), Some("Hello world"));
        assert_eq!(m.confidence(), 0.7);
        assert_eq!(m.raw_bytes(), &[1, 2]);
        assert_eq!(m.metadata().get("method").map(String::as_str), Some("layout"));
        assert_eq!(m.metadata().get("lang").map(String::as_str), Some("en"));
        assert_eq!(m.kind(), FragmentKind::Paragraph);
        assert_eq!(m.space(), CoordinateSpace::Absolute);
    }

    #[test]
    fn test_join_text() {
        assert_eq!(join_text(Some("a"), Some("b")).as_deref(), Some("a b"));
        assert_eq!(join_text(Some("a\n"), Some("b")).as_deref(), Some("a\nb"));
        assert_eq!(join_text(Some("a"), Some(" b")).as_deref(), Some("a b"));
        assert_eq!(join_text(None, Some("b")).as_deref(), Some("b"));
        assert_eq!(join_text(Some(""), Some("b")).as_deref(), Some("b"));
        assert_eq!(join_text(None, None), None);
    }
}
