//! Applies heading and list detection to a fragment sequence.
//!
//! Textual fragments and list items are considered. Heading detection runs
//! first; a fragment that is not a heading is then tried as a list item.
//! Fragments already labelled `ListItem` skip heading detection and only gain
//! their marker and nesting level. Matches are produced as updated copies
//! (identity preserved) carrying the new kind, level and detection metadata.
//! Titles keep their kind and only receive a level; running headers that
//! already carry a level are left alone.

use crate::fragment::{Fragment, FragmentKind, FragmentUpdate};
use crate::layout::heading_detector::HeadingDetector;
use crate::layout::list_detector::ListDetector;
use crate::pipeline::config::ValidatedConfig;
use crate::pipeline::logging::StageLog;
use indexmap::IndexMap;

/// Metadata key holding the matched pattern category.
pub const META_CLASSIFICATION: &str = "classification";
/// Metadata key holding the detection confidence.
pub const META_CLASSIFICATION_CONFIDENCE: &str = "classification_confidence";
/// Metadata key holding a list item's marker token.
pub const META_LIST_MARKER: &str = "list_marker";
/// Metadata key holding the full matched marker prefix.
pub const META_LIST_MARKER_SPAN: &str = "list_marker_span";

/// Classified sequence plus per-category counts.
#[derive(Debug, Clone, Default)]
pub struct ClassificationOutcome {
    /// Fragments after classification, order unchanged
    pub fragments: Vec<Fragment>,
    /// Headings found, by category name
    pub headings: IndexMap<String, usize>,
    /// List items found, by category name
    pub list_items: IndexMap<String, usize>,
}

/// Pattern classifier over a validated configuration.
#[derive(Debug, Clone, Copy)]
pub struct PatternClassifier<'a> {
    headings: HeadingDetector<'a>,
    lists: ListDetector<'a>,
}

impl<'a> PatternClassifier<'a> {
    /// Build both detectors from the validated configuration.
    pub fn new(config: &'a ValidatedConfig) -> Self {
        Self {
            headings: HeadingDetector::new(&config.config().headers, config.header_patterns()),
            lists: ListDetector::new(&config.config().lists, config.list_patterns()),
        }
    }

    /// Classify a sequence.
    pub fn classify(&self, fragments: Vec<Fragment>, log: &StageLog) -> ClassificationOutcome {
        let log = log.for_stage("classify");
        let mut outcome = ClassificationOutcome {
            fragments: Vec::with_capacity(fragments.len()),
            ..Default::default()
        };

        for fragment in fragments {
            let classified = self.classify_one(&fragment, &mut outcome);
            outcome.fragments.push(classified.unwrap_or(fragment));
        }

        log.debug(format_args!(
            "{} headings, {} list items",
            outcome.headings.values().sum::<usize>(),
            outcome.list_items.values().sum::<usize>()
        ));
        outcome
    }

    fn classify_one(
        &self,
        fragment: &Fragment,
        outcome: &mut ClassificationOutcome,
    ) -> Option<Fragment> {
        let kind = fragment.kind();
        if kind == FragmentKind::ListItem {
            return self.classify_list_item(fragment, outcome);
        }
        if !kind.is_textual() || (kind == FragmentKind::Header && fragment.level().is_some()) {
            return None;
        }

        let heading = self.headings.detect_header(fragment);
        if heading.is_header {
            let category = heading.category?.name();
            *outcome.headings.entry(category.to_string()).or_default() += 1;
            let new_kind = if kind == FragmentKind::Title {
                FragmentKind::Title
            } else {
                FragmentKind::Header
            };
            return Some(
                fragment.updated(
                    FragmentUpdate::new()
                        .kind(new_kind)
                        .level(heading.level)
                        .metadata(META_CLASSIFICATION, category)
                        .metadata(
                            META_CLASSIFICATION_CONFIDENCE,
                            format!("{:.2}", heading.confidence),
                        ),
                ),
            );
        }

        // Titles and running headers never become list items.
        if matches!(kind, FragmentKind::Title | FragmentKind::Header) {
            return None;
        }
        self.classify_list_item(fragment, outcome)
    }

    fn classify_list_item(
        &self,
        fragment: &Fragment,
        outcome: &mut ClassificationOutcome,
    ) -> Option<Fragment> {
        let item = self.lists.detect_list_item(fragment);
        if !item.is_list_item {
            return None;
        }
        let category = item.category?.name();
        *outcome.list_items.entry(category.to_string()).or_default() += 1;

        let mut update = FragmentUpdate::new()
            .kind(FragmentKind::ListItem)
            .level(item.level)
            .metadata(META_CLASSIFICATION, category)
            .metadata(
                META_CLASSIFICATION_CONFIDENCE,
                format!("{:.2}", item.confidence),
            );
        if let Some(marker) = item.marker {
            update = update.metadata(META_LIST_MARKER, marker);
        }
        if let Some(span) = item.marker_span {
            update = update.metadata(META_LIST_MARKER_SPAN, span);
        }
        Some(fragment.updated(update))
    }
}
