//! Running header and footer detection.
//!
//! Several independently togglable strategies are combined by logical OR:
//!
//! - **region**: the fragment's vertical center lies in an absolute band
//!   (`header_region_y ± tolerance`, `footer_region_y ± tolerance`), plus any
//!   extra bands when multi-region detection is on
//! - **percentage**: the center lies in the top/bottom fraction of the page
//! - **boilerplate**: the text contains a configured header/footer string
//! - **frequency**: the normalized text recurs on more than `threshold` of all
//!   pages, which needs a [`FrequencyTable`] built over the whole document
//!   before any page is classified
//!
//! Length bounds and page-number exclusion act as vetoes: a vetoed fragment is
//! never a header or footer, whatever the strategies say. Page numbers found
//! inside a band are retagged as [`FragmentKind::PageNumber`] instead.

use crate::fragment::{Fragment, FragmentKind, FragmentUpdate};
use crate::pipeline::config::{HeaderFooterConfig, HeaderFooterMode, RegionRole};
use crate::pipeline::logging::StageLog;
use indexmap::{IndexMap, IndexSet};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// "7", "Page 7", "page 7 of 12", "7/12", "- 7 -"
    static ref RE_PAGE_NUMBER: Regex = Regex::new(
        r"(?i)^(?:page\s*)?\d{1,4}(?:\s*(?:of|/)\s*\d{1,4})?$|^[-\u{2013}]\s*\d{1,4}\s*[-\u{2013}]$"
    )
    .unwrap();
    static ref RE_WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref RE_DIGITS: Regex = Regex::new(r"\d+").unwrap();
}

/// Normalize text for frequency counting: trim, lowercase, collapse
/// whitespace and, optionally, replace digit runs with `#`.
///
/// # Examples
///
/// ```
/// use fragdown::layout::header_footer::normalize_text;
///
/// assert_eq!(normalize_text("  Page   12 ", true), "page #");
/// assert_eq!(normalize_text("Page 12", false), "page 12");
/// ```
pub fn normalize_text(text: &str, ignore_digits: bool) -> String {
    let collapsed = RE_WHITESPACE
        .replace_all(text.trim(), " ")
        .to_lowercase();
    if ignore_digits {
        RE_DIGITS.replace_all(&collapsed, "#").into_owned()
    } else {
        collapsed
    }
}

/// Whether `text` looks like a bare page number label.
pub fn is_page_number(text: &str) -> bool {
    RE_PAGE_NUMBER.is_match(text.trim())
}

/// Kinds that may be classified as running headers/footers.
fn is_candidate(kind: FragmentKind) -> bool {
    matches!(
        kind,
        FragmentKind::TextBlock
            | FragmentKind::Paragraph
            | FragmentKind::Unknown
            | FragmentKind::Header
            | FragmentKind::Footer
    )
}

/// Cross-page text frequencies.
///
/// Built once over every page of a document (the reduce phase) and then
/// shared read-only by the per-page classification.
#[derive(Debug, Clone, Default)]
pub struct FrequencyTable {
    counts: IndexMap<String, usize>,
    pages: usize,
    ignore_digits: bool,
}

impl FrequencyTable {
    /// Count, for each normalized text, the number of pages it appears on.
    pub fn build<'f, I>(pages: I, ignore_digits: bool) -> Self
    where
        I: IntoIterator<Item = &'f [Fragment]>,
    {
        let mut table = Self {
            ignore_digits,
            ..Default::default()
        };
        for page in pages {
            table.pages += 1;
            let keys: IndexSet<String> = page
                .iter()
                .filter(|f| is_candidate(f.kind()))
                .map(|f| normalize_text(f.text_or_empty(), ignore_digits))
                .filter(|k| !k.is_empty())
                .collect();
            for key in keys {
                *table.counts.entry(key).or_default() += 1;
            }
        }
        table
    }

    /// Number of pages sampled.
    pub fn pages(&self) -> usize {
        self.pages
    }

    /// Number of distinct texts seen.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether no text was seen.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Fraction of pages on which `text` appears.
    pub fn rate(&self, text: &str) -> f32 {
        if self.pages == 0 {
            return 0.0;
        }
        let key = normalize_text(text, self.ignore_digits);
        let count = self.counts.get(&key).copied().unwrap_or(0);
        count as f32 / self.pages as f32
    }
}

/// Which strategy classified a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Absolute band
    Region,
    /// Fractional band
    Percentage,
    /// Configured boilerplate string
    Boilerplate,
    /// Cross-page recurrence
    Frequency,
}

impl Strategy {
    /// Name stored in fragment metadata.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Region => "region",
            Strategy::Percentage => "percentage",
            Strategy::Boilerplate => "boilerplate",
            Strategy::Frequency => "frequency",
        }
    }
}

/// Positive header/footer classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    /// Header or footer
    pub role: RegionRole,
    /// First strategy that matched
    pub strategy: Strategy,
}

/// Per-page classification result.
#[derive(Debug, Clone, Default)]
pub struct HeaderFooterOutcome {
    /// Fragments after tagging or dropping
    pub fragments: Vec<Fragment>,
    /// Fragments classified as headers
    pub headers: usize,
    /// Fragments classified as footers
    pub footers: usize,
    /// Fragments removed in drop mode
    pub dropped: usize,
    /// Fragments retagged as page numbers
    pub page_numbers: usize,
}

/// Region- and frequency-based header/footer classifier.
#[derive(Debug, Clone, Copy)]
pub struct HeaderFooterClassifier<'a> {
    config: &'a HeaderFooterConfig,
    page_height: f32,
    frequency: Option<&'a FrequencyTable>,
}

impl<'a> HeaderFooterClassifier<'a> {
    /// Create a classifier. `page_height` converts between coordinate spaces.
    pub fn new(config: &'a HeaderFooterConfig, page_height: f32) -> Self {
        Self {
            config,
            page_height,
            frequency: None,
        }
    }

    /// Attach the document-wide frequency table.
    pub fn with_frequency(mut self, table: &'a FrequencyTable) -> Self {
        self.frequency = Some(table);
        self
    }

    /// Classify one fragment. `None` means ordinary content.
    pub fn detect(&self, fragment: &Fragment) -> Option<Detection> {
        if !self.config.enabled || !is_candidate(fragment.kind()) {
            return None;
        }
        let text = fragment.text_or_empty().trim();
        if self.is_vetoed(text) {
            return None;
        }

        self.positional_role(fragment)
            .or_else(|| self.boilerplate_role(text))
            .or_else(|| self.frequency_role(fragment, text))
    }

    fn is_vetoed(&self, text: &str) -> bool {
        let ex = &self.config.exclusion;
        let len = text.chars().count();
        if len < ex.min_length.max(1) || len > ex.max_length {
            return true;
        }
        ex.exclude_page_numbers && is_page_number(text)
    }

    fn positional_role(&self, fragment: &Fragment) -> Option<Detection> {
        let region = &self.config.region;
        if region.enabled {
            let y = fragment.vertical_points(self.page_height);
            let mut bands = vec![
                (RegionRole::Header, region.header_region_y, region.tolerance),
                (RegionRole::Footer, region.footer_region_y, region.tolerance),
            ];
            let multi = &self.config.multi_region;
            if multi.enabled {
                for role in [RegionRole::Header, RegionRole::Footer] {
                    bands.extend(
                        multi
                            .extra_regions
                            .iter()
                            .filter(|r| r.role == role)
                            .take(multi.max_regions.saturating_sub(1))
                            .map(|r| (r.role, r.y, r.tolerance)),
                    );
                }
            }
            if let Some((role, _, _)) = bands
                .iter()
                .find(|(_, center, tol)| (y - center).abs() <= *tol)
            {
                return Some(Detection {
                    role: *role,
                    strategy: Strategy::Region,
                });
            }
        }

        let pct = &self.config.percentage;
        if pct.enabled {
            let frac = fragment.vertical_fraction(self.page_height);
            let role = if frac < pct.header_height {
                Some(RegionRole::Header)
            } else if frac > 1.0 - pct.footer_height {
                Some(RegionRole::Footer)
            } else {
                None
            };
            if let Some(role) = role {
                return Some(Detection {
                    role,
                    strategy: Strategy::Percentage,
                });
            }
        }
        None
    }

    fn boilerplate_role(&self, text: &str) -> Option<Detection> {
        let ex = &self.config.exclusion;
        let lower = text.to_lowercase();
        let contains = |list: &[String]| {
            list.iter()
                .any(|b| !b.is_empty() && lower.contains(&b.to_lowercase()))
        };
        let role = if contains(&ex.header_boilerplate) {
            RegionRole::Header
        } else if contains(&ex.footer_boilerplate) {
            RegionRole::Footer
        } else {
            return None;
        };
        Some(Detection {
            role,
            strategy: Strategy::Boilerplate,
        })
    }

    fn frequency_role(&self, fragment: &Fragment, text: &str) -> Option<Detection> {
        let freq = &self.config.frequency;
        let table = self.frequency?;
        if !freq.enabled || table.pages() < freq.min_pages.max(1) {
            return None;
        }
        if table.rate(text) <= freq.threshold {
            return None;
        }
        let role = if fragment.vertical_fraction(self.page_height) < 0.5 {
            RegionRole::Header
        } else {
            RegionRole::Footer
        };
        Some(Detection {
            role,
            strategy: Strategy::Frequency,
        })
    }

    /// Whether a page-number label sits in a header/footer band.
    fn is_banded_page_number(&self, fragment: &Fragment) -> bool {
        self.config.exclusion.exclude_page_numbers
            && is_candidate(fragment.kind())
            && is_page_number(fragment.text_or_empty())
            && self.positional_role(fragment).is_some()
    }

    /// Classify every fragment of one page, tagging or dropping matches
    /// according to the configured mode.
    pub fn classify(&self, fragments: Vec<Fragment>, log: &StageLog) -> HeaderFooterOutcome {
        let log = log.for_stage("header_footer");
        let mut outcome = HeaderFooterOutcome::default();
        if !self.config.enabled {
            outcome.fragments = fragments;
            return outcome;
        }

        for fragment in fragments {
            if self.is_banded_page_number(&fragment) {
                outcome.page_numbers += 1;
                outcome.fragments.push(fragment.updated(
                    FragmentUpdate::new()
                        .kind(FragmentKind::PageNumber)
                        .metadata("header_footer", "page_number"),
                ));
                continue;
            }

            let Some(detection) = self.detect(&fragment) else {
                outcome.fragments.push(fragment);
                continue;
            };
            match detection.role {
                RegionRole::Header => outcome.headers += 1,
                RegionRole::Footer => outcome.footers += 1,
            }
            log.trace(format_args!(
                "{:?} by {} on page {}: {:?}",
                detection.role,
                detection.strategy.name(),
                fragment.page(),
                fragment.text_or_empty()
            ));

            match self.config.mode {
                HeaderFooterMode::Drop => outcome.dropped += 1,
                HeaderFooterMode::Tag => {
                    let kind = match detection.role {
                        RegionRole::Header => FragmentKind::Header,
                        RegionRole::Footer => FragmentKind::Footer,
                    };
                    outcome.fragments.push(
                        fragment.updated(
                            FragmentUpdate::new()
                                .kind(kind)
                                .clear_level()
                                .metadata("header_footer", detection.strategy.name()),
                        ),
                    );
                }
            }
        }

        if outcome.headers + outcome.footers > 0 {
            log.debug(format_args!(
                "{} headers, {} footers, {} dropped",
                outcome.headers, outcome.footers, outcome.dropped
            ));
        }
        outcome
    }
}
