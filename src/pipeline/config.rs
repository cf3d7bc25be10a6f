//! Unified configuration for the fragment pipeline.
//!
//! Configuration is loaded once by the host, validated once, and then shared
//! by reference across every stage. Validation is non-fail-fast: every
//! violated constraint is collected and reported together in one
//! [`Error::InvalidConfig`](crate::error::Error::InvalidConfig). Pattern lists
//! are compiled during validation, so a malformed pattern can never surface
//! mid-run.

use crate::error::{ConfigErrors, ConfigIssue, Error, Result};
use crate::fragment::CoordinateSpace;
use crate::layout::patterns::{HeaderPatterns, ListPatterns};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Logging detail level for the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only critical errors are logged
    Error,
    /// Warnings and errors are logged
    Warn,
    /// General information (default level)
    #[default]
    Info,
    /// Per-stage debug information
    Debug,
    /// Per-fragment trace information
    Trace,
}

impl LogLevel {
    /// Check if a message at the given level should be logged.
    pub fn should_log(&self, level: LogLevel) -> bool {
        match (*self, level) {
            (Self::Error, Self::Error) => true,
            (Self::Warn, Self::Error | Self::Warn) => true,
            (Self::Info, Self::Error | Self::Warn | Self::Info) => true,
            (Self::Debug, Self::Error | Self::Warn | Self::Info | Self::Debug) => true,
            (Self::Trace, _) => true,
            _ => false,
        }
    }
}

/// A distance threshold tagged with the unit system it is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceThreshold {
    /// Threshold value
    pub value: f32,
    /// Whether `value` is a page fraction (`true`) or absolute points
    pub normalized: bool,
}

impl DistanceThreshold {
    /// A threshold in page-normalized units.
    pub fn normalized(value: f32) -> Self {
        Self {
            value,
            normalized: true,
        }
    }

    /// A threshold in absolute points.
    pub fn absolute(value: f32) -> Self {
        Self {
            value,
            normalized: false,
        }
    }

    /// The coordinate space this threshold applies to.
    pub fn space(&self) -> CoordinateSpace {
        if self.normalized {
            CoordinateSpace::Normalized
        } else {
            CoordinateSpace::Absolute
        }
    }

    /// Fail when `space` differs from the threshold's own space.
    pub fn check_space(&self, name: &'static str, space: CoordinateSpace) -> Result<()> {
        if self.space() == space {
            Ok(())
        } else {
            Err(Error::CoordinateSpaceMismatch {
                threshold: name,
                expected: self.space().name(),
                found: space.name(),
            })
        }
    }

    fn validate(&self, field: &str, errors: &mut ConfigErrors) {
        if self.value < 0.0 || self.value.is_nan() {
            errors.push(ConfigIssue::NegativeValue {
                field: field.to_string(),
                value: self.value,
            });
        } else if self.normalized && self.value > 1.0 {
            errors.push(ConfigIssue::ThresholdOutOfRange {
                field: field.to_string(),
                value: self.value,
            });
        }
    }
}

/// Thresholds for deduplication and merging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Run the deduplication stage
    pub deduplicate: bool,

    /// Overlap fraction above which two fragments are duplicates.
    ///
    /// Default: 0.8
    pub overlap_threshold: f32,

    /// Run the merge stage
    pub merge: bool,

    /// General (vertical) merge distance.
    ///
    /// Default: 0.02 normalized
    pub merge_threshold: DistanceThreshold,

    /// Merge distance for fragments on the same visual row.
    ///
    /// More permissive than `merge_threshold` so that a list marker detected
    /// apart from its text still joins it. Default: 0.05 normalized
    pub horizontal_merge_threshold: DistanceThreshold,

    /// Maximum difference of vertical centers for two fragments to count as
    /// the same row. Default: 0.01 normalized
    pub same_line_tolerance: DistanceThreshold,

    /// Page height in points, used to move between coordinate spaces.
    ///
    /// Default: 792.0 (US Letter)
    pub page_height: f32,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            deduplicate: true,
            overlap_threshold: 0.8,
            merge: true,
            merge_threshold: DistanceThreshold::normalized(0.02),
            horizontal_merge_threshold: DistanceThreshold::normalized(0.05),
            same_line_tolerance: DistanceThreshold::normalized(0.01),
            page_height: 792.0,
        }
    }
}

/// What to do with fragments classified as running headers/footers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderFooterMode {
    /// Re-tag as `Header`/`Footer`
    #[default]
    Tag,
    /// Remove from the sequence
    Drop,
}

/// Absolute-coordinate header/footer bands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionDetection {
    /// Enable region-based detection
    pub enabled: bool,
    /// Center of the header band, in points from the top
    pub header_region_y: f32,
    /// Center of the footer band, in points from the top
    pub footer_region_y: f32,
    /// Half-height of each band, in points
    pub tolerance: f32,
}

impl Default for RegionDetection {
    fn default() -> Self {
        Self {
            enabled: false,
            header_region_y: 36.0,
            footer_region_y: 756.0,
            tolerance: 24.0,
        }
    }
}

/// Fractional header/footer bands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PercentageDetection {
    /// Enable percentage-based detection
    pub enabled: bool,
    /// Top fraction of the page treated as header band
    pub header_height: f32,
    /// Bottom fraction of the page treated as footer band
    pub footer_height: f32,
}

impl Default for PercentageDetection {
    fn default() -> Self {
        Self {
            enabled: true,
            header_height: 0.08,
            footer_height: 0.08,
        }
    }
}

/// Cross-page recurrence detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyDetection {
    /// Enable frequency-based detection
    pub enabled: bool,
    /// Fraction of pages a text must appear on (strictly exceeded)
    pub threshold: f32,
    /// Documents with fewer pages skip frequency detection
    pub min_pages: usize,
    /// Mask digits when normalizing text, so "Page 3" matches "Page 4"
    pub ignore_digits: bool,
}

impl Default for FrequencyDetection {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 0.6,
            min_pages: 3,
            ignore_digits: true,
        }
    }
}

/// Known boilerplate and vetoes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusionRules {
    /// Case-insensitive substrings that mark a running header
    pub header_boilerplate: Vec<String>,
    /// Case-insensitive substrings that mark a running footer
    pub footer_boilerplate: Vec<String>,
    /// Never classify page-number labels as header/footer
    pub exclude_page_numbers: bool,
    /// Shorter texts are never classified
    pub min_length: usize,
    /// Longer texts are never classified
    pub max_length: usize,
}

impl Default for ExclusionRules {
    fn default() -> Self {
        Self {
            header_boilerplate: Vec::new(),
            footer_boilerplate: Vec::new(),
            exclude_page_numbers: true,
            min_length: 1,
            max_length: 200,
        }
    }
}

/// Role of an additional band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionRole {
    /// Band yields headers
    Header,
    /// Band yields footers
    Footer,
}

/// An additional absolute band used when multi-region detection is on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtraRegion {
    /// What the band detects
    pub role: RegionRole,
    /// Band center, in points from the top
    pub y: f32,
    /// Band half-height, in points
    pub tolerance: f32,
}

/// More than one header and footer band per page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiRegion {
    /// Enable the extra bands
    pub enabled: bool,
    /// Maximum bands per role, conventional band included
    pub max_regions: usize,
    /// Extra bands
    pub extra_regions: Vec<ExtraRegion>,
}

impl Default for MultiRegion {
    fn default() -> Self {
        Self {
            enabled: false,
            max_regions: 2,
            extra_regions: Vec::new(),
        }
    }
}

/// Header/footer classification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderFooterConfig {
    /// Master switch
    pub enabled: bool,
    /// Tag or drop classified fragments
    pub mode: HeaderFooterMode,
    /// Absolute bands
    pub region: RegionDetection,
    /// Fractional bands
    pub percentage: PercentageDetection,
    /// Cross-page recurrence
    pub frequency: FrequencyDetection,
    /// Boilerplate lists and vetoes
    pub exclusion: ExclusionRules,
    /// Additional bands
    pub multi_region: MultiRegion,
}

impl Default for HeaderFooterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: HeaderFooterMode::Tag,
            region: RegionDetection::default(),
            percentage: PercentageDetection::default(),
            frequency: FrequencyDetection::default(),
            exclusion: ExclusionRules::default(),
            multi_region: MultiRegion::default(),
        }
    }
}

/// Pattern-driven heading detection.
///
/// There are no built-in patterns; every list is supplied by the host.
/// Patterns are regular expressions matched against the trimmed text. When
/// a pattern has a capture group, group 1 is the token used for level
/// computation; otherwise the whole match is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderPatternConfig {
    /// Master switch
    pub enabled: bool,
    /// Dotted-number headings ("1.2.3 Scope")
    pub numbered: Vec<String>,
    /// Lettered headings ("A. Scope")
    pub lettered: Vec<String>,
    /// Roman-numeral headings ("IV. Scope")
    pub roman: Vec<String>,
    /// Named headings ("Chapter 3")
    pub named: Vec<String>,
    /// Level per named token, e.g. Part → 1, Chapter → 2
    pub named_levels: IndexMap<String, u8>,
    /// Added to every computed level, within `-6..=6`
    pub level_offset: i32,
    /// Upper bound for levels after the offset
    pub max_level: u8,
    /// Treat short all-caps text as a heading when nothing else matches
    pub heuristic_fallback: bool,
    /// Longest text the all-caps heuristic considers
    pub heuristic_max_length: usize,
}

impl Default for HeaderPatternConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            numbered: Vec::new(),
            lettered: Vec::new(),
            roman: Vec::new(),
            named: Vec::new(),
            named_levels: IndexMap::new(),
            level_offset: 0,
            max_level: 6,
            heuristic_fallback: false,
            heuristic_max_length: 60,
        }
    }
}

/// Pattern-driven list item detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListPatternConfig {
    /// Master switch
    pub enabled: bool,
    /// "1." / "2)" markers
    pub numbered: Vec<String>,
    /// "a)" markers
    pub lettered: Vec<String>,
    /// "•" / "-" markers
    pub bullet: Vec<String>,
    /// "iv." markers
    pub roman: Vec<String>,
    /// Anything else
    pub custom: Vec<String>,
    /// Derive nesting from horizontal offset
    pub use_indentation: bool,
    /// X offset of level 1, in the fragment's coordinate space
    pub base_indentation: f32,
    /// Indentation step per level, in the fragment's coordinate space
    pub level_threshold: f32,
    /// Upper bound for list levels
    pub max_level: u8,
}

impl Default for ListPatternConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            numbered: Vec::new(),
            lettered: Vec::new(),
            bullet: Vec::new(),
            roman: Vec::new(),
            custom: Vec::new(),
            use_indentation: false,
            base_indentation: 0.0,
            level_threshold: 0.03,
            max_level: 6,
        }
    }
}

/// Marker used when rendering list items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListMarkerStyle {
    /// `- item`
    #[default]
    Dash,
    /// `* item`
    Asterisk,
    /// `+ item`
    Plus,
    /// `1. item`
    Numbered,
}

/// Markdown output options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    /// Added to every heading level before rendering, within `-6..=6`
    pub header_level_offset: i32,
    /// List marker style
    pub list_marker: ListMarkerStyle,
    /// Prepend a table of contents
    pub include_toc: bool,
    /// Deepest heading level listed in the table of contents
    pub toc_max_depth: u8,
    /// Heading used for the table of contents
    pub toc_title: String,
    /// Deepest ATX level emitted; also the band count for positional levels
    pub max_level: u8,
    /// Derive levels for unlevelled headers from their vertical position
    pub positional_levels: bool,
    /// Prefix of generated image placeholder filenames
    pub image_prefix: String,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            header_level_offset: 0,
            list_marker: ListMarkerStyle::Dash,
            include_toc: false,
            toc_max_depth: 3,
            toc_title: "Table of Contents".to_string(),
            max_level: 6,
            positional_levels: true,
            image_prefix: "image".to_string(),
        }
    }
}

/// Unified configuration for the fragment pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Deduplication and merge thresholds
    pub processing: ProcessingConfig,
    /// Running header/footer detection
    pub header_footer: HeaderFooterConfig,
    /// Heading patterns
    pub headers: HeaderPatternConfig,
    /// List patterns
    pub lists: ListPatternConfig,
    /// Markdown style
    pub markdown: MarkdownConfig,
    /// Logging detail level
    pub log_level: LogLevel,
    /// Record per-stage timings
    pub collect_metrics: bool,
}

impl PipelineConfig {
    /// Parse a configuration from JSON text. Missing sections take defaults.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragdown::pipeline::config::PipelineConfig;
    ///
    /// let config = PipelineConfig::from_json(r#"{ "processing": { "overlap_threshold": 0.5 } }"#)?;
    /// assert_eq!(config.processing.overlap_threshold, 0.5);
    /// assert!(config.processing.merge);
    /// # Ok::<(), fragdown::error::Error>(())
    /// ```
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Set the logging detail level.
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Enable per-stage timing collection.
    pub fn with_metrics_collection(mut self, enabled: bool) -> Self {
        self.collect_metrics = enabled;
        self
    }

    /// Check every constraint and compile every pattern.
    ///
    /// All violations are reported at once.
    pub fn validate(self) -> Result<ValidatedConfig> {
        let mut errors = ConfigErrors::new();

        self.validate_processing(&mut errors);
        self.validate_header_footer(&mut errors);
        self.validate_headers(&mut errors);
        self.validate_lists(&mut errors);
        self.validate_markdown(&mut errors);

        let header_patterns = HeaderPatterns::compile(&self.headers, &mut errors);
        let list_patterns = ListPatterns::compile(&self.lists, &mut errors);

        errors.into_result()?;

        Ok(ValidatedConfig {
            config: self,
            header_patterns,
            list_patterns,
        })
    }

    fn validate_processing(&self, errors: &mut ConfigErrors) {
        let p = &self.processing;
        check_fraction(errors, "processing.overlap_threshold", p.overlap_threshold);
        p.merge_threshold
            .validate("processing.merge_threshold", errors);
        p.horizontal_merge_threshold
            .validate("processing.horizontal_merge_threshold", errors);
        p.same_line_tolerance
            .validate("processing.same_line_tolerance", errors);
        if !(p.page_height > 0.0) {
            errors.push(ConfigIssue::InvalidValue {
                field: "processing.page_height".to_string(),
                reason: format!("page height must be positive, got {}", p.page_height),
            });
        }
    }

    fn validate_header_footer(&self, errors: &mut ConfigErrors) {
        let hf = &self.header_footer;
        let page_height = self.processing.page_height;

        let pct = &hf.percentage;
        check_fraction(errors, "header_footer.percentage.header_height", pct.header_height);
        check_fraction(errors, "header_footer.percentage.footer_height", pct.footer_height);
        if pct.enabled && pct.header_height + pct.footer_height >= 1.0 {
            errors.push(ConfigIssue::OverlappingRegions {
                field: "header_footer.percentage".to_string(),
                header_end: pct.header_height,
                footer_start: 1.0 - pct.footer_height,
            });
        }

        let region = &hf.region;
        check_non_negative(errors, "header_footer.region.tolerance", region.tolerance);
        check_band(
            errors,
            "header_footer.region.header_region_y",
            region.header_region_y,
            page_height,
        );
        check_band(
            errors,
            "header_footer.region.footer_region_y",
            region.footer_region_y,
            page_height,
        );
        let header_end = region.header_region_y + region.tolerance;
        let footer_start = region.footer_region_y - region.tolerance;
        if region.enabled && header_end >= footer_start {
            errors.push(ConfigIssue::OverlappingRegions {
                field: "header_footer.region".to_string(),
                header_end,
                footer_start,
            });
        }

        check_fraction(errors, "header_footer.frequency.threshold", hf.frequency.threshold);

        let ex = &hf.exclusion;
        if ex.min_length > ex.max_length {
            errors.push(ConfigIssue::InvalidLengthBounds {
                field: "header_footer.exclusion".to_string(),
                min: ex.min_length,
                max: ex.max_length,
            });
        }

        let multi = &hf.multi_region;
        if multi.enabled {
            if multi.max_regions == 0 {
                errors.push(ConfigIssue::InvalidRegion {
                    field: "header_footer.multi_region.max_regions".to_string(),
                    reason: "at least one region per role is required".to_string(),
                });
            }
            for role in [RegionRole::Header, RegionRole::Footer] {
                let count = 1 + multi
                    .extra_regions
                    .iter()
                    .filter(|r| r.role == role)
                    .count();
                if multi.max_regions > 0 && count > multi.max_regions {
                    errors.push(ConfigIssue::TooManyRegions {
                        field: format!("header_footer.multi_region.{:?}", role).to_lowercase(),
                        count,
                        max: multi.max_regions,
                    });
                }
            }
            for (i, extra) in multi.extra_regions.iter().enumerate() {
                let field = format!("header_footer.multi_region.extra_regions[{}]", i);
                check_non_negative(errors, &format!("{}.tolerance", field), extra.tolerance);
                check_band(errors, &format!("{}.y", field), extra.y, page_height);
            }
        }
    }

    fn validate_headers(&self, errors: &mut ConfigErrors) {
        let h = &self.headers;
        check_level(errors, "headers.max_level", h.max_level as i64);
        check_offset(errors, "headers.level_offset", h.level_offset);
        for (name, level) in &h.named_levels {
            check_level(errors, &format!("headers.named_levels.{}", name), *level as i64);
        }
        let has_patterns = !(h.numbered.is_empty()
            && h.lettered.is_empty()
            && h.roman.is_empty()
            && h.named.is_empty());
        if h.enabled && !has_patterns && !h.heuristic_fallback {
            errors.push(ConfigIssue::EmptyPatternList {
                field: "headers".to_string(),
            });
        }
    }

    fn validate_lists(&self, errors: &mut ConfigErrors) {
        let l = &self.lists;
        check_level(errors, "lists.max_level", l.max_level as i64);
        let has_patterns = !(l.numbered.is_empty()
            && l.lettered.is_empty()
            && l.bullet.is_empty()
            && l.roman.is_empty()
            && l.custom.is_empty());
        if l.enabled && !has_patterns {
            errors.push(ConfigIssue::EmptyPatternList {
                field: "lists".to_string(),
            });
        }
        if l.use_indentation && !(l.level_threshold > 0.0) {
            errors.push(ConfigIssue::InvalidValue {
                field: "lists.level_threshold".to_string(),
                reason: format!("indentation step must be positive, got {}", l.level_threshold),
            });
        }
    }

    fn validate_markdown(&self, errors: &mut ConfigErrors) {
        let m = &self.markdown;
        check_level(errors, "markdown.max_level", m.max_level as i64);
        check_level(errors, "markdown.toc_max_depth", m.toc_max_depth as i64);
        check_offset(errors, "markdown.header_level_offset", m.header_level_offset);
    }
}

fn check_fraction(errors: &mut ConfigErrors, field: &str, value: f32) {
    if !(0.0..=1.0).contains(&value) {
        errors.push(ConfigIssue::ThresholdOutOfRange {
            field: field.to_string(),
            value,
        });
    }
}

fn check_non_negative(errors: &mut ConfigErrors, field: &str, value: f32) {
    if !(value >= 0.0) {
        errors.push(ConfigIssue::NegativeValue {
            field: field.to_string(),
            value,
        });
    }
}

fn check_band(errors: &mut ConfigErrors, field: &str, y: f32, page_height: f32) {
    if !(y >= 0.0 && y <= page_height) {
        errors.push(ConfigIssue::InvalidRegion {
            field: field.to_string(),
            reason: format!("band center {} lies outside the page (0..={})", y, page_height),
        });
    }
}

fn check_level(errors: &mut ConfigErrors, field: &str, value: i64) {
    if !(1..=6).contains(&value) {
        errors.push(ConfigIssue::InvalidLevel {
            field: field.to_string(),
            value,
        });
    }
}

fn check_offset(errors: &mut ConfigErrors, field: &str, value: i32) {
    if !(-6..=6).contains(&value) {
        errors.push(ConfigIssue::InvalidValue {
            field: field.to_string(),
            reason: format!("level offset must be within -6..=6, got {}", value),
        });
    }
}

/// A configuration that passed validation, with its patterns compiled.
///
/// Stages only accept this type.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    config: PipelineConfig,
    header_patterns: HeaderPatterns,
    list_patterns: ListPatterns,
}

impl ValidatedConfig {
    /// The underlying configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Compiled heading patterns.
    pub fn header_patterns(&self) -> &HeaderPatterns {
        &self.header_patterns
    }

    /// Compiled list patterns.
    pub fn list_patterns(&self) -> &ListPatterns {
        &self.list_patterns
    }
}
