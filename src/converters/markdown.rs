//! Markdown assembly for classified fragment sequences.
//!
//! Rendering is per fragment kind:
//! - Title / Header: ATX heading (`#` × level)
//! - Paragraph / TextBlock / List / Unknown: raw text
//! - ListItem: configured marker, two spaces of indent per nesting level
//! - Table: fenced block around the raw text, fence longer than any
//!   backtick run inside it
//! - Footer: emphasis
//! - Footnote: `[^n]: text`, referenced from the closest prose block before
//!   it on the same page (left unreferenced when there is none)
//! - PageNumber: `**Page N**`
//! - Image: image link to a generated placeholder filename
//! - Barcode: code span annotated as a barcode
//!
//! Renderings are joined with blank lines. Fragments that render to nothing
//! (for example empty text) are skipped.

use crate::converters::toc::TocBuilder;
use crate::converters::OutputConverter;
use crate::error::{Error, Result};
use crate::fragment::{Fragment, FragmentKind};
use crate::layout::classifier::{META_LIST_MARKER, META_LIST_MARKER_SPAN};
use crate::pipeline::config::{ListMarkerStyle, MarkdownConfig, ValidatedConfig};
use crate::pipeline::logging::StageLog;
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// First number in a page label ("Page 4 of 10" → 4)
    static ref RE_FIRST_NUMBER: Regex = Regex::new(r"\d+").unwrap();
}

/// Markdown assembler.
///
/// # Examples
///
/// ```
/// use fragdown::converters::{MarkdownAssembler, OutputConverter};
/// use fragdown::fragment::{Fragment, FragmentKind};
/// use fragdown::geometry::Rect;
/// use fragdown::pipeline::config::PipelineConfig;
/// use fragdown::pipeline::logging::StageLog;
///
/// # fn main() -> fragdown::Result<()> {
/// let config = PipelineConfig::default().validate()?;
/// let title = Fragment::new(FragmentKind::Title, Rect::new(0.1, 0.1, 0.8, 0.05), 1)
///     .with_text("Simple Title");
///
/// let markdown = MarkdownAssembler::new().convert(&[title], &config, &StageLog::quiet())?;
/// assert_eq!(markdown, "# Simple Title");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownAssembler;

impl MarkdownAssembler {
    /// Create a new assembler.
    pub fn new() -> Self {
        Self
    }
}

impl OutputConverter for MarkdownAssembler {
    fn convert(
        &self,
        fragments: &[Fragment],
        config: &ValidatedConfig,
        log: &StageLog,
    ) -> Result<String> {
        let log = log.for_stage("markdown");
        if fragments.is_empty() {
            return Err(Error::NoElements);
        }

        let md = &config.config().markdown;
        let page_height = config.config().processing.page_height;
        let mut state = RenderState::new(md);

        for fragment in fragments {
            state.push(fragment, page_height);
        }

        let blocks = state.blocks.len();
        let mut body = state.blocks.join("\n\n");
        if md.include_toc {
            if let Some(toc) = state.toc.render(&md.toc_title) {
                body = if body.is_empty() {
                    toc
                } else {
                    format!("{}\n\n{}", toc, body)
                };
            }
        }

        log.debug(format_args!(
            "rendered {} blocks from {} fragments",
            blocks,
            fragments.len()
        ));
        Ok(body)
    }

    fn name(&self) -> &'static str {
        "markdown"
    }
}

/// Rendered heading level of a Title/Header fragment.
///
/// Uses the pattern-derived level when present. A Header without one falls
/// back to position-proportional banding when enabled: the page is split into
/// `max_level` equal bands from the top and the band index plus one is the
/// level. `header_level_offset` is then added and the result clamped to
/// `1..=max_level`.
pub fn heading_level(fragment: &Fragment, config: &MarkdownConfig, page_height: f32) -> u8 {
    let max = config.max_level.clamp(1, 6);
    let base = match fragment.level() {
        Some(level) => level,
        None if fragment.kind() == FragmentKind::Header && config.positional_levels => {
            positional_level(fragment.vertical_fraction(page_height), max)
        }
        None => 1,
    };
    i32::from(base)
        .saturating_add(config.header_level_offset)
        .clamp(1, i32::from(max)) as u8
}

fn positional_level(fraction: f32, max_level: u8) -> u8 {
    let bands = f32::from(max_level);
    let band = (fraction.clamp(0.0, 1.0) * bands).floor().min(bands - 1.0);
    band as u8 + 1
}

/// Counters that persist across fragments of one document.
struct RenderState<'a> {
    config: &'a MarkdownConfig,
    toc: TocBuilder,
    list_counters: Vec<usize>,
    footnotes: usize,
    images_per_page: IndexMap<u32, usize>,
    blocks: Vec<String>,
    /// Last prose block (index, page) a footnote reference can attach to
    anchor: Option<(usize, u32)>,
}

impl<'a> RenderState<'a> {
    fn new(config: &'a MarkdownConfig) -> Self {
        let mut toc = TocBuilder::new(config.toc_max_depth);
        if config.include_toc {
            toc.reserve(&config.toc_title);
        }
        Self {
            config,
            toc,
            list_counters: Vec::new(),
            footnotes: 0,
            images_per_page: IndexMap::new(),
            blocks: Vec::new(),
            anchor: None,
        }
    }

    fn push(&mut self, fragment: &Fragment, page_height: f32) {
        let Some(block) = self.render(fragment, page_height) else {
            return;
        };
        match fragment.kind() {
            FragmentKind::Paragraph
            | FragmentKind::TextBlock
            | FragmentKind::List
            | FragmentKind::ListItem
            | FragmentKind::Unknown => {
                self.anchor = Some((self.blocks.len(), fragment.page()));
            }
            FragmentKind::Footnote => {
                let reference = format!("[^{}]", self.footnotes);
                let anchor = self.anchor.filter(|(_, page)| *page == fragment.page());
                if let Some((index, _)) = anchor {
                    self.blocks[index].push_str(&reference);
                }
            }
            _ => {}
        }
        self.blocks.push(block);
    }

    fn render(&mut self, fragment: &Fragment, page_height: f32) -> Option<String> {
        if fragment.kind() != FragmentKind::ListItem {
            self.list_counters.clear();
        }

        let text = fragment.text_or_empty();
        let trimmed = text.trim();

        match fragment.kind() {
            FragmentKind::Title | FragmentKind::Header => {
                if trimmed.is_empty() {
                    return None;
                }
                let level = heading_level(fragment, self.config, page_height);
                self.toc.push(trimmed, level);
                Some(format!("{} {}", "#".repeat(usize::from(level)), trimmed))
            }
            FragmentKind::Paragraph
            | FragmentKind::TextBlock
            | FragmentKind::List
            | FragmentKind::Unknown => (!trimmed.is_empty()).then(|| text.to_string()),
            FragmentKind::ListItem => self.render_list_item(fragment, trimmed),
            FragmentKind::Table => (!trimmed.is_empty()).then(|| {
                let fence = code_fence(text);
                format!("{}\n{}\n{}", fence, text, fence)
            }),
            FragmentKind::Footer => (!trimmed.is_empty()).then(|| format!("*{}*", trimmed)),
            FragmentKind::Footnote => {
                if trimmed.is_empty() {
                    return None;
                }
                self.footnotes += 1;
                Some(format!("[^{}]: {}", self.footnotes, trimmed))
            }
            FragmentKind::PageNumber => {
                let number = RE_FIRST_NUMBER
                    .find(trimmed)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_else(|| fragment.page().to_string());
                Some(format!("**Page {}**", number))
            }
            FragmentKind::Image => {
                let n = self.images_per_page.entry(fragment.page()).or_default();
                *n += 1;
                let alt = if trimmed.is_empty() { "image" } else { trimmed };
                Some(format!(
                    "![{}]({}_p{}_{}.png)",
                    alt,
                    self.config.image_prefix,
                    fragment.page(),
                    n
                ))
            }
            FragmentKind::Barcode => {
                (!trimmed.is_empty()).then(|| format!("`{}` (barcode)", trimmed))
            }
        }
    }

    fn render_list_item(&mut self, fragment: &Fragment, trimmed: &str) -> Option<String> {
        let body = strip_marker(fragment, trimmed);
        if body.is_empty() {
            return None;
        }

        let level = usize::from(fragment.level().unwrap_or(1).max(1));
        self.list_counters.resize(level, 0);
        self.list_counters[level - 1] += 1;

        let marker = match self.config.list_marker {
            ListMarkerStyle::Dash => "-".to_string(),
            ListMarkerStyle::Asterisk => "*".to_string(),
            ListMarkerStyle::Plus => "+".to_string(),
            ListMarkerStyle::Numbered => format!("{}.", self.list_counters[level - 1]),
        };
        Some(format!("{}{} {}", "  ".repeat(level - 1), marker, body))
    }
}

/// Backtick fence longer than any backtick run inside `text` (at least three).
fn code_fence(text: &str) -> String {
    let longest = text
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

/// Text of a list item without the marker detected during classification.
fn strip_marker<'t>(fragment: &Fragment, trimmed: &'t str) -> &'t str {
    let meta = fragment.metadata();
    if let Some(rest) = meta
        .get(META_LIST_MARKER_SPAN)
        .and_then(|span| trimmed.strip_prefix(span.as_str()))
    {
        return rest.trim_start();
    }
    if let Some(rest) = meta
        .get(META_LIST_MARKER)
        .filter(|m| !m.is_empty())
        .and_then(|marker| trimmed.strip_prefix(marker.as_str()))
    {
        return rest.trim_start_matches(['.', ')']).trim_start();
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::pipeline::config::PipelineConfig;

    fn frag(kind: FragmentKind, text: &str) -> Fragment {
        Fragment::new(kind, Rect::new(0.1, 0.3, 0.8, 0.04), 1).with_text(text)
    }

    fn render(fragments: &[Fragment], config: PipelineConfig) -> String {
        let config = config.validate().unwrap();
        MarkdownAssembler::new()
            .convert(fragments, &config, &StageLog::quiet())
            .unwrap()
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let config = PipelineConfig::default().validate().unwrap();
        let err = MarkdownAssembler::new()
            .convert(&[], &config, &StageLog::quiet())
            .unwrap_err();
        assert!(matches!(err, Error::NoElements));
        assert_eq!(err.to_string(), "no elements to process");
    }

    #[test]
    fn test_single_title() {
        let out = render(&[frag(FragmentKind::Title, "Simple Title")], PipelineConfig::default());
        assert_eq!(out, "# Simple Title");
    }

    #[test]
    fn test_heading_offset_and_clamp() {
        let mut config = PipelineConfig::default();
        config.markdown.header_level_offset = 1;
        let heading = frag(FragmentKind::Header, "Scope").with_level(2);
        assert_eq!(render(&[heading.clone()], config.clone()), "### Scope");

        config.markdown.header_level_offset = 5;
        assert_eq!(render(&[heading], config), "###### Scope");
    }

    #[test]
    fn test_positional_banding() {
        let md = MarkdownConfig::default();
        let top = Fragment::new(FragmentKind::Header, Rect::new(0.0, 0.0, 1.0, 0.02), 1);
        let middle = Fragment::new(FragmentKind::Header, Rect::new(0.0, 0.55, 1.0, 0.02), 1);
        let bottom = Fragment::new(FragmentKind::Header, Rect::new(0.0, 0.98, 1.0, 0.02), 1);
        assert_eq!(heading_level(&top, &md, 792.0), 1);
        assert_eq!(heading_level(&middle, &md, 792.0), 4);
        assert_eq!(heading_level(&bottom, &md, 792.0), 6);

        let off = MarkdownConfig {
            positional_levels: false,
            ..Default::default()
        };
        assert_eq!(heading_level(&bottom, &off, 792.0), 1);
    }

    #[test]
    fn test_heading_level_saturates_on_extreme_offsets() {
        let heading = frag(FragmentKind::Header, "Scope").with_level(3);
        let high = MarkdownConfig {
            header_level_offset: i32::MAX,
            ..Default::default()
        };
        assert_eq!(heading_level(&heading, &high, 792.0), 6);

        let low = MarkdownConfig {
            header_level_offset: i32::MIN,
            ..Default::default()
        };
        assert_eq!(heading_level(&heading, &low, 792.0), 1);
    }

    #[test]
    fn test_per_kind_rendering() {
        let fragments = vec![
            frag(FragmentKind::Paragraph, "Body text."),
            frag(FragmentKind::Table, "a | b\n1 | 2"),
            frag(FragmentKind::Footer, "Confidential"),
            frag(FragmentKind::Footnote, "See appendix."),
            frag(FragmentKind::PageNumber, "Page 4 of 10"),
            frag(FragmentKind::Barcode, "0123456789"),
            Fragment::new(FragmentKind::Image, Rect::new(0.1, 0.5, 0.3, 0.3), 2),
        ];
        let out = render(&fragments, PipelineConfig::default());
        assert_eq!(
            out,
            "Body text.[^1]\n\n```\na | b\n1 | 2\n```\n\n*Confidential*\n\n[^1]: See appendix.\n\n\
             **Page 4**\n\n`0123456789` (barcode)\n\n![image](image_p2_1.png)"
        );
        assert!(!out.contains("---"));
    }

    #[test]
    fn test_footnote_reference_attaches_to_prose_on_same_page() {
        let on_page = |kind, text: &str, page| {
            Fragment::new(kind, Rect::new(0.1, 0.3, 0.8, 0.04), page).with_text(text)
        };
        let fragments = vec![
            on_page(FragmentKind::Paragraph, "Revenue grew.", 1),
            on_page(FragmentKind::Footnote, "Unaudited.", 1),
            on_page(FragmentKind::Footnote, "Restated.", 1),
            on_page(FragmentKind::Footnote, "Orphan.", 2),
        ];
        assert_eq!(
            render(&fragments, PipelineConfig::default()),
            "Revenue grew.[^1][^2]\n\n[^1]: Unaudited.\n\n[^2]: Restated.\n\n[^3]: Orphan."
        );
    }

    #[test]
    fn test_table_fence_outgrows_inner_backticks() {
        let table = frag(FragmentKind::Table, "a | ```b```\n````");
        assert_eq!(
            render(&[table], PipelineConfig::default()),
            "`````\na | ```b```\n````\n`````"
        );
        assert_eq!(code_fence("plain"), "```");
        assert_eq!(code_fence("x ` y"), "```");
    }

    #[test]
    fn test_page_number_without_digits_uses_page() {
        let f = Fragment::new(FragmentKind::PageNumber, Rect::new(0.4, 0.95, 0.2, 0.02), 7);
        assert_eq!(render(&[f], PipelineConfig::default()), "**Page 7**");
    }

    #[test]
    fn test_empty_text_is_skipped() {
        let fragments = vec![
            frag(FragmentKind::Paragraph, "   "),
            frag(FragmentKind::Paragraph, "kept"),
        ];
        assert_eq!(render(&fragments, PipelineConfig::default()), "kept");
    }

    #[test]
    fn test_list_items_strip_marker_and_indent() {
        let items = vec![
            frag(FragmentKind::ListItem, "• Apples")
                .with_level(1)
                .with_metadata(META_LIST_MARKER_SPAN, "• "),
            frag(FragmentKind::ListItem, "2) Seeds")
                .with_level(2)
                .with_metadata(META_LIST_MARKER, "2"),
        ];
        let out = render(&items, PipelineConfig::default());
        assert_eq!(out, "- Apples\n\n  - Seeds");
    }

    #[test]
    fn test_numbered_lists_restart_after_other_content() {
        let mut config = PipelineConfig::default();
        config.markdown.list_marker = ListMarkerStyle::Numbered;
        let fragments = vec![
            frag(FragmentKind::ListItem, "one"),
            frag(FragmentKind::ListItem, "two"),
            frag(FragmentKind::Paragraph, "break"),
            frag(FragmentKind::ListItem, "again"),
        ];
        assert_eq!(
            render(&fragments, config),
            "1. one\n\n2. two\n\nbreak\n\n1. again"
        );
    }

    #[test]
    fn test_table_of_contents() {
        let mut config = PipelineConfig::default();
        config.markdown.include_toc = true;
        config.markdown.toc_max_depth = 2;
        let fragments = vec![
            frag(FragmentKind::Title, "Report"),
            frag(FragmentKind::Header, "Scope").with_level(2),
            frag(FragmentKind::Header, "Detail").with_level(3),
            frag(FragmentKind::Paragraph, "Text."),
        ];
        let out = render(&fragments, config);
        assert!(out.starts_with(
            "## Table of Contents\n\n- [Report](#report)\n  - [Scope](#scope)\n\n# Report"
        ));
        assert!(!out.contains("(#detail)"));
        assert!(out.ends_with("### Detail\n\nText."));
    }
}
