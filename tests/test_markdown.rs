//! Integration tests for Markdown assembly.

use fragdown::converters::{MarkdownAssembler, OutputConverter};
use fragdown::error::Error;
use fragdown::fragment::{Fragment, FragmentKind};
use fragdown::geometry::Rect;
use fragdown::pipeline::config::{ListMarkerStyle, PipelineConfig, ValidatedConfig};
use fragdown::pipeline::StageLog;

fn frag(kind: FragmentKind, text: &str, y: f32) -> Fragment {
    Fragment::new(kind, Rect::new(0.1, y, 0.8, 0.04), 1).with_text(text)
}

fn render(fragments: &[Fragment], config: &ValidatedConfig) -> fragdown::Result<String> {
    MarkdownAssembler::new().convert(fragments, config, &StageLog::quiet())
}

fn default_config() -> ValidatedConfig {
    PipelineConfig::default().validate().unwrap()
}

#[test]
fn test_round_trip_minimalism() {
    let out = render(
        &[frag(FragmentKind::Title, "Simple Title", 0.1)],
        &default_config(),
    )
    .unwrap();
    assert_eq!(out, "# Simple Title");
}

#[test]
fn test_empty_input_never_renders_empty_string() {
    let err = render(&[], &default_config()).unwrap_err();
    assert!(matches!(err, Error::NoElements));
}

#[test]
fn test_no_horizontal_rules_between_pages() {
    let fragments = vec![
        Fragment::new(FragmentKind::Paragraph, Rect::new(0.1, 0.5, 0.8, 0.1), 1)
            .with_text("End of page one."),
        Fragment::new(FragmentKind::Paragraph, Rect::new(0.1, 0.1, 0.8, 0.1), 2)
            .with_text("Start of page two."),
    ];
    let out = render(&fragments, &default_config()).unwrap();
    assert_eq!(out, "End of page one.\n\nStart of page two.");
}

#[test]
fn test_paragraph_text_is_unmodified() {
    let text = "Line one\nline  two with *stars*";
    let out = render(&[frag(FragmentKind::Paragraph, text, 0.3)], &default_config()).unwrap();
    assert_eq!(out, text);
}

#[test]
fn test_list_marker_styles() {
    let items = vec![
        frag(FragmentKind::ListItem, "first", 0.3),
        frag(FragmentKind::ListItem, "second", 0.35).with_level(2),
        frag(FragmentKind::ListItem, "third", 0.4),
    ];

    let cases = [
        (ListMarkerStyle::Dash, "- first\n\n  - second\n\n- third"),
        (ListMarkerStyle::Asterisk, "* first\n\n  * second\n\n* third"),
        (ListMarkerStyle::Plus, "+ first\n\n  + second\n\n+ third"),
        (ListMarkerStyle::Numbered, "1. first\n\n  1. second\n\n2. third"),
    ];
    for (style, expected) in cases {
        let mut config = PipelineConfig::default();
        config.markdown.list_marker = style;
        let out = render(&items, &config.validate().unwrap()).unwrap();
        assert_eq!(out, expected, "{:?}", style);
    }
}

#[test]
fn test_footnotes_and_images_are_numbered() {
    let fragments = vec![
        frag(FragmentKind::Footnote, "First note.", 0.8),
        frag(FragmentKind::Image, "Figure 1", 0.2),
        frag(FragmentKind::Image, "", 0.5),
        frag(FragmentKind::Footnote, "Second note.", 0.9),
    ];
    let mut config = PipelineConfig::default();
    config.markdown.image_prefix = "fig".to_string();
    let out = render(&fragments, &config.validate().unwrap()).unwrap();
    assert_eq!(
        out,
        "[^1]: First note.\n\n![Figure 1](fig_p1_1.png)\n\n![image](fig_p1_2.png)\n\n[^2]: Second note."
    );
}

#[test]
fn test_toc_depth_and_duplicate_anchors() {
    let mut config = PipelineConfig::default();
    config.markdown.include_toc = true;
    config.markdown.toc_max_depth = 2;
    config.markdown.toc_title = "Contents".to_string();
    let fragments = vec![
        frag(FragmentKind::Header, "Notes", 0.1).with_level(1),
        frag(FragmentKind::Header, "Deep", 0.2).with_level(3),
        frag(FragmentKind::Header, "Notes", 0.3).with_level(2),
    ];
    let out = render(&fragments, &config.validate().unwrap()).unwrap();
    assert!(out.starts_with("## Contents\n\n- [Notes](#notes)\n  - [Notes](#notes-1)\n\n# Notes"));
}

#[test]
fn test_toc_with_no_headings_is_omitted() {
    let mut config = PipelineConfig::default();
    config.markdown.include_toc = true;
    let out = render(
        &[frag(FragmentKind::Paragraph, "Just text.", 0.3)],
        &config.validate().unwrap(),
    )
    .unwrap();
    assert_eq!(out, "Just text.");
}

#[test]
fn test_negative_offset_clamps_to_one() {
    let mut config = PipelineConfig::default();
    config.markdown.header_level_offset = -3;
    let out = render(
        &[frag(FragmentKind::Header, "Top", 0.3).with_level(2)],
        &config.validate().unwrap(),
    )
    .unwrap();
    assert_eq!(out, "# Top");
}
