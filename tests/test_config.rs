//! Integration tests for configuration loading and validation.

use fragdown::error::{ConfigIssue, Error};
use fragdown::pipeline::config::{
    DistanceThreshold, ExtraRegion, HeaderFooterMode, ListMarkerStyle, LogLevel, PipelineConfig,
    RegionRole,
};

fn issues(config: PipelineConfig) -> Vec<ConfigIssue> {
    match config.validate() {
        Err(Error::InvalidConfig(errors)) => errors.issues().to_vec(),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => Vec::new(),
    }
}

#[test]
fn test_defaults_are_valid() {
    assert!(PipelineConfig::default().validate().is_ok());
}

#[test]
fn test_partial_json_takes_defaults() {
    let json = r#"{
        "processing": {
            "overlap_threshold": 0.6,
            "merge_threshold": { "value": 8.0, "normalized": false }
        },
        "header_footer": { "mode": "drop" },
        "markdown": { "list_marker": "numbered", "include_toc": true },
        "log_level": "debug"
    }"#;
    let config = PipelineConfig::from_json(json).unwrap();
    assert_eq!(config.processing.overlap_threshold, 0.6);
    assert_eq!(
        config.processing.merge_threshold,
        DistanceThreshold::absolute(8.0)
    );
    assert_eq!(
        config.processing.horizontal_merge_threshold,
        DistanceThreshold::normalized(0.05)
    );
    assert_eq!(config.header_footer.mode, HeaderFooterMode::Drop);
    assert_eq!(config.markdown.list_marker, ListMarkerStyle::Numbered);
    assert!(config.markdown.include_toc);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert!(config.validate().is_ok());
}

#[test]
fn test_malformed_json() {
    let err = PipelineConfig::from_json("{ not json").unwrap_err();
    assert!(matches!(err, Error::ConfigParse(_)));
}

#[test]
fn test_all_violations_reported_together() {
    let mut config = PipelineConfig::default();
    config.processing.overlap_threshold = 1.5;
    config.header_footer.percentage.header_height = 0.6;
    config.header_footer.percentage.footer_height = 0.5;
    config.headers.enabled = true;
    config.lists.enabled = true;
    config.lists.custom = vec!["(unclosed".to_string()];

    let found = issues(config);
    assert!(found.len() >= 4, "{:?}", found);
    assert!(found.iter().any(|i| matches!(
        i,
        ConfigIssue::ThresholdOutOfRange { field, .. } if field == "processing.overlap_threshold"
    )));
    assert!(found
        .iter()
        .any(|i| matches!(i, ConfigIssue::OverlappingRegions { .. })));
    assert!(found.iter().any(|i| matches!(
        i,
        ConfigIssue::EmptyPatternList { field } if field == "headers"
    )));
    assert!(found.iter().any(|i| matches!(
        i,
        ConfigIssue::InvalidPattern { pattern, .. } if pattern == "(unclosed"
    )));
}

#[test]
fn test_error_message_lists_every_issue() {
    let mut config = PipelineConfig::default();
    config.processing.overlap_threshold = -0.1;
    config.headers.max_level = 9;
    let err = config.validate().unwrap_err();
    let message = err.to_string();
    assert!(message.contains("processing.overlap_threshold"), "{}", message);
    assert!(message.contains("headers.max_level"), "{}", message);
}

#[test]
fn test_region_bounds() {
    let mut config = PipelineConfig::default();
    config.header_footer.region.enabled = true;
    config.header_footer.region.header_region_y = 400.0;
    config.header_footer.region.footer_region_y = 380.0;
    config.header_footer.region.tolerance = -1.0;
    let found = issues(config);
    assert!(found
        .iter()
        .any(|i| matches!(i, ConfigIssue::OverlappingRegions { field, .. } if field == "header_footer.region")));
    assert!(found
        .iter()
        .any(|i| matches!(i, ConfigIssue::NegativeValue { .. })));

    let mut config = PipelineConfig::default();
    config.header_footer.region.footer_region_y = 900.0;
    assert!(issues(config)
        .iter()
        .any(|i| matches!(i, ConfigIssue::InvalidRegion { .. })));
}

#[test]
fn test_multi_region_limit() {
    let mut config = PipelineConfig::default();
    config.header_footer.multi_region.enabled = true;
    config.header_footer.multi_region.max_regions = 2;
    for y in [60.0, 90.0] {
        config.header_footer.multi_region.extra_regions.push(ExtraRegion {
            role: RegionRole::Header,
            y,
            tolerance: 6.0,
        });
    }
    let found = issues(config);
    assert!(found
        .iter()
        .any(|i| matches!(i, ConfigIssue::TooManyRegions { count: 3, max: 2, .. })));
}

#[test]
fn test_normalized_threshold_above_one_rejected() {
    let mut config = PipelineConfig::default();
    config.processing.merge_threshold = DistanceThreshold::normalized(2.0);
    config.processing.horizontal_merge_threshold = DistanceThreshold::absolute(30.0);
    let found = issues(config);
    assert_eq!(found.len(), 1, "{:?}", found);
    assert!(matches!(
        &found[0],
        ConfigIssue::ThresholdOutOfRange { field, .. } if field == "processing.merge_threshold"
    ));
}

#[test]
fn test_length_bounds_and_levels() {
    let mut config = PipelineConfig::default();
    config.header_footer.exclusion.min_length = 50;
    config.header_footer.exclusion.max_length = 10;
    config.markdown.toc_max_depth = 0;
    config.headers.named_levels.insert("Part".to_string(), 7);
    let found = issues(config);
    assert!(found
        .iter()
        .any(|i| matches!(i, ConfigIssue::InvalidLengthBounds { min: 50, max: 10, .. })));
    assert!(found.iter().any(|i| matches!(
        i,
        ConfigIssue::InvalidLevel { field, value: 0 } if field == "markdown.toc_max_depth"
    )));
    assert!(found.iter().any(|i| matches!(
        i,
        ConfigIssue::InvalidLevel { value: 7, .. }
    )));
}

#[test]
fn test_heuristic_only_headers_are_valid() {
    let mut config = PipelineConfig::default();
    config.headers.enabled = true;
    config.headers.heuristic_fallback = true;
    assert!(config.validate().is_ok());
}

#[test]
fn test_indentation_requires_positive_step() {
    let mut config = PipelineConfig::default();
    config.lists.enabled = true;
    config.lists.bullet = vec![r"^-\s".to_string()];
    config.lists.use_indentation = true;
    config.lists.level_threshold = 0.0;
    assert!(issues(config)
        .iter()
        .any(|i| matches!(i, ConfigIssue::InvalidValue { field, .. } if field == "lists.level_threshold")));
}

#[test]
fn test_validated_config_exposes_compiled_patterns() {
    let mut config = PipelineConfig::default();
    config.headers.enabled = true;
    config.headers.numbered = vec![r"^(\d+)\s".to_string(), r"^(\d+\.\d+)\s".to_string()];
    let validated = config.validate().unwrap();
    assert_eq!(validated.header_patterns().numbered.len(), 2);
    assert!(validated.list_patterns().is_empty());
    assert!(validated.config().headers.enabled);
}

#[test]
fn test_level_offsets_are_bounded() {
    let json = r#"{
        "headers": { "enabled": true, "numbered": ["^(\\d+)\\s"], "level_offset": 2147483647 },
        "markdown": { "header_level_offset": -7 }
    }"#;
    let found = issues(PipelineConfig::from_json(json).unwrap());
    assert_eq!(found.len(), 2, "{:?}", found);
    assert!(found.iter().any(|i| matches!(
        i,
        ConfigIssue::InvalidValue { field, .. } if field == "headers.level_offset"
    )));
    assert!(found.iter().any(|i| matches!(
        i,
        ConfigIssue::InvalidValue { field, .. } if field == "markdown.header_level_offset"
    )));

    let mut config = PipelineConfig::default();
    config.headers.level_offset = -6;
    config.markdown.header_level_offset = 6;
    assert!(config.validate().is_ok());
}
