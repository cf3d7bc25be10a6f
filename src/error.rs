//! Error types for the fragment pipeline.
//!
//! This module defines every error that can surface while validating
//! configuration, running the layout stages, or rendering Markdown.

use std::fmt;

/// Result type alias for fragment pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during fragment processing.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Rendering was requested for an empty fragment sequence.
    #[error("no elements to process")]
    NoElements,

    /// Configuration failed validation; carries every violated constraint.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(ConfigErrors),

    /// Configuration text could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// A distance threshold was compared against fragments in the other coordinate space.
    #[error(
        "Coordinate space mismatch for {threshold}: threshold is {expected}, fragment is {found}"
    )]
    CoordinateSpaceMismatch {
        /// Name of the threshold being applied
        threshold: &'static str,
        /// Space the threshold is expressed in
        expected: &'static str,
        /// Space the fragment is expressed in
        found: &'static str,
    },

    /// The fragment producer failed to deliver a page.
    #[error("Fragment source error: {0}")]
    Source(String),
}

/// A single violated configuration constraint.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigIssue {
    /// A fractional value fell outside `[0, 1]`.
    #[error("{field} must be within [0, 1], got {value}")]
    ThresholdOutOfRange {
        /// Dotted path of the offending field
        field: String,
        /// Offending value
        value: f32,
    },

    /// An absolute quantity was negative.
    #[error("{field} must not be negative, got {value}")]
    NegativeValue {
        /// Dotted path of the offending field
        field: String,
        /// Offending value
        value: f32,
    },

    /// Detection is enabled but no patterns were supplied.
    #[error("{field} requires at least one pattern")]
    EmptyPatternList {
        /// Dotted path of the pattern section
        field: String,
    },

    /// A pattern failed to compile.
    #[error("{field}: pattern '{pattern}' does not compile: {reason}")]
    InvalidPattern {
        /// Dotted path of the pattern list
        field: String,
        /// The pattern text
        pattern: String,
        /// Compiler message
        reason: String,
    },

    /// A region definition is malformed.
    #[error("{field}: {reason}")]
    InvalidRegion {
        /// Dotted path of the region
        field: String,
        /// What is wrong with it
        reason: String,
    },

    /// Header and footer bands intersect.
    #[error("header band (ends at {header_end}) overlaps footer band (starts at {footer_start}) in {field}")]
    OverlappingRegions {
        /// Which strategy's bands overlap
        field: String,
        /// Lower edge of the header band
        header_end: f32,
        /// Upper edge of the footer band
        footer_start: f32,
    },

    /// More regions were configured than the multi-region limit allows.
    #[error("{field} defines {count} regions, maximum is {max}")]
    TooManyRegions {
        /// Dotted path of the region list
        field: String,
        /// Configured count
        count: usize,
        /// Allowed maximum
        max: usize,
    },

    /// A heading/list level is outside `1..=6`.
    #[error("{field} must be within 1..=6, got {value}")]
    InvalidLevel {
        /// Dotted path of the offending field
        field: String,
        /// Offending value
        value: i64,
    },

    /// A value violates a constraint not covered above.
    #[error("{field}: {reason}")]
    InvalidValue {
        /// Dotted path of the offending field
        field: String,
        /// What is wrong with it
        reason: String,
    },

    /// Minimum length exceeds maximum length.
    #[error("{field}: min_length {min} exceeds max_length {max}")]
    InvalidLengthBounds {
        /// Dotted path of the bounds
        field: String,
        /// Configured minimum
        min: usize,
        /// Configured maximum
        max: usize,
    },
}

/// Every constraint violated by a configuration, reported together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigErrors {
    issues: Vec<ConfigIssue>,
}

impl ConfigErrors {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation.
    pub fn push(&mut self, issue: ConfigIssue) {
        self.issues.push(issue);
    }

    /// Whether no violations were recorded.
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Number of recorded violations.
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// The recorded violations in discovery order.
    pub fn issues(&self) -> &[ConfigIssue] {
        &self.issues
    }

    /// Turn the collection into a result: `Ok(())` when empty.
    pub fn into_result(self) -> Result<()> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidConfig(self))
        }
    }
}

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} issue(s)", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "; {}", issue)?;
        }
        Ok(())
    }
}
