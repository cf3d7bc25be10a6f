//! Compiled pattern sets for heading and list detection.
//!
//! Patterns are supplied by configuration as regular-expression strings and
//! compiled once, during validation. Compile failures are recorded as
//! configuration issues so they can never surface while processing.

use crate::error::{ConfigErrors, ConfigIssue};
use crate::pipeline::config::{HeaderPatternConfig, ListPatternConfig};
use regex::Regex;
use std::fmt;

/// Heading pattern categories, in matching priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderCategory {
    /// "Chapter 3", "Part II"
    Named,
    /// "1.2.3 Scope"
    Numbered,
    /// "B. Scope"
    Lettered,
    /// "IV. Scope"
    Roman,
    /// Short all-caps line
    Heuristic,
}

impl HeaderCategory {
    /// Confidence attached to a match of this category.
    ///
    /// Strictly ordered: named > numbered > lettered = roman > heuristic.
    pub fn confidence(&self) -> f32 {
        match self {
            HeaderCategory::Named => 0.95,
            HeaderCategory::Numbered => 0.9,
            HeaderCategory::Lettered => 0.8,
            HeaderCategory::Roman => 0.8,
            HeaderCategory::Heuristic => 0.5,
        }
    }

    /// Stable name for metadata and statistics.
    pub fn name(&self) -> &'static str {
        match self {
            HeaderCategory::Named => "named",
            HeaderCategory::Numbered => "numbered",
            HeaderCategory::Lettered => "lettered",
            HeaderCategory::Roman => "roman",
            HeaderCategory::Heuristic => "heuristic",
        }
    }
}

impl fmt::Display for HeaderCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// List marker categories, in matching priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListCategory {
    /// "•", "-", "*"
    Bullet,
    /// "1.", "2)"
    Numbered,
    /// "a)", "B."
    Lettered,
    /// "iv."
    Roman,
    /// Host-defined
    Custom,
}

impl ListCategory {
    /// Confidence attached to a match of this category.
    pub fn confidence(&self) -> f32 {
        match self {
            ListCategory::Bullet => 0.95,
            ListCategory::Numbered => 0.9,
            ListCategory::Lettered => 0.85,
            ListCategory::Roman => 0.8,
            ListCategory::Custom => 0.75,
        }
    }

    /// Stable name for metadata and statistics.
    pub fn name(&self) -> &'static str {
        match self {
            ListCategory::Bullet => "bullet",
            ListCategory::Numbered => "numbered",
            ListCategory::Lettered => "lettered",
            ListCategory::Roman => "roman",
            ListCategory::Custom => "custom",
        }
    }
}

impl fmt::Display for ListCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One category's compiled patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Regex>,
}

impl PatternSet {
    /// Compile every pattern, recording failures in `errors`.
    ///
    /// Patterns that fail are left out of the set; the caller rejects the
    /// configuration anyway because `errors` is non-empty.
    pub fn compile(field: &str, sources: &[String], errors: &mut ConfigErrors) -> Self {
        let mut patterns = Vec::with_capacity(sources.len());
        for source in sources {
            match Regex::new(source) {
                Ok(re) => patterns.push(re),
                Err(e) => errors.push(ConfigIssue::InvalidPattern {
                    field: field.to_string(),
                    pattern: source.clone(),
                    reason: e.to_string(),
                }),
            }
        }
        Self { patterns }
    }

    /// Whether the set holds no patterns.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Number of patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// First match in `text`: the token (capture group 1 when present,
    /// otherwise the whole match) and the full matched span.
    pub fn find<'t>(&self, text: &'t str) -> Option<PatternMatch<'t>> {
        self.patterns.iter().find_map(|re| {
            let caps = re.captures(text)?;
            let whole = caps.get(0)?;
            let token = caps.get(1).unwrap_or(whole);
            Some(PatternMatch {
                token: token.as_str(),
                matched: whole.as_str(),
            })
        })
    }
}

/// A successful pattern match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternMatch<'t> {
    /// Token used for level computation / marker extraction
    pub token: &'t str,
    /// The entire matched span
    pub matched: &'t str,
}

/// Compiled heading patterns by category.
#[derive(Debug, Clone, Default)]
pub struct HeaderPatterns {
    /// Named patterns
    pub named: PatternSet,
    /// Numbered patterns
    pub numbered: PatternSet,
    /// Lettered patterns
    pub lettered: PatternSet,
    /// Roman-numeral patterns
    pub roman: PatternSet,
}

impl HeaderPatterns {
    /// Compile every heading pattern list.
    pub fn compile(config: &HeaderPatternConfig, errors: &mut ConfigErrors) -> Self {
        Self {
            named: PatternSet::compile("headers.named", &config.named, errors),
            numbered: PatternSet::compile("headers.numbered", &config.numbered, errors),
            lettered: PatternSet::compile("headers.lettered", &config.lettered, errors),
            roman: PatternSet::compile("headers.roman", &config.roman, errors),
        }
    }

    /// Pattern sets in matching priority order.
    pub fn by_priority(&self) -> [(HeaderCategory, &PatternSet); 4] {
        [
            (HeaderCategory::Named, &self.named),
            (HeaderCategory::Numbered, &self.numbered),
            (HeaderCategory::Lettered, &self.lettered),
            (HeaderCategory::Roman, &self.roman),
        ]
    }

    /// Whether no heading pattern was supplied.
    pub fn is_empty(&self) -> bool {
        self.by_priority().iter().all(|(_, set)| set.is_empty())
    }
}

/// Compiled list patterns by category.
#[derive(Debug, Clone, Default)]
pub struct ListPatterns {
    /// Bullet patterns
    pub bullet: PatternSet,
    /// Numbered patterns
    pub numbered: PatternSet,
    /// Lettered patterns
    pub lettered: PatternSet,
    /// Roman-numeral patterns
    pub roman: PatternSet,
    /// Custom patterns
    pub custom: PatternSet,
}

impl ListPatterns {
    /// Compile every list pattern list.
    pub fn compile(config: &ListPatternConfig, errors: &mut ConfigErrors) -> Self {
        Self {
            bullet: PatternSet::compile("lists.bullet", &config.bullet, errors),
            numbered: PatternSet::compile("lists.numbered", &config.numbered, errors),
            lettered: PatternSet::compile("lists.lettered", &config.lettered, errors),
            roman: PatternSet::compile("lists.roman", &config.roman, errors),
            custom: PatternSet::compile("lists.custom", &config.custom, errors),
        }
    }

    /// Pattern sets in matching priority order.
    pub fn by_priority(&self) -> [(ListCategory, &PatternSet); 5] {
        [
            (ListCategory::Bullet, &self.bullet),
            (ListCategory::Numbered, &self.numbered),
            (ListCategory::Lettered, &self.lettered),
            (ListCategory::Roman, &self.roman),
            (ListCategory::Custom, &self.custom),
        ]
    }

    /// Whether no list pattern was supplied.
    pub fn is_empty(&self) -> bool {
        self.by_priority().iter().all(|(_, set)| set.is_empty())
    }
}
