//! Table of contents generation.
//!
//! Headings are collected in document order and rendered as a nested bullet
//! list of anchor links. Anchors follow the usual Markdown renderer
//! convention: lowercase, punctuation dropped, spaces turned into hyphens,
//! and repeated slugs suffixed with `-1`, `-2`, ...

use indexmap::IndexMap;

/// One table of contents line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    /// Heading text
    pub title: String,
    /// Rendered heading level (1-based)
    pub level: u8,
    /// Anchor slug, without the leading `#`
    pub anchor: String,
}

/// Turn heading text into an anchor slug.
///
/// # Examples
///
/// ```
/// use fragdown::converters::toc::slugify;
///
/// assert_eq!(slugify("1.2 Scope & Goals"), "12-scope--goals");
/// assert_eq!(slugify("Résumé"), "résumé");
/// ```
pub fn slugify(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                Some(c)
            } else if c.is_whitespace() {
                Some('-')
            } else {
                None
            }
        })
        .collect()
}

/// Hands out unique anchors for a document.
#[derive(Debug, Clone, Default)]
pub struct SlugRegistry {
    seen: IndexMap<String, usize>,
}

impl SlugRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Unique anchor for `text`: the plain slug the first time, then the
    /// slug with `-1`, `-2`, ... appended.
    pub fn unique(&mut self, text: &str) -> String {
        let base = slugify(text);
        let Some(mut n) = self.seen.get(&base).copied() else {
            self.seen.insert(base.clone(), 0);
            return base;
        };

        let candidate = loop {
            n += 1;
            let candidate = format!("{}-{}", base, n);
            if !self.seen.contains_key(&candidate) {
                break candidate;
            }
        };
        self.seen.insert(base, n);
        self.seen.insert(candidate.clone(), 0);
        candidate
    }
}

/// Collects headings up to a maximum depth.
#[derive(Debug, Clone)]
pub struct TocBuilder {
    max_depth: u8,
    registry: SlugRegistry,
    entries: Vec<TocEntry>,
}

impl TocBuilder {
    /// A builder listing levels `1..=max_depth`.
    pub fn new(max_depth: u8) -> Self {
        Self {
            max_depth,
            registry: SlugRegistry::new(),
            entries: Vec::new(),
        }
    }

    /// Reserve the anchor of a heading that is rendered but not listed,
    /// such as the table of contents' own title.
    pub fn reserve(&mut self, title: &str) {
        self.registry.unique(title);
    }

    /// Record a rendered heading.
    ///
    /// Every heading consumes an anchor, so that later links stay in step
    /// with the renderer, but only those within depth are listed.
    pub fn push(&mut self, title: &str, level: u8) {
        let title = title.trim();
        if title.is_empty() {
            return;
        }
        let anchor = self.registry.unique(title);
        if level <= self.max_depth {
            self.entries.push(TocEntry {
                title: title.to_string(),
                level,
                anchor,
            });
        }
    }

    /// Entries collected so far.
    pub fn entries(&self) -> &[TocEntry] {
        &self.entries
    }

    /// Render the collected entries under a `##` title, or `None` when
    /// there is nothing to list.
    pub fn render(&self, title: &str) -> Option<String> {
        let min_level = self.entries.iter().map(|e| e.level).min()?;
        let mut out = format!("## {}\n", title);
        for entry in &self.entries {
            let indent = "  ".repeat(usize::from(entry.level - min_level));
            out.push('\n');
            out.push_str(&format!(
                "{}- [{}](#{})",
                indent,
                escape_link_text(&entry.title),
                entry.anchor
            ));
        }
        Some(out)
    }
}

fn escape_link_text(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}
