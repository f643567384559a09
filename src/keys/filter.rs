//! Case-insensitive token filtering over text lines and search texts.

use regex::{Regex, RegexBuilder};

/// A query split on spaces; a text passes when every token occurs in it.
#[derive(Debug, Clone, Default)]
pub struct TokenFilter {
    tokens: Vec<Regex>,
}

impl TokenFilter {
    pub fn new(query: &str) -> Self {
        let tokens = query
            .split(' ')
            .filter(|t| !t.is_empty())
            .filter_map(|t| {
                RegexBuilder::new(&regex::escape(t))
                    .case_insensitive(true)
                    .build()
                    .ok()
            })
            .collect();
        Self { tokens }
    }

    /// An empty query passes everything
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn matches(&self, text: &str) -> bool {
        self.tokens.iter().all(|t| t.is_match(text))
    }
}

/// A line kept by [`filter_lines`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilteredLine<'a> {
    /// A `#` line, always kept
    Heading(&'a str),
    Entry(&'a str),
}

impl<'a> FilteredLine<'a> {
    pub fn text(&self) -> &'a str {
        match self {
            FilteredLine::Heading(s) | FilteredLine::Entry(s) => s,
        }
    }
}

/// Non-empty lines of `text`, headings always, entries only when they pass.
pub fn filter_lines<'a>(text: &'a str, filter: &TokenFilter) -> Vec<FilteredLine<'a>> {
    text.lines()
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            if line.starts_with('#') {
                Some(FilteredLine::Heading(line))
            } else if filter.matches(line) {
                Some(FilteredLine::Entry(line))
            } else {
                None
            }
        })
        .collect()
}
