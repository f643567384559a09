//! Styled text produced by the formatter.
//!
//! A citation is built as a flat list of spans. Markup is applied only when a
//! fragment is rendered, so the same fragment yields plain text or inline
//! HTML.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether emphasis and links are rendered as markup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    #[default]
    Plain,
    Markup,
}

/// A run of text with one presentation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Plain(String),
    Italic(String),
    Link(String),
}

impl Span {
    pub fn text(&self) -> &str {
        match self {
            Span::Plain(s) | Span::Italic(s) | Span::Link(s) => s,
        }
    }

    fn render(&self, mode: RenderMode) -> String {
        match (mode, self) {
            (RenderMode::Plain, span) => span.text().to_string(),
            (RenderMode::Markup, Span::Plain(s)) => html_escape::encode_text(s).into_owned(),
            (RenderMode::Markup, Span::Italic(s)) => {
                format!("<i>{}</i>", html_escape::encode_text(s))
            }
            (RenderMode::Markup, Span::Link(url)) => format!(
                r#"<a href="{}" target="_blank">{}</a>"#,
                html_escape::encode_double_quoted_attribute(url),
                html_escape::encode_text(url)
            ),
        }
    }
}

/// A sequence of spans
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    spans: Vec<Span>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    fn single(span: Span) -> Self {
        if span.text().is_empty() {
            Self::new()
        } else {
            Self { spans: vec![span] }
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::single(Span::Plain(text.into()))
    }

    pub fn italic(text: impl Into<String>) -> Self {
        Self::single(Span::Italic(text.into()))
    }

    pub fn link(url: impl Into<String>) -> Self {
        Self::single(Span::Link(url.into()))
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.iter().all(|s| s.text().is_empty())
    }

    /// The text with all presentation stripped
    pub fn text(&self) -> String {
        self.spans.iter().map(Span::text).collect()
    }

    /// Append plain text, merging into a trailing plain span
    pub fn push_str(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.spans.last_mut() {
            Some(Span::Plain(last)) => last.push_str(text),
            _ => self.spans.push(Span::Plain(text.to_string())),
        }
    }

    pub fn append(&mut self, other: Fragment) {
        for span in other.spans {
            match span {
                Span::Plain(s) => self.push_str(&s),
                span if span.text().is_empty() => {}
                span => self.spans.push(span),
            }
        }
    }

    /// This fragment directly followed by `other`
    pub fn then(mut self, other: Fragment) -> Self {
        self.append(other);
        self
    }

    pub fn render(&self, mode: RenderMode) -> String {
        self.spans.iter().map(|s| s.render(mode)).collect()
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

impl From<&str> for Fragment {
    fn from(text: &str) -> Self {
        Self::plain(text)
    }
}

impl From<String> for Fragment {
    fn from(text: String) -> Self {
        Self::plain(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_spans_are_dropped() {
        assert!(Fragment::italic("").is_empty());
        assert!(Fragment::plain("").spans().is_empty());
        assert!(Fragment::new().then(Fragment::link("")).spans().is_empty());
    }

    #[test]
    fn test_plain_spans_merge() {
        let f = Fragment::plain("a").then(Fragment::plain("b")).then(Fragment::italic("c"));
        assert_eq!(
            f.spans(),
            &[Span::Plain("ab".into()), Span::Italic("c".into())]
        );
        assert_eq!(f.text(), "abc");
    }

    #[test]
    fn test_render_plain() {
        let f = Fragment::italic("Journal")
            .then(Fragment::plain(", 5. "))
            .then(Fragment::link("https://doi.org/x"));
        assert_eq!(f.render(RenderMode::Plain), "Journal, 5. https://doi.org/x");
    }

    #[test]
    fn test_render_markup() {
        let f = Fragment::plain("A & B ")
            .then(Fragment::italic("<Title>"))
            .then(Fragment::plain(" "))
            .then(Fragment::link("https://x.org/?a=1&b=\"2\""));
        assert_eq!(
            f.render(RenderMode::Markup),
            "A &amp; B <i>&lt;Title&gt;</i> <a href=\"https://x.org/?a=1&amp;b=&quot;2&quot;\" target=\"_blank\">https://x.org/?a=1&amp;b=\"2\"</a>"
        );
    }
}
