//! The plain-text key-list format.
//!
//! One key per line. A line starting with `#` is a comment and passes through
//! untouched; a data line may pair a key with a replacement as
//! `requestedKey => replacementKey`.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Separator between a requested key and its replacement
pub const REPLACEMENT_ARROW: &str = "=>";

/// A single meaningful line of a key list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyLine {
    Comment(String),
    Request(KeyRequest),
}

/// A requested key with an optional hand-supplied replacement
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyRequest {
    pub requested: String,
    /// Empty when no replacement was given
    pub replacement: String,
}

impl KeyRequest {
    pub fn new(requested: impl Into<String>) -> Self {
        Self {
            requested: requested.into(),
            replacement: String::new(),
        }
    }

    /// Parse `requested [=> replacement]`. Anything after a second arrow is
    /// ignored.
    pub fn parse(line: &str) -> Self {
        let mut parts = line.split(REPLACEMENT_ARROW);
        let requested = parts.next().unwrap_or_default().trim().to_string();
        let replacement = parts.next().unwrap_or_default().trim().to_string();
        Self {
            requested,
            replacement,
        }
    }
}

impl fmt::Display for KeyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.replacement.is_empty() {
            write!(f, "{}", self.requested)
        } else {
            write!(f, "{} {} {}", self.requested, REPLACEMENT_ARROW, self.replacement)
        }
    }
}

/// A parsed key list. Blank lines are dropped, everything else is kept in
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyList {
    lines: Vec<KeyLine>,
}

impl KeyList {
    pub fn parse(text: &str) -> Self {
        let lines = text
            .lines()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| {
                let line = raw.trim();
                if line.starts_with('#') {
                    // comments are kept verbatim, indentation included
                    KeyLine::Comment(raw.to_string())
                } else {
                    KeyLine::Request(KeyRequest::parse(line))
                }
            })
            .collect();
        Self { lines }
    }

    /// Build a list of plain requests, e.g. from extracted keys
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: keys
                .into_iter()
                .map(|k| KeyLine::Request(KeyRequest::new(k)))
                .collect(),
        }
    }

    pub fn lines(&self) -> &[KeyLine] {
        &self.lines
    }

    pub fn comments(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(|line| match line {
            KeyLine::Comment(c) => Some(c.as_str()),
            KeyLine::Request(_) => None,
        })
    }

    pub fn requests(&self) -> impl Iterator<Item = &KeyRequest> {
        self.lines.iter().filter_map(|line| match line {
            KeyLine::Request(r) => Some(r),
            KeyLine::Comment(_) => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl FromStr for KeyList {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lines() {
        let list = KeyList::parse(
            "# chapter one\n\n  Smith（2020）  \nJones, 2019 => Jones & Lee, 2019\nA => B => C\n",
        );

        assert_eq!(list.lines().len(), 4);
        assert_eq!(list.comments().collect::<Vec<_>>(), vec!["# chapter one"]);

        let requests: Vec<_> = list.requests().collect();
        assert_eq!(requests[0], &KeyRequest::new("Smith（2020）"));
        assert_eq!(requests[1].requested, "Jones, 2019");
        assert_eq!(requests[1].replacement, "Jones & Lee, 2019");
        assert_eq!(requests[2].requested, "A");
        assert_eq!(requests[2].replacement, "B");
    }

    #[test]
    fn test_comment_kept_verbatim() {
        let list = KeyList::parse("  # indented note\nA");
        assert_eq!(list.comments().collect::<Vec<_>>(), vec!["  # indented note"]);
    }

    #[test]
    fn test_display() {
        assert_eq!(KeyRequest::new("A").to_string(), "A");
        assert_eq!(KeyRequest::parse("A=>B").to_string(), "A => B");
    }

    #[test]
    fn test_from_keys() {
        let list = KeyList::from_keys(["A（2000）", "B（2001）"]);
        assert_eq!(list.requests().count(), 2);
        assert_eq!(list.comments().count(), 0);
    }

    #[test]
    fn test_empty() {
        assert!("".parse::<KeyList>().unwrap().is_empty());
        assert!(KeyList::parse("\n \n").is_empty());
    }
}
