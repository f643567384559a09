//! Reconciling a requested key list against a reference batch.

use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;

use super::list::{KeyList, REPLACEMENT_ARROW};
use crate::models::{Reference, ReferenceBatch};

/// Suggested file name for an exported key diff
pub const DIFF_FILE_NAME: &str = "key-diff.txt";

static BRACKETED_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\d+\]").unwrap());
static PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[,&()（）]").unwrap());
static AND: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\band\b").unwrap());
static ET_AL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bet al\.").unwrap());

/// Errors from hand-correcting a diff
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("Row {0} does not exist")]
    RowOutOfRange(usize),

    #[error("Row {0} is matched and cannot be edited")]
    NotEditable(usize),
}

/// One lookup entry: the composite key and the text shown when it matches.
#[derive(Debug, Clone)]
struct Entry {
    composite: String,
    display: String,
}

/// Lookup over a batch's composite keys, in batch order.
#[derive(Debug, Clone, Default)]
pub struct KeyMatcher {
    entries: Vec<Entry>,
}

impl KeyMatcher {
    pub fn new(batch: &ReferenceBatch) -> Self {
        let entries: Vec<Entry> = batch
            .iter()
            .map(|r| Entry {
                composite: composite_key(r),
                display: r.search_text(),
            })
            .collect();
        tracing::debug!("Built matcher over {} composite keys", entries.len());
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the first entry whose composite key contains every token of
    /// `requested`. A request with no tokens left after normalization
    /// matches nothing.
    pub fn find(&self, requested: &str) -> Option<usize> {
        let tokens = tokenize(requested);
        if tokens.is_empty() {
            return None;
        }

        let patterns = tokens
            .iter()
            .map(|t| Regex::new(&regex::escape(t)))
            .collect::<Result<Vec<_>, _>>();
        let patterns = match patterns {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("Cannot match '{}': {}", requested, e);
                return None;
            }
        };

        self.entries.iter().position(|entry| {
            patterns
                .iter()
                .all(|p| occurs_as_word(p, &entry.composite))
        })
    }

    /// Display text of the first matching record
    pub fn lookup(&self, requested: &str) -> Option<&str> {
        self.find(requested).map(|i| self.entries[i].display.as_str())
    }

    /// Match every request of `list` and collect what was never cited.
    pub fn diff(&self, list: &KeyList) -> KeyDiff {
        let mut selected = HashSet::new();

        let rows: Vec<DiffRow> = list
            .requests()
            .map(|request| {
                let matched = match self.find(&request.requested) {
                    Some(index) => {
                        selected.insert(index);
                        self.entries[index].display.clone()
                    }
                    None => String::new(),
                };
                DiffRow {
                    requested: request.requested.clone(),
                    replacement: request.replacement.clone(),
                    editable: matched.is_empty(),
                    matched,
                }
            })
            .collect();

        let unmatched: Vec<Entry> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(i, _)| !selected.contains(i))
            .map(|(_, e)| e.clone())
            .collect();

        tracing::debug!(
            "Matched {} of {} requests, {} references never cited",
            rows.iter().filter(|r| r.is_matched()).count(),
            rows.len(),
            unmatched.len()
        );

        KeyDiff {
            comments: list.comments().map(str::to_string).collect(),
            rows,
            unmatched_references: unmatched.iter().map(|e| e.display.clone()).collect(),
            unmatched_entries: unmatched,
        }
    }
}

/// Authors joined for matching, `&` before the last, year and suffix appended
/// with no separator, e.g. `Smith & Jones2020`.
pub fn composite_key(reference: &Reference) -> String {
    let authors = match reference.authors.as_slice() {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{} & {}", first, second),
        [init @ .., last] => format!("{}, & {}", init.join(", "), last),
    };
    format!(
        "{}{}",
        authors,
        reference.year_with_suffix().unwrap_or_default()
    )
}

/// Strip reference numbers, separators, "and" and "et al." and split into
/// tokens.
pub fn tokenize(requested: &str) -> Vec<String> {
    let text = BRACKETED_NUMBER.replace_all(requested, " ");
    let text = PUNCTUATION.replace_all(&text, " ");
    let text = AND.replace_all(&text, " ");
    let text = ET_AL.replace_all(&text, " ");
    text.split_whitespace().map(str::to_string).collect()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum WordClass {
    Letter,
    Digit,
}

fn word_class(c: char) -> Option<WordClass> {
    if c.is_numeric() {
        Some(WordClass::Digit)
    } else if c.is_alphabetic() || c == '_' {
        Some(WordClass::Letter)
    } else {
        None
    }
}

/// Whether `outside` continues the word that `edge` starts or ends.
/// A letter next to a digit is a boundary.
fn continues_word(outside: Option<char>, edge: Option<char>) -> bool {
    match (outside.and_then(word_class), edge.and_then(word_class)) {
        (None, _) => false,
        (Some(a), Some(b)) => a == b,
        (Some(_), None) => true,
    }
}

fn occurs_as_word(pattern: &Regex, haystack: &str) -> bool {
    let mut start = 0;
    while let Some(m) = pattern.find_at(haystack, start) {
        let text = m.as_str();
        let before = haystack[..m.start()].chars().next_back();
        let after = haystack[m.end()..].chars().next();

        if !continues_word(before, text.chars().next())
            && !continues_word(after, text.chars().next_back())
        {
            return true;
        }

        start = m.start() + text.chars().next().map_or(1, char::len_utf8);
    }
    false
}

/// One reconciled request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffRow {
    pub requested: String,
    /// Hand-supplied replacement, empty when none
    pub replacement: String,
    /// Display text of the matched record, empty when unmatched
    pub matched: String,
    editable: bool,
}

impl DiffRow {
    pub fn is_matched(&self) -> bool {
        !self.matched.is_empty()
    }

    /// Unmatched rows may be hand-corrected
    pub fn is_editable(&self) -> bool {
        self.editable
    }

    fn to_line(&self) -> String {
        if self.replacement.is_empty() {
            self.requested.clone()
        } else {
            format!("{} {} {}", self.requested, REPLACEMENT_ARROW, self.replacement)
        }
    }
}

/// A near-miss candidate for an unmatched row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub row: usize,
    pub requested: String,
    pub candidate: String,
    pub score: f64,
}

/// The result of matching a key list against a batch.
#[derive(Debug, Clone, Serialize)]
pub struct KeyDiff {
    pub comments: Vec<String>,
    pub rows: Vec<DiffRow>,
    /// Records never selected by any request
    pub unmatched_references: Vec<String>,
    #[serde(skip)]
    unmatched_entries: Vec<Entry>,
}

impl KeyDiff {
    pub fn rows(&self) -> &[DiffRow] {
        &self.rows
    }

    pub fn unmatched_references(&self) -> &[String] {
        &self.unmatched_references
    }

    /// Set the replacement of an unmatched row.
    pub fn amend(&mut self, row: usize, replacement: impl Into<String>) -> Result<(), MatchError> {
        let target = self.rows.get_mut(row).ok_or(MatchError::RowOutOfRange(row))?;
        if !target.editable {
            return Err(MatchError::NotEditable(row));
        }
        target.replacement = replacement.into().trim().to_string();
        Ok(())
    }

    /// Export as key-list text: the comments, an empty line, then one line
    /// per row. With `diff_only`, rows without a differing replacement are
    /// left out.
    pub fn to_diff_text(&self, diff_only: bool) -> String {
        let lines = self
            .rows
            .iter()
            .filter(|row| {
                !diff_only || !(row.replacement.is_empty() || row.replacement == row.requested)
            })
            .map(DiffRow::to_line);

        self.comments
            .iter()
            .cloned()
            .chain(std::iter::once(String::new()))
            .chain(lines)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Closest never-cited record for each unmatched row, by Jaro-Winkler
    /// similarity of the normalized request to the composite key.
    pub fn suggestions(&self, threshold: f64) -> Vec<Suggestion> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| !row.is_matched())
            .filter_map(|(index, row)| {
                let wanted = tokenize(&row.requested).join(" ");
                self.unmatched_entries
                    .iter()
                    .map(|e| (e, strsim::jaro_winkler(&wanted, &e.composite)))
                    .filter(|(_, score)| *score >= threshold)
                    .max_by(|a, b| a.1.total_cmp(&b.1))
                    .map(|(entry, score)| Suggestion {
                        row: index,
                        requested: row.requested.clone(),
                        candidate: entry.display.clone(),
                        score,
                    })
            })
            .collect()
    }
}
