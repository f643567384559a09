//! Mining in-text citation keys out of manuscript prose.
//!
//! Two grammars run over the text before the bibliography marker:
//!
//! - Latin: a parenthesized cluster such as `(Smith, 2020; Jones & Lee, 2019)`,
//!   or a comma-chained run such as `Smith (2020), Jones (2019)`.
//! - CJK: `（王小明，2020）` or `王小明（2020）`.
//!
//! Every key comes out in canonical `Author（Year）` form, deduplicated and
//! in collation order.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::utils::sort_keys;

/// Heading that starts the reference list in the manuscripts this targets.
pub const DEFAULT_MARKER: &str = "參考文獻";

const NAME: &str = r"[A-ZÀ-῿][A-Za-zÀ-῿'’\-]*";
/// Lowercase particles that may precede a surname, e.g. `van Dijk`.
const PARTICLE: &str = r"(?:van|von|de|der|den|del|della|di|da|du|la|le|dos|das|ten|ter)";
const YEAR: &str = r"\d{4}[a-z]?";

/// Words that open a sentence or clause and are never part of an author list.
const SENTENCE_WORDS: &[&str] = &[
    "Also", "Although", "And", "As", "According", "After", "Because", "Before", "But", "Finally",
    "Following", "For", "Furthermore", "Hence", "However", "In", "Indeed", "Instead", "Like",
    "Meanwhile", "Moreover", "Nevertheless", "Notably", "Previously", "Recently", "See",
    "Similarly", "Since", "So", "The", "Then", "Therefore", "These", "This", "Thus", "Unlike",
    "When", "While", "Yet",
];

/// A single name, a `&`/`and`-closed list (commas allowed before the last
/// name), or a name followed by `et al.`.
static AUTHORS: LazyLock<String> = LazyLock::new(|| {
    let surname = format!(r"(?:{PARTICLE}\s+)*{NAME}");
    format!(
        r"{surname}(?:(?:\s*,\s*{surname})*\s*,?\s+(?:&|and)\s+(?:{surname}|et\s+al\.)|\s+et\s+al\.)?"
    )
});

/// One `Author (Year)` unit with the author and year captured.
static UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?P<author>{})\s*[（(](?P<year>{YEAR})[）)]",
        *AUTHORS
    ))
    .unwrap()
});

/// Either grammar of the Latin pass.
static LATIN: LazyLock<Regex> = LazyLock::new(|| {
    let unit = format!(r"{}\s*[（(]{YEAR}[）)]", *AUTHORS);
    Regex::new(&format!(
        r"(?P<cluster>[（(][^）)]*[,;；]\s*{YEAR}[）)])|(?P<run>{unit}(?:,\s*{unit})*)"
    ))
    .unwrap()
});

static CJK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"（(?P<bracketed>[一-鿿]+)[，,]\s*(?P<year1>\d{4}[a-z]?)）|(?P<name>[一-鿿]{1,3})（(?P<year2>\d{4}[a-z]?)）",
    )
    .unwrap()
});

static YEAR_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"{YEAR}(?:[,; ]+{YEAR})+")).unwrap());
static SINGLE_YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(YEAR).unwrap());
static YEAR_FIRST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4}[a-z]?)\s*([^\d]+).*$").unwrap());
static TRAILING_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*,\s*(\d{4}[a-z]?)\s*$").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Extracts canonical citation keys from prose.
#[derive(Debug, Clone)]
pub struct KeyExtractor {
    marker: String,
}

impl Default for KeyExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyExtractor {
    pub fn new() -> Self {
        Self::with_marker(DEFAULT_MARKER)
    }

    /// Use a different bibliography-section marker. An empty marker disables
    /// truncation.
    pub fn with_marker(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// The part of `text` that is mined: everything before the first marker.
    pub fn in_text<'a>(&self, text: &'a str) -> &'a str {
        if self.marker.is_empty() {
            return text;
        }
        match text.find(&self.marker) {
            Some(index) => &text[..index],
            None => text,
        }
    }

    /// Mine keys from `text`. No matches is an empty list, not an error.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let body = self.in_text(text);

        let latin = latin_keys(body);

        let cjk: Vec<String> = CJK
            .captures_iter(body)
            .filter_map(|caps| {
                let name = caps.name("bracketed").or_else(|| caps.name("name"))?;
                let year = caps.name("year1").or_else(|| caps.name("year2"))?;
                Some(format!("{}（{}）", name.as_str(), year.as_str()))
            })
            .collect();

        tracing::debug!(
            "Mined {} Latin and {} CJK citation keys",
            latin.len(),
            cjk.len()
        );

        let mut seen = HashSet::new();
        let mut keys: Vec<String> = latin
            .into_iter()
            .chain(cjk)
            .filter(|k| seen.insert(k.clone()))
            .collect();
        sort_keys(&mut keys);
        keys
    }

    /// Keys as newline-separated text
    pub fn extract_text(&self, text: &str) -> String {
        self.extract(text).join("\n")
    }
}

/// Extract with the default marker.
pub fn extract_keys(text: &str) -> Vec<String> {
    KeyExtractor::new().extract(text)
}

/// Run the Latin grammar. A run must not start inside a Latin word, while
/// CJK text may directly precede it.
fn latin_keys(body: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let mut start = 0;

    while let Some(caps) = LATIN.captures_at(body, start) {
        let Some(whole) = caps.get(0) else { break };

        if let Some(cluster) = caps.name("cluster") {
            keys.extend(normalize_cluster(cluster.as_str()));
        } else if let Some(run) = caps.name("run") {
            if follows_latin_letter(body, run.start()) {
                start = run.start() + body[run.start()..].chars().next().map_or(1, char::len_utf8);
                continue;
            }
            keys.extend(normalize_run(run.as_str()));
        }
        start = whole.end();
    }
    keys
}

fn follows_latin_letter(haystack: &str, index: usize) -> bool {
    haystack[..index]
        .chars()
        .next_back()
        .is_some_and(|c| c.is_ascii_alphabetic() || ('À'..='ɏ').contains(&c))
}

/// Drop clause-opening words such as `However,` from the front of an author list.
fn strip_sentence_words(author: &str) -> &str {
    let mut rest = author.trim_start();
    loop {
        let word_end = rest
            .find(|c: char| c == ',' || c.is_whitespace())
            .unwrap_or(rest.len());
        let (word, tail) = rest.split_at(word_end);
        let tail = tail.trim_start_matches(|c: char| c == ',' || c.is_whitespace());
        if tail.is_empty() || !SENTENCE_WORDS.contains(&word) {
            return rest;
        }
        rest = tail;
    }
}

/// Normalize a parenthesized cluster into one key per cited work.
fn normalize_cluster(raw: &str) -> Vec<String> {
    let unified = raw.replace('；', ";");
    let inner = strip_outer_parens(unified.trim());

    split_clusters(inner)
        .into_iter()
        .flat_map(|line| expand_years(&line))
        .map(|line| year_first_to_author(&line))
        .map(|line| trailing_year_to_parens(&line))
        .map(|line| collapse_whitespace(&line))
        .filter(|line| !line.is_empty())
        .collect()
}

/// Split a comma-chained run into its `Author (Year)` units.
fn normalize_run(raw: &str) -> Vec<String> {
    let keys: Vec<String> = UNIT
        .captures_iter(raw)
        .map(|caps| {
            format!(
                "{}（{}）",
                collapse_whitespace(strip_sentence_words(&caps["author"])),
                &caps["year"]
            )
        })
        .collect();

    if keys.is_empty() {
        vec![collapse_whitespace(raw)]
    } else {
        keys
    }
}

fn strip_outer_parens(s: &str) -> &str {
    let opens = s.starts_with('（') || s.starts_with('(');
    let closes = s.ends_with('）') || s.ends_with(')');
    if !(opens && closes) {
        return s;
    }
    let mut chars = s.chars();
    chars.next();
    chars.next_back();
    chars.as_str()
}

/// Split on `;` unless the next non-space character is a digit, which
/// continues the same author's list of years.
fn split_clusters(s: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != ';' {
            current.push(c);
            continue;
        }

        let mut skipped = String::new();
        while let Some(&next) = chars.peek() {
            if !next.is_whitespace() {
                break;
            }
            skipped.push(next);
            chars.next();
        }

        if chars.peek().is_some_and(|n| n.is_ascii_digit()) {
            current.push(c);
            current.push_str(&skipped);
        } else {
            lines.push(std::mem::take(&mut current));
        }
    }
    lines.push(current);
    lines
}

/// `Smith, 2020, 2021` becomes `Smith, 2020` and `Smith, 2021`.
fn expand_years(line: &str) -> Vec<String> {
    let Some(run) = YEAR_RUN.find(line) else {
        return vec![line.to_string()];
    };

    let author = &line[..run.start()];
    let rest = &line[run.end()..];
    SINGLE_YEAR
        .find_iter(run.as_str())
        .map(|year| format!("{}{}{}", author, year.as_str(), rest))
        .collect()
}

/// `2020 Smith, ...` becomes `Smith, 2020`.
fn year_first_to_author(line: &str) -> String {
    match YEAR_FIRST.captures(line) {
        Some(caps) => format!("{}{}", &caps[2], &caps[1]),
        None => line.to_string(),
    }
}

/// `Smith, 2020` becomes `Smith（2020）`.
fn trailing_year_to_parens(line: &str) -> String {
    TRAILING_YEAR.replace(line, "（$1）").into_owned()
}

fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parenthesized_cluster() {
        let keys = extract_keys("as shown (Smith, 2020; Jones & Lee, 2019) before");
        assert_eq!(keys, vec!["Jones & Lee（2019）", "Smith（2020）"]);
    }

    #[test]
    fn test_marker_truncates() {
        let keys = extract_keys("... as shown (Smith, 2020; Jones, 2019) ... 參考文獻 (Lee, 2021)");
        assert!(keys.contains(&"Smith（2020）".to_string()));
        assert!(keys.contains(&"Jones（2019）".to_string()));
        assert!(!keys.contains(&"Lee（2021）".to_string()));
    }

    #[test]
    fn test_custom_marker() {
        let extractor = KeyExtractor::with_marker("References");
        let keys = extractor.extract("(Smith, 2020)\nReferences\n(Lee, 2021)");
        assert_eq!(keys, vec!["Smith（2020）"]);

        let keys = KeyExtractor::with_marker("").extract("(Smith, 2020) 參考文獻 (Lee, 2021)");
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_chained_run() {
        let keys = extract_keys("Smith (2020), Jones (2019)");
        assert_eq!(keys, vec!["Jones（2019）", "Smith（2020）"]);
    }

    #[test]
    fn test_run_with_multiple_authors() {
        let keys = extract_keys("as argued by Smith and Jones (2020) and Brown et al. (2018).");
        assert_eq!(keys, vec!["Brown et al.（2018）", "Smith and Jones（2020）"]);
    }

    #[test]
    fn test_full_width_run() {
        let keys = extract_keys("Smith（2020a）指出");
        assert_eq!(keys, vec!["Smith（2020a）"]);
    }

    #[test]
    fn test_multiple_years_for_one_author() {
        let keys = extract_keys("(Smith, 2020, 2021; Lee, 2019; 2018)");
        assert_eq!(
            keys,
            vec!["Lee（2018）", "Lee（2019）", "Smith（2020）", "Smith（2021）"]
        );
    }

    #[test]
    fn test_cjk_citations() {
        let keys = extract_keys("研究指出王小明（2020）與（陳大文，2019）的看法");
        assert_eq!(keys, vec!["王小明（2020）", "陳大文（2019）"]);
    }

    #[test]
    fn test_deduplicates() {
        let keys = extract_keys("(Smith, 2020) and later (Smith, 2020) and Smith (2020)");
        assert_eq!(keys, vec!["Smith（2020）"]);
    }

    #[test]
    fn test_no_matches() {
        assert!(extract_keys("No citations here at all.").is_empty());
        assert!(extract_keys("").is_empty());
    }

    #[test]
    fn test_unrecognized_cluster_kept_as_is() {
        let keys = extract_keys("(see 2020 Smith, 2021)");
        assert_eq!(keys.len(), 1);
        assert!(keys[0].contains("2021"));
    }

    #[test]
    fn test_idempotent() {
        let text = "(Smith, 2020; Jones & Lee, 2019) Brown (2018), Ärnold (2017) 王小明（2020）";
        let keys = extract_keys(text);
        let again = extract_keys(&keys.join("\n"));
        assert_eq!(keys, again);
    }

    #[test]
    fn test_latin_run_directly_after_cjk() {
        let keys = extract_keys("根據Smith（2020）的研究，以及王小明（2019）的看法");
        assert_eq!(keys, vec!["Smith（2020）", "王小明（2019）"]);
    }

    #[test]
    fn test_run_inside_latin_word_is_skipped() {
        assert!(extract_keys("theSmith (2020)").is_empty());
        assert_eq!(extract_keys("McDonald (2020)"), vec!["McDonald（2020）"]);
    }

    #[test]
    fn test_sentence_words_are_not_authors() {
        let keys = extract_keys(
            "... In Smith (2020), however, it fails. However Jones (2019) disagrees.",
        );
        assert_eq!(keys, vec!["Jones（2019）", "Smith（2020）"]);

        let keys = extract_keys("However, Smith and Jones (2020) disagree.");
        assert_eq!(keys, vec!["Smith and Jones（2020）"]);
    }

    #[test]
    fn test_surname_particles() {
        let keys = extract_keys("as noted by van Dijk (2015) and Smith, de Jong, & Lee (2016)");
        assert_eq!(keys, vec!["Smith, de Jong, & Lee（2016）", "van Dijk（2015）"]);
    }

    #[test]
    fn test_strip_sentence_words() {
        assert_eq!(strip_sentence_words("However, Smith"), "Smith");
        assert_eq!(strip_sentence_words("In Smith and Jones"), "Smith and Jones");
        assert_eq!(strip_sentence_words("Smith"), "Smith");
        // a lone word is kept
        assert_eq!(strip_sentence_words("In"), "In");
    }

    #[test]
    fn test_split_clusters() {
        assert_eq!(split_clusters("A, 2020; B, 2019"), vec!["A, 2020", "B, 2019"]);
        assert_eq!(split_clusters("A, 2020; 2021"), vec!["A, 2020; 2021"]);
    }

    #[test]
    fn test_year_first_to_author() {
        assert_eq!(year_first_to_author("2021 Smith, "), "Smith, 2021");
        assert_eq!(year_first_to_author("Smith, 2021"), "Smith, 2021");
    }
}
