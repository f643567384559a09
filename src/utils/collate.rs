//! Librarian-style collation for citation keys and reference search keys.
//!
//! Plain code-point order puts `Ä` after `z` and interleaves scripts in ways
//! that look wrong in a reference list. This module ranks characters by their
//! position in a fixed table instead: digits, ASCII punctuation, then each Latin
//! letter as uppercase base, uppercase variants, lowercase base, lowercase
//! variants, followed by ligatures and a residual extended-Latin block.
//!
//! ```
//! use cite_master::utils::compare_keys;
//! use std::cmp::Ordering;
//!
//! assert_eq!(compare_keys("Smith, 2020", "Smith 2020"), Ordering::Equal);
//! assert_eq!(compare_keys("Ärnold", "Arnold"), Ordering::Greater);
//! assert_eq!(compare_keys("Ärnold", "Bach"), Ordering::Less);
//! ```

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Collation table, one group per line of precedence.
const ORDER: &[&str] = &[
    "0123456789",
    "!\"#$%&'()*+,-./",
    "AÀÁÂÃÄÅĀĂĄ",
    "aàáâãäåāăą",
    "BɃƁƂ",
    "bƀɓƃ",
    "CÇĆĈĊČƇ",
    "cçćĉċčƈ",
    "DĎĐƊƋ",
    "dďđɗƌ",
    "EÈÉÊËĒĔĖĘĚ",
    "eèéêëēĕėęě",
    "FƑ",
    "fƒ",
    "GĜĞĠĢƓ",
    "gĝğġģɠ",
    "HĤĦ",
    "hĥħ",
    "IÌÍÎÏĨĪĬĮİƗȽ",
    "iìíîïĩīĭįıɨƚ",
    "JĴ",
    "jĵ",
    "KĶƘ",
    "kķƙ",
    "LĹĻĽĿŁ",
    "lĺļľŀł",
    "M",
    "m",
    "NÑŃŅŇƝȠ",
    "nñńņňɲƞ",
    "OÒÓÔÕÖØŌŎŐƟƠ",
    "oòóôõöøōŏőɵơ",
    "PƤ",
    "pƥ",
    "Q",
    "q",
    "RŔŖŘ",
    "rŕŗř",
    "SŚŜŞŠ",
    "sśŝşš",
    "TŢŤŦƬƮ",
    "tţťŧƫƭʈ",
    "UÙÚÛÜŨŪŬŮŰŲƯ",
    "uùúûüũūŭůűųư",
    "VƲ",
    "vʋ",
    "WŴ",
    "wŵ",
    "X",
    "x",
    "YÝŸŶƳ",
    "yýÿŷƴ",
    "ZŹŻŽƵ",
    "zźżžƶ",
    "ÆæĲĳŒœ",
    "ÐðÞþßĸŊŋſ",
    "ƄƅƆƉƍƎƏƐƔƕƖƛƜƢƣƦƧƨƩƪƱƷƸƹƺƻƼƽƾƿ",
];

/// Characters removed before comparison.
const IGNORED: &[char] = &[' ', '(', ')', '（', '）', ',', ';', '-', '.'];

static RANKS: LazyLock<HashMap<char, u32>> = LazyLock::new(|| {
    ORDER
        .iter()
        .flat_map(|group| group.chars())
        .enumerate()
        .map(|(rank, c)| (c, rank as u32))
        .collect()
});

/// Position of `c` in the collation table, if it has one.
pub fn collation_rank(c: char) -> Option<u32> {
    RANKS.get(&c).copied()
}

/// Numeric weight used for one side of a character comparison.
///
/// Table characters weigh their rank, all others their code point. The two
/// domains are compared as plain numbers when only one side is in the table.
fn weight(c: char) -> u32 {
    collation_rank(c).unwrap_or(c as u32)
}

fn is_ignored(c: &char) -> bool {
    IGNORED.contains(c)
}

/// Compare two keys under the collation table.
///
/// Ignorable characters are stripped first; the first differing weight
/// decides, otherwise the shorter key sorts first.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().filter(|c| !is_ignored(c));
    let mut right = b.chars().filter(|c| !is_ignored(c));

    loop {
        match (left.next(), right.next()) {
            (Some(x), Some(y)) => match weight(x).cmp(&weight(y)) {
                Ordering::Equal => continue,
                other => return other,
            },
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (None, None) => return Ordering::Equal,
        }
    }
}

/// Sort keys in place with [`compare_keys`].
pub fn sort_keys<S: AsRef<str>>(keys: &mut [S]) {
    keys.sort_by(|a, b| compare_keys(a.as_ref(), b.as_ref()));
}
