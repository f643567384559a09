//! Citation keys: mining them from prose, the key-list format, matching
//! them against references and filtering.

mod extract;
mod filter;
mod list;
mod matcher;

pub use extract::{extract_keys, KeyExtractor, DEFAULT_MARKER};
pub use filter::{filter_lines, FilteredLine, TokenFilter};
pub use list::{KeyLine, KeyList, KeyRequest, REPLACEMENT_ARROW};
pub use matcher::{
    composite_key, tokenize, DiffRow, KeyDiff, KeyMatcher, MatchError, Suggestion,
    DIFF_FILE_NAME,
};
