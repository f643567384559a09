//! Utility modules shared by the key and citation pipelines.
//!
//! - [`compare_keys`]: total order over citation keys mixing Latin and CJK text
//! - [`sort_keys`]: sort a slice of keys in place with [`compare_keys`]
//! - [`collation_rank`]: position of a character in the collation table
//!
//! # Ordering keys
//!
//! ```rust
//! use cite_master::utils::sort_keys;
//!
//! let mut keys = vec!["Smith（2020）", "Adams（2019）"];
//! sort_keys(&mut keys);
//! assert_eq!(keys, ["Adams（2019）", "Smith（2020）"]);
//! ```

mod collate;

pub use collate::{collation_rank, compare_keys, sort_keys};
