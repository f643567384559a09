//! # Cite Master
//!
//! Mine citation keys from manuscripts, reconcile them against a batch of
//! reference records and render the records as APA, TJS or Chicago reference
//! list entries.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Reference records and batches
//! - [`keys`]: Citation key extraction, key lists, matching and filtering
//! - [`cite`]: Citation styles and the batch formatter
//! - [`sources`]: Asynchronous text acquisition (files, stdin)
//! - [`utils`]: Key collation
//! - [`config`]: Configuration management
//! - [`ui`]: Terminal output helpers

pub mod cite;
pub mod config;
pub mod keys;
pub mod models;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use cite::{CitationFormatter, FormatError, FormatOptions, Style};
pub use keys::{extract_keys, KeyExtractor, KeyList, KeyMatcher};
pub use models::{Reference, ReferenceBatch};
pub use sources::TextSource;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
