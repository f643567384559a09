//! Core data models for bibliographic references and loaded batches.

mod batch;
mod reference;

pub use batch::{ReferenceBatch, StoreError};
pub use reference::{normalize_search_key, EffectiveType, Reference, ReferenceBuilder, SourceType};
