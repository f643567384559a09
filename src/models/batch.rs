//! Immutable snapshot of a loaded reference batch.

use std::sync::Arc;

use serde::Serialize;

use super::reference::Reference;
use crate::utils::compare_keys;

/// Errors raised while loading or ordering a batch
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    /// The batch is not decodable as a JSON array of records
    #[error("Parse error: {0}")]
    Parse(String),

    /// A lazily required field is absent on a record
    #[error("Record {index} is missing field '{field}'")]
    MissingField { index: usize, field: &'static str },
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Parse(format!("JSON: {}", err))
    }
}

/// A read-only batch of references.
///
/// Reloading input produces a new batch; nothing mutates an existing one.
/// Cloning is cheap and shares the records.
#[derive(Debug, Clone, Default)]
pub struct ReferenceBatch {
    references: Arc<[Reference]>,
}

impl ReferenceBatch {
    /// Wrap already-constructed records
    pub fn new(references: Vec<Reference>) -> Self {
        Self {
            references: references.into(),
        }
    }

    /// Parse a JSON array of field-maps.
    ///
    /// Unknown keys are ignored. A batch that does not decode produces no
    /// records at all.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let references: Vec<Reference> = serde_json::from_str(json)?;
        tracing::debug!("Loaded {} references", references.len());
        Ok(Self::new(references))
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reference> {
        self.references.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Reference> {
        self.references.get(index)
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    /// Search keys in batch order, failing on the first record without one
    pub fn search_keys(&self) -> Result<Vec<&str>, StoreError> {
        self.iter()
            .enumerate()
            .map(|(index, r)| {
                r.search_key.as_deref().ok_or(StoreError::MissingField {
                    index,
                    field: "searchKey",
                })
            })
            .collect()
    }

    /// A new batch with normalized search keys, sorted by collation order.
    pub fn ordered(&self) -> Result<Self, StoreError> {
        let mut references = self
            .iter()
            .enumerate()
            .map(|(index, r)| {
                let key = r.normalized_search_key().ok_or(StoreError::MissingField {
                    index,
                    field: "searchKey",
                })?;
                Ok(Reference {
                    search_key: Some(key),
                    ..r.clone()
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        references.sort_by(|a, b| {
            compare_keys(
                a.search_key.as_deref().unwrap_or(""),
                b.search_key.as_deref().unwrap_or(""),
            )
        });

        Ok(Self::new(references))
    }

    /// Pretty JSON with four-space indentation
    pub fn to_json_pretty(&self) -> Result<String, StoreError> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.references()
            .serialize(&mut serializer)
            .map_err(|e| StoreError::Parse(format!("JSON: {}", e)))?;
        String::from_utf8(out).map_err(|e| StoreError::Parse(e.to_string()))
    }
}

impl From<Vec<Reference>> for ReferenceBatch {
    fn from(references: Vec<Reference>) -> Self {
        Self::new(references)
    }
}

impl<'a> IntoIterator for &'a ReferenceBatch {
    type Item = &'a Reference;
    type IntoIter = std::slice::Iter<'a, Reference>;

    fn into_iter(self) -> Self::IntoIter {
        self.references.iter()
    }
}
