//! Reverse-reference registry.

use std::collections::HashMap;

use crate::schema::TypeId;

/// Where a reference to another type is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceKind {
    /// A nullable column of the source type's instance table.
    Column {
        /// Instance table of the source type.
        table: String,
        /// Flattened column name.
        column: String,
    },
    /// The `value` column of a reference-array sub-table.
    Array {
        /// Sub-table name.
        table: String,
    },
}

/// A property of `source` that points at some target type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseReference {
    /// Type declaring the reference.
    pub source: TypeId,
    /// Flattened property path on the source type.
    pub property: String,
    /// Physical location of the reference.
    pub kind: ReferenceKind,
}

impl ReverseReference {
    /// Check if deleting a target removes rows rather than nulling a column.
    pub fn is_array(&self) -> bool {
        matches!(self.kind, ReferenceKind::Array { .. })
    }
}

/// Per-type lists of the properties that reference it.
///
/// Appended to when a referencing type is committed and never shrunk, since
/// committed types live as long as their library.
#[derive(Debug, Default)]
pub struct ReferenceRegistry {
    by_target: HashMap<TypeId, Vec<ReverseReference>>,
}

impl ReferenceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `reference` points at `target`.
    pub fn add(&mut self, target: TypeId, reference: ReverseReference) {
        self.by_target.entry(target).or_default().push(reference);
    }

    /// References to `target`, in the order the source types were committed.
    pub fn references_to(&self, target: TypeId) -> &[ReverseReference] {
        self.by_target
            .get(&target)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Total number of recorded references.
    pub fn len(&self) -> usize {
        self.by_target.values().map(Vec::len).sum()
    }

    /// Check if no references are recorded.
    pub fn is_empty(&self) -> bool {
        self.by_target.values().all(Vec::is_empty)
    }
}
