//! Committed types and their generated tables.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::{DataType, NamespaceId, TypeLayout};

/// Store-assigned identifier of a committed type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) i64);

impl TypeId {
    /// Row id of the type in the `types` metadata table.
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of a generated table, as recorded in `generated_tables`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// The instance table of a type.
    Instance,
    /// Sub-table of a primitive or string array property.
    PrimitiveArray,
    /// Sub-table of a blob array property.
    BlobArray,
    /// Sub-table of a reference array property.
    ReferenceArray,
}

impl TableKind {
    /// Name stored in the `generated_tables` metadata table.
    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Instance => "instance",
            TableKind::PrimitiveArray => "primitive_array",
            TableKind::BlobArray => "blob_array",
            TableKind::ReferenceArray => "reference_array",
        }
    }
}

/// Error returned when parsing an unknown table kind name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown table kind \"{0}\"")]
pub struct UnknownTableKind(pub String);

impl FromStr for TableKind {
    type Err = UnknownTableKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "instance" => Ok(TableKind::Instance),
            "primitive_array" => Ok(TableKind::PrimitiveArray),
            "blob_array" => Ok(TableKind::BlobArray),
            "reference_array" => Ok(TableKind::ReferenceArray),
            other => Err(UnknownTableKind(other.to_string())),
        }
    }
}

/// A column of the instance table holding one flattened property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarColumn {
    /// Flattened property path, which is also the column name.
    pub path: String,
    /// Data type of the property.
    pub data_type: DataType,
    /// Stored as packed bytes.
    pub is_blob: bool,
    /// Referenced type for reference columns.
    pub reference_type: Option<TypeId>,
}

/// A sub-table holding the elements of one flattened array property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayTable {
    /// Table name: `<instance_table>_<path>`.
    pub name: String,
    /// Flattened property path.
    pub path: String,
    /// Which sub-handler owns this table.
    pub kind: TableKind,
    /// Element data type.
    pub data_type: DataType,
    /// Referenced type for reference arrays.
    pub reference_type: Option<TypeId>,
}

/// Handles to every table generated for a type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeTables {
    pub(crate) instance: Option<String>,
    pub(crate) columns: Vec<ScalarColumn>,
    pub(crate) primitive_arrays: Vec<ArrayTable>,
    pub(crate) blob_arrays: Vec<ArrayTable>,
    pub(crate) reference_arrays: Vec<ArrayTable>,
}

impl TypeTables {
    /// Name of the instance table. None for non-instantiable types.
    pub fn instance(&self) -> Option<&str> {
        self.instance.as_deref()
    }

    /// Instance table columns after flattening, in declaration order.
    pub fn columns(&self) -> &[ScalarColumn] {
        &self.columns
    }

    /// Primitive and string array sub-tables.
    pub fn primitive_arrays(&self) -> &[ArrayTable] {
        &self.primitive_arrays
    }

    /// Blob array sub-tables.
    pub fn blob_arrays(&self) -> &[ArrayTable] {
        &self.blob_arrays
    }

    /// Reference array sub-tables.
    pub fn reference_arrays(&self) -> &[ArrayTable] {
        &self.reference_arrays
    }

    /// All array sub-tables.
    pub fn arrays(&self) -> impl Iterator<Item = &ArrayTable> {
        self.primitive_arrays
            .iter()
            .chain(&self.blob_arrays)
            .chain(&self.reference_arrays)
    }

    /// Every generated table with its kind.
    pub fn generated(&self) -> impl Iterator<Item = (&str, TableKind)> {
        self.instance
            .as_deref()
            .map(|name| (name, TableKind::Instance))
            .into_iter()
            .chain(self.arrays().map(|t| (t.name.as_str(), t.kind)))
    }

    /// Check whether a flattened path names a column or an array.
    pub fn has_path(&self, path: &str) -> bool {
        self.columns.iter().any(|c| c.path == path) || self.arrays().any(|t| t.path == path)
    }

    pub(crate) fn push_array(&mut self, table: ArrayTable) {
        match table.kind {
            TableKind::PrimitiveArray => self.primitive_arrays.push(table),
            TableKind::BlobArray => self.blob_arrays.push(table),
            TableKind::ReferenceArray => self.reference_arrays.push(table),
            TableKind::Instance => {}
        }
    }
}

/// A committed, immutable type.
#[derive(Debug, Clone)]
pub struct Type {
    pub(crate) id: TypeId,
    pub(crate) name: String,
    pub(crate) namespace: NamespaceId,
    pub(crate) namespace_name: String,
    pub(crate) instantiable: bool,
    pub(crate) layout: TypeLayout,
    pub(crate) property_ids: Vec<i64>,
    pub(crate) tables: TypeTables,
}

impl Type {
    /// Store-assigned type id.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Type name, unique within its namespace.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace this type belongs to.
    pub fn namespace(&self) -> NamespaceId {
        self.namespace
    }

    /// Name of the owning namespace.
    pub fn namespace_name(&self) -> &str {
        &self.namespace_name
    }

    /// `namespace::name`.
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.namespace_name, self.name)
    }

    /// Whether instances can be created. Non-instantiable types have no
    /// tables and only exist to be nested.
    pub fn is_instantiable(&self) -> bool {
        self.instantiable
    }

    /// The committed layout.
    pub fn layout(&self) -> &TypeLayout {
        &self.layout
    }

    /// Row ids of the properties in the `properties` metadata table.
    pub fn property_ids(&self) -> &[i64] {
        &self.property_ids
    }

    /// Generated tables.
    pub fn tables(&self) -> &TypeTables {
        &self.tables
    }

    /// Name of the instance table.
    pub fn instance_table(&self) -> Option<&str> {
        self.tables.instance()
    }
}
