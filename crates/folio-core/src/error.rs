//! Core error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::object::InstanceId;
use crate::schema::DataType;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Core library errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A type declaration or the schema registry was used incorrectly.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// An instance identifier was missing, already taken, or unknown.
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),

    /// An instance value does not fit the property it is bound to.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// The relational store rejected a statement.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// Filesystem error while locating a library file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// `Library::create` was pointed at an existing file.
    #[error("library file already exists: {}", .0.display())]
    LibraryExists(PathBuf),

    /// `Library::open` was pointed at a missing file.
    #[error("library file does not exist: {}", .0.display())]
    LibraryMissing(PathBuf),
}

/// Schema declaration and commit errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A type was committed without a name.
    #[error("type in namespace {namespace} cannot be committed: it has no name")]
    EmptyTypeName {
        /// Namespace the commit targeted.
        namespace: String,
    },

    /// A type was committed without any properties.
    #[error("type {namespace}::{name} cannot be committed: it has no properties")]
    EmptyLayout {
        /// Namespace the commit targeted.
        namespace: String,
        /// Type name.
        name: String,
    },

    /// A namespace was created without a name.
    #[error("namespace name cannot be empty")]
    EmptyNamespaceName,

    /// A layout already holds a property with this name.
    #[error("layout already has a property named \"{name}\"")]
    DuplicateProperty {
        /// Offending property name.
        name: String,
    },

    /// A property name does not match `^[a-z][a-z0-9_]*$`.
    #[error("property name \"{name}\" does not match ^[a-z][a-z0-9_]*$")]
    InvalidPropertyName {
        /// Offending property name.
        name: String,
    },

    /// A primitive-only constructor was given a non-primitive data type.
    #[error("property \"{name}\" requires a primitive data type, got {data_type}")]
    NotPrimitive {
        /// Property name.
        name: String,
        /// Rejected data type.
        data_type: DataType,
    },

    /// A reference property targets a type without an instance table.
    #[error("property \"{name}\" cannot reference {target}: it is not an instantiable type")]
    NotInstantiable {
        /// Property name.
        name: String,
        /// Qualified name of the referenced type.
        target: String,
    },

    /// A type with the same name but a different layout already exists.
    #[error(
        "type {namespace}::{name} cannot be committed: a type with the same name but a different layout already exists"
    )]
    IncompatibleLayout {
        /// Namespace name.
        namespace: String,
        /// Type name.
        name: String,
    },

    /// A namespace with this name already exists.
    #[error("a namespace named \"{name}\" already exists")]
    NamespaceExists {
        /// Namespace name.
        name: String,
    },

    /// No namespace with this name or id is registered.
    #[error("unknown namespace {name}")]
    UnknownNamespace {
        /// Namespace name or id.
        name: String,
    },

    /// No committed type with this id is registered.
    #[error("unknown type id {id}")]
    UnknownType {
        /// Store-assigned type id.
        id: i64,
    },

    /// The metadata tables disagree with each other or with the generated tables.
    #[error("corrupt schema metadata: {0}")]
    CorruptMetadata(String),
}

/// Instance identity errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// `insert` was called on an instance that already has an id.
    #[error("instance {0} was already inserted")]
    AlreadyInserted(InstanceId),

    /// An operation that needs a valid id was given the nil id.
    #[error("instance id is not valid")]
    InvalidId,

    /// No instance with this id exists.
    #[error("instance {0} does not exist")]
    NotFound(InstanceId),
}

/// Errors binding instance values to properties.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// The instance carries a value for a path the type does not declare.
    #[error("type has no property \"{property}\"")]
    UnknownProperty {
        /// Flattened property path.
        property: String,
    },

    /// The value kind does not match the property's data type.
    #[error("property \"{property}\" expects {expected}, found {found}")]
    Mismatch {
        /// Flattened property path.
        property: String,
        /// What the property accepts.
        expected: String,
        /// Kind of the value supplied.
        found: &'static str,
    },

    /// An array element was null.
    #[error("array property \"{property}\" cannot hold null elements")]
    NullElement {
        /// Flattened property path.
        property: String,
    },

    /// The store cannot hold the value faithfully.
    #[error("property \"{property}\" cannot store {reason}")]
    Unrepresentable {
        /// Flattened property path.
        property: String,
        /// What was rejected.
        reason: &'static str,
    },

    /// A stored value could not be converted back into the property's kind.
    #[error("cannot decode property \"{property}\": {reason}")]
    Decode {
        /// Flattened property path.
        property: String,
        /// What went wrong.
        reason: String,
    },
}
