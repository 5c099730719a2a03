//! Folio Core - Schema compiler, referential integrity and object handlers.
//!
//! Types are declared as [`TypeLayout`]s, committed into a [`Namespace`] of a
//! [`Library`], and compiled into tables of an embedded SQLite store. An
//! [`ObjectHandler`] then reads and writes instances of a committed type while
//! the reverse-reference registry keeps references across types consistent.
//!
//! ```rust
//! use folio_core::{DataType, Instance, Library, LibraryConfig, TypeLayout, Value};
//!
//! let mut library = Library::create(LibraryConfig::temporary()).unwrap();
//! let main = library.create_namespace("main").unwrap();
//!
//! let mut layout = TypeLayout::new();
//! layout
//!     .create_primitive("a", DataType::Float)
//!     .unwrap()
//!     .create_primitive("b", DataType::Int32)
//!     .unwrap();
//! let (_, foo) = layout.commit(&mut library, main, "foo", true).unwrap();
//!
//! let mut handler = library.object_handler(foo).unwrap();
//! let mut instance = Instance::new()
//!     .with("a", Value::Float(0.5))
//!     .with("b", Value::Int32(4));
//! handler.insert(&mut instance).unwrap();
//!
//! let fetched = handler.get(instance.id()).unwrap();
//! assert_eq!(fetched.read().get("b"), Some(&Value::Int32(4)));
//! ```

pub mod config;
pub mod error;
pub mod integrity;
pub mod library;
pub mod object;
pub mod schema;
pub mod store;

pub use config::LibraryConfig;
pub use error::{Error, IdentityError, Result, SchemaError, ValueError};
pub use integrity::{CascadeExecutor, CascadeResult, ReferenceKind, ReferenceRegistry, ReverseReference};
pub use library::Library;
pub use object::{
    CacheEntry, CachePolicy, Instance, InstanceCache, InstanceId, ObjectHandler, SharedInstance,
    Value,
};
pub use schema::{
    ArrayTable, CommitOutcome, DataType, Namespace, NamespaceId, PropertyLayout, ScalarColumn,
    TableKind, Type, TypeId, TypeLayout, TypeTables,
};
