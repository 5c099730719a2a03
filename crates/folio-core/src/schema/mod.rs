//! Schema declarations, the commit engine and committed types.
//!
//! A [`TypeLayout`] is compiled into a [`Type`] by the commit engine. The
//! physical planner flattens nested properties into dotted column names and
//! emits one sub-table per array property.

mod commit;
mod data_type;
mod layout;
mod namespace;
pub(crate) mod plan;
mod property;
mod types;

pub use data_type::{DataType, UnknownDataType};
pub use layout::{CommitOutcome, TypeLayout};
pub use namespace::{Namespace, NamespaceId};
pub use property::PropertyLayout;
pub use types::{ArrayTable, ScalarColumn, TableKind, Type, TypeId, TypeTables, UnknownTableKind};
