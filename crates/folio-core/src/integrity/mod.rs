//! Referential integrity across types.
//!
//! The registry records, per type, which properties of other types point at
//! it. The cascade executor consults it when an instance is deleted.

mod cascade;
mod registry;

pub use cascade::{CascadeExecutor, CascadeResult};
pub use registry::{ReferenceKind, ReferenceRegistry, ReverseReference};
