//! Instances and the per-type CRUD engine.
//!
//! An [`ObjectHandler`] is built from a committed type's tables. It owns one
//! sub-handler for the instance table and one per array sub-table, plus an
//! identity cache of the instances it has handed out.

mod array;
mod cache;
mod codec;
mod handler;
mod id;
mod instance;
mod scalar;
mod value;

pub use cache::{CacheEntry, CachePolicy, InstanceCache, SharedInstance};
pub use handler::ObjectHandler;
pub use id::InstanceId;
pub use instance::Instance;
pub use value::Value;
