//! Folio Benchmark Suite
//!
//! Criterion benchmarks for the schema compiler and the object handlers.
//!
//! # Benchmark Categories
//!
//! - **Commit**: Type creation, idempotent re-commit, nested flattening
//! - **CRUD**: Insert, get (cached and uncached), update, delete with cascade

pub mod fixtures;
pub mod harness;

pub use fixtures::{generate_authors, generate_documents, Scale};
pub use harness::{init_tracing, SchemaContext, TestContext};
