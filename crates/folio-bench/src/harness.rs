//! Benchmark harness helpers.
//!
//! This module provides utilities for setting up and running benchmarks.

use std::sync::Once;

use folio_core::{InstanceId, Library, LibraryConfig, NamespaceId, TypeId};

use crate::fixtures::{
    author_layout, author_to_instance, document_layout, document_to_instance, generate_authors,
    generate_documents, stats_layout, Scale,
};

/// Name of the namespace benchmark types are committed into.
pub const NAMESPACE: &str = "bench";

/// Test context for benchmarks.
///
/// Manages a library in a temporary directory for isolated benchmark runs.
pub struct TestContext {
    pub library: Library,
    pub namespace: NamespaceId,
    _library_dir: tempfile::TempDir,
}

/// A context with the document schema committed.
pub struct SchemaContext {
    pub ctx: TestContext,
    pub authors: TypeId,
    pub documents: TypeId,
    pub author_ids: Vec<InstanceId>,
    pub document_ids: Vec<InstanceId>,
}

impl TestContext {
    /// Create a new library with an empty namespace.
    pub fn new() -> Self {
        let library_dir = tempfile::tempdir().unwrap();
        let config = LibraryConfig::new(library_dir.path().join("bench.folio"));
        let mut library = Library::create(config).unwrap();
        let namespace = library.create_namespace(NAMESPACE).unwrap();

        Self {
            library,
            namespace,
            _library_dir: library_dir,
        }
    }

    /// Create a test context with the document schema.
    pub fn with_schema() -> SchemaContext {
        let mut ctx = Self::new();
        let (authors, documents) = commit_schema(&mut ctx);
        SchemaContext {
            ctx,
            authors,
            documents,
            author_ids: Vec::new(),
            document_ids: Vec::new(),
        }
    }

    /// Create a test context with the document schema and populated data.
    pub fn with_scale(scale: Scale) -> SchemaContext {
        let mut schema = Self::with_schema();
        populate_library(&mut schema, scale);
        schema
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Commit the author, stats and document types. Returns the ids of the
/// instantiable ones.
pub fn commit_schema(ctx: &mut TestContext) -> (TypeId, TypeId) {
    let ns = ctx.namespace;
    let (_, authors) = author_layout()
        .commit(&mut ctx.library, ns, "author", true)
        .unwrap();
    let (_, stats) = stats_layout()
        .commit(&mut ctx.library, ns, "stats", false)
        .unwrap();

    let layout = {
        let author = ctx.library.get_type(authors).unwrap();
        let stats = ctx.library.get_type(stats).unwrap();
        document_layout(author, stats)
    };
    let (_, documents) = layout
        .commit(&mut ctx.library, ns, "document", true)
        .unwrap();
    (authors, documents)
}

/// Populate the library with benchmark data at the specified scale.
pub fn populate_library(schema: &mut SchemaContext, scale: Scale) {
    let library = &schema.ctx.library;

    let mut authors = library.object_handler(schema.authors).unwrap();
    schema.author_ids = generate_authors(scale.count())
        .iter()
        .map(|a| authors.insert(&mut author_to_instance(a)).unwrap())
        .collect();

    let mut documents = library.object_handler(schema.documents).unwrap();
    let author_ids = &schema.author_ids;
    schema.document_ids = generate_documents(scale.count() * scale.documents_per_author())
        .iter()
        .enumerate()
        .map(|(i, d)| {
            documents
                .insert(&mut document_to_instance(d, i, author_ids))
                .unwrap()
        })
        .collect();
}

static TRACING: Once = Once::new();

/// Install a fmt subscriber filtered by `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive("folio_core=warn".parse().unwrap()),
            )
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::store::count_rows;

    #[test]
    fn test_context_creation() {
        let ctx = TestContext::new();
        let ns = ctx.library.namespace_by_id(ctx.namespace).unwrap();
        assert_eq!(ns.name(), NAMESPACE);
        assert!(ns.is_empty());
    }

    #[test]
    fn test_with_scale_populates() {
        let schema = TestContext::with_scale(Scale::Tiny);
        let conn = schema.ctx.library.connection();

        assert_eq!(schema.author_ids.len(), 10);
        assert_eq!(schema.document_ids.len(), 20);
        assert_eq!(count_rows(conn, "bench_document").unwrap(), 20);
        assert_eq!(count_rows(conn, "bench_document_reviewers").unwrap(), 40);
        assert_eq!(schema.ctx.library.references_to(schema.authors).len(), 2);
    }
}
