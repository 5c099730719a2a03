//! Test data generation for benchmarks.
//!
//! Generators are seeded so every run works on the same data.

use folio_core::{DataType, Instance, InstanceId, Type, TypeLayout, Value};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Scale factor for benchmark data generation.
#[derive(Clone, Copy, Debug, Default)]
pub enum Scale {
    /// 10 authors. Use for quick tests and development iteration.
    Tiny,
    /// 100 authors.
    Small,
    /// 2,000 authors.
    #[default]
    Medium,
    /// 20,000 authors.
    Large,
}

impl Scale {
    /// Number of authors at this scale.
    pub fn count(&self) -> usize {
        match self {
            Scale::Tiny => 10,
            Scale::Small => 100,
            Scale::Medium => 2_000,
            Scale::Large => 20_000,
        }
    }

    /// Documents written by each author.
    pub fn documents_per_author(&self) -> usize {
        match self {
            Scale::Tiny => 2,
            Scale::Small => 5,
            Scale::Medium => 5,
            Scale::Large => 10,
        }
    }
}

/// Author data for benchmarks.
pub struct AuthorData {
    pub name: String,
    pub age: i32,
}

/// Document data for benchmarks.
pub struct DocumentData {
    pub title: String,
    pub body: String,
    pub views: i64,
    pub score: f64,
    pub tags: Vec<String>,
    pub digest: Vec<u8>,
}

/// Generate a random string of specified length.
fn random_string(rng: &mut StdRng, len: usize) -> String {
    (0..len).map(|_| rng.sample(Alphanumeric) as char).collect()
}

/// Generate authors with a realistic field distribution.
pub fn generate_authors(count: usize) -> Vec<AuthorData> {
    const SEED: u64 = 12345;
    let mut rng = StdRng::seed_from_u64(SEED);

    let name_prefixes = [
        "Alice", "Bob", "Charlie", "David", "Eve", "Frank", "Grace", "Henry", "Ivy", "Jack",
    ];

    (0..count)
        .map(|i| AuthorData {
            name: format!("{}_{}", name_prefixes[i % name_prefixes.len()], i),
            age: 18 + (rng.gen::<u32>() % 60) as i32,
        })
        .collect()
}

/// Generate documents with between zero and four tags each.
pub fn generate_documents(count: usize) -> Vec<DocumentData> {
    const SEED: u64 = 54321;
    let mut rng = StdRng::seed_from_u64(SEED);

    let tag_pool = ["draft", "review", "published", "archived", "pinned", "shared"];

    (0..count)
        .map(|i| {
            let tag_count = rng.gen_range(0..=4);
            let mut digest = vec![0u8; 32];
            rng.fill(digest.as_mut_slice());

            DocumentData {
                title: format!("Document {}: {}", i, random_string(&mut rng, 20)),
                body: random_string(&mut rng, 200),
                views: rng.gen_range(0..1_000_000),
                score: rng.gen::<f64>(),
                tags: (0..tag_count)
                    .map(|_| tag_pool[rng.gen_range(0..tag_pool.len())].to_string())
                    .collect(),
                digest,
            }
        })
        .collect()
}

/// Layout of the `author` type.
pub fn author_layout() -> TypeLayout {
    let mut layout = TypeLayout::new();
    layout
        .create_string("name")
        .and_then(|l| l.create_primitive("age", DataType::Int32))
        .expect("author layout");
    layout
}

/// Layout of the non-instantiable `stats` type nested into documents.
pub fn stats_layout() -> TypeLayout {
    let mut layout = TypeLayout::new();
    layout
        .create_primitive("views", DataType::Int64)
        .and_then(|l| l.create_primitive("score", DataType::Double))
        .expect("stats layout");
    layout
}

/// Layout of the `document` type.
pub fn document_layout(author: &Type, stats: &Type) -> TypeLayout {
    let mut layout = TypeLayout::new();
    layout
        .create_string("title")
        .and_then(|l| l.create_string("body"))
        .and_then(|l| l.create_nested("stats", stats))
        .and_then(|l| l.create_string_array("tags"))
        .and_then(|l| l.create_blob("digest"))
        .and_then(|l| l.create_reference("author", author))
        .and_then(|l| l.create_reference_array("reviewers", author))
        .expect("document layout");
    layout
}

/// Convert AuthorData into an unsaved instance.
pub fn author_to_instance(author: &AuthorData) -> Instance {
    Instance::new()
        .with("name", author.name.as_str())
        .with("age", author.age)
}

/// Convert DocumentData into an unsaved instance.
///
/// The author and two reviewers are picked from `author_ids` by `index`.
pub fn document_to_instance(doc: &DocumentData, index: usize, author_ids: &[InstanceId]) -> Instance {
    let pick = |offset: usize| author_ids[(index + offset) % author_ids.len()];

    Instance::new()
        .with("title", doc.title.as_str())
        .with("body", doc.body.as_str())
        .with("stats.views", doc.views)
        .with("stats.score", doc.score)
        .with(
            "tags",
            doc.tags.iter().map(|t| Value::from(t.as_str())).collect::<Vec<_>>(),
        )
        .with("digest", doc.digest.clone())
        .with("author", pick(0))
        .with("reviewers", vec![Value::Reference(pick(1)), Value::Reference(pick(2))])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generators_are_deterministic() {
        let first = generate_documents(20);
        let second = generate_documents(20);
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.title, b.title);
            assert_eq!(a.tags, b.tags);
            assert_eq!(a.digest, b.digest);
        }
        assert!(first.iter().all(|d| d.tags.len() <= 4));
    }

    #[test]
    fn test_author_ages_in_range() {
        let authors = generate_authors(100);
        assert_eq!(authors.len(), 100);
        assert!(authors.iter().all(|a| (18..78).contains(&a.age)));
    }
}
