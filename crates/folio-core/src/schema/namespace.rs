//! Namespaces: name-unique registries of committed types.

use std::collections::HashMap;
use std::fmt;

use super::{Type, TypeId};

/// Store-assigned identifier of a namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceId(pub(crate) i64);

impl NamespaceId {
    /// Row id of the namespace in the `namespaces` metadata table.
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A scope of unique type names within one library.
///
/// The namespace owns its types in an arena. Types refer to each other by
/// [`TypeId`] and are resolved through the [`Library`](crate::Library).
#[derive(Debug)]
pub struct Namespace {
    id: NamespaceId,
    name: String,
    types: Vec<Type>,
    by_name: HashMap<String, usize>,
    by_id: HashMap<TypeId, usize>,
}

impl Namespace {
    pub(crate) fn new(id: NamespaceId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            types: Vec::new(),
            by_name: HashMap::new(),
            by_id: HashMap::new(),
        }
    }

    /// Namespace id.
    pub fn id(&self) -> NamespaceId {
        self.id
    }

    /// Namespace name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a type id by name.
    pub fn get_type(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).map(|&slot| self.types[slot].id)
    }

    /// Look up a type by name.
    pub fn type_named(&self, name: &str) -> Option<&Type> {
        self.by_name.get(name).map(|&slot| &self.types[slot])
    }

    /// Look up a type by id.
    pub fn type_by_id(&self, id: TypeId) -> Option<&Type> {
        self.by_id.get(&id).map(|&slot| &self.types[slot])
    }

    /// All types in commit order.
    pub fn types(&self) -> impl Iterator<Item = &Type> {
        self.types.iter()
    }

    /// Number of types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if the namespace holds no types.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Add a committed type. The caller guarantees the name is free.
    pub(crate) fn insert(&mut self, ty: Type) {
        let slot = self.types.len();
        self.by_name.insert(ty.name.clone(), slot);
        self.by_id.insert(ty.id, slot);
        self.types.push(ty);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{TypeLayout, TypeTables};

    fn dummy_type(id: i64, name: &str) -> Type {
        Type {
            id: TypeId(id),
            name: name.to_string(),
            namespace: NamespaceId(1),
            namespace_name: "main".to_string(),
            instantiable: false,
            layout: TypeLayout::new(),
            property_ids: Vec::new(),
            tables: TypeTables::default(),
        }
    }

    #[test]
    fn test_lookup_by_name_and_id() {
        let mut ns = Namespace::new(NamespaceId(1), "main");
        assert!(ns.is_empty());

        ns.insert(dummy_type(7, "foo"));
        ns.insert(dummy_type(9, "bar"));

        assert_eq!(ns.len(), 2);
        assert_eq!(ns.get_type("foo"), Some(TypeId(7)));
        assert_eq!(ns.type_by_id(TypeId(9)).unwrap().name(), "bar");
        assert!(ns.get_type("baz").is_none());
        assert_eq!(
            ns.types().map(|t| t.name()).collect::<Vec<_>>(),
            vec!["foo", "bar"]
        );
    }
}
