//! The library: store connection, namespaces and committed types.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rusqlite::Connection;
use tracing::{debug, info, instrument};

use crate::config::LibraryConfig;
use crate::error::{Error, Result, SchemaError};
use crate::integrity::{ReferenceRegistry, ReverseReference};
use crate::object::ObjectHandler;
use crate::schema::plan::{PendingReference, PhysicalPlan};
use crate::schema::{
    CommitOutcome, DataType, Namespace, NamespaceId, PropertyLayout, TableKind, Type, TypeId,
    TypeLayout, TypeTables,
};
use crate::store::{self, GeneratedTableRow, PropertyRow};

/// An embedded object store.
///
/// Owns the SQLite connection, the namespaces with their committed types,
/// and the reverse-reference registry. Everything committed is mirrored in
/// the metadata tables and rebuilt from them by [`Library::open`].
pub struct Library {
    conn: Connection,
    config: LibraryConfig,
    namespaces: BTreeMap<NamespaceId, Namespace>,
    namespace_names: HashMap<String, NamespaceId>,
    type_owners: HashMap<TypeId, NamespaceId>,
    registry: ReferenceRegistry,
}

impl Library {
    /// Create a new library. Fails if the library file already exists.
    pub fn create(config: LibraryConfig) -> Result<Self> {
        if !config.is_in_memory() && config.path().exists() {
            return Err(Error::LibraryExists(config.path().to_path_buf()));
        }

        let conn = config.open_connection()?;
        store::create_metadata_tables(&conn)?;
        info!(path = %config.path().display(), "created library");

        Ok(Self::with_connection(conn, config))
    }

    /// Open an existing library and rebuild its schema from the metadata tables.
    #[instrument(skip(config), fields(path = %config.path().display()))]
    pub fn open(config: LibraryConfig) -> Result<Self> {
        if config.is_in_memory() || !config.path().exists() {
            return Err(Error::LibraryMissing(config.path().to_path_buf()));
        }

        let conn = config.open_connection()?;
        let mut library = Self::with_connection(conn, config);
        library.load()?;
        info!(
            namespaces = library.namespaces.len(),
            types = library.type_owners.len(),
            "opened library"
        );

        Ok(library)
    }

    /// Open the library if its file exists, create it otherwise.
    ///
    /// The flag is true when the library was created.
    pub fn open_or_create(config: LibraryConfig) -> Result<(Self, bool)> {
        if config.is_in_memory() || !config.path().exists() {
            Ok((Self::create(config)?, true))
        } else {
            Ok((Self::open(config)?, false))
        }
    }

    fn with_connection(conn: Connection, config: LibraryConfig) -> Self {
        Self {
            conn,
            config,
            namespaces: BTreeMap::new(),
            namespace_names: HashMap::new(),
            type_owners: HashMap::new(),
            registry: ReferenceRegistry::new(),
        }
    }

    /// The store connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// The configuration this library was opened with.
    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    // Namespaces.

    /// Create a namespace.
    pub fn create_namespace(&mut self, name: &str) -> Result<NamespaceId> {
        if name.is_empty() {
            return Err(SchemaError::EmptyNamespaceName.into());
        }
        if self.namespace_names.contains_key(name) {
            return Err(SchemaError::NamespaceExists {
                name: name.to_string(),
            }
            .into());
        }

        let id = NamespaceId(store::insert_namespace(&self.conn, name)?);
        self.insert_namespace(Namespace::new(id, name));
        info!(namespace = name, %id, "created namespace");
        Ok(id)
    }

    /// Look up a namespace by name.
    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespace_names
            .get(name)
            .and_then(|id| self.namespaces.get(id))
    }

    /// Look up a namespace by id.
    pub fn namespace_by_id(&self, id: NamespaceId) -> Option<&Namespace> {
        self.namespaces.get(&id)
    }

    /// All namespaces in creation order.
    pub fn namespaces(&self) -> impl Iterator<Item = &Namespace> {
        self.namespaces.values()
    }

    fn insert_namespace(&mut self, namespace: Namespace) {
        self.namespace_names
            .insert(namespace.name().to_string(), namespace.id());
        self.namespaces.insert(namespace.id(), namespace);
    }

    // Types.

    /// Look up a committed type by id.
    pub fn get_type(&self, id: TypeId) -> Option<&Type> {
        self.type_owners
            .get(&id)
            .and_then(|ns| self.namespaces.get(ns))
            .and_then(|ns| ns.type_by_id(id))
    }

    /// Look up a committed type by namespace and type name.
    pub fn find_type(&self, namespace: &str, name: &str) -> Option<&Type> {
        self.namespace(namespace).and_then(|ns| ns.type_named(name))
    }

    /// Commit `layout` as type `name` of `namespace`.
    ///
    /// Same as [`TypeLayout::commit`].
    pub fn create_type(
        &mut self,
        namespace: NamespaceId,
        name: &str,
        layout: &TypeLayout,
        instantiable: bool,
    ) -> Result<(CommitOutcome, TypeId)> {
        layout.commit(self, namespace, name, instantiable)
    }

    /// Register a committed type and the references it declares.
    pub(crate) fn insert_type(&mut self, ty: Type, references: Vec<PendingReference>) {
        for reference in references {
            self.registry.add(
                reference.target,
                ReverseReference {
                    source: ty.id(),
                    property: reference.property,
                    kind: reference.kind,
                },
            );
        }
        self.type_owners.insert(ty.id(), ty.namespace());
        if let Some(ns) = self.namespaces.get_mut(&ty.namespace()) {
            ns.insert(ty);
        }
    }

    // Integrity.

    /// Properties of other types that reference `target`.
    pub fn references_to(&self, target: TypeId) -> &[ReverseReference] {
        self.registry.references_to(target)
    }

    /// The reverse-reference registry.
    pub fn registry(&self) -> &ReferenceRegistry {
        &self.registry
    }

    // Objects.

    /// Build an object handler for an instantiable type.
    pub fn object_handler(&self, type_id: TypeId) -> Result<ObjectHandler<'_>> {
        let ty = self
            .get_type(type_id)
            .ok_or(SchemaError::UnknownType { id: type_id.get() })?;
        if !ty.is_instantiable() {
            return Err(SchemaError::NotInstantiable {
                name: ty.name().to_string(),
                target: ty.qualified_name(),
            }
            .into());
        }
        ObjectHandler::new(self, ty)
    }

    // Reconstruction.

    /// Replay the metadata tables in id order.
    ///
    /// Types can only reference types committed before them, so replaying in
    /// id order always finds every target already registered.
    fn load(&mut self) -> Result<()> {
        let snapshot = store::load_snapshot(&self.conn)?;

        for row in snapshot.namespaces {
            self.insert_namespace(Namespace::new(NamespaceId(row.id), row.name));
        }

        let mut properties: HashMap<i64, Vec<PropertyRow>> = HashMap::new();
        for row in snapshot.properties {
            properties.entry(row.type_id).or_default().push(row);
        }
        let mut generated: HashMap<i64, Vec<GeneratedTableRow>> = HashMap::new();
        for row in snapshot.generated_tables {
            generated.entry(row.type_id).or_default().push(row);
        }

        for row in snapshot.types {
            let namespace = NamespaceId(row.namespace_id);
            let namespace_name = self
                .namespace_by_id(namespace)
                .map(|ns| ns.name().to_string())
                .ok_or_else(|| {
                    SchemaError::CorruptMetadata(format!(
                        "type {} belongs to unknown namespace {}",
                        row.name, row.namespace_id
                    ))
                })?;
            let qualified = format!("{namespace_name}::{}", row.name);

            let mut layout = TypeLayout::new();
            let mut property_ids = Vec::new();
            for prop in properties.remove(&row.id).unwrap_or_default() {
                let data_type = prop.data_type.parse::<DataType>().map_err(|err| {
                    SchemaError::CorruptMetadata(format!("{qualified}.{}: {err}", prop.name))
                })?;
                property_ids.push(prop.id);
                layout.push(PropertyLayout::new(
                    prop.name,
                    data_type,
                    prop.reference_type_id.map(TypeId),
                    prop.is_array,
                    prop.is_blob,
                ));
            }

            let recorded = generated.remove(&row.id).unwrap_or_default();
            let (tables, references) = if row.instantiable {
                let plan = PhysicalPlan::generate(
                    self,
                    &format!("{namespace_name}_{}", row.name),
                    &layout,
                )?;
                verify_tables(&qualified, &plan.tables, &recorded)?;
                (plan.tables, plan.references)
            } else {
                verify_tables(&qualified, &TypeTables::default(), &recorded)?;
                (TypeTables::default(), Vec::new())
            };

            debug!(type_name = %qualified, type_id = row.id, "loaded type");
            self.insert_type(
                Type {
                    id: TypeId(row.id),
                    name: row.name,
                    namespace,
                    namespace_name,
                    instantiable: row.instantiable,
                    layout,
                    property_ids,
                    tables,
                },
                references,
            );
        }

        Ok(())
    }
}

/// Compare the tables a layout plans with the tables recorded for it.
fn verify_tables(qualified: &str, planned: &TypeTables, recorded: &[GeneratedTableRow]) -> Result<()> {
    let planned: BTreeSet<(&str, &str)> = planned
        .generated()
        .map(|(name, kind)| (name, kind.as_str()))
        .collect();

    let mut found = BTreeSet::new();
    for row in recorded {
        let kind = row
            .table_kind
            .parse::<TableKind>()
            .map_err(|err| SchemaError::CorruptMetadata(format!("{qualified}: {err}")))?;
        found.insert((row.table_name.as_str(), kind.as_str()));
    }

    if planned != found {
        return Err(SchemaError::CorruptMetadata(format!(
            "generated tables of {qualified} do not match its layout"
        ))
        .into());
    }
    Ok(())
}

impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("path", &self.config.path())
            .field("namespaces", &self.namespaces.len())
            .field("types", &self.type_owners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::table_exists;

    fn library() -> Library {
        Library::create(LibraryConfig::temporary()).unwrap()
    }

    #[test]
    fn test_namespaces() {
        let mut library = library();
        let main = library.create_namespace("main").unwrap();

        assert_eq!(library.namespace("main").unwrap().id(), main);
        assert_eq!(library.namespace_by_id(main).unwrap().name(), "main");
        assert!(matches!(
            library.create_namespace("main"),
            Err(Error::Schema(SchemaError::NamespaceExists { .. }))
        ));
        assert!(matches!(
            library.create_namespace(""),
            Err(Error::Schema(SchemaError::EmptyNamespaceName))
        ));

        library.create_namespace("other").unwrap();
        let names: Vec<_> = library.namespaces().map(|ns| ns.name()).collect();
        assert_eq!(names, vec!["main", "other"]);
    }

    #[test]
    fn test_create_type_and_lookup() {
        let mut library = library();
        let main = library.create_namespace("main").unwrap();

        let mut layout = TypeLayout::new();
        layout.create_primitive("a", DataType::Int32).unwrap();
        let (outcome, id) = library.create_type(main, "foo", &layout, true).unwrap();

        assert_eq!(outcome, CommitOutcome::Created);
        assert_eq!(library.get_type(id).unwrap().name(), "foo");
        assert_eq!(library.find_type("main", "foo").unwrap().id(), id);
        assert_eq!(library.namespace("main").unwrap().get_type("foo"), Some(id));
        assert!(table_exists(library.connection(), "main_foo").unwrap());
    }

    #[test]
    fn test_object_handler_requires_instantiable_type() {
        let mut library = library();
        let main = library.create_namespace("main").unwrap();

        let mut layout = TypeLayout::new();
        layout.create_string("label").unwrap();
        let (_, id) = layout.commit(&mut library, main, "label", false).unwrap();

        assert!(library.get_type(id).unwrap().tables().instance().is_none());
        assert!(matches!(
            library.object_handler(id),
            Err(Error::Schema(SchemaError::NotInstantiable { .. }))
        ));
        assert!(matches!(
            library.object_handler(TypeId(999)),
            Err(Error::Schema(SchemaError::UnknownType { id: 999 }))
        ));
    }

    #[test]
    fn test_in_memory_cannot_be_opened() {
        assert!(matches!(
            Library::open(LibraryConfig::temporary()),
            Err(Error::LibraryMissing(_))
        ));
        let (_, created) = Library::open_or_create(LibraryConfig::temporary()).unwrap();
        assert!(created);
    }

    #[test]
    fn test_verify_tables_detects_mismatch() {
        let planned = TypeTables {
            instance: Some("main_foo".into()),
            ..Default::default()
        };
        let row = |name: &str, kind: &str| GeneratedTableRow {
            type_id: 1,
            table_name: name.into(),
            table_kind: kind.into(),
        };

        assert!(verify_tables("main::foo", &planned, &[row("main_foo", "instance")]).is_ok());
        assert!(verify_tables("main::foo", &planned, &[]).is_err());
        assert!(verify_tables(
            "main::foo",
            &planned,
            &[row("main_foo", "instance"), row("main_foo_xs", "primitive_array")]
        )
        .is_err());
        assert!(verify_tables("main::foo", &planned, &[row("main_foo", "view")]).is_err());
    }
}
