//! Physical planning: turns a layout into table definitions.
//!
//! Planning is pure. The commit engine executes the resulting definitions
//! inside its transaction, and reopening a library re-runs the planner to
//! rebuild table handles without touching the store.

use crate::error::{Result, SchemaError};
use crate::integrity::ReferenceKind;
use crate::library::Library;
use crate::store::{ColumnDef, ColumnType, DeleteBehavior, TableDef};

use super::{ArrayTable, DataType, PropertyLayout, ScalarColumn, TableKind, Type, TypeId, TypeLayout, TypeTables};

/// Unique instance identifier column of every instance table.
pub(crate) const UUID_COLUMN: &str = "uuid";

/// Owner column of every array sub-table.
pub(crate) const INSTANCE_COLUMN: &str = "instance";

/// Element column of every array sub-table.
pub(crate) const VALUE_COLUMN: &str = "value";

/// A reference discovered while planning, not yet tied to its source type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingReference {
    pub target: TypeId,
    pub property: String,
    pub kind: ReferenceKind,
}

/// Everything a commit creates for an instantiable type.
#[derive(Debug)]
pub(crate) struct PhysicalPlan {
    pub tables: TypeTables,
    /// Definitions in creation order, instance table first.
    pub definitions: Vec<(TableDef, TableKind)>,
    pub references: Vec<PendingReference>,
}

impl PhysicalPlan {
    /// Plan the tables of `layout` with the given instance table name.
    pub(crate) fn generate(
        library: &Library,
        instance_table: &str,
        layout: &TypeLayout,
    ) -> Result<Self> {
        let mut planner = Planner {
            library,
            instance: TableDef::new(instance_table)
                .with_column(ColumnDef::surrogate_id())
                .with_column(ColumnDef::new(UUID_COLUMN, ColumnType::Text).not_null().unique()),
            sub_tables: Vec::new(),
            tables: TypeTables {
                instance: Some(instance_table.to_string()),
                ..Default::default()
            },
            references: Vec::new(),
        };

        for prop in layout.properties() {
            planner.generate(prop, "")?;
        }

        let mut definitions = Vec::with_capacity(planner.sub_tables.len() + 1);
        definitions.push((planner.instance, TableKind::Instance));
        definitions.extend(planner.sub_tables);

        Ok(Self {
            tables: planner.tables,
            definitions,
            references: planner.references,
        })
    }
}

struct Planner<'a> {
    library: &'a Library,
    instance: TableDef,
    sub_tables: Vec<(TableDef, TableKind)>,
    tables: TypeTables,
    references: Vec<PendingReference>,
}

impl<'a> Planner<'a> {
    fn generate(&mut self, prop: &PropertyLayout, prefix: &str) -> Result<()> {
        let path = format!("{prefix}{}", prop.name());

        match prop.data_type() {
            DataType::Nested => {
                let nested = self.resolve(prop)?;
                let prefix = format!("{path}.");
                for inner in nested.layout().properties() {
                    self.generate(inner, &prefix)?;
                }
            }
            DataType::Reference => {
                let target = self.resolve(prop)?;
                let target_table = target.instance_table().ok_or_else(|| {
                    SchemaError::NotInstantiable {
                        name: path.clone(),
                        target: target.qualified_name(),
                    }
                })?;

                if prop.is_array() {
                    let name = self.sub_table_name(&path);
                    let def = self.sub_table(&name).with_column(
                        ColumnDef::new(VALUE_COLUMN, ColumnType::Text).references(
                            target_table,
                            UUID_COLUMN,
                            DeleteBehavior::Cascade,
                        ),
                    );
                    self.references.push(PendingReference {
                        target: target.id(),
                        property: path.clone(),
                        kind: ReferenceKind::Array {
                            table: name.clone(),
                        },
                    });
                    self.push_array(
                        def,
                        ArrayTable {
                            name,
                            path,
                            kind: TableKind::ReferenceArray,
                            data_type: DataType::Reference,
                            reference_type: Some(target.id()),
                        },
                    );
                } else {
                    self.instance.add_column(
                        ColumnDef::new(path.as_str(), ColumnType::Text).references(
                            target_table,
                            UUID_COLUMN,
                            DeleteBehavior::SetNull,
                        ),
                    );
                    self.references.push(PendingReference {
                        target: target.id(),
                        property: path.clone(),
                        kind: ReferenceKind::Column {
                            table: self.instance.name.clone(),
                            column: path.clone(),
                        },
                    });
                    self.tables.columns.push(ScalarColumn {
                        path,
                        data_type: DataType::Reference,
                        is_blob: false,
                        reference_type: Some(target.id()),
                    });
                }
            }
            data_type => {
                let column_type = data_type.column_type().ok_or_else(|| {
                    SchemaError::CorruptMetadata(format!(
                        "property \"{path}\" has no physical column type"
                    ))
                })?;

                if prop.is_array() {
                    let kind = if data_type == DataType::Blob {
                        TableKind::BlobArray
                    } else {
                        TableKind::PrimitiveArray
                    };
                    let name = self.sub_table_name(&path);
                    let def = self
                        .sub_table(&name)
                        .with_column(ColumnDef::new(VALUE_COLUMN, column_type));
                    self.push_array(
                        def,
                        ArrayTable {
                            name,
                            path,
                            kind,
                            data_type,
                            reference_type: None,
                        },
                    );
                } else {
                    let column_type = if prop.is_blob() {
                        ColumnType::Blob
                    } else {
                        column_type
                    };
                    self.instance
                        .add_column(ColumnDef::new(path.as_str(), column_type));
                    self.tables.columns.push(ScalarColumn {
                        path,
                        data_type,
                        is_blob: prop.is_blob(),
                        reference_type: None,
                    });
                }
            }
        }

        Ok(())
    }

    fn resolve(&self, prop: &PropertyLayout) -> Result<&'a Type> {
        let id = prop.reference_type().ok_or_else(|| {
            SchemaError::CorruptMetadata(format!(
                "{} property \"{}\" has no target type",
                prop.data_type(),
                prop.name()
            ))
        })?;
        let ty = self
            .library
            .get_type(id)
            .ok_or(SchemaError::UnknownType { id: id.get() })?;
        Ok(ty)
    }

    fn sub_table_name(&self, path: &str) -> String {
        format!("{}_{}", self.instance.name, path)
    }

    /// Sub-table with the surrogate id and the cascading owner column.
    fn sub_table(&self, name: &str) -> TableDef {
        TableDef::new(name)
            .with_column(ColumnDef::surrogate_id())
            .with_column(
                ColumnDef::new(INSTANCE_COLUMN, ColumnType::Text)
                    .not_null()
                    .references(self.instance.name.as_str(), UUID_COLUMN, DeleteBehavior::Cascade),
            )
    }

    fn push_array(&mut self, def: TableDef, table: ArrayTable) {
        self.sub_tables.push((def, table.kind));
        self.tables.push_array(table);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LibraryConfig;

    #[test]
    fn test_plan_flattens_nested_and_splits_arrays() {
        let mut library = Library::create(LibraryConfig::temporary()).unwrap();
        let main = library.create_namespace("main").unwrap();

        let mut leaf = TypeLayout::new();
        leaf.create_primitive("leaf", DataType::Int32).unwrap();
        let (_, inner) = leaf.commit(&mut library, main, "inner", false).unwrap();

        let mut middle = TypeLayout::new();
        middle
            .create_nested("inner", library.get_type(inner).unwrap())
            .unwrap()
            .create_string_array("tags")
            .unwrap();
        let (_, middle) = middle.commit(&mut library, main, "middle", false).unwrap();

        let mut target = TypeLayout::new();
        target.create_string("name").unwrap();
        let (_, target) = target.commit(&mut library, main, "target", true).unwrap();

        let mut layout = TypeLayout::new();
        layout
            .create_primitive("a", DataType::Float)
            .unwrap()
            .create_nested("outer", library.get_type(middle).unwrap())
            .unwrap()
            .create_reference("owner", library.get_type(target).unwrap())
            .unwrap()
            .create_reference_array("items", library.get_type(target).unwrap())
            .unwrap()
            .create_blob_array("files")
            .unwrap();

        let plan = PhysicalPlan::generate(&library, "main_foo", &layout).unwrap();

        let (instance, kind) = &plan.definitions[0];
        assert_eq!(*kind, TableKind::Instance);
        assert_eq!(
            instance.column_names().collect::<Vec<_>>(),
            vec!["id", "uuid", "a", "outer.inner.leaf", "owner"]
        );

        let sub_tables: Vec<_> = plan.definitions[1..]
            .iter()
            .map(|(def, kind)| (def.name.as_str(), *kind))
            .collect();
        assert_eq!(
            sub_tables,
            vec![
                ("main_foo_outer.tags", TableKind::PrimitiveArray),
                ("main_foo_items", TableKind::ReferenceArray),
                ("main_foo_files", TableKind::BlobArray),
            ]
        );

        assert_eq!(plan.tables.columns().len(), 3);
        assert!(plan.tables.has_path("outer.tags"));
        assert_eq!(
            plan.references
                .iter()
                .map(|r| r.property.as_str())
                .collect::<Vec<_>>(),
            vec!["owner", "items"]
        );
        assert!(plan.references.iter().all(|r| r.target == target));
    }

    #[test]
    fn test_sub_tables_cascade_from_owner() {
        let library = Library::create(LibraryConfig::temporary()).unwrap();
        let mut layout = TypeLayout::new();
        layout.create_primitive_array("xs", DataType::Double).unwrap();

        let plan = PhysicalPlan::generate(&library, "main_foo", &layout).unwrap();
        let sql = plan.definitions[1].0.create_sql();
        assert!(sql.contains(r#""instance" TEXT NOT NULL REFERENCES "main_foo"("uuid") ON DELETE CASCADE"#));
        assert!(sql.contains(r#""value" REAL"#));
    }
}
