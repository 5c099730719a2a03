//! Global metadata tables mirroring every committed schema.
//!
//! The rows in these tables are the durable copy of the in-memory registry:
//! reopening a library replays them in id order.

use rusqlite::{params, Connection};

/// Table of namespace definitions.
pub const NAMESPACES_TABLE: &str = "namespaces";

/// Table of type definitions.
pub const TYPES_TABLE: &str = "types";

/// Table of property definitions.
pub const PROPERTIES_TABLE: &str = "properties";

/// Table of tables generated for committed types.
pub const GENERATED_TABLES_TABLE: &str = "generated_tables";

const CREATE_METADATA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS "namespaces" (
    "id" INTEGER PRIMARY KEY AUTOINCREMENT,
    "name" TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS "types" (
    "id" INTEGER PRIMARY KEY AUTOINCREMENT,
    "namespace_id" INTEGER NOT NULL REFERENCES "namespaces"("id"),
    "name" TEXT NOT NULL,
    "instantiable" INTEGER NOT NULL,
    UNIQUE ("namespace_id", "name")
);

CREATE TABLE IF NOT EXISTS "properties" (
    "id" INTEGER PRIMARY KEY AUTOINCREMENT,
    "type_id" INTEGER NOT NULL REFERENCES "types"("id"),
    "name" TEXT NOT NULL,
    "data_type" TEXT NOT NULL,
    "reference_type_id" INTEGER REFERENCES "types"("id"),
    "is_array" INTEGER NOT NULL,
    "is_blob" INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS "generated_tables" (
    "id" INTEGER PRIMARY KEY AUTOINCREMENT,
    "type_id" INTEGER NOT NULL REFERENCES "types"("id"),
    "table_name" TEXT NOT NULL UNIQUE,
    "table_kind" TEXT NOT NULL
        CHECK ("table_kind" IN ('instance', 'primitive_array', 'blob_array', 'reference_array'))
);
"#;

/// A row of the `namespaces` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NamespaceRow {
    pub id: i64,
    pub name: String,
}

/// A row of the `types` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TypeRow {
    pub id: i64,
    pub namespace_id: i64,
    pub name: String,
    pub instantiable: bool,
}

/// A row of the `properties` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PropertyRow {
    pub id: i64,
    pub type_id: i64,
    pub name: String,
    pub data_type: String,
    pub reference_type_id: Option<i64>,
    pub is_array: bool,
    pub is_blob: bool,
}

/// A row of the `generated_tables` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GeneratedTableRow {
    pub type_id: i64,
    pub table_name: String,
    pub table_kind: String,
}

/// Every metadata row, each list ordered by id.
#[derive(Debug, Default)]
pub(crate) struct MetadataSnapshot {
    pub namespaces: Vec<NamespaceRow>,
    pub types: Vec<TypeRow>,
    pub properties: Vec<PropertyRow>,
    pub generated_tables: Vec<GeneratedTableRow>,
}

/// Create the metadata tables if they do not exist yet.
pub(crate) fn create_metadata_tables(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(CREATE_METADATA_SQL)
}

/// Insert a namespace row and return its id.
pub(crate) fn insert_namespace(conn: &Connection, name: &str) -> rusqlite::Result<i64> {
    let mut stmt =
        conn.prepare_cached(r#"INSERT INTO "namespaces" ("name") VALUES (?1)"#)?;
    stmt.execute([name])?;
    Ok(conn.last_insert_rowid())
}

/// Insert a type row and return its id.
pub(crate) fn insert_type(
    conn: &Connection,
    namespace_id: i64,
    name: &str,
    instantiable: bool,
) -> rusqlite::Result<i64> {
    let mut stmt = conn.prepare_cached(
        r#"INSERT INTO "types" ("namespace_id", "name", "instantiable") VALUES (?1, ?2, ?3)"#,
    )?;
    stmt.execute(params![namespace_id, name, instantiable])?;
    Ok(conn.last_insert_rowid())
}

/// Insert a property row and return its id.
pub(crate) fn insert_property(
    conn: &Connection,
    type_id: i64,
    name: &str,
    data_type: &str,
    reference_type_id: Option<i64>,
    is_array: bool,
    is_blob: bool,
) -> rusqlite::Result<i64> {
    let mut stmt = conn.prepare_cached(
        r#"INSERT INTO "properties"
               ("type_id", "name", "data_type", "reference_type_id", "is_array", "is_blob")
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
    )?;
    stmt.execute(params![
        type_id,
        name,
        data_type,
        reference_type_id,
        is_array,
        is_blob
    ])?;
    Ok(conn.last_insert_rowid())
}

/// Record a generated table.
pub(crate) fn insert_generated_table(
    conn: &Connection,
    type_id: i64,
    table_name: &str,
    table_kind: &str,
) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare_cached(
        r#"INSERT INTO "generated_tables" ("type_id", "table_name", "table_kind") VALUES (?1, ?2, ?3)"#,
    )?;
    stmt.execute(params![type_id, table_name, table_kind])?;
    Ok(())
}

/// Read every metadata row.
pub(crate) fn load_snapshot(conn: &Connection) -> rusqlite::Result<MetadataSnapshot> {
    let namespaces = conn
        .prepare(r#"SELECT "id", "name" FROM "namespaces" ORDER BY "id""#)?
        .query_map([], |row| {
            Ok(NamespaceRow {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let types = conn
        .prepare(
            r#"SELECT "id", "namespace_id", "name", "instantiable" FROM "types" ORDER BY "id""#,
        )?
        .query_map([], |row| {
            Ok(TypeRow {
                id: row.get(0)?,
                namespace_id: row.get(1)?,
                name: row.get(2)?,
                instantiable: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let properties = conn
        .prepare(
            r#"SELECT "id", "type_id", "name", "data_type", "reference_type_id", "is_array", "is_blob"
               FROM "properties" ORDER BY "id""#,
        )?
        .query_map([], |row| {
            Ok(PropertyRow {
                id: row.get(0)?,
                type_id: row.get(1)?,
                name: row.get(2)?,
                data_type: row.get(3)?,
                reference_type_id: row.get(4)?,
                is_array: row.get(5)?,
                is_blob: row.get(6)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let generated_tables = conn
        .prepare(
            r#"SELECT "type_id", "table_name", "table_kind" FROM "generated_tables" ORDER BY "id""#,
        )?
        .query_map([], |row| {
            Ok(GeneratedTableRow {
                type_id: row.get(0)?,
                table_name: row.get(1)?,
                table_kind: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(MetadataSnapshot {
        namespaces,
        types,
        properties,
        generated_tables,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_metadata_tables(&conn).unwrap();
        conn
    }

    #[test]
    fn test_create_is_idempotent() {
        let conn = test_conn();
        create_metadata_tables(&conn).unwrap();
    }

    #[test]
    fn test_rows_round_trip_in_id_order() {
        let conn = test_conn();

        let ns = insert_namespace(&conn, "main").unwrap();
        let foo = insert_type(&conn, ns, "foo", true).unwrap();
        let bar = insert_type(&conn, ns, "bar", false).unwrap();
        insert_property(&conn, foo, "a", "float", None, false, false).unwrap();
        insert_property(&conn, bar, "r", "reference", Some(foo), true, false).unwrap();
        insert_generated_table(&conn, foo, "main_foo", "instance").unwrap();

        let snapshot = load_snapshot(&conn).unwrap();
        assert_eq!(
            snapshot.namespaces,
            vec![NamespaceRow {
                id: ns,
                name: "main".into()
            }]
        );
        assert_eq!(snapshot.types.len(), 2);
        assert_eq!(snapshot.types[0].name, "foo");
        assert!(snapshot.types[0].instantiable);
        assert!(!snapshot.types[1].instantiable);
        assert_eq!(snapshot.properties[1].reference_type_id, Some(foo));
        assert!(snapshot.properties[1].is_array);
        assert_eq!(snapshot.generated_tables[0].table_kind, "instance");
    }

    #[test]
    fn test_type_names_unique_per_namespace() {
        let conn = test_conn();
        let a = insert_namespace(&conn, "a").unwrap();
        let b = insert_namespace(&conn, "b").unwrap();

        insert_type(&conn, a, "foo", true).unwrap();
        insert_type(&conn, b, "foo", true).unwrap();
        assert!(insert_type(&conn, a, "foo", true).is_err());
    }

    #[test]
    fn test_table_kind_is_checked() {
        let conn = test_conn();
        let ns = insert_namespace(&conn, "main").unwrap();
        let ty = insert_type(&conn, ns, "foo", true).unwrap();
        assert!(insert_generated_table(&conn, ty, "main_foo", "bogus").is_err());
    }
}
