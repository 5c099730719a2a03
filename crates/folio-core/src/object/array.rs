//! Sub-handlers for array sub-tables.
//!
//! Elements are read back ordered by the sub-table's surrogate id, so an
//! array always comes back in the order it was written.

use std::marker::PhantomData;

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, Connection};

use crate::error::{Result, ValueError};
use crate::schema::plan::{INSTANCE_COLUMN, VALUE_COLUMN};
use crate::schema::ArrayTable;
use crate::store::quote_ident;

use super::codec::{BlobCodec, ElementCodec, PrimitiveCodec, ReferenceCodec};
use super::{Instance, InstanceId, Value};

/// Handler of one array sub-table, parameterized by its element codec.
#[derive(Debug)]
pub(crate) struct ArrayHandler<C> {
    table: ArrayTable,
    insert_sql: String,
    select_sql: String,
    delete_sql: String,
    codec: PhantomData<C>,
}

pub(crate) type PrimitiveArrayHandler = ArrayHandler<PrimitiveCodec>;
pub(crate) type BlobArrayHandler = ArrayHandler<BlobCodec>;
pub(crate) type ReferenceArrayHandler = ArrayHandler<ReferenceCodec>;

impl<C: ElementCodec> ArrayHandler<C> {
    /// Build the statements and compile them into the connection's cache.
    pub(crate) fn new(conn: &Connection, table: &ArrayTable) -> Result<Self> {
        debug_assert_eq!(table.kind, C::KIND);

        let name = quote_ident(&table.name);
        let instance = quote_ident(INSTANCE_COLUMN);
        let value = quote_ident(VALUE_COLUMN);

        let handler = Self {
            table: table.clone(),
            insert_sql: format!("INSERT INTO {name} ({instance}, {value}) VALUES (?1, ?2)"),
            select_sql: format!(
                r#"SELECT {value} FROM {name} WHERE {instance} = ?1 ORDER BY "id""#
            ),
            delete_sql: format!("DELETE FROM {name} WHERE {instance} = ?1"),
            codec: PhantomData,
        };

        for sql in [&handler.insert_sql, &handler.select_sql, &handler.delete_sql] {
            conn.prepare_cached(sql)?;
        }

        Ok(handler)
    }

    /// Flattened property path served by this handler.
    pub(crate) fn path(&self) -> &str {
        &self.table.path
    }

    /// Write the elements of `instance`'s array. A missing or null array is
    /// empty.
    pub(crate) fn insert(&self, conn: &Connection, id: &InstanceId, instance: &Instance) -> Result<usize> {
        let items = match instance.get(&self.table.path) {
            None | Some(Value::Null) => return Ok(0),
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(ValueError::Mismatch {
                    property: self.table.path.clone(),
                    expected: format!("array of {}", self.table.data_type),
                    found: other.kind_name(),
                }
                .into())
            }
        };

        let mut stmt = conn.prepare_cached(&self.insert_sql)?;
        for item in items {
            let encoded = C::encode(&self.table.path, self.table.data_type, item)?;
            stmt.execute(params![id, encoded])?;
        }
        Ok(items.len())
    }

    /// Read the elements owned by `id` into `instance`.
    pub(crate) fn select_into(&self, conn: &Connection, id: &InstanceId, instance: &mut Instance) -> Result<()> {
        let mut stmt = conn.prepare_cached(&self.select_sql)?;
        let stored = stmt
            .query_map([id], |row| row.get::<_, SqlValue>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let items = stored
            .into_iter()
            .map(|value| C::decode(&self.table.path, self.table.data_type, value))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        instance.set(self.table.path.clone(), Value::Array(items));
        Ok(())
    }

    /// Remove every element owned by `id`.
    pub(crate) fn delete(&self, conn: &Connection, id: &InstanceId) -> Result<usize> {
        Ok(conn.prepare_cached(&self.delete_sql)?.execute([id])?)
    }

    /// Replace the stored elements with the current ones.
    pub(crate) fn update(&self, conn: &Connection, id: &InstanceId, instance: &Instance) -> Result<usize> {
        self.delete(conn, id)?;
        self.insert(conn, id, instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DataType, TableKind};

    fn setup(kind: TableKind, data_type: DataType) -> (Connection, ArrayTable) {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"CREATE TABLE "main_foo_xs" ("id" INTEGER PRIMARY KEY AUTOINCREMENT, "instance" TEXT NOT NULL, "value")"#,
        )
        .unwrap();
        let table = ArrayTable {
            name: "main_foo_xs".into(),
            path: "xs".into(),
            kind,
            data_type,
            reference_type: None,
        };
        (conn, table)
    }

    #[test]
    fn test_elements_keep_insertion_order() {
        let (conn, table) = setup(TableKind::PrimitiveArray, DataType::Int32);
        let handler = PrimitiveArrayHandler::new(&conn, &table).unwrap();
        let id = InstanceId::generate();

        let values = vec![Value::Int32(3), Value::Int32(1), Value::Int32(2)];
        let instance = Instance::new().with("xs", values.clone());
        assert_eq!(handler.insert(&conn, &id, &instance).unwrap(), 3);

        let mut fetched = Instance::new();
        handler.select_into(&conn, &id, &mut fetched).unwrap();
        assert_eq!(fetched.get("xs"), Some(&Value::Array(values)));
        assert_eq!(handler.path(), "xs");
    }

    #[test]
    fn test_update_replaces_elements() {
        let (conn, table) = setup(TableKind::PrimitiveArray, DataType::String);
        let handler = PrimitiveArrayHandler::new(&conn, &table).unwrap();
        let id = InstanceId::generate();
        let other = InstanceId::generate();

        let instance = Instance::new().with("xs", vec![Value::from("a"), Value::from("b")]);
        handler.insert(&conn, &id, &instance).unwrap();
        handler.insert(&conn, &other, &instance).unwrap();

        let replaced = Instance::new().with("xs", vec![Value::from("c")]);
        handler.update(&conn, &id, &replaced).unwrap();

        let mut fetched = Instance::new();
        handler.select_into(&conn, &id, &mut fetched).unwrap();
        assert_eq!(fetched.get("xs"), Some(&Value::Array(vec![Value::from("c")])));

        handler.select_into(&conn, &other, &mut fetched).unwrap();
        assert_eq!(fetched.get("xs").and_then(Value::as_array).map(<[Value]>::len), Some(2));
    }

    #[test]
    fn test_missing_array_is_empty() {
        let (conn, table) = setup(TableKind::BlobArray, DataType::Blob);
        let handler = BlobArrayHandler::new(&conn, &table).unwrap();
        let id = InstanceId::generate();

        assert_eq!(handler.insert(&conn, &id, &Instance::new()).unwrap(), 0);
        let mut fetched = Instance::new();
        handler.select_into(&conn, &id, &mut fetched).unwrap();
        assert_eq!(fetched.get("xs"), Some(&Value::Array(vec![])));
    }

    #[test]
    fn test_rejects_non_array_and_null_elements() {
        let (conn, table) = setup(TableKind::ReferenceArray, DataType::Reference);
        let handler = ReferenceArrayHandler::new(&conn, &table).unwrap();
        let id = InstanceId::generate();

        let scalar = Instance::new().with("xs", InstanceId::generate());
        assert!(matches!(
            handler.insert(&conn, &id, &scalar),
            Err(crate::Error::Value(ValueError::Mismatch { .. }))
        ));

        let with_null = Instance::new().with("xs", vec![Value::Null]);
        assert!(matches!(
            handler.insert(&conn, &id, &with_null),
            Err(crate::Error::Value(ValueError::NullElement { .. }))
        ));
    }
}
