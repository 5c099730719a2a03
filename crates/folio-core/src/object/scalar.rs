//! Sub-handler for the instance table.

use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, OptionalExtension};

use crate::error::Result;
use crate::schema::plan::UUID_COLUMN;
use crate::schema::ScalarColumn;
use crate::store::quote_ident;

use super::codec::{decode_scalar, encode_scalar};
use super::{Instance, InstanceId, Value};

/// Reads and writes the scalar, blob and reference columns of one instance
/// table.
#[derive(Debug)]
pub(crate) struct ScalarHandler {
    columns: Vec<ScalarColumn>,
    create_sql: String,
    insert_sql: String,
    update_sql: String,
    select_sql: String,
    exists_sql: String,
    list_sql: String,
    delete_sql: String,
}

impl ScalarHandler {
    /// Build the statements and compile them into the connection's cache.
    pub(crate) fn new(conn: &Connection, table: &str, columns: &[ScalarColumn]) -> Result<Self> {
        let table = quote_ident(table);
        let uuid = quote_ident(UUID_COLUMN);
        let names: Vec<String> = columns.iter().map(|c| quote_ident(&c.path)).collect();

        let mut insert_columns = vec![uuid.clone()];
        insert_columns.extend(names.iter().cloned());
        let placeholders: Vec<String> = (1..=insert_columns.len()).map(|i| format!("?{i}")).collect();

        let assignments = if names.is_empty() {
            format!("{uuid} = {uuid}")
        } else {
            names
                .iter()
                .enumerate()
                .map(|(i, name)| format!("{name} = ?{}", i + 2))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut select_columns = vec![uuid.clone()];
        select_columns.extend(names.iter().cloned());

        let handler = Self {
            columns: columns.to_vec(),
            create_sql: format!("INSERT INTO {table} ({uuid}) VALUES (?1)"),
            insert_sql: format!(
                "INSERT INTO {table} ({}) VALUES ({})",
                insert_columns.join(", "),
                placeholders.join(", ")
            ),
            update_sql: format!("UPDATE {table} SET {assignments} WHERE {uuid} = ?1"),
            select_sql: format!(
                "SELECT {} FROM {table} WHERE {uuid} = ?1",
                select_columns.join(", ")
            ),
            exists_sql: format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE {uuid} = ?1)"),
            list_sql: format!(r#"SELECT {uuid} FROM {table} ORDER BY "id""#),
            delete_sql: format!("DELETE FROM {table} WHERE {uuid} = ?1"),
        };

        for sql in [
            &handler.create_sql,
            &handler.insert_sql,
            &handler.update_sql,
            &handler.select_sql,
            &handler.exists_sql,
            &handler.list_sql,
            &handler.delete_sql,
        ] {
            conn.prepare_cached(sql)?;
        }

        Ok(handler)
    }

    /// Columns in table order.
    pub(crate) fn columns(&self) -> &[ScalarColumn] {
        &self.columns
    }

    /// Insert a row with every column at its default.
    pub(crate) fn create(&self, conn: &Connection, id: &InstanceId) -> Result<()> {
        conn.prepare_cached(&self.create_sql)?.execute([id])?;
        Ok(())
    }

    /// Insert the row of `instance` under `id`.
    pub(crate) fn insert(&self, conn: &Connection, id: &InstanceId, instance: &Instance) -> Result<()> {
        let params = self.bind(id, instance)?;
        conn.prepare_cached(&self.insert_sql)?
            .execute(params_from_iter(params))?;
        Ok(())
    }

    /// Overwrite every column of the row. Returns false if there is no row.
    pub(crate) fn update(&self, conn: &Connection, instance: &Instance) -> Result<bool> {
        let params = self.bind(&instance.id(), instance)?;
        let changed = conn
            .prepare_cached(&self.update_sql)?
            .execute(params_from_iter(params))?;
        Ok(changed > 0)
    }

    /// Read the row into `instance`. Returns false if there is no row.
    pub(crate) fn select_into(
        &self,
        conn: &Connection,
        id: &InstanceId,
        instance: &mut Instance,
    ) -> Result<bool> {
        let mut stmt = conn.prepare_cached(&self.select_sql)?;
        let row = stmt
            .query_row([id], |row| {
                (1..=self.columns.len())
                    .map(|i| row.get::<_, SqlValue>(i))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })
            .optional()?;

        let Some(stored) = row else {
            return Ok(false);
        };
        for (column, value) in self.columns.iter().zip(stored) {
            let value = decode_scalar(&column.path, column.data_type, column.is_blob, value)?;
            instance.set(column.path.clone(), value);
        }
        Ok(true)
    }

    pub(crate) fn exists(&self, conn: &Connection, id: &InstanceId) -> Result<bool> {
        let exists = conn
            .prepare_cached(&self.exists_sql)?
            .query_row([id], |row| row.get(0))?;
        Ok(exists)
    }

    pub(crate) fn list(&self, conn: &Connection) -> Result<Vec<InstanceId>> {
        let mut stmt = conn.prepare_cached(&self.list_sql)?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<InstanceId>>>()?;
        Ok(ids)
    }

    /// Delete the row. Returns false if there was none.
    pub(crate) fn delete(&self, conn: &Connection, id: &InstanceId) -> Result<bool> {
        let removed = conn.prepare_cached(&self.delete_sql)?.execute([id])?;
        Ok(removed > 0)
    }

    /// Parameters `?1 = uuid, ?2.. = columns`. Missing values bind as null.
    fn bind(&self, id: &InstanceId, instance: &Instance) -> Result<Vec<SqlValue>> {
        let mut params = Vec::with_capacity(self.columns.len() + 1);
        params.push(SqlValue::Text(id.to_string()));
        for column in &self.columns {
            let value = instance.get(&column.path).unwrap_or(&Value::Null);
            params.push(encode_scalar(
                &column.path,
                column.data_type,
                column.is_blob,
                value,
            )?);
        }
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DataType;

    fn column(path: &str, data_type: DataType) -> ScalarColumn {
        ScalarColumn {
            path: path.to_string(),
            data_type,
            is_blob: false,
            reference_type: None,
        }
    }

    fn setup(columns: &[ScalarColumn]) -> (Connection, ScalarHandler) {
        let conn = Connection::open_in_memory().unwrap();
        let mut ddl = String::from(
            r#"CREATE TABLE "main_foo" ("id" INTEGER PRIMARY KEY AUTOINCREMENT, "uuid" TEXT NOT NULL UNIQUE"#,
        );
        for c in columns {
            ddl.push_str(&format!(", {}", quote_ident(&c.path)));
        }
        ddl.push(')');
        conn.execute_batch(&ddl).unwrap();
        let handler = ScalarHandler::new(&conn, "main_foo", columns).unwrap();
        (conn, handler)
    }

    #[test]
    fn test_insert_select_update_delete() {
        let (conn, handler) = setup(&[
            column("a", DataType::Float),
            column("outer.b", DataType::Int32),
        ]);
        let id = InstanceId::generate();
        let mut instance = Instance::new().with("a", 0.5f32);
        instance.set_id(id);

        handler.insert(&conn, &id, &instance).unwrap();
        assert!(handler.exists(&conn, &id).unwrap());

        let mut fetched = Instance::new();
        assert!(handler.select_into(&conn, &id, &mut fetched).unwrap());
        assert_eq!(fetched.get("a"), Some(&Value::Float(0.5)));
        assert_eq!(fetched.get("outer.b"), Some(&Value::Null));

        instance.set("outer.b", 4i32);
        assert!(handler.update(&conn, &instance).unwrap());
        let mut fetched = Instance::new();
        handler.select_into(&conn, &id, &mut fetched).unwrap();
        assert_eq!(fetched.get("outer.b"), Some(&Value::Int32(4)));

        assert!(handler.delete(&conn, &id).unwrap());
        assert!(!handler.delete(&conn, &id).unwrap());
        assert!(!handler.exists(&conn, &id).unwrap());
        assert!(!handler.select_into(&conn, &id, &mut fetched).unwrap());
    }

    #[test]
    fn test_list_in_insertion_order() {
        let (conn, handler) = setup(&[column("a", DataType::Int64)]);
        let ids: Vec<_> = (0..3).map(|_| InstanceId::generate()).collect();
        for id in &ids {
            handler.create(&conn, id).unwrap();
        }
        assert_eq!(handler.list(&conn).unwrap(), ids);
    }

    #[test]
    fn test_update_without_columns_reports_presence() {
        let (conn, handler) = setup(&[]);
        let id = InstanceId::generate();
        let mut instance = Instance::new();
        instance.set_id(id);

        assert!(!handler.update(&conn, &instance).unwrap());
        handler.create(&conn, &id).unwrap();
        assert!(handler.update(&conn, &instance).unwrap());
    }
}
