//! Cascade executor for keeping references consistent on delete.
//!
//! For every property that references the deleted instance's type:
//! - reference columns are set to null
//! - reference-array rows holding the deleted id are removed

use rusqlite::Connection;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::object::InstanceId;
use crate::schema::TypeId;
use crate::store::quote_ident;

use super::{ReferenceKind, ReferenceRegistry};

/// Result of a cascade pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CascadeResult {
    /// Rows whose reference column was set to null.
    pub nullified_rows: usize,
    /// Reference-array rows that were removed.
    pub removed_rows: usize,
}

impl CascadeResult {
    /// Create an empty cascade result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the total number of affected rows.
    pub fn affected_count(&self) -> usize {
        self.nullified_rows + self.removed_rows
    }
}

/// Executes the cascade for deletes of one type's instances.
///
/// When the store enforces foreign keys it has already applied the same
/// actions by the time this runs, and the counts only cover what was left.
pub struct CascadeExecutor<'a> {
    registry: &'a ReferenceRegistry,
}

impl<'a> CascadeExecutor<'a> {
    /// Create a new cascade executor.
    pub fn new(registry: &'a ReferenceRegistry) -> Self {
        Self { registry }
    }

    /// Clear every reference to instance `id` of type `target`.
    ///
    /// Runs on the caller's connection, which is expected to be inside the
    /// delete's transaction.
    #[instrument(skip(self, conn), fields(target = %target, id = %id))]
    pub fn process_delete(
        &self,
        conn: &Connection,
        target: TypeId,
        id: &InstanceId,
    ) -> Result<CascadeResult> {
        let mut result = CascadeResult::new();

        for reference in self.registry.references_to(target) {
            match &reference.kind {
                ReferenceKind::Column { table, column } => {
                    let column = quote_ident(column);
                    let sql = format!(
                        "UPDATE {} SET {column} = NULL WHERE {column} = ?1",
                        quote_ident(table)
                    );
                    result.nullified_rows += conn.prepare_cached(&sql)?.execute([id])?;
                }
                ReferenceKind::Array { table } => {
                    let sql = format!(r#"DELETE FROM {} WHERE "value" = ?1"#, quote_ident(table));
                    result.removed_rows += conn.prepare_cached(&sql)?.execute([id])?;
                }
            }
        }

        if result.affected_count() > 0 {
            debug!(
                nullified = result.nullified_rows,
                removed = result.removed_rows,
                "cascade applied"
            );
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrity::ReverseReference;

    fn setup() -> (Connection, ReferenceRegistry) {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE "main_bar" ("id" INTEGER PRIMARY KEY, "uuid" TEXT, "owner" TEXT);
            CREATE TABLE "main_bar_items" ("id" INTEGER PRIMARY KEY, "instance" TEXT, "value" TEXT);
            "#,
        )
        .unwrap();

        let mut registry = ReferenceRegistry::new();
        registry.add(
            TypeId(1),
            ReverseReference {
                source: TypeId(2),
                property: "owner".into(),
                kind: ReferenceKind::Column {
                    table: "main_bar".into(),
                    column: "owner".into(),
                },
            },
        );
        registry.add(
            TypeId(1),
            ReverseReference {
                source: TypeId(2),
                property: "items".into(),
                kind: ReferenceKind::Array {
                    table: "main_bar_items".into(),
                },
            },
        );
        (conn, registry)
    }

    #[test]
    fn test_no_references_is_a_no_op() {
        let (conn, registry) = setup();
        let executor = CascadeExecutor::new(&registry);

        let result = executor
            .process_delete(&conn, TypeId(9), &InstanceId::generate())
            .unwrap();
        assert_eq!(result, CascadeResult::new());
    }

    #[test]
    fn test_nulls_columns_and_removes_array_rows() {
        let (conn, registry) = setup();
        let deleted = InstanceId::generate();
        let kept = InstanceId::generate();

        conn.execute(
            r#"INSERT INTO "main_bar" ("uuid", "owner") VALUES ('a', ?1), ('b', ?2)"#,
            [&deleted, &kept],
        )
        .unwrap();
        conn.execute(
            r#"INSERT INTO "main_bar_items" ("instance", "value") VALUES ('a', ?1), ('a', ?2), ('b', ?1)"#,
            [&deleted, &kept],
        )
        .unwrap();

        let executor = CascadeExecutor::new(&registry);
        let result = executor.process_delete(&conn, TypeId(1), &deleted).unwrap();

        assert_eq!(result.nullified_rows, 1);
        assert_eq!(result.removed_rows, 2);
        assert_eq!(result.affected_count(), 3);

        let owners: Vec<Option<String>> = conn
            .prepare(r#"SELECT "owner" FROM "main_bar" ORDER BY "id""#)
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(owners, vec![None, Some(kept.to_string())]);

        let remaining: i64 = conn
            .query_row(r#"SELECT COUNT(*) FROM "main_bar_items""#, [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 1);
    }
}
