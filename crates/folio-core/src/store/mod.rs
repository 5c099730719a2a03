//! Relational store layer.
//!
//! Folio keeps its schema and instances in SQLite through `rusqlite`. This
//! module holds the pieces that talk SQL directly: table definitions and DDL
//! generation, the global metadata tables, and transaction scoping.

mod ddl;
mod metadata;

use rusqlite::{Connection, Transaction, TransactionBehavior};

pub use ddl::{quote_ident, ColumnDef, ColumnType, DeleteBehavior, ForeignKey, TableDef};
pub(crate) use metadata::{
    create_metadata_tables, insert_generated_table, insert_namespace, insert_property,
    insert_type, load_snapshot, GeneratedTableRow, PropertyRow,
};
pub use metadata::{GENERATED_TABLES_TABLE, NAMESPACES_TABLE, PROPERTIES_TABLE, TYPES_TABLE};

/// Begin a deferred transaction on a shared connection.
///
/// The transaction rolls back when dropped without `commit`, so every early
/// return through `?` discards the partial work.
pub(crate) fn begin(conn: &Connection) -> rusqlite::Result<Transaction<'_>> {
    Transaction::new_unchecked(conn, TransactionBehavior::Deferred)
}

/// Count the rows of a table. Mostly useful for diagnostics and tests.
pub fn count_rows(conn: &Connection, table: &str) -> rusqlite::Result<u64> {
    let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
    conn.query_row(&sql, [], |row| row.get::<_, i64>(0))
        .map(|count| count as u64)
}

/// Check whether a table exists in the store.
pub fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
        [table],
        |row| row.get(0),
    )
}

/// Column names of a table in declaration order.
pub fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let sql = format!("PRAGMA table_info({})", quote_ident(table));
    let mut stmt = conn.prepare(&sql)?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropped_transaction_rolls_back() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v INTEGER)").unwrap();

        {
            let tx = begin(&conn).unwrap();
            tx.execute("INSERT INTO t (v) VALUES (1)", []).unwrap();
        }
        assert_eq!(count_rows(&conn, "t").unwrap(), 0);

        let tx = begin(&conn).unwrap();
        tx.execute("INSERT INTO t (v) VALUES (1)", []).unwrap();
        tx.commit().unwrap();
        assert_eq!(count_rows(&conn, "t").unwrap(), 1);
    }

    #[test]
    fn test_table_introspection() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE \"a.b\" (id INTEGER, \"x.y\" TEXT)")
            .unwrap();

        assert!(table_exists(&conn, "a.b").unwrap());
        assert!(!table_exists(&conn, "a").unwrap());
        assert_eq!(table_columns(&conn, "a.b").unwrap(), vec!["id", "x.y"]);
    }
}
