//! Table definitions and DDL generation.

use std::fmt::Write;

/// Physical column storage class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// 64-bit signed integer.
    Integer,
    /// 64-bit float.
    Real,
    /// UTF-8 text.
    Text,
    /// Raw bytes.
    Blob,
}

impl ColumnType {
    /// SQL spelling of this column type.
    pub fn as_sql(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
            ColumnType::Blob => "BLOB",
        }
    }
}

/// Action applied to referencing rows when the referenced row is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteBehavior {
    /// Delete the referencing rows.
    Cascade,
    /// Set the referencing column to null.
    SetNull,
}

impl DeleteBehavior {
    fn as_sql(&self) -> &'static str {
        match self {
            DeleteBehavior::Cascade => "CASCADE",
            DeleteBehavior::SetNull => "SET NULL",
        }
    }
}

/// Foreign key clause of a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    /// Referenced table.
    pub table: String,
    /// Referenced column.
    pub column: String,
    /// Behavior on delete of the referenced row.
    pub on_delete: DeleteBehavior,
}

/// A column definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Storage class.
    pub column_type: ColumnType,
    /// Autoincrementing integer primary key.
    pub primary_key: bool,
    /// NOT NULL constraint.
    pub not_null: bool,
    /// UNIQUE constraint.
    pub unique: bool,
    /// Optional foreign key.
    pub references: Option<ForeignKey>,
}

impl ColumnDef {
    /// Create a plain nullable column.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            primary_key: false,
            not_null: false,
            unique: false,
            references: None,
        }
    }

    /// Create the autoincrementing surrogate id column.
    pub fn surrogate_id() -> Self {
        Self {
            primary_key: true,
            ..Self::new("id", ColumnType::Integer)
        }
    }

    /// Mark as NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Mark as UNIQUE.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Add a foreign key.
    pub fn references(
        mut self,
        table: impl Into<String>,
        column: impl Into<String>,
        on_delete: DeleteBehavior,
    ) -> Self {
        self.references = Some(ForeignKey {
            table: table.into(),
            column: column.into(),
            on_delete,
        });
        self
    }

    fn write_sql(&self, out: &mut String) {
        let _ = write!(
            out,
            "{} {}",
            quote_ident(&self.name),
            self.column_type.as_sql()
        );
        if self.primary_key {
            out.push_str(" PRIMARY KEY AUTOINCREMENT");
        }
        if self.not_null {
            out.push_str(" NOT NULL");
        }
        if self.unique {
            out.push_str(" UNIQUE");
        }
        if let Some(fk) = &self.references {
            let _ = write!(
                out,
                " REFERENCES {}({}) ON DELETE {}",
                quote_ident(&fk.table),
                quote_ident(&fk.column),
                fk.on_delete.as_sql()
            );
        }
    }
}

/// A table definition, built column by column and emitted as one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    /// Table name.
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnDef>,
}

impl TableDef {
    /// Create an empty table definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Append a column.
    pub fn add_column(&mut self, column: ColumnDef) -> &mut Self {
        self.columns.push(column);
        self
    }

    /// Builder-style variant of [`add_column`](Self::add_column).
    pub fn with_column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// The `CREATE TABLE` statement for this definition.
    pub fn create_sql(&self) -> String {
        let mut sql = format!("CREATE TABLE {} (", quote_ident(&self.name));
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            column.write_sql(&mut sql);
        }
        sql.push(')');
        sql
    }
}

/// Quote an identifier for SQLite.
///
/// Generated names contain `.` for flattened nested properties, so every
/// identifier is quoted. Embedded double quotes are doubled.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("main_foo"), "\"main_foo\"");
        assert_eq!(quote_ident("outer.inner"), "\"outer.inner\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_create_sql() {
        let table = TableDef::new("main_bar_refs")
            .with_column(ColumnDef::surrogate_id())
            .with_column(
                ColumnDef::new("instance", ColumnType::Text)
                    .not_null()
                    .references("main_bar", "uuid", DeleteBehavior::Cascade),
            )
            .with_column(ColumnDef::new("value", ColumnType::Text).references(
                "main_foo",
                "uuid",
                DeleteBehavior::Cascade,
            ));

        assert_eq!(
            table.create_sql(),
            "CREATE TABLE \"main_bar_refs\" (\"id\" INTEGER PRIMARY KEY AUTOINCREMENT, \
             \"instance\" TEXT NOT NULL REFERENCES \"main_bar\"(\"uuid\") ON DELETE CASCADE, \
             \"value\" TEXT REFERENCES \"main_foo\"(\"uuid\") ON DELETE CASCADE)"
        );
    }

    #[test]
    fn test_set_null_and_unique() {
        let mut table = TableDef::new("t");
        table
            .add_column(ColumnDef::new("uuid", ColumnType::Text).not_null().unique())
            .add_column(ColumnDef::new("r", ColumnType::Text).references(
                "u",
                "uuid",
                DeleteBehavior::SetNull,
            ));

        let sql = table.create_sql();
        assert!(sql.contains("\"uuid\" TEXT NOT NULL UNIQUE"));
        assert!(sql.contains("ON DELETE SET NULL"));
        assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["uuid", "r"]);
    }

    #[test]
    fn test_generated_sql_executes() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let table = TableDef::new("ns_type")
            .with_column(ColumnDef::surrogate_id())
            .with_column(ColumnDef::new("uuid", ColumnType::Text).not_null().unique())
            .with_column(ColumnDef::new("outer.leaf", ColumnType::Real));
        conn.execute_batch(&table.create_sql()).unwrap();
    }
}
