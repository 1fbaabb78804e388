//! Table schemas derived from records, and descriptions of tables found in a database.

use crate::record::{ColumnDef, Record, columns_for, default_table_name, resolve_primary_key};
use crate::query::{Statement, quote_ident};
use crate::StorageError;

/// Options for binding a record type to a table.
#[derive(Debug, Clone, Default)]
pub struct TableOptions {
    pub primary_key: Vec<String>,
    pub name: Option<String>,
}

impl TableOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the primary key; order is preserved as given.
    pub fn primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// The schema of one table as declared by a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    /// Primary-key columns in declared order.
    pub primary_key: Vec<String>,
}

impl TableSchema {
    pub fn for_record<T: Record>(options: &TableOptions) -> Result<Self, StorageError> {
        let primary_key = resolve_primary_key::<T>(&options.primary_key);
        let columns = columns_for::<T>(&primary_key)?;
        let name = options
            .name
            .clone()
            .unwrap_or_else(default_table_name::<T>);
        Ok(Self {
            name,
            columns,
            primary_key,
        })
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// `CREATE TABLE IF NOT EXISTS` for this schema.
    pub fn create_sql(&self) -> Statement {
        let mut defs: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("{} {}", quote_ident(&c.name), c.sql_type))
            .collect();
        let keys: Vec<String> = self.primary_key.iter().map(|k| quote_ident(k)).collect();
        defs.push(format!("PRIMARY KEY ({})", keys.join(", ")));

        Statement::new(format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(&self.name),
            defs.join(", ")
        ))
    }

    /// Compare against an introspected table, returning a description of each difference.
    pub fn differences(&self, existing: &TableInfo) -> Vec<String> {
        let mut diffs = Vec::new();
        for column in &self.columns {
            match existing.column(&column.name) {
                None => diffs.push(format!("column `{}` is missing", column.name)),
                Some(info) => {
                    if !info.sql_type.eq_ignore_ascii_case(column.sql_type.as_sql()) {
                        diffs.push(format!(
                            "column `{}` is {} but declared {}",
                            column.name, info.sql_type, column.sql_type
                        ));
                    }
                    if info.is_primary_key() != column.primary_key {
                        diffs.push(format!(
                            "column `{}` primary-key membership differs",
                            column.name
                        ));
                    }
                }
            }
        }
        for info in &existing.columns {
            if self.column(&info.name).is_none() {
                diffs.push(format!("column `{}` is not declared", info.name));
            }
        }
        diffs
    }
}

/// A column as reported by the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub sql_type: String,
    /// 1-based position within the primary key, 0 if not a key column.
    pub primary_key_position: u32,
}

impl ColumnInfo {
    pub fn is_primary_key(&self) -> bool {
        self.primary_key_position > 0
    }
}

/// A table as reported by the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

impl TableInfo {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Primary-key column names in key order.
    pub fn primary_key(&self) -> Vec<&str> {
        let mut keys: Vec<&ColumnInfo> = self.columns.iter().filter(|c| c.is_primary_key()).collect();
        keys.sort_by_key(|c| c.primary_key_position);
        keys.into_iter().map(|c| c.name.as_str()).collect()
    }
}

impl std::fmt::Display for TableInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Table: {}", self.name)?;
        for column in &self.columns {
            let marker = if column.is_primary_key() { '*' } else { '-' };
            writeln!(f, "  {} {}: {}", marker, column.name, column.sql_type)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::UserProfile;

    #[test]
    fn create_sql_is_idempotent_ddl() {
        let schema = TableSchema::for_record::<UserProfile>(&TableOptions::new()).unwrap();
        assert_eq!(
            schema.create_sql().sql,
            r#"CREATE TABLE IF NOT EXISTS "user_profile" ("id" INTEGER, "name" TEXT, "active" BOOLEAN, PRIMARY KEY ("id"))"#
        );
    }

    #[test]
    fn composite_key_keeps_declared_order() {
        let options = TableOptions::new().primary_key(["name", "id"]).name("profiles");
        let schema = TableSchema::for_record::<UserProfile>(&options).unwrap();
        assert_eq!(schema.name, "profiles");
        assert_eq!(schema.primary_key, vec!["name", "id"]);
        assert!(schema.create_sql().sql.ends_with(r#"PRIMARY KEY ("name", "id"))"#));
    }

    #[test]
    fn report_marks_key_columns() {
        let info = TableInfo {
            name: "user_profile".into(),
            columns: vec![
                ColumnInfo {
                    name: "id".into(),
                    sql_type: "INTEGER".into(),
                    primary_key_position: 1,
                },
                ColumnInfo {
                    name: "name".into(),
                    sql_type: "TEXT".into(),
                    primary_key_position: 0,
                },
            ],
        };
        assert_eq!(
            info.to_string(),
            "Table: user_profile\n  * id: INTEGER\n  - name: TEXT\n"
        );
    }

    #[test]
    fn differences_report_missing_columns() {
        let schema = TableSchema::for_record::<UserProfile>(&TableOptions::new()).unwrap();
        let info = TableInfo {
            name: "user_profile".into(),
            columns: vec![ColumnInfo {
                name: "id".into(),
                sql_type: "INTEGER".into(),
                primary_key_position: 1,
            }],
        };
        let diffs = schema.differences(&info);
        assert_eq!(diffs.len(), 2);
        assert!(diffs[0].contains("`name`"));
    }
}
