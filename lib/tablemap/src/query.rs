//! Translation of typed table operations into parameterized SQL.
//!
//! Filters, ordering and projections are raw SQL [`Fragment`]s supplied by the
//! caller. They are inserted verbatim and are a trust boundary: never build a
//! fragment from untrusted input. Values always travel as bound parameters,
//! except identity-scope constraints, which are fixed by the program and
//! rendered as literals.

use indexmap::IndexMap;

use crate::schema::TableSchema;
use crate::{StorageError, Value};

/// Quote an identifier for use in generated SQL.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// An executable statement: SQL text with `?` placeholders and their values in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// A raw SQL snippet for `where`, `order by` or `select` clauses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment(String);

impl Fragment {
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Fragment {
    fn from(s: &str) -> Self {
        Fragment(s.to_string())
    }
}

impl From<String> for Fragment {
    fn from(s: String) -> Self {
        Fragment(s)
    }
}

/// Parameters for a `where` fragment: positional for `?`, named for `:name`.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereArgs {
    Positional(Vec<Value>),
    Named(IndexMap<String, Value>),
}

impl WhereArgs {
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        WhereArgs::Positional(values.into_iter().map(Into::into).collect())
    }

    pub fn named<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        WhereArgs::Named(
            values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<Vec<Value>> for WhereArgs {
    fn from(values: Vec<Value>) -> Self {
        WhereArgs::Positional(values)
    }
}

impl From<IndexMap<String, Value>> for WhereArgs {
    fn from(values: IndexMap<String, Value>) -> Self {
        WhereArgs::Named(values)
    }
}

/// Column projection for a select.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Projection {
    #[default]
    All,
    Columns(Vec<Fragment>),
}

impl Projection {
    /// Parse a comma-separated projection; `*` selects every column.
    pub fn parse(select: &str) -> Self {
        if select.trim() == "*" {
            return Projection::All;
        }
        let columns: Vec<Fragment> = select
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(Fragment::from)
            .collect();
        if columns.is_empty() {
            Projection::All
        } else {
            Projection::Columns(columns)
        }
    }
}

/// Fixed column values scoping a table binding to one logical partition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IdentityScope(IndexMap<String, Value>);

impl IdentityScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// `"a" = 1 AND "b" = 'x'`, or `None` when the scope is empty.
    fn literal_condition(&self) -> Option<String> {
        if self.0.is_empty() {
            return None;
        }
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(column, value)| format!("{} = {}", quote_ident(column), value.to_sql_literal()))
            .collect();
        Some(parts.join(" AND "))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for IdentityScope {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        IdentityScope(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A primary-key value; single values are one-tuples.
#[derive(Debug, Clone, PartialEq)]
pub struct Key(Vec<Value>);

impl Key {
    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

macro_rules! key_from_scalar {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Key {
                fn from(v: $ty) -> Self {
                    Key(vec![v.into()])
                }
            }
        )*
    };
}

key_from_scalar!(i64, i32, u32, bool, &str, String, &String, Value);

impl<A: Into<Value>, B: Into<Value>> From<(A, B)> for Key {
    fn from((a, b): (A, B)) -> Self {
        Key(vec![a.into(), b.into()])
    }
}

impl<A: Into<Value>, B: Into<Value>, C: Into<Value>> From<(A, B, C)> for Key {
    fn from((a, b, c): (A, B, C)) -> Self {
        Key(vec![a.into(), b.into(), c.into()])
    }
}

impl From<Vec<Value>> for Key {
    fn from(values: Vec<Value>) -> Self {
        Key(values)
    }
}

/// A select request against one table.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filter: Option<Fragment>,
    pub where_args: Option<WhereArgs>,
    /// Keyword-style named parameters, merged with named `where_args`.
    pub params: IndexMap<String, Value>,
    pub order_by: Option<Fragment>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub select: Projection,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the raw `where` fragment, e.g. `age > :age` or `id > ?`.
    pub fn filter(mut self, fragment: impl Into<Fragment>) -> Self {
        self.filter = Some(fragment.into());
        self
    }

    pub fn where_args(mut self, args: impl Into<WhereArgs>) -> Self {
        self.where_args = Some(args.into());
        self
    }

    /// Add a named parameter. Named `where_args` take precedence on a name clash.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn order_by(mut self, fragment: impl Into<Fragment>) -> Self {
        self.order_by = Some(fragment.into());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Comma-separated column expressions, or `*`.
    pub fn select(mut self, select: &str) -> Self {
        self.select = Projection::parse(select);
        self
    }

    fn named_params(&self) -> IndexMap<String, Value> {
        let mut named = self.params.clone();
        if let Some(WhereArgs::Named(args)) = &self.where_args {
            for (k, v) in args {
                named.insert(k.clone(), v.clone());
            }
        }
        named
    }

    fn positional_params(&self) -> &[Value] {
        match &self.where_args {
            Some(WhereArgs::Positional(values)) => values,
            _ => &[],
        }
    }
}

/// Rewrite `?`, `?NNN` and `:name` placeholders in a raw fragment to plain `?`,
/// returning the rewritten SQL and the values in placeholder order.
///
/// Quoted strings, quoted identifiers and comments are copied untouched.
/// `::` is left alone so casts survive. Every supplied value must be
/// referenced: surplus positional values and unused names are rejected.
pub fn bind_fragment(
    fragment: &str,
    positional: &[Value],
    named: &IndexMap<String, Value>,
) -> Result<(String, Vec<Value>), StorageError> {
    let chars: Vec<char> = fragment.chars().collect();
    let mut sql = String::with_capacity(fragment.len());
    let mut params = Vec::new();
    let mut next_positional = 0;
    let mut used_positional = vec![false; positional.len()];
    let mut used_named: Vec<&str> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' | '"' | '`' | '[' => {
                let close = if c == '[' { ']' } else { c };
                sql.push(c);
                i += 1;
                while i < chars.len() {
                    sql.push(chars[i]);
                    i += 1;
                    if chars[i - 1] == close {
                        break;
                    }
                }
            }
            '-' if chars.get(i + 1) == Some(&'-') => {
                while i < chars.len() && chars[i] != '\n' {
                    sql.push(chars[i]);
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                sql.push_str("/*");
                i += 2;
                while i < chars.len() {
                    if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
                        sql.push_str("*/");
                        i += 2;
                        break;
                    }
                    sql.push(chars[i]);
                    i += 1;
                }
            }
            '?' => {
                i += 1;
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let index = if i > start {
                    let digits: String = chars[start..i].iter().collect();
                    let n: usize = digits.parse().map_err(|_| {
                        StorageError::InvalidQuery(format!("bad placeholder ?{}", digits))
                    })?;
                    n.checked_sub(1).ok_or_else(|| {
                        StorageError::InvalidQuery("placeholder ?0 is not valid".to_string())
                    })?
                } else {
                    next_positional += 1;
                    next_positional - 1
                };
                let value = positional.get(index).ok_or_else(|| {
                    StorageError::InvalidQuery(format!(
                        "no positional value for placeholder {} ({} supplied)",
                        index + 1,
                        positional.len()
                    ))
                })?;
                if let Some(used) = used_positional.get_mut(index) {
                    *used = true;
                }
                sql.push('?');
                params.push(value.clone());
            }
            ':' if chars.get(i + 1) == Some(&':') => {
                sql.push_str("::");
                i += 2;
            }
            ':' if chars
                .get(i + 1)
                .is_some_and(|n| n.is_ascii_alphabetic() || *n == '_') =>
            {
                i += 1;
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                let (key, value) = named.get_key_value(&name).ok_or_else(|| {
                    StorageError::InvalidQuery(format!("no value for named parameter :{}", name))
                })?;
                used_named.push(key.as_str());
                sql.push('?');
                params.push(value.clone());
            }
            _ => {
                sql.push(c);
                i += 1;
            }
        }
    }

    let unused = used_positional.iter().filter(|used| !**used).count();
    if unused > 0 {
        return Err(StorageError::InvalidQuery(format!(
            "{} of {} positional values are not referenced by `{}`",
            unused,
            positional.len(),
            fragment
        )));
    }
    if let Some(name) = named.keys().find(|k| !used_named.contains(&k.as_str())) {
        return Err(StorageError::InvalidQuery(format!(
            "named parameter :{} is not referenced by `{}`",
            name, fragment
        )));
    }

    Ok((sql, params))
}

/// Builds statements for one table, applying its identity scope.
pub struct StatementBuilder<'a> {
    schema: &'a TableSchema,
    scope: &'a IdentityScope,
}

impl<'a> StatementBuilder<'a> {
    pub fn new(schema: &'a TableSchema, scope: &'a IdentityScope) -> Self {
        Self { schema, scope }
    }

    fn table(&self) -> String {
        quote_ident(&self.schema.name)
    }

    fn returning(&self) -> String {
        let cols: Vec<String> = self.schema.column_names().map(quote_ident).collect();
        format!(" RETURNING {}", cols.join(", "))
    }

    /// The select for a [`Query`]: scope constraints are AND-ed in front of the caller's filter.
    pub fn select(&self, query: &Query) -> Result<Statement, StorageError> {
        let projection = match &query.select {
            Projection::All => "*".to_string(),
            Projection::Columns(cols) => cols
                .iter()
                .map(Fragment::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        };
        let mut sql = format!("SELECT {} FROM {}", projection, self.table());
        let mut params = Vec::new();

        let filter = match &query.filter {
            Some(fragment) => {
                let (bound, values) =
                    bind_fragment(fragment.as_str(), query.positional_params(), &query.named_params())?;
                params = values;
                Some(bound)
            }
            None => None,
        };
        let condition = match (self.scope.literal_condition(), filter) {
            (Some(scope), Some(filter)) => Some(format!("{} AND ({})", scope, filter)),
            (Some(scope), None) => Some(scope),
            (None, Some(filter)) => Some(filter),
            (None, None) => None,
        };
        if let Some(condition) = condition {
            sql.push_str(" WHERE ");
            sql.push_str(&condition);
        }

        if let Some(order_by) = &query.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by.as_str());
        }
        match (query.limit, query.offset) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset)),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {}", limit)),
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset)),
            (None, None) => {}
        }

        Ok(Statement::with_params(sql, params))
    }

    /// Equality over the primary key followed by the scope columns.
    fn key_condition(&self, key: &Key) -> Result<(String, Vec<Value>), StorageError> {
        let expected = self.schema.primary_key.len();
        if key.len() != expected {
            return Err(StorageError::InvalidKey {
                expected,
                got: key.len(),
            });
        }

        let columns = self
            .schema
            .primary_key
            .iter()
            .map(String::as_str)
            .chain(self.scope.iter().map(|(c, _)| c.as_str()));
        let values = key
            .values()
            .iter()
            .cloned()
            .chain(self.scope.iter().map(|(_, v)| v.clone()));

        let mut parts = Vec::new();
        let mut params = Vec::new();
        for (column, value) in columns.zip(values) {
            parts.push(format!("{} = ?", quote_ident(column)));
            params.push(value);
        }
        Ok((parts.join(" AND "), params))
    }

    /// Point lookup. Fetches up to two rows so an ambiguous key can be detected.
    pub fn select_by_key(&self, key: &Key) -> Result<Statement, StorageError> {
        let (condition, params) = self.key_condition(key)?;
        Ok(Statement::with_params(
            format!("SELECT * FROM {} WHERE {} LIMIT 2", self.table(), condition),
            params,
        ))
    }

    /// Insert of the given values, scope values merged in (scope wins on collision).
    pub fn insert(&self, values: &IndexMap<String, Value>) -> Statement {
        let mut merged = values.clone();
        for (column, value) in self.scope.iter() {
            merged.insert(column.clone(), value.clone());
        }

        let sql = if merged.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES{}", self.table(), self.returning())
        } else {
            let cols: Vec<String> = merged.keys().map(|c| quote_ident(c)).collect();
            let placeholders = vec!["?"; merged.len()];
            format!(
                "INSERT INTO {} ({}) VALUES ({}){}",
                self.table(),
                cols.join(", "),
                placeholders.join(", "),
                self.returning()
            )
        };
        Statement::with_params(sql, merged.into_values().collect())
    }

    /// Update of the row with `key`. Scope values replace the record's own, so a
    /// row never leaves the binding's partition.
    pub fn update(&self, key: &Key, values: &IndexMap<String, Value>) -> Result<Statement, StorageError> {
        let (condition, key_params) = self.key_condition(key)?;
        let mut merged = values.clone();
        for (column, value) in self.scope.iter() {
            merged.insert(column.clone(), value.clone());
        }
        let assignments: Vec<String> = merged
            .keys()
            .map(|c| format!("{} = ?", quote_ident(c)))
            .collect();
        let mut params: Vec<Value> = merged.into_values().collect();
        params.extend(key_params);
        Ok(Statement::with_params(
            format!(
                "UPDATE {} SET {} WHERE {}{}",
                self.table(),
                assignments.join(", "),
                condition,
                self.returning()
            ),
            params,
        ))
    }

    pub fn delete(&self, key: &Key) -> Result<Statement, StorageError> {
        let (condition, params) = self.key_condition(key)?;
        Ok(Statement::with_params(
            format!("DELETE FROM {} WHERE {}", self.table(), condition),
            params,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::UserProfile;
    use crate::schema::TableOptions;

    fn schema() -> TableSchema {
        TableSchema::for_record::<UserProfile>(&TableOptions::new()).unwrap()
    }

    #[test]
    fn named_placeholders_become_positional() {
        let named: IndexMap<String, Value> = [("age".to_string(), Value::from(30i64))].into();
        let (sql, params) = bind_fragment("age > :age AND age < :age + 10", &[], &named).unwrap();
        assert_eq!(sql, "age > ? AND age < ? + 10");
        assert_eq!(params, vec![Value::Integer(30), Value::Integer(30)]);
    }

    #[test]
    fn numbered_and_plain_positional_placeholders() {
        let args = vec![Value::from("a"), Value::from("b")];
        let (sql, params) = bind_fragment("x = ?2 OR y = ? OR z = ?1", &args, &IndexMap::new()).unwrap();
        assert_eq!(sql, "x = ? OR y = ? OR z = ?");
        assert_eq!(params, vec![Value::from("b"), Value::from("a"), Value::from("a")]);
    }

    #[test]
    fn quoted_text_and_casts_are_not_placeholders() {
        let (sql, params) =
            bind_fragment("name = 'a:b?' AND \"odd:col\" = x::text", &[], &IndexMap::new()).unwrap();
        assert_eq!(sql, "name = 'a:b?' AND \"odd:col\" = x::text");
        assert!(params.is_empty());
    }

    #[test]
    fn missing_parameter_is_an_error() {
        let err = bind_fragment("age > :age", &[], &IndexMap::new()).unwrap_err();
        assert!(matches!(err, StorageError::InvalidQuery(_)));
        let err = bind_fragment("id > ?", &[], &IndexMap::new()).unwrap_err();
        assert!(matches!(err, StorageError::InvalidQuery(_)));
    }

    #[test]
    fn unreferenced_values_are_rejected() {
        let args = vec![Value::Integer(1), Value::Integer(2)];
        let err = bind_fragment("id > ?", &args, &IndexMap::new()).unwrap_err();
        assert!(matches!(err, StorageError::InvalidQuery(_)));

        let named: IndexMap<String, Value> = [("agee".to_string(), Value::from(30i64))].into();
        let err = bind_fragment("age > 1", &[], &named).unwrap_err();
        assert!(matches!(err, StorageError::InvalidQuery(ref m) if m.contains(":agee")));

        let err = bind_fragment("id = ?2", &args, &IndexMap::new()).unwrap_err();
        assert!(matches!(err, StorageError::InvalidQuery(_)));
    }

    #[test]
    fn block_comments_are_not_placeholders() {
        let named: IndexMap<String, Value> = [("age".to_string(), Value::from(30i64))].into();
        let (sql, params) =
            bind_fragment("/* ? or :name */ age > :age /* :age */", &[], &named).unwrap();
        assert_eq!(sql, "/* ? or :name */ age > ? /* :age */");
        assert_eq!(params, vec![Value::Integer(30)]);

        let (sql, params) = bind_fragment("x = 1 /* unterminated ?", &[], &IndexMap::new()).unwrap();
        assert_eq!(sql, "x = 1 /* unterminated ?");
        assert!(params.is_empty());
    }

    #[test]
    fn scope_is_anded_before_filter() {
        let schema = schema();
        let scope: IdentityScope = [("name", Value::from("acme"))].into_iter().collect();
        let builder = StatementBuilder::new(&schema, &scope);

        let query = Query::new().filter("id > :id").param("id", 30i64);
        let stmt = builder.select(&query).unwrap();
        assert_eq!(
            stmt.sql,
            r#"SELECT * FROM "user_profile" WHERE "name" = 'acme' AND (id > ?)"#
        );
        assert_eq!(stmt.params, vec![Value::Integer(30)]);

        let stmt = builder.select(&Query::new()).unwrap();
        assert_eq!(stmt.sql, r#"SELECT * FROM "user_profile" WHERE "name" = 'acme'"#);
    }

    #[test]
    fn where_args_take_precedence_over_params() {
        let schema = schema();
        let scope = IdentityScope::new();
        let query = Query::new()
            .filter("id = :id")
            .param("id", 1i64)
            .where_args(WhereArgs::named([("id", 2i64)]));
        let stmt = StatementBuilder::new(&schema, &scope).select(&query).unwrap();
        assert_eq!(stmt.params, vec![Value::Integer(2)]);
    }

    #[test]
    fn projection_ordering_and_pagination() {
        let schema = schema();
        let scope = IdentityScope::new();
        let builder = StatementBuilder::new(&schema, &scope);

        let query = Query::new().select("id, name").order_by("id DESC").limit(3).offset(0);
        assert_eq!(
            builder.select(&query).unwrap().sql,
            r#"SELECT id, name FROM "user_profile" ORDER BY id DESC LIMIT 3 OFFSET 0"#
        );

        let query = Query::new().offset(5);
        assert_eq!(
            builder.select(&query).unwrap().sql,
            r#"SELECT * FROM "user_profile" LIMIT -1 OFFSET 5"#
        );
    }

    #[test]
    fn point_lookup_appends_scope_columns() {
        let schema = schema();
        let scope: IdentityScope = [("active", true)].into_iter().collect();
        let stmt = StatementBuilder::new(&schema, &scope)
            .select_by_key(&Key::from(7i64))
            .unwrap();
        assert_eq!(
            stmt.sql,
            r#"SELECT * FROM "user_profile" WHERE "id" = ? AND "active" = ? LIMIT 2"#
        );
        assert_eq!(stmt.params, vec![Value::Integer(7), Value::Bool(true)]);
    }

    #[test]
    fn key_arity_must_match_primary_key() {
        let schema = schema();
        let scope = IdentityScope::new();
        let err = StatementBuilder::new(&schema, &scope)
            .delete(&Key::from((1i64, 2i64)))
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey { expected: 1, got: 2 }));
    }

    #[test]
    fn insert_merges_scope_values() {
        let schema = schema();
        let scope: IdentityScope = [("active", true)].into_iter().collect();
        let values: IndexMap<String, Value> = [
            ("name".to_string(), Value::from("ann")),
            ("active".to_string(), Value::from(false)),
        ]
        .into();
        let stmt = StatementBuilder::new(&schema, &scope).insert(&values);
        assert_eq!(
            stmt.sql,
            r#"INSERT INTO "user_profile" ("name", "active") VALUES (?, ?) RETURNING "id", "name", "active""#
        );
        assert_eq!(stmt.params, vec![Value::from("ann"), Value::Bool(true)]);
    }

    #[test]
    fn empty_insert_uses_default_values() {
        let schema = schema();
        let scope = IdentityScope::new();
        let stmt = StatementBuilder::new(&schema, &scope).insert(&IndexMap::new());
        assert!(stmt.sql.starts_with(r#"INSERT INTO "user_profile" DEFAULT VALUES RETURNING"#));
    }

    #[test]
    fn update_sets_values_then_binds_key() {
        let schema = schema();
        let scope = IdentityScope::new();
        let values: IndexMap<String, Value> = [
            ("id".to_string(), Value::from(3i64)),
            ("name".to_string(), Value::from("bo")),
        ]
        .into();
        let stmt = StatementBuilder::new(&schema, &scope)
            .update(&Key::from(3i64), &values)
            .unwrap();
        assert_eq!(
            stmt.sql,
            r#"UPDATE "user_profile" SET "id" = ?, "name" = ? WHERE "id" = ? RETURNING "id", "name", "active""#
        );
        assert_eq!(
            stmt.params,
            vec![Value::Integer(3), Value::from("bo"), Value::Integer(3)]
        );
    }

    #[test]
    fn update_keeps_rows_inside_the_scope() {
        let schema = schema();
        let scope: IdentityScope = [("active", true)].into_iter().collect();
        let values: IndexMap<String, Value> = [
            ("id".to_string(), Value::from(3i64)),
            ("active".to_string(), Value::from(false)),
        ]
        .into();
        let stmt = StatementBuilder::new(&schema, &scope)
            .update(&Key::from(3i64), &values)
            .unwrap();
        assert_eq!(
            stmt.sql,
            r#"UPDATE "user_profile" SET "id" = ?, "active" = ? WHERE "id" = ? AND "active" = ? RETURNING "id", "name", "active""#
        );
        assert_eq!(
            stmt.params,
            vec![Value::Integer(3), Value::Bool(true), Value::Integer(3), Value::Bool(true)]
        );
    }
}
