//! Select query builder.
//!
//! `SelectQuery` is the clonable query value relations work with: the base
//! query against the related table and the indirection (lookup) query are both
//! `SelectQuery`s. Builder methods consume and return `self`; relation code
//! always clones the stored query before narrowing it, so a configured query
//! can be reused across any number of resolutions.

use sea_query::{
    Asterisk, DynIden, Expr, ExprTrait, IntoCondition, Order, PostgresQueryBuilder,
    SelectStatement, Value, Values,
};

/// Query builder for selecting records
///
/// # Example
///
/// ```
/// use belongs_to_dynamic::SelectQuery;
///
/// let lookup = SelectQuery::new("post_authors")
///     .where_eq("role", "primary");
///
/// let (sql, values) = lookup.clone().select_only("author_id").where_eq("post_id", 7).build();
/// assert_eq!(
///     sql,
///     r#"SELECT "author_id" FROM "post_authors" WHERE "role" = $1 AND "post_id" = $2"#
/// );
/// assert_eq!(values.0.len(), 2);
///
/// // the original is untouched
/// assert_eq!(lookup.build().0, r#"SELECT * FROM "post_authors" WHERE "role" = $1"#);
/// ```
#[derive(Clone, Debug)]
pub struct SelectQuery {
    pub(crate) query: SelectStatement,
    table: String,
    primary_key: String,
}

/// Column reference for a possibly table-qualified name (`table.column`)
pub(crate) fn column_expr(name: &str) -> Expr {
    match name.split_once('.') {
        Some((table, column)) => Expr::col((
            DynIden::from(table.to_string()),
            DynIden::from(column.to_string()),
        )),
        None => Expr::col(DynIden::from(name.to_string())),
    }
}

impl SelectQuery {
    /// Create a `SELECT *` query against a table
    pub fn new(table: impl Into<String>) -> Self {
        let table = table.into();
        let mut query = SelectStatement::default();
        query
            .column(Asterisk)
            .from(DynIden::from(table.clone()));
        Self {
            query,
            table,
            primary_key: "id".to_string(),
        }
    }

    /// Set the primary key column of records returned by this query
    pub fn with_primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_key = name.into();
        self
    }

    /// Table the query selects from
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Primary key column of returned records
    pub fn primary_key_name(&self) -> &str {
        &self.primary_key
    }

    /// Replace the projection with a single column
    pub fn select_only(mut self, column: &str) -> Self {
        self.query.clear_selects();
        self.query.expr(column_expr(column));
        self
    }

    /// Add a filter condition
    ///
    /// Accepts any type that implements `IntoCondition`, including
    /// `Expr` and `Condition`.
    pub fn filter<F>(mut self, condition: F) -> Self
    where
        F: IntoCondition,
    {
        self.query.cond_where(condition.into_condition());
        self
    }

    /// Add `column = value`
    pub fn where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        let value: Value = value.into();
        self.filter(column_expr(column).eq(value))
    }

    /// Add `column IN (values)`
    pub fn where_in<I>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        let values: Vec<Value> = values.into_iter().collect();
        self.filter(column_expr(column).is_in(values))
    }

    /// Add an ORDER BY clause
    pub fn order_by(mut self, column: &str, order: Order) -> Self {
        self.query.order_by_expr(column_expr(column), order);
        self
    }

    /// Add a LIMIT clause
    pub fn limit(mut self, limit: u64) -> Self {
        self.query.limit(limit);
        self
    }

    /// Render to PostgreSQL with positional parameters
    pub fn build(&self) -> (String, Values) {
        self.query.build(PostgresQueryBuilder)
    }
}
