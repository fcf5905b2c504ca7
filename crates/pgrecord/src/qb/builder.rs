//! The query descriptor and its SQL rendering.

use crate::qb::bindings::Bindings;
use crate::qb::expr::{Boolean, Join, JoinKind, OrderBy, Predicate, render_predicates};
use crate::value::Value;

/// Fluent SELECT/INSERT/UPDATE/DELETE builder scoped to one table.
///
/// Column, operator and table strings are rendered verbatim; only values are
/// parameterized. Callers must not pass untrusted input as identifiers.
#[derive(Clone, Debug)]
pub struct QueryBuilder {
    /// Target table
    pub(crate) table: String,
    /// SELECT columns (default ["*"])
    pub(crate) select_cols: Vec<String>,
    /// WHERE predicates
    pub(crate) wheres: Vec<Predicate>,
    /// JOIN clauses
    pub(crate) joins: Vec<Join>,
    /// ORDER BY terms
    pub(crate) orders: Vec<OrderBy>,
    /// LIMIT
    pub(crate) limit: Option<u64>,
    /// OFFSET
    pub(crate) offset: Option<u64>,
    /// Placeholder values for the predicates
    pub(crate) bindings: Bindings,
    /// Relations to eager load when the rows are hydrated into entities
    pub(crate) with: Vec<String>,
}

impl QueryBuilder {
    /// Create a new query builder for a table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            select_cols: vec!["*".to_string()],
            wheres: Vec::new(),
            joins: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
            bindings: Bindings::new(),
            with: Vec::new(),
        }
    }

    // ==================== SELECT columns ====================

    /// Replace the projection list.
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select_cols = columns.into_iter().map(Into::into).collect();
        self
    }

    // ==================== WHERE ====================

    fn push_basic(
        mut self,
        column: &str,
        operator: &str,
        value: Value,
        boolean: Boolean,
    ) -> Self {
        let placeholder = self.bindings.bind(column, value);
        self.wheres.push(Predicate::Basic {
            column: column.to_string(),
            operator: operator.to_string(),
            placeholder,
            boolean,
        });
        self
    }

    /// Add WHERE: column = value
    pub fn where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.push_basic(column, "=", value.into(), Boolean::And)
    }

    /// Add WHERE: column <operator> value
    pub fn where_op(self, column: &str, operator: &str, value: impl Into<Value>) -> Self {
        self.push_basic(column, operator, value.into(), Boolean::And)
    }

    /// Add OR WHERE: column = value
    pub fn or_where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.push_basic(column, "=", value.into(), Boolean::Or)
    }

    /// Add OR WHERE: column <operator> value
    pub fn or_where_op(self, column: &str, operator: &str, value: impl Into<Value>) -> Self {
        self.push_basic(column, operator, value.into(), Boolean::Or)
    }

    /// Add WHERE: column IN (values...)
    ///
    /// Each value gets its own placeholder, named `<column>_<index>` before
    /// collision adjustment.
    pub fn where_in<I, V>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let placeholders = values
            .into_iter()
            .enumerate()
            .map(|(idx, value)| self.bindings.bind(&format!("{column}_{idx}"), value))
            .collect();
        self.wheres.push(Predicate::In {
            column: column.to_string(),
            placeholders,
            boolean: Boolean::And,
        });
        self
    }

    // ==================== JOIN ====================

    /// Add INNER JOIN table ON left op right.
    pub fn join(self, table: &str, left: &str, operator: &str, right: &str) -> Self {
        self.push_join(JoinKind::Inner, table, left, operator, right)
    }

    /// Add LEFT JOIN table ON left op right.
    pub fn left_join(self, table: &str, left: &str, operator: &str, right: &str) -> Self {
        self.push_join(JoinKind::Left, table, left, operator, right)
    }

    fn push_join(
        mut self,
        kind: JoinKind,
        table: &str,
        left: &str,
        operator: &str,
        right: &str,
    ) -> Self {
        self.joins.push(Join {
            kind,
            table: table.to_string(),
            left: left.to_string(),
            operator: operator.to_string(),
            right: right.to_string(),
        });
        self
    }

    // ==================== ORDER / LIMIT / OFFSET ====================

    /// Add an ORDER BY term. `direction` is upper-cased when rendered.
    pub fn order_by(mut self, column: &str, direction: &str) -> Self {
        self.orders.push(OrderBy {
            column: column.to_string(),
            direction: direction.to_string(),
        });
        self
    }

    /// Add ORDER BY column ASC.
    pub fn order_by_asc(self, column: &str) -> Self {
        self.order_by(column, "asc")
    }

    /// Add ORDER BY column DESC.
    pub fn order_by_desc(self, column: &str) -> Self {
        self.order_by(column, "desc")
    }

    /// Set LIMIT (last call wins).
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Set OFFSET (last call wins).
    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    // ==================== Eager loading ====================

    /// Queue relations to eager load when rows are hydrated into entities.
    pub fn with<I, S>(mut self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with.extend(relations.into_iter().map(Into::into));
        self
    }

    // ==================== Accessors ====================

    pub fn get_bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn get_table(&self) -> &str {
        &self.table
    }

    pub fn get_with(&self) -> &[String] {
        &self.with
    }

    pub fn get_select(&self) -> &[String] {
        &self.select_cols
    }

    // ==================== Rendering ====================

    /// Render the SELECT statement for the current state.
    pub fn to_sql(&self) -> String {
        self.render_select(&self.select_cols, true)
    }

    /// Render the row-count statement. ORDER BY is left out: PostgreSQL
    /// rejects ordering by a non-aggregated column next to `COUNT(*)`.
    pub(crate) fn count_sql(&self) -> String {
        self.render_select(&["COUNT(*) AS count".to_string()], false)
    }

    fn render_select(&self, columns: &[String], with_order: bool) -> String {
        let mut sql = format!("SELECT {} FROM {}", columns.join(", "), self.table);

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.to_string());
        }

        self.push_where(&mut sql);

        if with_order && !self.orders.is_empty() {
            let parts: Vec<String> = self.orders.iter().map(ToString::to_string).collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&parts.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        sql
    }

    fn push_where(&self, sql: &mut String) {
        if !self.wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&render_predicates(&self.wheres));
        }
    }

    /// Render an INSERT with one placeholder per column, in `data` order.
    pub fn insert_sql<I, K, V>(&self, data: I) -> (String, Bindings)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut bindings = Bindings::new();
        let mut columns = Vec::new();
        let mut placeholders = Vec::new();
        for (column, value) in data {
            let column = column.into();
            placeholders.push(bindings.bind(&column, value));
            columns.push(column);
        }

        if columns.is_empty() {
            return (format!("INSERT INTO {} DEFAULT VALUES", self.table), bindings);
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            columns.join(", "),
            placeholders.join(", ")
        );
        (sql, bindings)
    }

    /// Render an UPDATE. SET placeholders live in the `update_` namespace and
    /// are merged with the WHERE bindings, so a column may appear in both.
    pub fn update_sql<I, K, V>(&self, data: I) -> (String, Bindings)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut bindings = self.bindings.clone();
        let set_parts: Vec<String> = data
            .into_iter()
            .map(|(column, value)| {
                let column = column.into();
                let placeholder = bindings.bind(&format!("update_{column}"), value);
                format!("{column} = {placeholder}")
            })
            .collect();

        let mut sql = format!("UPDATE {} SET {}", self.table, set_parts.join(", "));
        self.push_where(&mut sql);
        (sql, bindings)
    }

    /// Render a DELETE using the current WHERE state.
    pub fn delete_sql(&self) -> String {
        let mut sql = format!("DELETE FROM {}", self.table);
        self.push_where(&mut sql);
        sql
    }
}
