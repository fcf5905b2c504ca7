//! Terminal operations: run the rendered statement through a [`Connector`].

use crate::connector::Connector;
use crate::error::{OrmError, OrmResult};
use crate::qb::builder::QueryBuilder;
use crate::value::{Record, Value};

impl QueryBuilder {
    /// Execute the SELECT and return every matched row.
    pub async fn get(&self, conn: &impl Connector) -> OrmResult<Vec<Record>> {
        conn.query(&self.to_sql(), &self.bindings).await
    }

    /// Execute with `LIMIT 1` and return the row, if any.
    ///
    /// The builder itself is left untouched.
    pub async fn first(&self, conn: &impl Connector) -> OrmResult<Option<Record>> {
        let limited = self.clone().limit(1);
        let rows = limited.get(conn).await?;
        Ok(rows.into_iter().next())
    }

    /// Count matching rows.
    ///
    /// Runs with a `COUNT(*)` projection; the builder's own select list is never touched.
    pub async fn count(&self, conn: &impl Connector) -> OrmResult<i64> {
        let rows = conn.query(&self.count_sql(), &self.bindings).await?;
        let Some(row) = rows.into_iter().next() else {
            return Ok(0);
        };
        match row.get("count") {
            Some(Value::Int(n)) => Ok(*n),
            Some(Value::Null) | None => Ok(0),
            Some(other) => other.as_i64().ok_or_else(|| {
                OrmError::decode("count", format!("expected integer, got {other:?}"))
            }),
        }
    }

    /// `count() > 0`
    pub async fn exists(&self, conn: &impl Connector) -> OrmResult<bool> {
        Ok(self.count(conn).await? > 0)
    }

    /// Insert one row. Returns whether at least one row was written.
    pub async fn insert<I, K, V>(&self, conn: &impl Connector, data: I) -> OrmResult<bool>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let (sql, bindings) = self.insert_sql(data);
        Ok(conn.execute(&sql, &bindings).await? > 0)
    }

    /// Insert one row and read `column` back from it in the same statement.
    ///
    /// Returns `None` when nothing was written.
    pub async fn insert_returning<I, K, V>(
        &self,
        conn: &impl Connector,
        data: I,
        column: &str,
    ) -> OrmResult<Option<Value>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let (sql, bindings) = self.insert_sql(data);
        let sql = format!("{sql} RETURNING {column}");
        let rows = conn.query(&sql, &bindings).await?;
        Ok(rows
            .into_iter()
            .next()
            .map(|mut row| row.remove(column).unwrap_or_default()))
    }

    /// Update matching rows. Returns the affected row count.
    pub async fn update<I, K, V>(&self, conn: &impl Connector, data: I) -> OrmResult<u64>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let data: Vec<(String, Value)> = data
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        if data.is_empty() {
            return Err(OrmError::Validation(
                "UPDATE: SET clause cannot be empty".to_string(),
            ));
        }
        let (sql, bindings) = self.update_sql(data);
        conn.execute(&sql, &bindings).await
    }

    /// Delete matching rows. Returns the affected row count.
    pub async fn delete(&self, conn: &impl Connector) -> OrmResult<u64> {
        conn.execute(&self.delete_sql(), &self.bindings).await
    }
}
