//! PostgreSQL connector backed by a single `tokio_postgres` session.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, MutexGuard};
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls};

use crate::config::ConnectionConfig;
use crate::connector::Connector;
use crate::error::{OrmError, OrmResult};
use crate::named::to_positional;
use crate::qb::Bindings;
use crate::value::{Record, Value, record_from_row};

const MAX_LOGGED_SQL: usize = 200;

fn truncate_sql(sql: &str) -> &str {
    if sql.len() <= MAX_LOGGED_SQL {
        return sql;
    }
    let mut end = MAX_LOGGED_SQL;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

fn statement_kind(sql: &str) -> &str {
    sql.split_whitespace().next().unwrap_or("")
}

fn log_statement(sql: &str, bindings: &Bindings) {
    tracing::debug!(
        target: "pgrecord.sql",
        kind = statement_kind(sql),
        sql = truncate_sql(sql),
        params = bindings.len(),
        "executing statement"
    );
}

async fn run_query(client: &Client, sql: &str, bindings: &Bindings) -> OrmResult<Vec<Record>> {
    log_statement(sql, bindings);
    let (sql, values) = to_positional(sql, bindings)?;
    let params: Vec<&(dyn ToSql + Sync)> = values
        .iter()
        .map(|v| *v as &(dyn ToSql + Sync))
        .collect();
    let rows = client
        .query(sql.as_str(), &params)
        .await
        .map_err(OrmError::from_db_error)?;
    rows.iter().map(record_from_row).collect()
}

async fn run_execute(client: &Client, sql: &str, bindings: &Bindings) -> OrmResult<u64> {
    log_statement(sql, bindings);
    let (sql, values) = to_positional(sql, bindings)?;
    let params: Vec<&(dyn ToSql + Sync)> = values
        .iter()
        .map(|v| *v as &(dyn ToSql + Sync))
        .collect();
    client
        .execute(sql.as_str(), &params)
        .await
        .map_err(OrmError::from_db_error)
}

/// `lastval()` for the session. A session that has not yet drawn from a
/// sequence reports SQLSTATE 55000, which maps to `None`.
async fn run_lastval(client: &Client) -> OrmResult<Option<Value>> {
    match client.query_opt("SELECT lastval()", &[]).await {
        Ok(Some(row)) => {
            let id: i64 = row.try_get(0).map_err(|e| OrmError::decode("lastval", e.to_string()))?;
            Ok(Some(Value::Int(id)))
        }
        Ok(None) => Ok(None),
        Err(e) if e.code() == Some(&SqlState::OBJECT_NOT_IN_PREREQUISITE_STATE) => Ok(None),
        Err(e) => Err(OrmError::from_db_error(e)),
    }
}

async fn batch(client: &Client, statement: &str) -> OrmResult<()> {
    tracing::debug!(
        target: "pgrecord.sql",
        kind = statement_kind(statement),
        sql = statement,
        "executing statement"
    );
    client
        .batch_execute(statement)
        .await
        .map_err(OrmError::from_db_error)
}

/// A [`Connector`] owning one lazily opened PostgreSQL session.
///
/// Statements are serialized through the session lock, one at a time. When
/// several tasks share the connector, `last_insert_id` reports whichever
/// INSERT drew from a sequence last; models read generated keys back with
/// `INSERT … RETURNING` instead. A session that the server closed is
/// reopened on next use.
pub struct PgConnector {
    config: ConnectionConfig,
    client: Mutex<Option<Client>>,
    in_transaction: AtomicBool,
}

impl PgConnector {
    /// Create a connector. No session is opened until the first statement.
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            client: Mutex::new(None),
            in_transaction: AtomicBool::new(false),
        }
    }

    /// Create a connector from `DATABASE_URL` or the `DB_*` variables.
    pub fn from_env() -> OrmResult<Self> {
        Ok(Self::new(ConnectionConfig::from_env()?))
    }

    /// Open the session now instead of on first use.
    pub async fn connect(config: ConnectionConfig) -> OrmResult<Self> {
        let connector = Self::new(config);
        drop(connector.session().await?);
        Ok(connector)
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Whether a live session is currently held.
    pub async fn is_connected(&self) -> bool {
        matches!(self.client.lock().await.as_ref(), Some(client) if !client.is_closed())
    }

    /// Drop the session. The next statement opens a fresh one.
    pub async fn close(&self) {
        if self.client.lock().await.take().is_some() {
            self.in_transaction.store(false, Ordering::SeqCst);
            tracing::info!(
                target: "pgrecord.connector",
                host = %self.config.host,
                "session closed"
            );
        }
    }

    async fn open(&self) -> OrmResult<Client> {
        let (client, connection) = self
            .config
            .to_pg_config()
            .connect(NoTls)
            .await
            .map_err(|e| OrmError::Connection(e.to_string()))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(target: "pgrecord.connector", error = %e, "connection task failed");
            }
        });

        tracing::info!(
            target: "pgrecord.connector",
            host = %self.config.host,
            port = self.config.port,
            database = %self.config.database,
            "session opened"
        );
        Ok(client)
    }

    async fn session(&self) -> OrmResult<MutexGuard<'_, Option<Client>>> {
        let mut guard = self.client.lock().await;
        if guard.as_ref().is_none_or(Client::is_closed) {
            if guard.is_some() {
                tracing::warn!(target: "pgrecord.connector", "session lost, reconnecting");
                self.in_transaction.store(false, Ordering::SeqCst);
            }
            *guard = Some(self.open().await?);
        }
        Ok(guard)
    }
}

fn not_open() -> OrmError {
    OrmError::Connection("session is not open".to_string())
}

impl Connector for PgConnector {
    async fn query(&self, sql: &str, bindings: &Bindings) -> OrmResult<Vec<Record>> {
        let guard = self.session().await?;
        let client = guard.as_ref().ok_or_else(not_open)?;
        run_query(client, sql, bindings).await
    }

    async fn execute(&self, sql: &str, bindings: &Bindings) -> OrmResult<u64> {
        let guard = self.session().await?;
        let client = guard.as_ref().ok_or_else(not_open)?;
        run_execute(client, sql, bindings).await
    }

    async fn last_insert_id(&self) -> OrmResult<Option<Value>> {
        let guard = self.session().await?;
        let client = guard.as_ref().ok_or_else(not_open)?;
        if !self.in_transaction.load(Ordering::SeqCst) {
            return run_lastval(client).await;
        }

        // A failed lastval() would abort the open transaction; fence it.
        batch(client, "SAVEPOINT pgrecord_lastval").await?;
        match run_lastval(client).await {
            Ok(Some(id)) => {
                batch(client, "RELEASE SAVEPOINT pgrecord_lastval").await?;
                Ok(Some(id))
            }
            Ok(None) => {
                batch(client, "ROLLBACK TO SAVEPOINT pgrecord_lastval").await?;
                Ok(None)
            }
            Err(e) => {
                batch(client, "ROLLBACK TO SAVEPOINT pgrecord_lastval").await?;
                Err(e)
            }
        }
    }

    async fn begin_transaction(&self) -> OrmResult<()> {
        let guard = self.session().await?;
        let client = guard.as_ref().ok_or_else(not_open)?;
        batch(client, "BEGIN").await?;
        self.in_transaction.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn commit(&self) -> OrmResult<()> {
        let guard = self.session().await?;
        let client = guard.as_ref().ok_or_else(not_open)?;
        let result = batch(client, "COMMIT").await;
        self.in_transaction.store(false, Ordering::SeqCst);
        result
    }

    async fn rollback(&self) -> OrmResult<()> {
        let guard = self.session().await?;
        let client = guard.as_ref().ok_or_else(not_open)?;
        let result = batch(client, "ROLLBACK").await;
        self.in_transaction.store(false, Ordering::SeqCst);
        result
    }
}

/// Use an already connected client directly.
///
/// The caller keeps ownership of the connection task. `last_insert_id` is
/// not fenced here: inside a transaction, call it only after an INSERT that
/// drew from a sequence.
impl Connector for Client {
    async fn query(&self, sql: &str, bindings: &Bindings) -> OrmResult<Vec<Record>> {
        run_query(self, sql, bindings).await
    }

    async fn execute(&self, sql: &str, bindings: &Bindings) -> OrmResult<u64> {
        run_execute(self, sql, bindings).await
    }

    async fn last_insert_id(&self) -> OrmResult<Option<Value>> {
        run_lastval(self).await
    }

    async fn begin_transaction(&self) -> OrmResult<()> {
        batch(self, "BEGIN").await
    }

    async fn commit(&self) -> OrmResult<()> {
        batch(self, "COMMIT").await
    }

    async fn rollback(&self) -> OrmResult<()> {
        batch(self, "ROLLBACK").await
    }
}
