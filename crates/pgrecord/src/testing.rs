//! In-memory connector for unit tests: records every statement and replays
//! scripted results.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::connector::Connector;
use crate::error::{OrmError, OrmResult};
use crate::qb::Bindings;
use crate::value::{Record, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatementKind {
    Query,
    Execute,
    Transaction,
}

#[derive(Debug, Clone)]
pub(crate) struct Statement {
    pub kind: StatementKind,
    pub sql: String,
    pub bindings: Bindings,
}

impl Statement {
    pub fn binding(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }
}

#[derive(Default)]
struct Script {
    statements: Vec<Statement>,
    rows: VecDeque<Vec<Record>>,
    affected: VecDeque<u64>,
    failures: VecDeque<String>,
    last_insert_id: Option<Value>,
}

/// Query results come from `push_rows` in order. Once the queue runs dry,
/// an `INSERT … RETURNING col` yields one row holding the scripted
/// last-insert id and any other query yields an empty set. Executes report
/// the queued affected counts, or 1.
#[derive(Default)]
pub(crate) struct RecordingConnector {
    script: Mutex<Script>,
}

impl RecordingConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_rows(&self, rows: Vec<Record>) {
        self.script.lock().unwrap().rows.push_back(rows);
    }

    pub fn push_affected(&self, n: u64) {
        self.script.lock().unwrap().affected.push_back(n);
    }

    /// Make the next query or execute fail with the given message.
    pub fn fail_next(&self, message: &str) {
        self.script.lock().unwrap().failures.push_back(message.to_string());
    }

    /// The key the fake sequence hands out, both to `last_insert_id` and to
    /// `INSERT … RETURNING`.
    pub fn set_last_insert_id(&self, id: impl Into<Value>) {
        self.script.lock().unwrap().last_insert_id = Some(id.into());
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.script.lock().unwrap().statements.clone()
    }

    pub fn sql_log(&self) -> Vec<String> {
        self.statements().into_iter().map(|s| s.sql).collect()
    }

    fn record(&self, kind: StatementKind, sql: &str, bindings: &Bindings) -> OrmResult<()> {
        let mut script = self.script.lock().unwrap();
        script.statements.push(Statement {
            kind,
            sql: sql.to_string(),
            bindings: bindings.clone(),
        });
        match script.failures.pop_front() {
            Some(message) if kind != StatementKind::Transaction => Err(OrmError::Other(message)),
            Some(message) => {
                script.failures.push_front(message);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Connector for RecordingConnector {
    async fn query(&self, sql: &str, bindings: &Bindings) -> OrmResult<Vec<Record>> {
        self.record(StatementKind::Query, sql, bindings)?;
        let mut script = self.script.lock().unwrap();
        if let Some(rows) = script.rows.pop_front() {
            return Ok(rows);
        }
        match sql.split_once(" RETURNING ") {
            Some((_, column)) if sql.starts_with("INSERT") => {
                let id = script.last_insert_id.clone().unwrap_or_default();
                Ok(vec![row([(column.trim(), id)])])
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn execute(&self, sql: &str, bindings: &Bindings) -> OrmResult<u64> {
        self.record(StatementKind::Execute, sql, bindings)?;
        Ok(self.script.lock().unwrap().affected.pop_front().unwrap_or(1))
    }

    async fn last_insert_id(&self) -> OrmResult<Option<Value>> {
        Ok(self.script.lock().unwrap().last_insert_id.clone())
    }

    async fn begin_transaction(&self) -> OrmResult<()> {
        self.record(StatementKind::Transaction, "BEGIN", &Bindings::new())
    }

    async fn commit(&self) -> OrmResult<()> {
        self.record(StatementKind::Transaction, "COMMIT", &Bindings::new())
    }

    async fn rollback(&self) -> OrmResult<()> {
        self.record(StatementKind::Transaction, "ROLLBACK", &Bindings::new())
    }
}

/// Build a row from `(column, value)` pairs.
pub(crate) fn row<const N: usize>(pairs: [(&str, Value); N]) -> Record {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}
