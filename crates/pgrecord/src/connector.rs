//! The storage seam consumed by the query builder and models.

use crate::error::OrmResult;
use crate::qb::Bindings;
use crate::value::{Record, Value};

/// A connection that can run parameterized SQL with named `:placeholders`.
///
/// Implementations own exactly one session: `last_insert_id` must refer to
/// the most recent INSERT issued through the same connector, and no two
/// statements may run on the session at the same time. Callers that need
/// the key of one specific row use [`QueryBuilder::insert_returning`].
///
/// [`QueryBuilder::insert_returning`]: crate::QueryBuilder::insert_returning
pub trait Connector: Send + Sync {
    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        bindings: &Bindings,
    ) -> impl std::future::Future<Output = OrmResult<Vec<Record>>> + Send;

    /// Execute a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        bindings: &Bindings,
    ) -> impl std::future::Future<Output = OrmResult<u64>> + Send;

    /// The identifier generated by the last INSERT on this session, if any.
    fn last_insert_id(&self) -> impl std::future::Future<Output = OrmResult<Option<Value>>> + Send;

    /// Start a flat transaction.
    fn begin_transaction(&self) -> impl std::future::Future<Output = OrmResult<()>> + Send;

    /// Commit the open transaction.
    fn commit(&self) -> impl std::future::Future<Output = OrmResult<()>> + Send;

    /// Roll back the open transaction.
    fn rollback(&self) -> impl std::future::Future<Output = OrmResult<()>> + Send;
}

impl<C: Connector> Connector for &C {
    fn query(
        &self,
        sql: &str,
        bindings: &Bindings,
    ) -> impl std::future::Future<Output = OrmResult<Vec<Record>>> + Send {
        (**self).query(sql, bindings)
    }

    fn execute(
        &self,
        sql: &str,
        bindings: &Bindings,
    ) -> impl std::future::Future<Output = OrmResult<u64>> + Send {
        (**self).execute(sql, bindings)
    }

    fn last_insert_id(&self) -> impl std::future::Future<Output = OrmResult<Option<Value>>> + Send {
        (**self).last_insert_id()
    }

    fn begin_transaction(&self) -> impl std::future::Future<Output = OrmResult<()>> + Send {
        (**self).begin_transaction()
    }

    fn commit(&self) -> impl std::future::Future<Output = OrmResult<()>> + Send {
        (**self).commit()
    }

    fn rollback(&self) -> impl std::future::Future<Output = OrmResult<()>> + Send {
        (**self).rollback()
    }
}

/// Runs the given block inside a transaction on a [`Connector`].
///
/// - Begins with `$conn.begin_transaction().await`.
/// - Commits on `Ok(_)`.
/// - Rolls back on `Err(_)`.
///
/// The block must evaluate to `pgrecord::OrmResult<T>`. Transactions are
/// flat; nesting is not supported.
///
/// # Example
///
/// ```ignore
/// pgrecord::transaction!(&conn, {
///     let user = User::create(&conn, record! { "name" => "Alice" }).await?;
///     Profile::create(&conn, record! { "user_id" => user.get_key().cloned() }).await?;
///     Ok(user)
/// })?;
/// ```
#[macro_export]
macro_rules! transaction {
    ($conn:expr, $body:block) => {{
        let __pgrecord_conn = $conn;
        $crate::Connector::begin_transaction(__pgrecord_conn).await?;

        let __pgrecord_tx_body_result: $crate::OrmResult<_> = async { $body }.await;
        match __pgrecord_tx_body_result {
            Ok(value) => {
                $crate::Connector::commit(__pgrecord_conn).await?;
                Ok(value)
            }
            Err(error) => match $crate::Connector::rollback(__pgrecord_conn).await {
                Ok(()) => Err(error),
                Err(rollback_err) => Err($crate::OrmError::Other(format!(
                    "{error} (rollback failed: {rollback_err})"
                ))),
            },
        }
    }};
}
