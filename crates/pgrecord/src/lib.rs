//! # pgrecord
//!
//! A small active-record ORM for PostgreSQL.
//!
//! ## Features
//!
//! - **Fluent query builder**: table, projection, predicates, joins, ordering and
//!   pagination rendered into one statement with named `:placeholders`
//! - **Active-record models**: fillable/guarded mass assignment, dirty tracking,
//!   insert-or-update `save`
//! - **Relationships**: `has_one`, `has_many`, `belongs_to` and `belongs_to_many`,
//!   memoized per instance through `get_relation` or eager loading
//! - **Pluggable connector**: everything runs through the [`Connector`] trait;
//!   [`PgConnector`] owns one lazily opened `tokio_postgres` session
//!
//! ## Query Builder (qb)
//!
//! ```ignore
//! use pgrecord::qb;
//!
//! let rows = qb::table("users")
//!     .where_eq("status", "active")
//!     .where_op("age", ">", 18)
//!     .order_by("name", "desc")
//!     .limit(10)
//!     .get(&conn)
//!     .await?;
//! ```
//!
//! ## Models
//!
//! ```ignore
//! use pgrecord::prelude::*;
//! use pgrecord::entities::User;
//!
//! let conn = PgConnector::from_env()?;
//!
//! let mut user = User::create(&conn, record! {
//!     "name" => "Alice",
//!     "email" => "alice@example.com",
//!     "status" => "active",
//! }).await?;
//!
//! user.set_attribute("status", "inactive");
//! user.save(&conn).await?; // UPDATE users SET status = ... WHERE id = ...
//!
//! let posts = user.get_relation(&conn, "posts").await?.many::<Post>();
//! let active = User::get(&conn, &User::active().with(["profile"])).await?;
//! ```

pub mod config;
pub mod connector;
pub mod entities;
pub mod error;
pub mod model;
pub mod named;
pub mod pg;
pub mod qb;
pub mod value;

#[cfg(test)]
pub(crate) mod testing;

pub use config::ConnectionConfig;
pub use connector::Connector;
pub use error::{OrmError, OrmResult};
pub use model::{Entity, EntityConfig, HasAttributes, Model, Relation};
pub use pg::PgConnector;
pub use qb::{Bindings, QueryBuilder};
pub use value::{Record, Value};

/// Commonly used traits and types.
pub mod prelude {
    pub use crate::entities::{Comment, Post, Profile, Role, Tag, User};
    pub use crate::{
        ConnectionConfig, Connector, Entity, EntityConfig, HasAttributes, Model, OrmError,
        OrmResult, PgConnector, QueryBuilder, Record, Relation, Value, record, transaction,
    };
}
