//! Fluent query builder.
//!
//! A [`QueryBuilder`] accumulates a table, a projection, WHERE predicates,
//! joins, ordering and pagination, then renders a single statement with
//! named `:placeholders` and a matching [`Bindings`] map.
//!
//! # Usage
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
//!
//! // SELECT * FROM users WHERE status = :status AND age > :age ORDER BY name DESC LIMIT 10
//! ```

mod bindings;
mod builder;
mod exec;
mod expr;

pub use bindings::Bindings;
pub use builder::QueryBuilder;
pub use expr::{Boolean, Join, JoinKind, OrderBy, Predicate};

/// Create a query builder for the given table.
pub fn table(name: &str) -> QueryBuilder {
    QueryBuilder::new(name)
}
