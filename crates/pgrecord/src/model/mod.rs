//! Active-record layer.
//!
//! A [`Model`] holds one row's state: current attributes, the snapshot last
//! synchronized with storage, an `exists` flag and memoized relations.
//! Concrete entity types wrap a `Model` and implement [`Entity`] (usually
//! through [`entity!`](crate::entity)), which supplies type-level lookups,
//! persistence and relationship resolution on top of the query builder.
//!
//! # Lifecycle
//!
//! - `make`/`new` produce a transient entity (`exists == false`).
//! - `find`, `all`, `get` and relation queries hydrate persisted entities.
//! - `save` inserts a transient entity or updates only the dirty attributes
//!   of a persisted one.
//! - `delete` removes the row and marks the entity transient again.

mod attributes;
mod base;
mod config;
mod entity;
mod macros;
mod relation;

pub use attributes::HasAttributes;
pub use base::Model;
pub use config::EntityConfig;
pub use entity::Entity;
pub use relation::Relation;

#[cfg(test)]
mod tests;
