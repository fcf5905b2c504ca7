use std::future::Future;

use crate::connector::Connector;
use crate::error::{OrmError, OrmResult};
use crate::model::attributes::HasAttributes;
use crate::model::base::Model;
use crate::model::config::EntityConfig;
use crate::model::relation::Relation;
use crate::qb::QueryBuilder;
use crate::value::{Record, Value};

/// A concrete entity type wrapping a [`Model`].
///
/// Implement it with [`entity!`](crate::entity), which also wires relation
/// names to the entity's relation methods for [`Entity::get_relation`] and
/// eager loading.
pub trait Entity: Sized + Send + Sync {
    /// Static table/key/fillable configuration.
    fn config() -> &'static EntityConfig;

    fn from_model(model: Model) -> Self;

    fn model(&self) -> &Model;

    fn model_mut(&mut self) -> &mut Model;

    fn into_model(self) -> Model;

    /// Resolve the relation called `name` by running its query.
    ///
    /// Entities without relations keep the default, which rejects every name.
    fn resolve_relation<C: Connector>(
        &self,
        conn: &C,
        name: &str,
    ) -> impl Future<Output = OrmResult<Relation>> + Send {
        let _ = conn;
        let error = OrmError::invalid_relation(name, Self::config().name());
        async move { Err(error) }
    }

    // ==================== Construction ====================

    /// An empty transient entity.
    fn new() -> Self {
        Self::from_model(Model::new(Self::config()))
    }

    /// A transient entity filled through the fillable rules.
    fn make(attributes: Record) -> Self {
        Self::from_model(Model::with_attributes(Self::config(), attributes))
    }

    /// A persisted entity from a storage row.
    fn hydrate(row: Record) -> Self {
        Self::from_model(Model::hydrate(Self::config(), row))
    }

    // ==================== Queries ====================

    fn query() -> QueryBuilder {
        QueryBuilder::new(Self::config().table())
    }

    fn where_eq(column: &str, value: impl Into<Value>) -> QueryBuilder {
        Self::query().where_eq(column, value)
    }

    fn where_op(column: &str, operator: &str, value: impl Into<Value>) -> QueryBuilder {
        Self::query().where_op(column, operator, value)
    }

    /// Start a query that eager loads the named relations.
    fn with<I, S>(relations: I) -> QueryBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::query().with(relations)
    }

    /// Look up by primary key. Absence is `Ok(None)`.
    fn find(
        conn: &impl Connector,
        id: impl Into<Value>,
    ) -> impl Future<Output = OrmResult<Option<Self>>> + Send {
        let query = Self::where_eq(Self::config().primary_key(), id);
        async move { Ok(query.first(conn).await?.map(Self::hydrate)) }
    }

    /// Look up by primary key, failing with [`OrmError::NotFound`] when absent.
    fn find_or_fail(
        conn: &impl Connector,
        id: impl Into<Value>,
    ) -> impl Future<Output = OrmResult<Self>> + Send {
        let id = id.into();
        async move {
            let key = id.to_string();
            Self::find(conn, id)
                .await?
                .ok_or_else(|| OrmError::not_found(Self::config().name(), key))
        }
    }

    /// Build a transient entity from `attributes` and save it.
    fn create(
        conn: &impl Connector,
        attributes: Record,
    ) -> impl Future<Output = OrmResult<Self>> + Send {
        async move {
            let mut entity = Self::make(attributes);
            entity.model_mut().save(conn).await?;
            Ok(entity)
        }
    }

    /// Every row of the table.
    fn all(conn: &impl Connector) -> impl Future<Output = OrmResult<Vec<Self>>> + Send {
        async move { Self::get(conn, &Self::query()).await }
    }

    /// Run `query` and hydrate every row, loading the relations it names in `with`.
    fn get(
        conn: &impl Connector,
        query: &QueryBuilder,
    ) -> impl Future<Output = OrmResult<Vec<Self>>> + Send {
        async move {
            let mut entities: Vec<Self> = query
                .get(conn)
                .await?
                .into_iter()
                .map(Self::hydrate)
                .collect();
            if !query.get_with().is_empty() {
                Self::load_relations(conn, &mut entities, query.get_with()).await?;
            }
            Ok(entities)
        }
    }

    /// Run `query` with `LIMIT 1` and hydrate the row, if any.
    fn first(
        conn: &impl Connector,
        query: &QueryBuilder,
    ) -> impl Future<Output = OrmResult<Option<Self>>> + Send {
        async move {
            let Some(row) = query.first(conn).await? else {
                return Ok(None);
            };
            let mut entity = Self::hydrate(row);
            if !query.get_with().is_empty() {
                Self::load_relations(conn, std::slice::from_mut(&mut entity), query.get_with())
                    .await?;
            }
            Ok(Some(entity))
        }
    }

    /// Update the row with key `id` directly, without dirty tracking.
    fn update_model(
        conn: &impl Connector,
        id: impl Into<Value>,
        attributes: Record,
    ) -> impl Future<Output = OrmResult<u64>> + Send {
        let query = Self::where_eq(Self::config().primary_key(), id);
        async move { query.update(conn, attributes).await }
    }

    /// Delete the row with key `id` directly.
    fn destroy(
        conn: &impl Connector,
        id: impl Into<Value>,
    ) -> impl Future<Output = OrmResult<u64>> + Send {
        let query = Self::where_eq(Self::config().primary_key(), id);
        async move { query.delete(conn).await }
    }

    /// Resolve each relation for each entity and memoize it.
    ///
    /// Every entity runs its own query per relation. Names the entity does
    /// not define are skipped.
    fn load_relations(
        conn: &impl Connector,
        entities: &mut [Self],
        relations: &[String],
    ) -> impl Future<Output = OrmResult<()>> + Send {
        async move {
            'relations: for name in relations {
                for entity in entities.iter_mut() {
                    match entity.resolve_relation(conn, name).await {
                        Ok(relation) => {
                            entity.model_mut().set_relation(name.as_str(), relation);
                        }
                        Err(error) if error.is_invalid_relation() => {
                            tracing::warn!(
                                target: "pgrecord.model",
                                entity = Self::config().name(),
                                relation = %name,
                                "skipping unknown relation"
                            );
                            continue 'relations;
                        }
                        Err(error) => return Err(error),
                    }
                }
            }
            Ok(())
        }
    }

    // ==================== Instance persistence ====================

    fn save(&mut self, conn: &impl Connector) -> impl Future<Output = OrmResult<bool>> + Send {
        self.model_mut().save(conn)
    }

    fn delete(&mut self, conn: &impl Connector) -> impl Future<Output = OrmResult<bool>> + Send {
        self.model_mut().delete(conn)
    }

    fn refresh(&mut self, conn: &impl Connector) -> impl Future<Output = OrmResult<()>> + Send {
        self.model_mut().refresh(conn)
    }

    /// The memoized relation, resolving and caching it on first access.
    fn get_relation<'a>(
        &'a mut self,
        conn: &impl Connector,
        name: &str,
    ) -> impl Future<Output = OrmResult<&'a Relation>> + Send {
        async move {
            if !self.model().relation_loaded(name) {
                let relation = self.resolve_relation(conn, name).await?;
                self.model_mut().set_relation(name, relation);
            }
            self.model()
                .relation(name)
                .ok_or_else(|| OrmError::invalid_relation(name, Self::config().name()))
        }
    }

    // ==================== Relationships ====================

    /// One `R` whose `foreign_key` (default `<self>_id`) matches this
    /// entity's `local_key` (default primary key).
    fn has_one<R: Entity>(
        &self,
        conn: &impl Connector,
        foreign_key: Option<&str>,
        local_key: Option<&str>,
    ) -> impl Future<Output = OrmResult<Option<R>>> + Send {
        let query = self.has_query::<R>(foreign_key, local_key);
        async move { Ok(query.first(conn).await?.map(R::hydrate)) }
    }

    /// Every `R` whose `foreign_key` matches this entity's `local_key`.
    fn has_many<R: Entity>(
        &self,
        conn: &impl Connector,
        foreign_key: Option<&str>,
        local_key: Option<&str>,
    ) -> impl Future<Output = OrmResult<Vec<R>>> + Send {
        let query = self.has_query::<R>(foreign_key, local_key);
        async move {
            Ok(query
                .get(conn)
                .await?
                .into_iter()
                .map(R::hydrate)
                .collect())
        }
    }

    #[doc(hidden)]
    fn has_query<R: Entity>(
        &self,
        foreign_key: Option<&str>,
        local_key: Option<&str>,
    ) -> QueryBuilder {
        let foreign_key =
            foreign_key.map_or_else(|| Self::config().foreign_key(), str::to_string);
        let local_key = local_key.unwrap_or(Self::config().primary_key());
        let value = self
            .model()
            .get_attribute(local_key)
            .cloned()
            .unwrap_or_default();
        R::where_eq(&foreign_key, value)
    }

    /// The `R` this entity points at through `foreign_key` (default
    /// `<related>_id`), matched on `owner_key` (default related primary key).
    fn belongs_to<R: Entity>(
        &self,
        conn: &impl Connector,
        foreign_key: Option<&str>,
        owner_key: Option<&str>,
    ) -> impl Future<Output = OrmResult<Option<R>>> + Send {
        let foreign_key = foreign_key.map_or_else(|| R::config().foreign_key(), str::to_string);
        let owner_key = owner_key.unwrap_or(R::config().primary_key());
        let value = self
            .model()
            .get_attribute(&foreign_key)
            .cloned()
            .unwrap_or_default();
        let query = R::where_eq(owner_key, value);
        async move { Ok(query.first(conn).await?.map(R::hydrate)) }
    }

    /// Every `R` linked through a pivot table.
    ///
    /// The pivot defaults to both names sorted and joined by `_`; the pivot
    /// keys default to each side's foreign key.
    fn belongs_to_many<R: Entity>(
        &self,
        conn: &impl Connector,
        table: Option<&str>,
        foreign_pivot_key: Option<&str>,
        related_pivot_key: Option<&str>,
    ) -> impl Future<Output = OrmResult<Vec<R>>> + Send {
        let query =
            self.belongs_to_many_query::<R>(table, foreign_pivot_key, related_pivot_key);
        async move {
            Ok(query
                .get(conn)
                .await?
                .into_iter()
                .map(R::hydrate)
                .collect())
        }
    }

    #[doc(hidden)]
    fn belongs_to_many_query<R: Entity>(
        &self,
        table: Option<&str>,
        foreign_pivot_key: Option<&str>,
        related_pivot_key: Option<&str>,
    ) -> QueryBuilder {
        let owner = Self::config();
        let related = R::config();
        let pivot = table.map_or_else(|| owner.joining_table(related), str::to_string);
        let foreign_pivot_key =
            foreign_pivot_key.map_or_else(|| owner.foreign_key(), str::to_string);
        let related_pivot_key =
            related_pivot_key.map_or_else(|| related.foreign_key(), str::to_string);
        let owner_table = owner.table();
        let related_table = related.table();
        let owner_key = format!("{owner_table}.{}", owner.primary_key());
        let key = self.model().get_key().cloned().unwrap_or_default();

        Self::query()
            .select([format!("{related_table}.*")])
            .join(&pivot, &owner_key, "=", &format!("{pivot}.{foreign_pivot_key}"))
            .join(
                &related_table,
                &format!("{pivot}.{related_pivot_key}"),
                "=",
                &format!("{related_table}.{}", related.primary_key()),
            )
            .where_eq(&owner_key, key)
    }
}
