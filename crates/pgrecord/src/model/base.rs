use std::collections::BTreeMap;

use serde_json::Map;

use crate::connector::Connector;
use crate::error::{OrmError, OrmResult};
use crate::model::attributes::HasAttributes;
use crate::model::config::EntityConfig;
use crate::model::relation::Relation;
use crate::qb::QueryBuilder;
use crate::value::{Record, Value};

/// Row state shared by every entity: attributes, the last synchronized
/// snapshot, existence and memoized relations.
///
/// `exists` only becomes true through hydration from storage or a
/// successful insert; constructors always produce a transient model.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    config: &'static EntityConfig,
    attributes: Record,
    original: Record,
    exists: bool,
    relations: BTreeMap<String, Relation>,
}

impl Model {
    /// An empty transient model.
    pub fn new(config: &'static EntityConfig) -> Self {
        Self {
            config,
            attributes: Record::new(),
            original: Record::new(),
            exists: false,
            relations: BTreeMap::new(),
        }
    }

    /// A transient model filled through the fillable rules.
    pub fn with_attributes(config: &'static EntityConfig, attributes: Record) -> Self {
        let mut model = Self::new(config);
        model.fill(attributes);
        model
    }

    /// A persisted model built from a storage row. The row is taken as-is.
    pub fn hydrate(config: &'static EntityConfig, row: Record) -> Self {
        Self {
            config,
            attributes: row.clone(),
            original: row,
            exists: true,
            relations: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &'static EntityConfig {
        self.config
    }

    pub fn key_name(&self) -> &'static str {
        self.config.primary_key()
    }

    /// The primary key value, if set and not null.
    pub fn get_key(&self) -> Option<&Value> {
        self.attributes
            .get(self.key_name())
            .filter(|value| !value.is_null())
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    /// A fresh builder over this model's table.
    pub fn query(&self) -> QueryBuilder {
        QueryBuilder::new(self.config.table())
    }

    /// The key the row is stored under: the synchronized value wins over a
    /// pending change to the key attribute.
    fn stored_key(&self) -> Value {
        self.original
            .get(self.key_name())
            .filter(|value| !value.is_null())
            .or_else(|| self.get_key())
            .cloned()
            .unwrap_or_default()
    }

    fn key_query(&self) -> QueryBuilder {
        self.query().where_eq(self.key_name(), self.stored_key())
    }

    // ==================== Persistence ====================

    /// Insert when transient, otherwise update the dirty attributes.
    ///
    /// Returns `Ok(true)` without touching storage when there is nothing to
    /// write.
    pub async fn save(&mut self, conn: &impl Connector) -> OrmResult<bool> {
        if self.exists {
            self.perform_update(conn).await
        } else {
            self.perform_insert(conn).await
        }
    }

    async fn perform_insert(&mut self, conn: &impl Connector) -> OrmResult<bool> {
        let entity = self.config.name();
        if self.attributes.is_empty() {
            tracing::debug!(target: "pgrecord.model", entity, "insert skipped: no attributes");
            return Ok(true);
        }

        let key_name = self.key_name();
        let payload: Vec<(&str, &Value)> = self
            .attributes
            .iter()
            .filter(|(column, value)| !(column.as_str() == key_name && value.is_null()))
            .map(|(column, value)| (column.as_str(), value))
            .collect();

        // Without a key, the generated one comes back from the INSERT itself
        // so a concurrent insert on a shared connector cannot be observed.
        let written = if self.get_key().is_some() {
            self.query().insert(conn, payload).await?.then_some(None)
        } else {
            self.query()
                .insert_returning(conn, payload, key_name)
                .await?
                .map(Some)
        };
        let Some(generated) = written else {
            tracing::debug!(target: "pgrecord.model", entity, "insert wrote no rows");
            return Ok(false);
        };

        self.exists = true;
        self.original = self.attributes.clone();

        if let Some(id) = generated.filter(|id| !id.is_null() && *id != Value::Int(0)) {
            self.original.insert(key_name.to_string(), id.clone());
            self.attributes.insert(key_name.to_string(), id);
        }

        tracing::debug!(
            target: "pgrecord.model",
            entity,
            key = ?self.get_key(),
            "inserted"
        );
        Ok(true)
    }

    async fn perform_update(&mut self, conn: &impl Connector) -> OrmResult<bool> {
        let entity = self.config.name();
        let dirty = self.get_dirty();
        if dirty.is_empty() {
            tracing::debug!(target: "pgrecord.model", entity, "update skipped: clean");
            return Ok(true);
        }

        let updated = self
            .key_query()
            .update(conn, dirty.iter().map(|(column, value)| (column.as_str(), value)))
            .await?;

        tracing::debug!(
            target: "pgrecord.model",
            entity,
            columns = dirty.len(),
            updated,
            "updated"
        );
        if updated > 0 {
            self.original.extend(dirty);
        }
        Ok(updated > 0)
    }

    /// Delete the row by key. A transient model is left alone and reports `false`.
    pub async fn delete(&mut self, conn: &impl Connector) -> OrmResult<bool> {
        if !self.exists {
            tracing::debug!(
                target: "pgrecord.model",
                entity = self.config.name(),
                "delete skipped: not persisted"
            );
            return Ok(false);
        }

        let deleted = self.key_query().delete(conn).await?;
        if deleted > 0 {
            self.exists = false;
        }
        Ok(deleted > 0)
    }

    /// Reload attributes from storage and drop memoized relations.
    pub async fn refresh(&mut self, conn: &impl Connector) -> OrmResult<()> {
        let key = self.stored_key();
        if key.is_null() {
            return Err(OrmError::Validation(format!(
                "cannot refresh {} without a key",
                self.config.name()
            )));
        }

        let row = self
            .key_query()
            .first(conn)
            .await?
            .ok_or_else(|| OrmError::not_found(self.config.name(), &key))?;

        self.attributes = row.clone();
        self.original = row;
        self.exists = true;
        self.relations.clear();
        Ok(())
    }

    // ==================== Relations ====================

    pub fn set_relation(&mut self, name: impl Into<String>, relation: Relation) -> &mut Self {
        self.relations.insert(name.into(), relation);
        self
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    pub fn relation_loaded(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    pub fn unset_relation(&mut self, name: &str) -> Option<Relation> {
        self.relations.remove(name)
    }

    pub fn relations(&self) -> &BTreeMap<String, Relation> {
        &self.relations
    }

    // ==================== Serialization ====================

    /// Attributes merged with memoized relations, expanded recursively.
    pub fn to_array(&self) -> Map<String, serde_json::Value> {
        let mut map: Map<String, serde_json::Value> = self
            .attributes
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect();
        for (name, relation) in &self.relations {
            map.insert(name.clone(), relation.to_json());
        }
        map
    }

    pub fn to_json(&self) -> String {
        serde_json::Value::Object(self.to_array()).to_string()
    }
}

impl HasAttributes for Model {
    fn fill(&mut self, attributes: Record) -> &mut Self {
        for (key, value) in attributes {
            if self.config.permits(&key) {
                self.attributes.insert(key, value);
            }
        }
        self
    }

    fn get_attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    fn set_attribute(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    fn unset_attribute(&mut self, key: &str) -> Option<Value> {
        self.attributes.remove(key)
    }

    fn get_attributes(&self) -> &Record {
        &self.attributes
    }

    fn get_original(&self) -> &Record {
        &self.original
    }
}
