use crate::model::base::Model;
use crate::model::entity::Entity;
use crate::value::Value;

/// A resolved relation memoized on a model.
#[derive(Debug, Clone, PartialEq)]
pub enum Relation {
    /// `has_one` / `belongs_to`
    One(Option<Model>),
    /// `has_many` / `belongs_to_many`
    Many(Vec<Model>),
    /// Plain data set through `set_relation`.
    Data(Value),
}

impl Relation {
    pub fn as_one(&self) -> Option<&Model> {
        match self {
            Relation::One(model) => model.as_ref(),
            _ => None,
        }
    }

    pub fn as_many(&self) -> &[Model] {
        match self {
            Relation::Many(models) => models,
            _ => &[],
        }
    }

    /// Clone the single related model into a concrete entity.
    pub fn one<E: Entity>(&self) -> Option<E> {
        self.as_one().cloned().map(E::from_model)
    }

    /// Clone the related models into concrete entities.
    pub fn many<E: Entity>(&self) -> Vec<E> {
        self.as_many().iter().cloned().map(E::from_model).collect()
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Relation::One(Some(model)) => serde_json::Value::Object(model.to_array()),
            Relation::One(None) => serde_json::Value::Null,
            Relation::Many(models) => models
                .iter()
                .map(|model| serde_json::Value::Object(model.to_array()))
                .collect(),
            Relation::Data(value) => value.to_json(),
        }
    }
}

impl<E: Entity> From<Option<E>> for Relation {
    fn from(entity: Option<E>) -> Self {
        Relation::One(entity.map(Entity::into_model))
    }
}

impl<E: Entity> From<Vec<E>> for Relation {
    fn from(entities: Vec<E>) -> Self {
        Relation::Many(entities.into_iter().map(Entity::into_model).collect())
    }
}

impl From<Value> for Relation {
    fn from(value: Value) -> Self {
        Relation::Data(value)
    }
}
