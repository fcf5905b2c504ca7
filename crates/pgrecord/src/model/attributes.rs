use crate::value::{Record, Value};

/// Attribute storage with mass-assignment filtering and dirty tracking.
pub trait HasAttributes {
    /// Set every permitted key from `attributes`; other keys are dropped silently.
    fn fill(&mut self, attributes: Record) -> &mut Self;

    fn get_attribute(&self, key: &str) -> Option<&Value>;

    /// Set a single attribute, bypassing the fillable rules.
    fn set_attribute(&mut self, key: &str, value: impl Into<Value>) -> &mut Self;

    fn unset_attribute(&mut self, key: &str) -> Option<Value>;

    fn get_attributes(&self) -> &Record;

    /// The attributes as last synchronized with storage.
    fn get_original(&self) -> &Record;

    /// Attributes that are missing from, or differ from, the original.
    fn get_dirty(&self) -> Record {
        let original = self.get_original();
        self.get_attributes()
            .iter()
            .filter(|(key, value)| original.get(*key) != Some(*value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    fn is_dirty(&self) -> bool {
        !self.get_dirty().is_empty()
    }
}
