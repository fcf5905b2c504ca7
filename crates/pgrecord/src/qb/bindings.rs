//! Named parameter storage for query builders.

use std::collections::BTreeMap;
use std::collections::btree_map;

use crate::value::Value;

/// Placeholder name (including the leading `:`) to bound value.
///
/// Every placeholder referenced by rendered SQL exists exactly once here.
/// Names are derived from column names and de-duplicated with a numeric
/// suffix, so filtering the same column twice yields `:status` and
/// `:status_1`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bindings {
    values: BTreeMap<String, Value>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// The placeholder that [`Bindings::bind`] would allocate for `column`.
    pub fn placeholder_for(&self, column: &str) -> String {
        let base = format!(":{}", column.replace('.', "_"));
        if !self.values.contains_key(&base) {
            return base;
        }
        let mut counter = 1usize;
        loop {
            let candidate = format!("{base}_{counter}");
            if !self.values.contains_key(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }

    /// Allocate a fresh placeholder for `column`, bind `value` to it and return its name.
    pub fn bind(&mut self, column: &str, value: impl Into<Value>) -> String {
        let placeholder = self.placeholder_for(column);
        self.values.insert(placeholder.clone(), value.into());
        placeholder
    }

    /// Look up a value by placeholder name (with or without the leading `:`).
    pub fn get(&self, placeholder: &str) -> Option<&Value> {
        if placeholder.starts_with(':') {
            self.values.get(placeholder)
        } else {
            self.values.get(&format!(":{placeholder}"))
        }
    }

    pub fn contains(&self, placeholder: &str) -> bool {
        self.get(placeholder).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.values.iter()
    }

    /// Copy every binding of `other` into `self`, overwriting equal names.
    pub fn extend(&mut self, other: &Bindings) {
        self.values
            .extend(other.values.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}

impl<'a> IntoIterator for &'a Bindings {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
