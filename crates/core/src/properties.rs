use std::collections::HashMap;

use crate::error::PropertyError;
use crate::property::{Property, PropertyKey, PropertyType};

/// A set of properties keyed by id.
///
/// Built fresh for every invocation by layering caller values over an
/// operation's schema, then dropped once `exec` returns.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    entries: HashMap<String, Property>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a property, replacing any existing entry with the same id.
    pub fn add(&mut self, property: Property) -> Option<Property> {
        self.entries.insert(property.id().to_string(), property)
    }

    pub fn with(mut self, property: Property) -> Self {
        self.add(property);
        self
    }

    /// Layer `other` on top of this set. Entries from `other` win on collision.
    pub fn merge(&mut self, other: Properties) {
        self.entries.extend(other.entries);
    }

    pub fn get(&self, id: &str) -> Option<&Property> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Property> {
        self.entries.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Typed read. `Ok(None)` when the property is absent or unbound.
    pub fn value<T: PropertyType>(
        &self,
        key: &PropertyKey<T>,
    ) -> Result<Option<T>, PropertyError> {
        match self.entries.get(key.id()) {
            Some(property) => property.get::<T>(),
            None => Ok(None),
        }
    }

    /// Typed read of a property that must be bound.
    pub fn require<T: PropertyType>(&self, key: &PropertyKey<T>) -> Result<T, PropertyError> {
        self.value(key)?.ok_or_else(|| PropertyError::Missing(key.id().to_string()))
    }

    /// Bind `value` under `key`, declaring the property if it is not in the set.
    pub fn set<T: PropertyType>(
        &mut self,
        key: &PropertyKey<T>,
        value: T,
    ) -> Result<(), PropertyError> {
        match self.entries.get_mut(key.id()) {
            Some(property) => property.set(value.into_value()),
            None => {
                self.add(key.bind(value));
                Ok(())
            }
        }
    }

    /// Ids in sorted order.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Property> for Properties {
    fn from_iter<I: IntoIterator<Item = Property>>(iter: I) -> Self {
        let mut props = Properties::new();
        for property in iter {
            props.add(property);
        }
        props
    }
}

impl Extend<Property> for Properties {
    fn extend<I: IntoIterator<Item = Property>>(&mut self, iter: I) {
        for property in iter {
            self.add(property);
        }
    }
}
