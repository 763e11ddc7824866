//! Object-oriented environment state.
//!
//! A state is a set of named objects, each belonging to a class and holding
//! attribute values. Objects are kept in a `BTreeMap` so iteration (and
//! therefore hashing) is deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// A single object in a state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectInstance {
    /// Name of the class this object belongs to.
    pub class: String,

    /// Attribute values by attribute name.
    #[serde(default)]
    pub values: BTreeMap<String, Value>,
}

impl ObjectInstance {
    /// Creates an object of `class` with no attribute values.
    #[must_use]
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            values: BTreeMap::new(),
        }
    }

    /// Sets an attribute value (builder style).
    #[must_use]
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(attribute, value);
        self
    }

    /// Sets an attribute value in place.
    pub fn set(&mut self, attribute: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(attribute.into(), value.into());
    }

    /// Returns the value of `attribute`, if set.
    #[must_use]
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.values.get(attribute)
    }
}

/// Raw environment state observed by a learning agent.
///
/// # Examples
///
/// ```
/// use qhist::{ObjectInstance, State};
///
/// let mut state = State::new();
/// state.add_object("p0", ObjectInstance::new("player").with("x", 1));
/// assert_eq!(state.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State {
    objects: BTreeMap<String, ObjectInstance>,
}

impl State {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the object stored under `name`.
    pub fn add_object(&mut self, name: impl Into<String>, object: ObjectInstance) {
        self.objects.insert(name.into(), object);
    }

    /// Adds an object (builder style).
    #[must_use]
    pub fn with_object(mut self, name: impl Into<String>, object: ObjectInstance) -> Self {
        self.add_object(name, object);
        self
    }

    /// Removes and returns the object stored under `name`.
    pub fn remove_object(&mut self, name: &str) -> Option<ObjectInstance> {
        self.objects.remove(name)
    }

    /// Object named `name`.
    #[must_use]
    pub fn object(&self, name: &str) -> Option<&ObjectInstance> {
        self.objects.get(name)
    }

    /// Iterates objects in name order.
    pub fn objects(&self) -> impl Iterator<Item = (&str, &ObjectInstance)> {
        self.objects.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates the objects of one class in name order.
    pub fn objects_of_class<'a>(
        &'a self,
        class: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a ObjectInstance)> + 'a {
        self.objects().filter(move |(_, o)| o.class == class)
    }

    /// Number of objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True when the state holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
