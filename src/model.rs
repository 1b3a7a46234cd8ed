//! Model trait for accessing and manipulating record data
//!
//! This module provides the `ModelTrait` which allows dynamic access to record
//! attributes, primary key values and the per-record relation cache, plus
//! [`Record`], the attribute-map model every query result is decoded into.

use crate::value::is_null;
use sea_query::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Trait for record-level operations used by relations
///
/// Relations only ever read and write records through this trait, so typed
/// application models can take part in loading by implementing it.
///
/// # Example
///
/// ```
/// use belongs_to_dynamic::{ModelTrait, Record};
///
/// let mut post = Record::new().with_attribute("id", 7).with_attribute("title", "Hello");
/// assert!(post.get_attribute("author_id").is_none());
///
/// post.set_attribute("author_id", 3.into());
/// assert!(post.is_dirty("author_id"));
/// ```
pub trait ModelTrait: Clone + std::fmt::Debug {
    /// Get the value of an attribute, `None` when the record has no such attribute
    fn get_attribute(&self, name: &str) -> Option<Value>;

    /// Set an attribute value, marking it dirty
    fn set_attribute(&mut self, name: &str, value: Value);

    /// Name of the primary key column
    fn primary_key_name(&self) -> &str;

    /// Get the primary key value from the model
    fn get_primary_key_value(&self) -> Value {
        self.get_attribute(self.primary_key_name())
            .unwrap_or(Value::String(None))
    }

    /// Cache a loaded relation. `None` records that the relation was loaded
    /// and has no related record.
    fn set_relation(&mut self, name: &str, related: Option<Record>);

    /// Whether the relation has been loaded onto this record
    fn relation_loaded(&self, name: &str) -> bool;

    /// The cached related record, if the relation is loaded and non-empty
    fn get_relation(&self, name: &str) -> Option<&Record>;

    /// Whether the attribute was assigned after the record was loaded
    fn is_dirty(&self, name: &str) -> bool;

    /// Get an attribute only if it holds a non-null value
    fn non_null_attribute(&self, name: &str) -> Option<Value> {
        self.get_attribute(name).filter(|value| !is_null(value))
    }
}

/// A row-shaped model: attributes keyed by column name
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    primary_key: String,
    attributes: BTreeMap<String, Value>,
    dirty: BTreeSet<String>,
    relations: BTreeMap<String, Option<Box<Record>>>,
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

impl Record {
    /// Create an empty record whose primary key column is `id`
    pub fn new() -> Self {
        Self {
            primary_key: "id".to_string(),
            attributes: BTreeMap::new(),
            dirty: BTreeSet::new(),
            relations: BTreeMap::new(),
        }
    }

    /// Build a record from loaded attributes. Nothing is marked dirty.
    pub fn from_attributes(attributes: BTreeMap<String, Value>) -> Self {
        Self {
            attributes,
            ..Self::new()
        }
    }

    /// Set the primary key column name
    pub fn with_primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_key = name.into();
        self
    }

    /// Add a loaded (clean) attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// All attributes in column-name order
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    /// Names of attributes assigned since load
    pub fn dirty_attributes(&self) -> impl Iterator<Item = &str> {
        self.dirty.iter().map(String::as_str)
    }

    /// Forget dirty markers, e.g. after the record has been persisted
    pub fn sync_original(&mut self) {
        self.dirty.clear();
    }

    /// Names of loaded relations
    pub fn loaded_relations(&self) -> impl Iterator<Item = &str> {
        self.relations.keys().map(String::as_str)
    }
}

impl ModelTrait for Record {
    fn get_attribute(&self, name: &str) -> Option<Value> {
        self.attributes.get(name).cloned()
    }

    fn set_attribute(&mut self, name: &str, value: Value) {
        self.attributes.insert(name.to_string(), value);
        self.dirty.insert(name.to_string());
    }

    fn primary_key_name(&self) -> &str {
        &self.primary_key
    }

    fn set_relation(&mut self, name: &str, related: Option<Record>) {
        self.relations.insert(name.to_string(), related.map(Box::new));
    }

    fn relation_loaded(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    fn get_relation(&self, name: &str) -> Option<&Record> {
        self.relations.get(name).and_then(|related| related.as_deref())
    }

    fn is_dirty(&self, name: &str) -> bool {
        self.dirty.contains(name)
    }
}
