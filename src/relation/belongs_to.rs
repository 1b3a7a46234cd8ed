//! Base belongs-to relation.
//!
//! The child holds a foreign key attribute that points at the related (parent)
//! table's owner key, e.g. `posts.author_id -> authors.id`.

use crate::executor::{LifeError, LifeExecutor};
use crate::model::{ModelTrait, Record};
use crate::query::SelectQuery;
use crate::value::{sorted_unique_keys, KeyValue};
use sea_query::Value;
use std::collections::HashMap;

/// Many-to-one relation from a child record to its parent
#[derive(Clone, Debug)]
pub struct BelongsTo {
    query: SelectQuery,
    foreign_key: String,
    owner_key: String,
    relation: String,
    constrained: bool,
}

impl BelongsTo {
    /// Create a relation
    ///
    /// * `query` - query against the parent table
    /// * `foreign_key` - attribute on the child holding the parent key
    /// * `owner_key` - parent column the foreign key refers to
    /// * `relation` - name the parent is cached under on the child
    pub fn new(
        query: SelectQuery,
        foreign_key: impl Into<String>,
        owner_key: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            query,
            foreign_key: foreign_key.into(),
            owner_key: owner_key.into(),
            relation: relation.into(),
            constrained: true,
        }
    }

    /// Stop [`add_constraints`](Self::add_constraints) from narrowing the query
    ///
    /// Eager loading builds its relations this way; the batch constraints are
    /// applied separately.
    pub fn without_constraints(mut self) -> Self {
        self.constrained = false;
        self
    }

    /// Whether per-record constraints are applied
    pub fn constraints_enabled(&self) -> bool {
        self.constrained
    }

    /// The active query
    pub fn query(&self) -> &SelectQuery {
        &self.query
    }

    pub(crate) fn set_query(&mut self, query: SelectQuery) {
        self.query = query;
    }

    pub fn foreign_key(&self) -> &str {
        &self.foreign_key
    }

    pub fn owner_key(&self) -> &str {
        &self.owner_key
    }

    pub fn relation_name(&self) -> &str {
        &self.relation
    }

    /// Owner key qualified with the parent table, e.g. `authors.id`
    pub fn qualified_owner_key(&self) -> String {
        format!("{}.{}", self.query.table_name(), self.owner_key)
    }

    /// Constrain the query to the child's parent
    pub fn add_constraints<M: ModelTrait>(&mut self, child: &M) {
        if !self.constrained {
            return;
        }
        let key = child
            .get_attribute(&self.foreign_key)
            .unwrap_or(Value::String(None));
        let column = self.qualified_owner_key();
        self.query = self.query.clone().where_eq(&column, key);
    }

    /// Constrain the query to the parents of a whole batch
    pub fn add_eager_constraints<M: ModelTrait>(&mut self, models: &[M]) {
        let keys = gather_keys(models, &self.foreign_key);
        let column = self.qualified_owner_key();
        self.query = self.query.clone().where_in(&column, keys);
    }

    /// Mark the relation as loaded and empty on every model
    pub fn init_relation<M: ModelTrait>(&self, models: &mut [M], relation: &str) {
        for model in models.iter_mut() {
            model.set_relation(relation, None);
        }
    }

    /// Load the parent of a single child
    ///
    /// Returns `None` without querying when the child has no foreign key.
    ///
    /// # Errors
    ///
    /// Propagates executor errors unchanged.
    pub fn get_results<M, Ex>(&self, child: &M, executor: &Ex) -> Result<Option<Record>, LifeError>
    where
        M: ModelTrait,
        Ex: LifeExecutor + ?Sized,
    {
        if child.non_null_attribute(&self.foreign_key).is_none() {
            return Ok(None);
        }
        self.query.first(executor)
    }

    /// Run the active query for an eager load
    ///
    /// # Errors
    ///
    /// Propagates executor errors unchanged.
    pub fn get_eager<Ex: LifeExecutor + ?Sized>(&self, executor: &Ex) -> Result<Vec<Record>, LifeError> {
        self.query.all(executor)
    }

    /// Attach eagerly loaded parents to their children
    ///
    /// Parents are keyed by owner key; owner keys are unique in the parent
    /// table, so a repeated key simply replaces the earlier row.
    pub fn match_models<M: ModelTrait>(&self, mut models: Vec<M>, results: Vec<Record>, relation: &str) -> Vec<M> {
        let mut dictionary: HashMap<KeyValue, Record> = HashMap::new();
        for result in results {
            if let Some(key) = result.get_attribute(&self.owner_key).as_ref().and_then(KeyValue::from_value) {
                dictionary.insert(key, result);
            }
        }

        for model in models.iter_mut() {
            let key = model
                .get_attribute(&self.foreign_key)
                .as_ref()
                .and_then(KeyValue::from_value);
            if let Some(parent) = key.and_then(|key| dictionary.get(&key)) {
                model.set_relation(relation, Some(parent.clone()));
            }
        }
        models
    }
}

/// Gather the non-null values of `attribute` across a batch for an `IN` list.
///
/// Keys are deduplicated and sorted. A batch without any key yields a single
/// NULL so the `IN` list stays valid and matches nothing.
pub(crate) fn gather_keys<M: ModelTrait>(models: &[M], attribute: &str) -> Vec<Value> {
    let keys = sorted_unique_keys(models.iter().filter_map(|m| m.get_attribute(attribute)));
    if keys.is_empty() {
        return vec![Value::String(None)];
    }
    keys
}
