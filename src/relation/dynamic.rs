//! Belongs-to relation with a dynamically resolved foreign key.
//!
//! Some children do not store the key of their parent. Instead a lookup
//! (indirection) query maps the child's primary key to the parent key, e.g.
//! `post_authors(post_id, author_id)` for posts whose author is kept outside
//! the `posts` table. [`BelongsToDynamic`] resolves that key through the lookup
//! query and then behaves like a normal [`BelongsTo`].
//!
//! Two load paths are supported:
//!
//! - **single** ([`BelongsToDynamic::resolve_single`]): resolve the key for one
//!   child with one lookup, store it on the child, then load the parent.
//! - **batch** ([`BelongsToDynamic::resolve_batch`]): one `IN` query against the
//!   lookup for the whole batch, matched back through an [`EagerMatch`]
//!   dictionary. No per-child queries.
//!
//! The stored lookup query is never narrowed in place. Every use works on a
//! clone, so one relation can resolve any number of children.

use crate::executor::{LifeError, LifeExecutor};
use crate::model::{ModelTrait, Record};
use crate::query::SelectQuery;
use crate::relation::belongs_to::{gather_keys, BelongsTo};
use crate::value::KeyValue;
use sea_query::Value;
use std::collections::HashMap;

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

/// Belongs-to relation whose foreign key comes from a lookup query
///
/// # Example
///
/// ```
/// use belongs_to_dynamic::test_helpers::MockExecutor;
/// use belongs_to_dynamic::{BelongsTo, BelongsToDynamic, ModelTrait, Record, SelectQuery};
///
/// let relation = BelongsToDynamic::new(
///     BelongsTo::new(SelectQuery::new("authors"), "author_id", "id", "author"),
///     SelectQuery::new("post_authors"),
///     "author_id",
///     "post_id",
/// );
///
/// let executor = MockExecutor::new();
/// executor.push_rows(vec![Record::new().with_attribute("author_id", 9)]);
/// executor.push_rows(vec![Record::new().with_attribute("id", 9).with_attribute("name", "ann")]);
///
/// let mut post = Record::new().with_attribute("id", 1);
/// let author = relation.resolve_single(&mut post, &executor).unwrap();
///
/// assert_eq!(post.get_attribute("author_id"), Some(9.into()));
/// assert_eq!(author.unwrap().get_attribute("name"), Some("ann".into()));
/// ```
#[derive(Clone, Debug)]
pub struct BelongsToDynamic {
    parent: BelongsTo,
    sub_query: SelectQuery,
    sub_query_foreign_key: String,
    sub_query_owner_key: String,
}

impl BelongsToDynamic {
    /// Create a relation
    ///
    /// * `parent` - the plain belongs-to relation the resolved key feeds
    /// * `sub_query` - lookup query mapping children to parent keys
    /// * `sub_query_foreign_key` - lookup column holding the parent key
    /// * `sub_query_owner_key` - lookup column matched against the child
    pub fn new(
        parent: BelongsTo,
        sub_query: SelectQuery,
        sub_query_foreign_key: impl Into<String>,
        sub_query_owner_key: impl Into<String>,
    ) -> Self {
        Self {
            parent,
            sub_query,
            sub_query_foreign_key: sub_query_foreign_key.into(),
            sub_query_owner_key: sub_query_owner_key.into(),
        }
    }

    /// The underlying belongs-to relation (its query is the active query)
    pub fn parent(&self) -> &BelongsTo {
        &self.parent
    }

    /// The configured lookup query, as passed in
    pub fn sub_query(&self) -> &SelectQuery {
        &self.sub_query
    }

    pub fn sub_query_foreign_key(&self) -> &str {
        &self.sub_query_foreign_key
    }

    pub fn sub_query_owner_key(&self) -> &str {
        &self.sub_query_owner_key
    }

    pub fn relation_name(&self) -> &str {
        self.parent.relation_name()
    }

    /// Build this relation for eager loading: [`add_constraints`](Self::add_constraints)
    /// becomes a no-op and no per-record lookup runs
    pub fn without_constraints(mut self) -> Self {
        self.parent = self.parent.without_constraints();
        self
    }

    pub fn constraints_enabled(&self) -> bool {
        self.parent.constraints_enabled()
    }

    /// Resolve the child's foreign key if needed, then constrain the parent query
    ///
    /// A child whose foreign key is already set is left alone and no lookup
    /// runs. Otherwise the lookup is filtered by the child's primary key and
    /// the first row's `sub_query_foreign_key` becomes the child's foreign key.
    /// Without a lookup row the foreign key stays null.
    ///
    /// Does nothing on a relation built [`without_constraints`](Self::without_constraints).
    ///
    /// # Errors
    ///
    /// Propagates lookup query errors unchanged.
    pub fn add_constraints<M, Ex>(&mut self, child: &mut M, executor: &Ex) -> Result<(), LifeError>
    where
        M: ModelTrait,
        Ex: LifeExecutor + ?Sized,
    {
        if !self.constraints_enabled() {
            return Ok(());
        }

        let foreign_key = self.parent.foreign_key().to_string();
        if child.non_null_attribute(&foreign_key).is_none() {
            #[cfg(feature = "metrics")]
            METRICS.record_relation_lookup();

            let lookup = self
                .sub_query
                .clone()
                .select_only(&self.sub_query_foreign_key)
                .where_eq(&self.sub_query_owner_key, child.get_primary_key_value());

            match lookup.first(executor)? {
                Some(row) => {
                    let value = row
                        .get_attribute(&self.sub_query_foreign_key)
                        .unwrap_or(Value::String(None));
                    log::debug!(
                        "resolved {}.{} = {:?} via {}",
                        self.relation_name(),
                        foreign_key,
                        value,
                        self.sub_query.table_name()
                    );
                    child.set_attribute(&foreign_key, value);
                }
                None => {
                    log::debug!(
                        "no {} row for {:?}; {} left unresolved",
                        self.sub_query.table_name(),
                        child.get_primary_key_value(),
                        foreign_key
                    );
                }
            }
        }

        self.parent.add_constraints(child);
        Ok(())
    }

    /// Replace the active query with one lookup query for the whole batch
    ///
    /// The lookup is filtered by `sub_query_owner_key IN (...)` over the
    /// children's `sub_query_foreign_key` attribute. Children are not modified.
    pub fn add_eager_constraints<M: ModelTrait>(&mut self, models: &[M]) {
        let keys = self.get_eager_model_keys(models);
        log::debug!(
            "eager {}: {} model(s), {} key(s)",
            self.relation_name(),
            models.len(),
            keys.len()
        );
        let query = self
            .sub_query
            .clone()
            .where_in(&self.sub_query_owner_key, keys);
        self.parent.set_query(query);
    }

    /// Distinct, sorted, non-null `sub_query_foreign_key` values of a batch
    ///
    /// Returns a single NULL when the batch has no keys at all.
    pub fn get_eager_model_keys<M: ModelTrait>(&self, models: &[M]) -> Vec<Value> {
        gather_keys(models, &self.sub_query_foreign_key)
    }

    /// Mark the relation as loaded and empty on every model
    pub fn init_relation<M: ModelTrait>(&self, models: &mut [M], relation: &str) {
        self.parent.init_relation(models, relation);
    }

    /// Load the parent of a single child after [`add_constraints`](Self::add_constraints)
    ///
    /// # Errors
    ///
    /// Propagates executor errors unchanged.
    pub fn get_results<M, Ex>(&self, child: &M, executor: &Ex) -> Result<Option<Record>, LifeError>
    where
        M: ModelTrait,
        Ex: LifeExecutor + ?Sized,
    {
        self.parent.get_results(child, executor)
    }

    /// Run the active query after [`add_eager_constraints`](Self::add_eager_constraints)
    ///
    /// # Errors
    ///
    /// Propagates executor errors unchanged.
    pub fn get_eager<Ex: LifeExecutor + ?Sized>(&self, executor: &Ex) -> Result<Vec<Record>, LifeError> {
        self.parent.get_eager(executor)
    }

    /// Build the owner-key dictionary for eager results
    pub fn dictionary(&self, results: Vec<Record>) -> EagerMatch {
        EagerMatch::build(
            results,
            &self.sub_query_owner_key,
            &self.sub_query_foreign_key,
        )
    }

    /// Attach eager results to the children they belong to
    ///
    /// Results are keyed by `sub_query_owner_key` (first row wins per key) and
    /// looked up with each child's `sub_query_foreign_key` attribute. Children
    /// without a match are left untouched.
    pub fn match_models<M: ModelTrait>(&self, mut models: Vec<M>, results: Vec<Record>, relation: &str) -> Vec<M> {
        self.dictionary(results).attach(&mut models, relation);
        models
    }

    /// Single-record path: resolve the key and load the parent
    ///
    /// # Errors
    ///
    /// Propagates executor errors unchanged.
    pub fn resolve_single<M, Ex>(&self, child: &mut M, executor: &Ex) -> Result<Option<Record>, LifeError>
    where
        M: ModelTrait,
        Ex: LifeExecutor + ?Sized,
    {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::resolve_relation_span(self.relation_name(), "single").entered();

        let mut relation = self.clone();
        relation.add_constraints(child, executor)?;
        relation.get_results(child, executor)
    }

    /// Batch path: one lookup query for all children
    ///
    /// Apply the returned [`EagerMatch`] with [`EagerMatch::attach`].
    ///
    /// # Errors
    ///
    /// Propagates executor errors unchanged.
    pub fn resolve_batch<M, Ex>(&self, children: &[M], executor: &Ex) -> Result<EagerMatch, LifeError>
    where
        M: ModelTrait,
        Ex: LifeExecutor + ?Sized,
    {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::resolve_relation_span(self.relation_name(), "batch").entered();

        let mut relation = self.clone();
        relation.add_eager_constraints(children);
        let results = relation.get_eager(executor)?;
        Ok(relation.dictionary(results))
    }
}

/// Eager results keyed by the lookup owner key
#[derive(Clone, Debug, Default)]
pub struct EagerMatch {
    dictionary: HashMap<KeyValue, Record>,
    lookup_attribute: String,
}

impl EagerMatch {
    /// Key `results` by `owner_key`; children are looked up by `lookup_attribute`
    ///
    /// When several rows share an owner key only the first one is kept.
    pub fn build(results: Vec<Record>, owner_key: &str, lookup_attribute: &str) -> Self {
        let mut dictionary = HashMap::new();
        for result in results {
            let Some(key) = result.get_attribute(owner_key).as_ref().and_then(KeyValue::from_value) else {
                continue;
            };
            if dictionary.contains_key(&key) {
                log::debug!("discarding duplicate {owner_key} row for {key:?}");
                continue;
            }
            dictionary.insert(key, result);
        }
        Self {
            dictionary,
            lookup_attribute: lookup_attribute.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.dictionary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dictionary.is_empty()
    }

    /// The row matched for a key value
    pub fn get(&self, key: &Value) -> Option<&Record> {
        KeyValue::from_value(key).and_then(|key| self.dictionary.get(&key))
    }

    /// Set `relation` on every model whose lookup attribute has a matching row
    pub fn attach<M: ModelTrait>(&self, models: &mut [M], relation: &str) {
        for model in models.iter_mut() {
            let matched = model
                .get_attribute(&self.lookup_attribute)
                .and_then(|key| self.get(&key));
            if let Some(row) = matched {
                model.set_relation(relation, Some(row.clone()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MockExecutor;
    use crate::value::is_null;

    fn relation() -> BelongsToDynamic {
        BelongsToDynamic::new(
            BelongsTo::new(SelectQuery::new("authors"), "author_id", "id", "author"),
            SelectQuery::new("post_authors"),
            "author_id",
            "post_id",
        )
    }

    // ============================================================================
    // Single path
    // ============================================================================

    #[test]
    fn test_add_constraints_skips_lookup_when_key_present() {
        let executor = MockExecutor::new();
        let mut rel = relation();
        let mut post = Record::new().with_attribute("id", 1).with_attribute("author_id", 4);

        rel.add_constraints(&mut post, &executor).unwrap();

        assert_eq!(executor.query_count(), 0);
        assert_eq!(post.get_attribute("author_id"), Some(Value::Int(Some(4))));
        assert!(!post.is_dirty("author_id"));
        assert_eq!(
            rel.parent().query().build().0,
            r#"SELECT * FROM "authors" WHERE "authors"."id" = $1"#
        );
    }

    #[test]
    fn test_add_constraints_resolves_key_from_lookup() {
        let executor = MockExecutor::new();
        executor.push_rows(vec![Record::new().with_attribute("author_id", "F")]);
        let mut rel = relation();
        let mut post = Record::new().with_attribute("id", 1);

        rel.add_constraints(&mut post, &executor).unwrap();

        assert_eq!(post.get_attribute("author_id"), Some(Value::from("F")));
        assert!(post.is_dirty("author_id"));

        let captured = executor.captured();
        assert_eq!(captured.len(), 1);
        assert!(captured[0]
            .sql
            .starts_with(r#"SELECT "author_id" FROM "post_authors" WHERE "post_id" = $1 LIMIT"#));
        assert_eq!(captured[0].values[0], Value::Int(Some(1)));

        let (sql, values) = rel.parent().query().build();
        assert_eq!(sql, r#"SELECT * FROM "authors" WHERE "authors"."id" = $1"#);
        assert_eq!(values.0, vec![Value::from("F")]);
    }

    #[test]
    fn test_add_constraints_without_lookup_row_leaves_key_null() {
        let executor = MockExecutor::new();
        executor.push_rows(vec![]);
        let mut rel = relation();
        let mut post = Record::new().with_attribute("id", 1);

        rel.add_constraints(&mut post, &executor).unwrap();

        assert!(post.non_null_attribute("author_id").is_none());
        assert!(!post.is_dirty("author_id"));
        assert_eq!(executor.query_count(), 1);
    }

    #[test]
    fn test_add_constraints_treats_null_key_as_missing() {
        let executor = MockExecutor::new();
        executor.push_rows(vec![Record::new().with_attribute("author_id", 5)]);
        let mut rel = relation();
        let mut post = Record::new()
            .with_attribute("id", 1)
            .with_attribute("author_id", Value::Int(None));

        rel.add_constraints(&mut post, &executor).unwrap();

        assert_eq!(post.get_attribute("author_id"), Some(Value::Int(Some(5))));
    }

    #[test]
    fn test_add_constraints_is_idempotent() {
        let executor = MockExecutor::new();
        executor.push_rows(vec![Record::new().with_attribute("author_id", 5)]);
        let mut post = Record::new().with_attribute("id", 1);

        relation().add_constraints(&mut post, &executor).unwrap();
        relation().add_constraints(&mut post, &executor).unwrap();

        assert_eq!(executor.query_count(), 1);
        assert_eq!(post.get_attribute("author_id"), Some(Value::Int(Some(5))));
    }

    #[test]
    fn test_add_constraints_noop_without_constraints() {
        let executor = MockExecutor::new();
        let mut rel = relation().without_constraints();
        let mut post = Record::new().with_attribute("id", 1);

        rel.add_constraints(&mut post, &executor).unwrap();

        assert_eq!(executor.query_count(), 0);
        assert_eq!(rel.parent().query().build().0, r#"SELECT * FROM "authors""#);
    }

    #[test]
    fn test_lookup_query_is_never_mutated() {
        let executor = MockExecutor::new();
        let mut rel = relation();
        let mut post = Record::new().with_attribute("id", 1);

        rel.add_constraints(&mut post, &executor).unwrap();
        rel.add_eager_constraints(&[Record::new().with_attribute("author_id", 2)]);

        assert_eq!(rel.sub_query().build().0, r#"SELECT * FROM "post_authors""#);
    }

    #[test]
    fn test_lookup_error_propagates() {
        let executor = MockExecutor::new();
        executor.push_error(LifeError::QueryError("connection reset".to_string()));
        let mut post = Record::new().with_attribute("id", 1);

        let err = relation().add_constraints(&mut post, &executor).unwrap_err();

        assert!(matches!(err, LifeError::QueryError(ref m) if m == "connection reset"));
        assert!(post.get_attribute("author_id").is_none());
    }

    #[test]
    fn test_resolve_single_loads_parent() {
        let executor = MockExecutor::new();
        executor.push_rows(vec![Record::new().with_attribute("author_id", 9)]);
        executor.push_rows(vec![Record::new().with_attribute("id", 9)]);
        let rel = relation();
        let mut post = Record::new().with_attribute("id", 1);

        let author = rel.resolve_single(&mut post, &executor).unwrap();

        assert_eq!(author.and_then(|a| a.get_attribute("id")), Some(Value::Int(Some(9))));
        assert_eq!(executor.query_count(), 2);
        // configured relation stays reusable
        assert_eq!(rel.parent().query().build().0, r#"SELECT * FROM "authors""#);
    }

    #[test]
    fn test_resolve_single_without_mapping_skips_parent_query() {
        let executor = MockExecutor::new();
        let mut post = Record::new().with_attribute("id", 1);

        let author = relation().resolve_single(&mut post, &executor).unwrap();

        assert!(author.is_none());
        assert_eq!(executor.query_count(), 1);
    }

    // ============================================================================
    // Batch path
    // ============================================================================

    #[test]
    fn test_eager_model_keys_all_null() {
        let posts = vec![
            Record::new().with_attribute("id", 1),
            Record::new().with_attribute("author_id", Value::BigInt(None)),
        ];

        let keys = relation().get_eager_model_keys(&posts);

        assert_eq!(keys.len(), 1);
        assert!(is_null(&keys[0]));
    }

    #[test]
    fn test_eager_model_keys_dedup_and_sort() {
        let posts: Vec<Record> = [3, 1, 3, 2]
            .into_iter()
            .map(|k| Record::new().with_attribute("author_id", k))
            .collect();

        let keys = relation().get_eager_model_keys(&posts);

        assert_eq!(
            keys,
            vec![Value::Int(Some(1)), Value::Int(Some(2)), Value::Int(Some(3))]
        );
    }

    #[test]
    fn test_add_eager_constraints_builds_one_in_query() {
        let mut rel = relation();
        let posts = vec![
            Record::new().with_attribute("author_id", "B"),
            Record::new().with_attribute("author_id", "A"),
            Record::new().with_attribute("author_id", "B"),
        ];

        rel.add_eager_constraints(&posts);

        let (sql, values) = rel.parent().query().build();
        assert_eq!(sql, r#"SELECT * FROM "post_authors" WHERE "post_id" IN ($1, $2)"#);
        assert_eq!(values.0, vec![Value::from("A"), Value::from("B")]);
        assert!(posts.iter().all(|p| !p.is_dirty("author_id")));
    }

    #[test]
    fn test_add_eager_constraints_without_keys_matches_nothing() {
        let mut rel = relation();
        rel.add_eager_constraints(&[Record::new()]);

        let (sql, values) = rel.parent().query().build();
        assert_eq!(sql, r#"SELECT * FROM "post_authors" WHERE "post_id" IN ($1)"#);
        assert!(is_null(&values.0[0]));
    }

    #[test]
    fn test_resolve_batch_runs_single_query() {
        let executor = MockExecutor::new();
        executor.push_rows(vec![
            Record::new().with_attribute("post_id", 1).with_attribute("name", "ann"),
            Record::new().with_attribute("post_id", 2).with_attribute("name", "bob"),
        ]);
        let mut posts: Vec<Record> = (1..=3)
            .map(|k| Record::new().with_attribute("author_id", k))
            .collect();

        let matched = relation().resolve_batch(&posts, &executor).unwrap();
        matched.attach(&mut posts, "author");

        assert_eq!(executor.query_count(), 1);
        assert_eq!(matched.len(), 2);
        assert!(posts[0].get_relation("author").is_some());
        assert!(posts[1].get_relation("author").is_some());
        assert!(!posts[2].relation_loaded("author"));
    }

    // ============================================================================
    // Matching
    // ============================================================================

    #[test]
    fn test_match_first_row_wins() {
        let rows = vec![
            Record::new().with_attribute("post_id", "X").with_attribute("val", 1),
            Record::new().with_attribute("post_id", "X").with_attribute("val", 2),
        ];

        let matched = relation().dictionary(rows);

        assert_eq!(matched.len(), 1);
        assert_eq!(
            matched.get(&Value::from("X")).and_then(|r| r.get_attribute("val")),
            Some(Value::Int(Some(1)))
        );
    }

    #[test]
    fn test_match_attaches_and_leaves_unmatched_unset() {
        let row = Record::new().with_attribute("post_id", "X").with_attribute("name", "ann");
        let posts = vec![
            Record::new().with_attribute("author_id", "X"),
            Record::new().with_attribute("author_id", "Y"),
            Record::new(),
        ];

        let posts = relation().match_models(posts, vec![row.clone()], "author");

        assert_eq!(posts.len(), 3);
        assert_eq!(posts[0].get_relation("author"), Some(&row));
        assert!(!posts[1].relation_loaded("author"));
        assert!(!posts[2].relation_loaded("author"));
    }

    #[test]
    fn test_match_ignores_null_owner_keys() {
        let rows = vec![Record::new().with_attribute("post_id", Value::Int(None))];
        assert!(relation().dictionary(rows).is_empty());
    }

    #[test]
    fn test_match_normalises_integer_widths() {
        let rows = vec![Record::new().with_attribute("post_id", Value::BigInt(Some(1)))];
        let posts = vec![Record::new().with_attribute("author_id", Value::Int(Some(1)))];

        let posts = relation().match_models(posts, rows, "author");

        assert!(posts[0].get_relation("author").is_some());
    }
}
