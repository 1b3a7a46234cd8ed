//! Eager loading of dynamic belongs-to relations.
//!
//! Loads the relation for a whole batch with the "selectinload" strategy:
//!
//! 1. Build the relation without per-record constraints (no per-record lookups)
//! 2. Constrain the lookup query with one `IN` list over the batch
//! 3. Mark the relation loaded-and-empty on every model
//! 4. Run the single query and match rows back through a dictionary
//!
//! # Example
//!
//! ```
//! use belongs_to_dynamic::test_helpers::MockExecutor;
//! use belongs_to_dynamic::{load_dynamic, BelongsTo, BelongsToDynamic, ModelTrait, Record, SelectQuery};
//!
//! let executor = MockExecutor::new();
//! executor.push_rows(vec![Record::new().with_attribute("post_id", 1).with_attribute("name", "ann")]);
//!
//! let mut posts = vec![
//!     Record::new().with_attribute("author_id", 1),
//!     Record::new().with_attribute("author_id", 2),
//! ];
//!
//! load_dynamic(&mut posts, &executor, || {
//!     BelongsToDynamic::new(
//!         BelongsTo::new(SelectQuery::new("authors"), "author_id", "id", "author"),
//!         SelectQuery::new("post_authors"),
//!         "author_id",
//!         "post_id",
//!     )
//! })?;
//!
//! assert_eq!(executor.query_count(), 1);
//! assert!(posts[0].get_relation("author").is_some());
//! assert!(posts[1].relation_loaded("author"));
//! assert!(posts[1].get_relation("author").is_none());
//! # Ok::<(), belongs_to_dynamic::LifeError>(())
//! ```

use crate::executor::{LifeError, LifeExecutor};
use crate::model::ModelTrait;
use crate::relation::dynamic::BelongsToDynamic;

/// Eagerly load a dynamic relation for every model in `models`
///
/// `make_relation` builds the relation definition; the result is switched to
/// [`without_constraints`](BelongsToDynamic::without_constraints) before use.
/// An empty batch runs no query.
///
/// # Errors
///
/// Propagates executor errors unchanged. On error no relation is set.
pub fn load_dynamic<M, Ex, F>(models: &mut [M], executor: &Ex, make_relation: F) -> Result<(), LifeError>
where
    M: ModelTrait,
    Ex: LifeExecutor + ?Sized,
    F: FnOnce() -> BelongsToDynamic,
{
    if models.is_empty() {
        return Ok(());
    }

    let mut relation = make_relation().without_constraints();
    relation.add_eager_constraints(models);

    let results = relation.get_eager(executor)?;

    let name = relation.relation_name().to_string();
    relation.init_relation(models, &name);
    relation.dictionary(results).attach(models, &name);
    Ok(())
}
