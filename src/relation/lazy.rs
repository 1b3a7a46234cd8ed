//! Lazy loading of dynamic belongs-to relations.
//!
//! The parent is loaded the first time it is asked for and cached on the
//! child under the relation name; later calls return the cached value
//! without touching the database.
//!
//! # Example
//!
//! ```
//! use belongs_to_dynamic::test_helpers::MockExecutor;
//! use belongs_to_dynamic::{BelongsTo, BelongsToDynamic, LazyLoader, ModelTrait, Record, SelectQuery};
//!
//! let relation = BelongsToDynamic::new(
//!     BelongsTo::new(SelectQuery::new("authors"), "author_id", "id", "author"),
//!     SelectQuery::new("post_authors"),
//!     "author_id",
//!     "post_id",
//! );
//!
//! let executor = MockExecutor::new();
//! executor.push_rows(vec![Record::new().with_attribute("author_id", 3)]);
//! executor.push_rows(vec![Record::new().with_attribute("id", 3)]);
//!
//! let mut post = Record::new().with_attribute("id", 1);
//! let loader = LazyLoader::new(&executor);
//!
//! let author = loader.load(&mut post, &relation)?;
//! assert!(author.is_some());
//! assert!(post.relation_loaded("author"));
//!
//! // cached
//! loader.load(&mut post, &relation)?;
//! assert_eq!(executor.query_count(), 2);
//! # Ok::<(), belongs_to_dynamic::LifeError>(())
//! ```

use crate::executor::{LifeError, LifeExecutor};
use crate::model::{ModelTrait, Record};
use crate::relation::dynamic::BelongsToDynamic;

/// A lazy loader bound to an executor
pub struct LazyLoader<'a, Ex: ?Sized> {
    executor: &'a Ex,
}

impl<'a, Ex> LazyLoader<'a, Ex>
where
    Ex: LifeExecutor + ?Sized,
{
    pub fn new(executor: &'a Ex) -> Self {
        Self { executor }
    }

    /// Return the child's parent, loading and caching it on first access
    ///
    /// # Errors
    ///
    /// Propagates executor errors unchanged; nothing is cached on error.
    pub fn load<M: ModelTrait>(&self, child: &mut M, relation: &BelongsToDynamic) -> Result<Option<Record>, LifeError> {
        let name = relation.relation_name();
        if child.relation_loaded(name) {
            return Ok(child.get_relation(name).cloned());
        }

        let parent = relation.resolve_single(child, self.executor)?;
        child.set_relation(name, parent.clone());
        Ok(parent)
    }
}
