//! Constructing dynamic belongs-to relations with conventional defaults.
//!
//! The relation name is always explicit; the foreign key and owner key fall
//! back to conventions derived from it and from the related entity:
//!
//! - foreign key: `snake_case(relation) + "_" + related primary key`
//! - owner key: the related primary key

use crate::model::ModelTrait;
use crate::query::{LifeModelTrait, SelectQuery};
use crate::relation::belongs_to::BelongsTo;
use crate::relation::dynamic::BelongsToDynamic;
use heck::ToSnakeCase;
use std::marker::PhantomData;

/// Default foreign key for a relation: `author` + `id` -> `author_id`
pub fn default_foreign_key(relation: &str, related_primary_key: &str) -> String {
    format!("{}_{}", relation.to_snake_case(), related_primary_key)
}

/// Builder for [`BelongsToDynamic`]
///
/// # Example
///
/// ```
/// use belongs_to_dynamic::{BelongsToDynamicBuilder, LifeEntityName, LifeModelTrait, SelectQuery};
///
/// #[derive(Default)]
/// struct Author;
/// impl LifeEntityName for Author {
///     fn table_name(&self) -> &'static str { "authors" }
/// }
/// impl LifeModelTrait for Author {}
///
/// let relation = BelongsToDynamicBuilder::<Author>::new(
///     "author",
///     SelectQuery::new("post_authors"),
///     "author_id",
///     "post_id",
/// )
/// .build();
///
/// assert_eq!(relation.parent().foreign_key(), "author_id");
/// assert_eq!(relation.parent().owner_key(), "id");
/// ```
#[derive(Debug)]
pub struct BelongsToDynamicBuilder<R> {
    relation: String,
    sub_query: SelectQuery,
    sub_query_foreign_key: String,
    sub_query_owner_key: String,
    foreign_key: Option<String>,
    owner_key: Option<String>,
    _related: PhantomData<R>,
}

impl<R: LifeModelTrait> BelongsToDynamicBuilder<R> {
    /// Start building a relation to `R`
    ///
    /// * `relation` - relation name, also the cache key on the child
    /// * `sub_query` - lookup query; stored as given and only ever cloned
    /// * `sub_query_foreign_key` - lookup column holding the parent key
    /// * `sub_query_owner_key` - lookup column matched against the child
    pub fn new(
        relation: impl Into<String>,
        sub_query: SelectQuery,
        sub_query_foreign_key: impl Into<String>,
        sub_query_owner_key: impl Into<String>,
    ) -> Self {
        Self {
            relation: relation.into(),
            sub_query,
            sub_query_foreign_key: sub_query_foreign_key.into(),
            sub_query_owner_key: sub_query_owner_key.into(),
            foreign_key: None,
            owner_key: None,
            _related: PhantomData,
        }
    }

    /// Override the child attribute that holds the parent key
    pub fn foreign_key(mut self, foreign_key: impl Into<String>) -> Self {
        self.foreign_key = Some(foreign_key.into());
        self
    }

    /// Override the parent column the foreign key refers to
    pub fn owner_key(mut self, owner_key: impl Into<String>) -> Self {
        self.owner_key = Some(owner_key.into());
        self
    }

    /// Assemble the relation. Runs no query.
    pub fn build(self) -> BelongsToDynamic {
        let related = R::default();
        let primary_key = related.primary_key_name();

        let foreign_key = self
            .foreign_key
            .unwrap_or_else(|| default_foreign_key(&self.relation, primary_key));
        let owner_key = self.owner_key.unwrap_or_else(|| primary_key.to_string());

        BelongsToDynamic::new(
            BelongsTo::new(R::find(), foreign_key, owner_key, self.relation),
            self.sub_query,
            self.sub_query_foreign_key,
            self.sub_query_owner_key,
        )
    }
}

/// Define dynamic belongs-to relations from a model
///
/// ```
/// use belongs_to_dynamic::{BelongsToDynamic, BelongsToDynamicExt, LifeEntityName, LifeModelTrait, Record, SelectQuery};
///
/// #[derive(Default)]
/// struct Author;
/// impl LifeEntityName for Author {
///     fn table_name(&self) -> &'static str { "authors" }
/// }
/// impl LifeModelTrait for Author {}
///
/// fn primary_author(post: &Record) -> BelongsToDynamic {
///     post.belongs_to_dynamic::<Author>(
///         "primary_author",
///         SelectQuery::new("post_authors").where_eq("role", "primary"),
///         "author_id",
///         "post_id",
///     )
///     .build()
/// }
///
/// let relation = primary_author(&Record::new());
/// assert_eq!(relation.parent().foreign_key(), "primary_author_id");
/// ```
pub trait BelongsToDynamicExt: ModelTrait {
    fn belongs_to_dynamic<R: LifeModelTrait>(
        &self,
        relation: &str,
        sub_query: SelectQuery,
        sub_query_foreign_key: &str,
        sub_query_owner_key: &str,
    ) -> BelongsToDynamicBuilder<R> {
        BelongsToDynamicBuilder::new(relation, sub_query, sub_query_foreign_key, sub_query_owner_key)
    }
}

impl<M: ModelTrait> BelongsToDynamicExt for M {}
