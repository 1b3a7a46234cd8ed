//! Core traits for record types.

use crate::query::select::SelectQuery;

/// Table name of a record type
pub trait LifeEntityName {
    /// The table this record type is stored in
    fn table_name(&self) -> &'static str;
}

/// Trait implemented by record type markers (entities)
///
/// Relations instantiate the related entity with `Default` to discover its
/// table and primary key column, so the marker must be cheap to construct.
///
/// # Example
///
/// ```
/// use belongs_to_dynamic::{LifeEntityName, LifeModelTrait};
///
/// #[derive(Default)]
/// struct Author;
///
/// impl LifeEntityName for Author {
///     fn table_name(&self) -> &'static str { "authors" }
/// }
///
/// impl LifeModelTrait for Author {}
///
/// assert_eq!(Author.primary_key_name(), "id");
/// let (sql, _) = Author::find().build();
/// assert_eq!(sql, r#"SELECT * FROM "authors""#);
/// ```
pub trait LifeModelTrait: Default + LifeEntityName {
    /// Primary key column name
    fn primary_key_name(&self) -> &'static str {
        "id"
    }

    /// Start a query against this entity's table
    fn find() -> SelectQuery {
        let entity = Self::default();
        SelectQuery::new(entity.table_name()).with_primary_key(entity.primary_key_name())
    }
}
