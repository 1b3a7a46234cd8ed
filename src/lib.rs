//! # belongs_to_dynamic
//!
//! Belongs-to relations whose foreign key is resolved at query time through a
//! lookup (indirection) query, for sea-query built statements running on
//! `may_postgres` coroutines.
//!
//! ```
//! use belongs_to_dynamic::test_helpers::MockExecutor;
//! use belongs_to_dynamic::{
//!     BelongsToDynamicExt, LazyLoader, LifeEntityName, LifeModelTrait, ModelTrait, Record, SelectQuery,
//! };
//!
//! #[derive(Default)]
//! struct Author;
//!
//! impl LifeEntityName for Author {
//!     fn table_name(&self) -> &'static str { "authors" }
//! }
//!
//! impl LifeModelTrait for Author {}
//!
//! let mut post = Record::new().with_attribute("id", 1);
//! let relation = post
//!     .belongs_to_dynamic::<Author>("author", SelectQuery::new("post_authors"), "author_id", "post_id")
//!     .build();
//! assert_eq!(relation.parent().foreign_key(), "author_id");
//!
//! let executor = MockExecutor::new();
//! executor.push_rows(vec![Record::new().with_attribute("author_id", 5)]);
//! executor.push_rows(vec![Record::new().with_attribute("id", 5)]);
//!
//! let author = LazyLoader::new(&executor).load(&mut post, &relation)?;
//! assert_eq!(author.and_then(|a| a.get_attribute("id")), Some(5.into()));
//! # Ok::<(), belongs_to_dynamic::LifeError>(())
//! ```

pub mod config;
pub use config::DatabaseConfig;

pub mod connection;
pub use connection::{connect, connect_with_config, ConnectionError};

pub mod executor;
pub use executor::{LifeError, LifeExecutor, MayPostgresExecutor};

pub mod metrics;

pub mod model;
pub use model::{ModelTrait, Record};

pub mod query;
pub use query::{LifeEntityName, LifeModelTrait, SelectQuery};

pub mod relation;
pub use relation::{
    load_dynamic, BelongsTo, BelongsToDynamic, BelongsToDynamicBuilder, BelongsToDynamicExt, EagerMatch,
    LazyLoader,
};

pub mod value;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
