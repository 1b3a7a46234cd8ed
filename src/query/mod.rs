//! Query building and execution.
//!
//! - **Traits**: record type contract (`LifeModelTrait`, `LifeEntityName`)
//! - **Select**: clonable SELECT builder (`SelectQuery`)
//! - **Execution**: `all` / `first` against a [`LifeExecutor`](crate::LifeExecutor)
//! - **Value Conversion**: sea-query `Value` to `ToSql` parameters and rows back to records

pub mod traits;
#[doc(inline)]
pub use traits::{LifeEntityName, LifeModelTrait};

pub mod select;
#[doc(inline)]
pub use select::SelectQuery;

mod execution;

pub(crate) mod value_conversion;
