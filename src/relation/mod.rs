//! Relation module for belongs-to relationships.
//!
//! - `belongs_to`: the base many-to-one relation with a static foreign key
//! - `dynamic`: a belongs-to whose foreign key is resolved through a lookup query
//! - `factory`: builders that fill in conventional key names
//! - `lazy` / `eager`: load orchestration for one record or a batch

pub mod belongs_to;
#[doc(inline)]
pub use belongs_to::BelongsTo;

pub mod dynamic;
#[doc(inline)]
pub use dynamic::{BelongsToDynamic, EagerMatch};

pub mod factory;
#[doc(inline)]
pub use factory::{default_foreign_key, BelongsToDynamicBuilder, BelongsToDynamicExt};

pub mod lazy;
#[doc(inline)]
pub use lazy::LazyLoader;

pub mod eager;
#[doc(inline)]
pub use eager::load_dynamic;
