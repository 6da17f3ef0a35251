//! Business logic services for model synchronization and comparison.
//!
//! Services orchestrate the store and mapper and are built from the
//! [`Context`](crate::context::Context) through [`FromRef`](crate::di::FromRef).

mod locks;
mod similarity;
mod sync;

pub use locks::{TagGuard, TagLocks};
pub use similarity::SimilarityService;
pub use sync::SyncService;
