//! The store operations the services depend on.

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{ComparisonSnapshot, MappedModel, WriteSummary};

/// Persistence of tagged model subgraphs.
///
/// Every operation addresses one model by its tag. Zero matches is a normal
/// result for reads and deletes; only store failures are errors.
#[async_trait]
pub trait ModelStore: Send + Sync {
    /// True iff at least one node carries `tag`.
    async fn exists(&self, tag: &str) -> Result<bool, AppError>;

    /// Detach-deletes every node carrying `tag`. Deleting an absent tag is a no-op.
    async fn delete(&self, tag: &str) -> Result<(), AppError>;

    /// Writes all nodes of the model, returning how many were created.
    async fn create_nodes(&self, model: &MappedModel) -> Result<usize, AppError>;

    /// Writes all relationships of the model between its already stored nodes.
    ///
    /// Fails with [`AppError::MissingEndpoints`] when an endpoint is absent.
    async fn create_relationships(&self, model: &MappedModel) -> Result<usize, AppError>;

    /// Removes any previous version and writes the model in one transaction.
    ///
    /// On failure the previous version is left untouched.
    async fn replace(&self, model: &MappedModel) -> Result<WriteSummary, AppError>;

    /// Traversal counts and direct children of the roots whose `id` is
    /// `tag_a` and `tag_b`.
    async fn snapshot(&self, tag_a: &str, tag_b: &str) -> Result<ComparisonSnapshot, AppError>;
}
