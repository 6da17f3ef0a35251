//! Structural similarity between two stored models.

use crate::context::{AppStore, Context};
use crate::di::FromRef;
use crate::error::AppError;
use crate::models::{self, SimilarityScore, SimilarityWeights};

/// Scores stored models against each other. Read-only.
#[derive(Clone)]
pub struct SimilarityService {
    store: AppStore,
    weights: SimilarityWeights,
}

impl FromRef<Context> for SimilarityService {
    fn from_ref(ctx: &Context) -> Self {
        Self {
            store: FromRef::from_ref(ctx),
            weights: FromRef::from_ref(ctx),
        }
    }
}

impl SimilarityService {
    /// Compares the models whose roots have `id` equal to `tag_a` and `tag_b`.
    ///
    /// # Errors
    ///
    /// [`AppError::ModelNotFound`] naming the first identifier without a root.
    pub async fn score(&self, tag_a: &str, tag_b: &str) -> Result<SimilarityScore, AppError> {
        let snapshot = self.store.snapshot(tag_a, tag_b).await?;
        let a = snapshot
            .a
            .ok_or_else(|| AppError::ModelNotFound(tag_a.to_string()))?;
        let b = snapshot
            .b
            .ok_or_else(|| AppError::ModelNotFound(tag_b.to_string()))?;

        let result = models::score(&a, &b, self.weights);
        tracing::debug!(
            tag_a,
            tag_b,
            elements = ?(a.elements, b.elements),
            relationships = ?(a.relationships, b.relationships),
            structural = result.structural,
            children = result.children,
            "Scored model pair"
        );
        Ok(result)
    }
}
