//! Domain models for model synchronization and comparison.

mod identifier;
mod record;
mod similarity;
mod sync;

pub use identifier::{label_expression, type_alternation, Identifier};
pub use record::{
    MappedModel, NodeRecord, RelationshipKey, RelationshipRecord, WriteSummary, TAG_PROPERTY,
    UID_PROPERTY,
};
pub use similarity::{
    child_similarity, relative_agreement, score, structural_similarity, ChildRef,
    ComparisonSnapshot, Containment, ContainmentType, SideSnapshot, SimilarityScore,
    SimilarityWeights,
};
pub use sync::{SyncReport, TagOutcome, TagStatus};
