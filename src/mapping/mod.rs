//! Turning model sources into node and relationship records.
//!
//! [`ModelMapper`] is the seam between the synchronizer and whatever produces
//! graph records for a model. [`DocumentMapper`] projects JSON model
//! documents onto the templates of a [`MappingSchema`].

mod document;
mod schema;

use std::path::Path;

pub use document::DocumentMapper;
pub use schema::{MappingSchema, NodeTemplate, RelationshipTemplate};

use crate::error::AppError;
use crate::models::MappedModel;

/// Produces the records for one model, each stamped with `tag`.
pub trait ModelMapper: Send + Sync {
    /// Fails with [`AppError::Mapping`] when the source is missing or malformed.
    fn map(&self, source: &Path, tag: &str) -> Result<MappedModel, AppError>;
}
