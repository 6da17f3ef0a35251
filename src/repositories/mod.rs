//! Data access layer for the model store.
//!
//! Services depend on the [`ModelStore`] trait; [`ModelRepository`]
//! implements it with Cypher over any [`GraphClient`](crate::graph::GraphClient).

#[cfg(test)]
mod memory;
mod model;
mod schema;
mod store;

#[cfg(test)]
pub(crate) use memory::MemoryStore;
pub use model::ModelRepository;
pub use schema::{initialize_schema, schema_statements};
pub use store::ModelStore;
