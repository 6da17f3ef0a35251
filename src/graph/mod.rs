//! Graph abstraction layer for backend-agnostic database access.
//!
//! Repositories talk to the store through a small trait hierarchy so the
//! same Cypher can run against a live driver, inside a transaction, or
//! against a scripted executor in tests.
//!
//! # Architecture
//!
//! - [`CypherExecutor`] - Execute Cypher queries (required for all graph backends)
//! - [`Transaction`] - Transaction lifecycle (commit/rollback)
//! - [`GraphClient`] - Connection management and transaction creation
//!
//! # Usage
//!
//! ```ignore
//! use sbmlgraph::graph::{Graph, QueryExt};
//!
//! let graph = Graph::new(client);
//!
//! // Read
//! let rows = graph.query("MATCH (n {tag: $tag}) RETURN n.uid AS uid LIMIT 1")
//!     .param("tag", tag)
//!     .fetch_all()
//!     .await?;
//!
//! // Write, no results
//! graph.query("MATCH (n {tag: $tag}) DETACH DELETE n")
//!     .param("tag", tag)
//!     .run()
//!     .await?;
//! ```

mod macros;
mod query;
mod row;
mod traits;

pub mod backends;

// Re-export core types
pub use query::{Query, QueryExt};
pub use row::{Params, Row, RowStream};
pub use traits::{CypherExecutor, GraphClient, Transaction};

// Re-export macro (defined at crate root via #[macro_export])
#[doc(inline)]
pub use crate::cypher;

use crate::error::AppError;

/// High-level wrapper around any [`GraphClient`].
///
/// Direct queries auto-commit one statement at a time; [`Graph::begin`]
/// opens an explicit transaction for multi-statement writes.
pub struct Graph<C: GraphClient> {
    client: C,
}

impl<C: GraphClient> Graph<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Returns a reference to the underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Creates a query builder for a direct (auto-commit) query.
    pub fn query(&self, cypher: &str) -> Query<'_, C> {
        Query::new(&self.client, cypher)
    }

    /// Begins a transaction; the caller must commit or roll it back.
    pub async fn begin(&self) -> Result<C::Tx<'_>, AppError> {
        self.client.begin().await
    }
}

// Forward CypherExecutor to the underlying client for convenience
#[async_trait::async_trait]
impl<C: GraphClient> CypherExecutor for Graph<C> {
    async fn execute_cypher(
        &self,
        cypher: &str,
        params: Params,
    ) -> Result<RowStream<'_>, AppError> {
        self.client.execute_cypher(cypher, params).await
    }

    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError> {
        self.client.run_cypher(cypher, params).await
    }
}
