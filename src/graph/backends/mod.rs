//! Backend implementations for different graph databases.
//!
//! Each backend implements the core traits from [`crate::graph::traits`]:
//!
//! - [`CypherExecutor`](crate::graph::CypherExecutor) - Required
//! - [`Transaction`](crate::graph::Transaction) - Required
//! - [`GraphClient`](crate::graph::GraphClient) - Required
//!
//! | Backend | Module |
//! |---------|--------|
//! | Neo4j (Bolt) | [`neo4j`] |

pub mod neo4j;
