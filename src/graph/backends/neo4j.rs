//! Neo4j backend over the neo4rs Bolt driver.
//!
//! ```ignore
//! use sbmlgraph::graph::backends::neo4j::Neo4jClient;
//! use sbmlgraph::graph::Graph;
//!
//! let client = Neo4jClient::connect(&config.neo4j).await?;
//! let graph = Graph::new(client);
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use neo4rs::{
    BoltBoolean, BoltFloat, BoltInteger, BoltList, BoltMap, BoltNull, BoltString, BoltType,
    ConfigBuilder,
};
use serde_json::Value as JsonValue;
use tokio::sync::Mutex;

use crate::config::Neo4jConfig;
use crate::error::AppError;
use crate::graph::row::{Params, Row, RowStream};
use crate::graph::traits::{CypherExecutor, GraphClient, Transaction};

/// Neo4j graph client.
///
/// Cheap to clone; the underlying neo4rs pool is shared.
#[derive(Clone)]
pub struct Neo4jClient {
    graph: neo4rs::Graph,
}

impl Neo4jClient {
    /// Builds the connection pool and pings the server.
    ///
    /// neo4rs creates its pool lazily, so the `RETURN 1` forces a real Bolt
    /// handshake and an unreachable server fails here rather than on the
    /// first sync.
    pub async fn connect(config: &Neo4jConfig) -> Result<Self, AppError> {
        let mut builder = ConfigBuilder::default()
            .uri(config.uri.as_str())
            .user(config.user.as_str())
            .password(config.password.as_deref().unwrap_or(""))
            .max_connections(config.max_connections)
            .fetch_size(config.fetch_size);
        if let Some(database) = &config.database {
            builder = builder.db(database.as_str());
        }

        let graph = neo4rs::Graph::connect(builder.build()?).await?;
        graph.run(neo4rs::query("RETURN 1")).await?;

        Ok(Self { graph })
    }
}

#[async_trait]
impl CypherExecutor for Neo4jClient {
    async fn execute_cypher(
        &self,
        cypher: &str,
        params: Params,
    ) -> Result<RowStream<'_>, AppError> {
        use async_stream::try_stream;

        let mut stream = self
            .graph
            .execute(build_query(cypher, &params))
            .await
            .map_err(|e| query_error(e, cypher))?;
        let cypher = cypher.to_string();

        Ok(Box::pin(try_stream! {
            while let Some(row) = stream.next().await.map_err(|e| query_error(e, &cypher))? {
                let row = convert_row(&row)?;
                yield row;
            }
        }))
    }

    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError> {
        self.graph
            .run(build_query(cypher, &params))
            .await
            .map_err(|e| query_error(e, cypher))
    }
}

#[async_trait]
impl GraphClient for Neo4jClient {
    type Tx<'a> = Neo4jTransaction;

    async fn begin(&self) -> Result<Self::Tx<'_>, AppError> {
        let txn = self.graph.start_txn().await?;
        Ok(Neo4jTransaction {
            txn: Mutex::new(Some(txn)),
        })
    }
}

/// An explicit Neo4j transaction.
///
/// neo4rs needs `&mut Txn` for every statement, so the handle sits behind an
/// async mutex; statements inside one transaction run one at a time anyway.
pub struct Neo4jTransaction {
    txn: Mutex<Option<neo4rs::Txn>>,
}

impl Neo4jTransaction {
    fn finished() -> AppError {
        AppError::Internal("transaction already committed or rolled back".into())
    }
}

#[async_trait]
impl CypherExecutor for Neo4jTransaction {
    async fn execute_cypher(
        &self,
        cypher: &str,
        params: Params,
    ) -> Result<RowStream<'_>, AppError> {
        let mut guard = self.txn.lock().await;
        let txn = guard.as_mut().ok_or_else(Self::finished)?;

        let mut stream = txn
            .execute(build_query(cypher, &params))
            .await
            .map_err(|e| query_error(e, cypher))?;

        // Rows are read through the transaction handle, so they are buffered
        // before the lock is released.
        let mut rows = Vec::new();
        while let Some(row) = stream
            .next(txn.handle())
            .await
            .map_err(|e| query_error(e, cypher))?
        {
            rows.push(convert_row(&row));
        }

        Ok(Box::pin(futures::stream::iter(rows)))
    }

    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError> {
        let mut guard = self.txn.lock().await;
        let txn = guard.as_mut().ok_or_else(Self::finished)?;
        txn.run(build_query(cypher, &params))
            .await
            .map(|_| ())
            .map_err(|e| query_error(e, cypher))
    }
}

#[async_trait]
impl Transaction for Neo4jTransaction {
    async fn commit(mut self) -> Result<(), AppError> {
        let txn = self.txn.get_mut().take().ok_or_else(Self::finished)?;
        txn.commit().await?;
        Ok(())
    }

    async fn rollback(mut self) -> Result<(), AppError> {
        let txn = self.txn.get_mut().take().ok_or_else(Self::finished)?;
        txn.rollback().await?;
        Ok(())
    }
}

impl Drop for Neo4jTransaction {
    fn drop(&mut self) {
        if self.txn.get_mut().is_some() {
            tracing::warn!("Neo4jTransaction dropped without commit or rollback");
        }
    }
}

fn query_error(err: neo4rs::Error, cypher: &str) -> AppError {
    AppError::Query {
        message: format!("Cypher query failed: {}", err),
        query: cypher.to_string(),
    }
}

fn build_query(cypher: &str, params: &Params) -> neo4rs::Query {
    params
        .iter()
        .fold(neo4rs::query(cypher), |query, (name, value)| {
            query.param(name, json_to_bolt(value))
        })
}

/// Converts a JSON parameter to the Bolt value the driver sends.
fn json_to_bolt(value: &JsonValue) -> BoltType {
    match value {
        JsonValue::Null => BoltType::Null(BoltNull),
        JsonValue::Bool(b) => BoltType::Boolean(BoltBoolean::new(*b)),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => BoltType::Integer(BoltInteger::new(i)),
            // u64 beyond i64::MAX and all non-integers travel as floats
            None => BoltType::Float(BoltFloat::new(n.as_f64().unwrap_or(f64::NAN))),
        },
        JsonValue::String(s) => BoltType::String(BoltString::new(s)),
        JsonValue::Array(items) => {
            let mut list = BoltList::with_capacity(items.len());
            for item in items {
                list.push(json_to_bolt(item));
            }
            BoltType::List(list)
        }
        JsonValue::Object(map) => {
            let mut bolt = BoltMap::with_capacity(map.len());
            for (key, item) in map {
                bolt.put(BoltString::new(key), json_to_bolt(item));
            }
            BoltType::Map(bolt)
        }
    }
}

fn convert_row(row: &neo4rs::Row) -> Result<Row, AppError> {
    row.to::<HashMap<String, JsonValue>>()
        .map(Row::new)
        .map_err(|e| AppError::Internal(format!("failed to decode Neo4j row: {}", e)))
}
