//! Cypher data access for tagged model subgraphs.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::config::Config;
use crate::cypher;
use crate::error::AppError;
use crate::graph::{CypherExecutor, Graph, GraphClient, QueryExt, Row, Transaction};
use crate::models::{
    label_expression, type_alternation, ChildRef, ComparisonSnapshot, Containment, Identifier,
    MappedModel, SideSnapshot, WriteSummary,
};
use crate::repositories::ModelStore;

const EXISTS_QUERY: &str = "MATCH (n {tag: $tag}) RETURN n.tag AS tag LIMIT 1";

const DELETE_QUERY: &str = "MATCH (n {tag: $tag}) DETACH DELETE n";

/// Neo4j-backed [`ModelStore`].
pub struct ModelRepository<C: GraphClient> {
    graph: Arc<Graph<C>>,
    batch_size: usize,
    snapshot_query: String,
}

impl<C: GraphClient> ModelRepository<C> {
    pub fn new(graph: Arc<Graph<C>>, config: &Config) -> Result<Self, AppError> {
        let root_label = Identifier::parse(&config.similarity.root_label)?;
        let containment = config.similarity.containment()?;
        Ok(Self {
            graph,
            batch_size: config.sync.batch_size.max(1),
            snapshot_query: snapshot_query(&root_label, &containment),
        })
    }
}

#[async_trait]
impl<C: GraphClient> ModelStore for ModelRepository<C> {
    async fn exists(&self, tag: &str) -> Result<bool, AppError> {
        exists_in(self.graph.as_ref(), tag).await
    }

    async fn delete(&self, tag: &str) -> Result<(), AppError> {
        delete_in(self.graph.as_ref(), tag).await
    }

    async fn create_nodes(&self, model: &MappedModel) -> Result<usize, AppError> {
        create_nodes_in(self.graph.as_ref(), model, self.batch_size).await
    }

    async fn create_relationships(&self, model: &MappedModel) -> Result<usize, AppError> {
        create_relationships_in(self.graph.as_ref(), model, self.batch_size).await
    }

    async fn replace(&self, model: &MappedModel) -> Result<WriteSummary, AppError> {
        let txn = self.graph.begin().await?;

        match write_replacement(&txn, model, self.batch_size).await {
            Ok(summary) => {
                txn.commit().await?;
                Ok(summary)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::warn!(tag = %model.tag, error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    async fn snapshot(&self, tag_a: &str, tag_b: &str) -> Result<ComparisonSnapshot, AppError> {
        let row = cypher!(self.graph, &self.snapshot_query, tag_a = tag_a, tag_b = tag_b)
            .fetch_one()
            .await?;

        let Some(row) = row else {
            return Ok(ComparisonSnapshot::default());
        };
        Ok(ComparisonSnapshot {
            a: side_from_row(&row, "a")?,
            b: side_from_row(&row, "b")?,
        })
    }
}

async fn exists_in<E: CypherExecutor>(executor: &E, tag: &str) -> Result<bool, AppError> {
    let row = cypher!(executor, EXISTS_QUERY, tag = tag).fetch_one().await?;
    Ok(row.is_some())
}

async fn delete_in<E: CypherExecutor>(executor: &E, tag: &str) -> Result<(), AppError> {
    cypher!(executor, DELETE_QUERY, tag = tag).run().await?;
    tracing::debug!(tag, "Deleted model subgraph");
    Ok(())
}

/// One `UNWIND ... CREATE` per label set and chunk.
async fn create_nodes_in<E: CypherExecutor>(
    executor: &E,
    model: &MappedModel,
    batch_size: usize,
) -> Result<usize, AppError> {
    let mut created = 0;
    for (labels, nodes) in model.node_groups() {
        let cypher = format!(
            "UNWIND $rows AS row CREATE (n{}) SET n = row RETURN count(n) AS created",
            label_expression(&labels)
        );
        for chunk in nodes.chunks(batch_size) {
            let rows = chunk.iter().map(|n| n.to_row()).collect();
            let row = executor
                .query(&cypher)
                .param_raw("rows", JsonValue::Array(rows))
                .fetch_one()
                .await?;
            created += created_count(row)?;
        }
    }
    tracing::debug!(tag = %model.tag, created, "Created nodes");
    Ok(created)
}

/// Endpoints are matched by label and `(tag, uid)`, which is what the
/// schema indexes cover.
///
/// A chunk is all or nothing: when any row misses an endpoint the `WHERE`
/// drops the whole chunk before `CREATE`, and the count check reports it.
async fn create_relationships_in<E: CypherExecutor>(
    executor: &E,
    model: &MappedModel,
    batch_size: usize,
) -> Result<usize, AppError> {
    let mut created = 0;
    for (key, rels) in model.relationship_groups() {
        let cypher = format!(
            "UNWIND $rows AS row \
             OPTIONAL MATCH (a{from} {{tag: row.tag, uid: row.from}}) \
             OPTIONAL MATCH (b{to} {{tag: row.tag, uid: row.to}}) \
             WITH collect({{a: a, b: b, props: row.properties}}) AS pairs \
             WHERE all(p IN pairs WHERE p.a IS NOT NULL AND p.b IS NOT NULL) \
             UNWIND pairs AS p \
             WITH p.a AS a, p.b AS b, p.props AS props \
             CREATE (a)-[r:{rel_type}]->(b) SET r = props \
             RETURN count(r) AS created",
            from = label_expression(&key.from),
            to = label_expression(&key.to),
            rel_type = key.rel_type.quoted(),
        );
        for chunk in rels.chunks(batch_size) {
            let rows = chunk.iter().map(|r| r.to_row()).collect();
            let row = executor
                .query(&cypher)
                .param_raw("rows", JsonValue::Array(rows))
                .fetch_one()
                .await?;
            let count = created_count(row)?;
            if count < chunk.len() {
                return Err(AppError::MissingEndpoints {
                    tag: model.tag.clone(),
                    rel_type: key.rel_type.to_string(),
                    expected: chunk.len(),
                    created: count,
                });
            }
            created += count;
        }
    }
    tracing::debug!(tag = %model.tag, created, "Created relationships");
    Ok(created)
}

async fn write_replacement<E: CypherExecutor>(
    executor: &E,
    model: &MappedModel,
    batch_size: usize,
) -> Result<WriteSummary, AppError> {
    let replaced = exists_in(executor, &model.tag).await?;
    if replaced {
        delete_in(executor, &model.tag).await?;
    }
    let nodes = create_nodes_in(executor, model, batch_size).await?;
    let relationships = create_relationships_in(executor, model, batch_size).await?;
    Ok(WriteSummary {
        replaced,
        nodes,
        relationships,
    })
}

fn created_count(row: Option<Row>) -> Result<usize, AppError> {
    let count: Option<u64> = match row {
        Some(row) => row.get_opt("created")?,
        None => None,
    };
    Ok(count.unwrap_or(0) as usize)
}

/// Builds the single read-only comparison query.
///
/// Each root is looked up by `id` under `root_label`. Elements are the
/// distinct nodes reachable over the descendant types; relationships are the
/// distinct descendant-typed edges touching the root or any such node.
fn snapshot_query(root_label: &Identifier, containment: &Containment) -> String {
    let descend = type_alternation(&containment.descendants);
    let child = type_alternation(&containment.children);
    let side = |v: &str| {
        format!(
            "{v} IS NOT NULL AS found_{v}, \
             COUNT {{ MATCH ({v})-[{descend}*]->(x) RETURN DISTINCT x }} AS elements_{v}, \
             COUNT {{ MATCH ({v})-[{descend}*0..]->(x)-[r{descend}]-() RETURN DISTINCT r }} AS relationships_{v}, \
             COLLECT {{ MATCH ({v})-[{child}]->(c) WITH DISTINCT c RETURN {{labels: labels(c), id: c.id}} }} AS children_{v}"
        )
    };
    format!(
        "OPTIONAL MATCH (a{root} {{id: $tag_a}}) \
         OPTIONAL MATCH (b{root} {{id: $tag_b}}) \
         RETURN {}, {} LIMIT 1",
        side("a"),
        side("b"),
        root = label_expression(std::slice::from_ref(root_label)),
    )
}

#[derive(Deserialize)]
struct ChildRow {
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    id: Option<JsonValue>,
}

impl ChildRow {
    fn into_ref(self) -> ChildRef {
        let id = self.id.and_then(|v| match v {
            JsonValue::Null => None,
            JsonValue::String(s) => Some(s),
            other => Some(other.to_string()),
        });
        ChildRef::new(self.labels, id)
    }
}

fn side_from_row(row: &Row, side: &str) -> Result<Option<SideSnapshot>, AppError> {
    let found: bool = row.get_opt(&format!("found_{}", side))?.unwrap_or(false);
    if !found {
        return Ok(None);
    }

    let children: Vec<ChildRow> = row
        .get_opt(&format!("children_{}", side))?
        .unwrap_or_default();
    Ok(Some(SideSnapshot {
        elements: row.get_opt(&format!("elements_{}", side))?.unwrap_or(0),
        relationships: row
            .get_opt(&format!("relationships_{}", side))?
            .unwrap_or(0),
        children: children.into_iter().map(ChildRow::into_ref).collect(),
    }))
}
