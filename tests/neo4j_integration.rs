//! Integration tests against a live Neo4j server.
//!
//! These tests require a running Neo4j 5 instance (bolt://localhost:7687).
//! Run with: `NEO4J_PASSWORD=... cargo test --features integration --test neo4j_integration`

#![cfg(feature = "integration")]

use std::path::Path;
use std::sync::Arc;

use sbmlgraph::config::{Config, Neo4jConfig, SyncMode};
use sbmlgraph::context::Context;
use sbmlgraph::error::AppError;
use sbmlgraph::graph::backends::neo4j::Neo4jClient;
use sbmlgraph::graph::Graph;
use sbmlgraph::mapping::{DocumentMapper, MappingSchema};
use sbmlgraph::models::{Identifier, MappedModel, NodeRecord, RelationshipRecord};
use sbmlgraph::repositories::{ModelRepository, ModelStore};
use sbmlgraph::services::{SimilarityService, SyncService};
use sbmlgraph::FromRef;
use serde_json::json;
use serial_test::serial;

const SCHEMA: &str = r#"{
    "nodes": [
        {"id": "n0", "labels": ["Model"], "properties": {"id": "", "name": ""}},
        {"id": "n1", "labels": ["Compartment"], "properties": {"id": ""}},
        {"id": "n2", "labels": ["Species"], "properties": {"id": ""}},
        {"id": "n3", "labels": ["Reaction"], "properties": {"id": ""}}
    ],
    "relationships": [
        {"fromId": "n0", "toId": "n1", "type": "HAS_COMPARTMENT"},
        {"fromId": "n0", "toId": "n2", "type": "HAS_SPECIES"},
        {"fromId": "n0", "toId": "n3", "type": "HAS_REACTION"}
    ]
}"#;

fn neo4j_config() -> Neo4jConfig {
    Neo4jConfig {
        password: Some(std::env::var("NEO4J_PASSWORD").unwrap_or_else(|_| "password".into())),
        ..Neo4jConfig::default()
    }
}

/// Model document: 3 compartments, 5 species, 2 reactions.
fn write_model(dir: &Path, tag: &str) {
    let mut nodes = vec![json!({"uid": "root", "labels": ["Model"], "properties": {"id": tag}})];
    let mut relationships = vec![];
    let children = [
        ("Compartment", "HAS_COMPARTMENT", 3),
        ("Species", "HAS_SPECIES", 5),
        ("Reaction", "HAS_REACTION", 2),
    ];
    for (label, rel_type, count) in children {
        for i in 0..count {
            let uid = format!("{}{}", label.to_lowercase(), i);
            nodes.push(json!({"uid": uid, "labels": [label], "properties": {"id": uid}}));
            relationships.push(json!({"from": "root", "to": uid, "type": rel_type}));
        }
    }
    let document = json!({"nodes": nodes, "relationships": relationships});
    std::fs::write(dir.join(format!("{}.json", tag)), document.to_string()).unwrap();
}

struct Fixture {
    _dir: tempfile::TempDir,
    graph: Arc<Graph<Neo4jClient>>,
    ctx: Context,
}

async fn fixture(mode: SyncMode) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    for tag in ["ITEST_M1", "ITEST_M1_COPY"] {
        write_model(dir.path(), tag);
    }

    let mut config = Config::default();
    config.neo4j = neo4j_config();
    config.models.folder = dir.path().to_path_buf();
    config.sync.mode = mode;

    let client = Neo4jClient::connect(&config.neo4j)
        .await
        .expect("Failed to connect to Neo4j");
    let graph = Arc::new(Graph::new(client));
    let store = ModelRepository::new(graph.clone(), &config).unwrap();
    let mapper = DocumentMapper::new(
        MappingSchema::from_json(SCHEMA).unwrap(),
        Identifier::parse("Model").unwrap(),
    );
    let ctx = Context::new(Arc::new(store), Arc::new(mapper), config).unwrap();

    cleanup(&graph).await;
    Fixture {
        _dir: dir,
        graph,
        ctx,
    }
}

async fn cleanup(graph: &Graph<Neo4jClient>) {
    let _ = graph
        .query("MATCH (n) WHERE n.tag STARTS WITH 'ITEST_' DETACH DELETE n")
        .run()
        .await;
}

async fn count_tagged(graph: &Graph<Neo4jClient>, tag: &str) -> (i64, i64) {
    let row = graph
        .query(
            "MATCH (n {tag: $tag}) \
             RETURN count(n) AS nodes, COUNT { MATCH ({tag: $tag})-[r]->() RETURN r } AS rels",
        )
        .param("tag", tag)
        .fetch_one()
        .await
        .unwrap()
        .unwrap();
    (row.get("nodes").unwrap(), row.get("rels").unwrap())
}

/// Builds a model from `(uid, label)` nodes and `(from, to, type)` edges.
/// The root is `root` and carries the tag as its `id`; other nodes use their
/// uid as `id`.
fn build_model(tag: &str, nodes: &[(&str, &str)], edges: &[(&str, &str, &str)]) -> MappedModel {
    let id = |n: &str| Identifier::parse(n).unwrap();
    let labels: std::collections::HashMap<&str, &str> = nodes.iter().copied().collect();
    let mut model = MappedModel::new(tag);
    for (uid, label) in nodes {
        let mut properties = serde_json::Map::new();
        let logical_id = if *uid == "root" { tag } else { *uid };
        properties.insert("id".into(), json!(logical_id));
        model.nodes.push(NodeRecord {
            uid: uid.to_string(),
            labels: vec![id(label)],
            tag: tag.into(),
            properties,
        });
    }
    for (from, to, rel_type) in edges {
        model.relationships.push(RelationshipRecord {
            rel_type: id(rel_type),
            from: from.to_string(),
            from_labels: vec![id(labels[from])],
            to: to.to_string(),
            to_labels: vec![id(labels[to])],
            tag: tag.into(),
            properties: serde_json::Map::new(),
        });
    }
    model
}

/// Root with `n` species children.
fn star(tag: &str, n: usize) -> MappedModel {
    let uids: Vec<String> = (0..n).map(|i| format!("s{}", i)).collect();
    let mut nodes = vec![("root", "Model")];
    nodes.extend(uids.iter().map(|u| (u.as_str(), "Species")));
    let edges: Vec<(&str, &str, &str)> = uids
        .iter()
        .map(|u| ("root", u.as_str(), "HAS_SPECIES"))
        .collect();
    build_model(tag, &nodes, &edges)
}

// All tests share one database and run serially
#[serial]
mod store_tests {
    use super::*;

    #[tokio::test]
    async fn test_sync_creates_model() {
        let fx = fixture(SyncMode::Transactional).await;
        let sync = SyncService::from_ref(&fx.ctx);

        let summary = sync.sync_tag("ITEST_M1").await.unwrap();

        assert_eq!(summary.nodes, 11);
        assert_eq!(summary.relationships, 10);
        assert!(sync.exists("ITEST_M1").await.unwrap());
        assert_eq!(count_tagged(&fx.graph, "ITEST_M1").await, (11, 10));
        cleanup(&fx.graph).await;
    }

    #[tokio::test]
    async fn test_resync_keeps_one_subgraph() {
        for mode in [SyncMode::Transactional, SyncMode::Sequential] {
            let fx = fixture(mode).await;
            let sync = SyncService::from_ref(&fx.ctx);

            sync.sync_tag("ITEST_M1").await.unwrap();
            let second = sync.sync_tag("ITEST_M1").await.unwrap();

            assert!(second.replaced);
            assert_eq!(count_tagged(&fx.graph, "ITEST_M1").await, (11, 10));
            cleanup(&fx.graph).await;
        }
    }

    #[tokio::test]
    async fn test_delete_absent_tag() {
        let fx = fixture(SyncMode::Transactional).await;
        let sync = SyncService::from_ref(&fx.ctx);

        sync.delete("ITEST_ABSENT").await.unwrap();
        assert!(!sync.exists("ITEST_ABSENT").await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_replace_rolls_back() {
        let fx = fixture(SyncMode::Transactional).await;
        SyncService::from_ref(&fx.ctx)
            .sync_tag("ITEST_M1")
            .await
            .unwrap();

        // Relationship to a node that is never written
        let id = |n: &str| Identifier::parse(n).unwrap();
        let mut broken = MappedModel::new("ITEST_M1");
        broken.nodes.push(NodeRecord {
            uid: "root".into(),
            labels: vec![id("Model")],
            tag: "ITEST_M1".into(),
            properties: serde_json::Map::new(),
        });
        broken.relationships.push(RelationshipRecord {
            rel_type: id("HAS_SPECIES"),
            from: "root".into(),
            from_labels: vec![id("Model")],
            to: "ghost".into(),
            to_labels: vec![id("Species")],
            tag: "ITEST_M1".into(),
            properties: serde_json::Map::new(),
        });

        let err = fx.ctx.store.replace(&broken).await.unwrap_err();

        assert_eq!(err.code(), "MISSING_ENDPOINTS");
        assert_eq!(count_tagged(&fx.graph, "ITEST_M1").await, (11, 10));
        cleanup(&fx.graph).await;
    }

    #[tokio::test]
    async fn test_similarity_of_duplicates() {
        let fx = fixture(SyncMode::Transactional).await;
        let sync = SyncService::from_ref(&fx.ctx);
        let report = sync
            .sync_many(&["ITEST_M1".to_string(), "ITEST_M1_COPY".to_string()])
            .await;
        assert!(!report.has_failures());

        let similarity = SimilarityService::from_ref(&fx.ctx);
        let own = similarity.score("ITEST_M1", "ITEST_M1").await.unwrap();
        let copy = similarity.score("ITEST_M1", "ITEST_M1_COPY").await.unwrap();

        assert_eq!(own.score, 1.0);
        assert_eq!(copy.structural, 1.0);
        assert_eq!(copy.children, 1.0);
        cleanup(&fx.graph).await;
    }

    #[tokio::test]
    async fn test_similarity_missing_root() {
        let fx = fixture(SyncMode::Transactional).await;
        SyncService::from_ref(&fx.ctx)
            .sync_tag("ITEST_M1")
            .await
            .unwrap();

        let err = SimilarityService::from_ref(&fx.ctx)
            .score("ITEST_M1", "ITEST_NOPE")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ModelNotFound(id) if id == "ITEST_NOPE"));
        cleanup(&fx.graph).await;
    }

    #[tokio::test]
    async fn test_snapshot_counts_nested_model() {
        let fx = fixture(SyncMode::Transactional).await;
        let model = build_model(
            "ITEST_NESTED",
            &[
                ("root", "Model"),
                ("c1", "Compartment"),
                ("s1", "Species"),
                ("s2", "Species"),
                ("s3", "Species"),
                ("r1", "Reaction"),
            ],
            &[
                ("root", "c1", "HAS_COMPARTMENT"),
                ("c1", "s1", "HAS_SPECIES"),
                ("c1", "s2", "HAS_SPECIES"),
                ("root", "s3", "HAS_SPECIES"),
                ("root", "r1", "HAS_REACTION"),
                // s1 is reachable twice; it still counts once
                ("r1", "s1", "HAS_SPECIES"),
                // Not a containment type
                ("s1", "s2", "REFERENCES"),
            ],
        );
        fx.ctx.store.replace(&model).await.unwrap();

        let snapshot = fx
            .ctx
            .store
            .snapshot("ITEST_NESTED", "ITEST_NESTED")
            .await
            .unwrap();
        let side = snapshot.a.unwrap();

        assert_eq!(side.elements, 5);
        assert_eq!(side.relationships, 6);
        let mut children: Vec<String> = side
            .children
            .iter()
            .filter_map(|c| c.id.clone())
            .collect();
        children.sort();
        assert_eq!(children, ["c1", "r1", "s3"]);
        cleanup(&fx.graph).await;
    }

    #[tokio::test]
    async fn test_structural_similarity_of_ten_and_eight_elements() {
        let fx = fixture(SyncMode::Transactional).await;
        fx.ctx.store.replace(&star("ITEST_TEN", 10)).await.unwrap();

        // Eight children plus two extra containment edges: 8 elements, 10 edges
        let mut eight = star("ITEST_EIGHT", 8);
        let extra = build_model(
            "ITEST_EIGHT",
            &[("s0", "Species"), ("s1", "Species"), ("s2", "Species")],
            &[("s0", "s1", "HAS_SPECIES"), ("s0", "s2", "HAS_SPECIES")],
        );
        eight.relationships.extend(extra.relationships);
        fx.ctx.store.replace(&eight).await.unwrap();

        let snapshot = fx
            .ctx
            .store
            .snapshot("ITEST_TEN", "ITEST_EIGHT")
            .await
            .unwrap();
        let (a, b) = (snapshot.a.unwrap(), snapshot.b.unwrap());
        assert_eq!((a.elements, a.relationships), (10, 10));
        assert_eq!((b.elements, b.relationships), (8, 10));

        let score = SimilarityService::from_ref(&fx.ctx)
            .score("ITEST_TEN", "ITEST_EIGHT")
            .await
            .unwrap();
        assert!((score.structural - (0.5 * (1.0 - 2.0 / 18.0) + 0.5)).abs() < 1e-9);
        cleanup(&fx.graph).await;
    }

    #[tokio::test]
    async fn test_similarity_of_childless_roots() {
        let fx = fixture(SyncMode::Transactional).await;
        fx.ctx.store.replace(&star("ITEST_EMPTY_A", 0)).await.unwrap();
        fx.ctx.store.replace(&star("ITEST_EMPTY_B", 0)).await.unwrap();

        let score = SimilarityService::from_ref(&fx.ctx)
            .score("ITEST_EMPTY_A", "ITEST_EMPTY_B")
            .await
            .unwrap();

        assert_eq!(score.structural, 1.0);
        assert_eq!(score.children, 1.0);
        assert_eq!(score.score, 1.0);
        cleanup(&fx.graph).await;
    }
}
