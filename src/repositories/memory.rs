//! In-memory [`ModelStore`] for service tests.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};

use crate::error::AppError;
use crate::models::{
    ChildRef, ComparisonSnapshot, Containment, Identifier, MappedModel, SideSnapshot,
    WriteSummary,
};
use crate::repositories::ModelStore;

#[derive(Debug, Clone)]
pub struct StoredNode {
    pub tag: String,
    pub uid: String,
    pub labels: Vec<Identifier>,
    pub properties: Map<String, JsonValue>,
}

#[derive(Debug, Clone)]
pub struct StoredRelationship {
    pub tag: String,
    pub rel_type: Identifier,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default)]
struct Contents {
    nodes: Vec<StoredNode>,
    relationships: Vec<StoredRelationship>,
}

#[derive(Default)]
struct State {
    contents: Contents,
    operations: Vec<String>,
    failing: HashSet<String>,
}

/// Mirrors the Cypher semantics of the Neo4j repository over plain vectors.
///
/// Every operation yields once before touching the state, so concurrent
/// callers interleave the way they would against a real server.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    containment: Containment,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relationship writes for `tag` fail with missing endpoints.
    pub fn fail_relationships_for(&self, tag: &str) {
        self.state.lock().unwrap().failing.insert(tag.to_string());
    }

    /// Store calls in the order they were made, e.g. `"exists M1"`.
    pub fn operations(&self) -> Vec<String> {
        self.state.lock().unwrap().operations.clone()
    }

    pub fn nodes_for(&self, tag: &str) -> Vec<StoredNode> {
        let state = self.state.lock().unwrap();
        state
            .contents
            .nodes
            .iter()
            .filter(|n| n.tag == tag)
            .cloned()
            .collect()
    }

    pub fn relationships_for(&self, tag: &str) -> Vec<StoredRelationship> {
        let state = self.state.lock().unwrap();
        state
            .contents
            .relationships
            .iter()
            .filter(|r| r.tag == tag)
            .cloned()
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.state.lock().unwrap().contents.nodes.len()
    }

    fn record(&self, operation: &str, tag: &str) {
        self.state
            .lock()
            .unwrap()
            .operations
            .push(format!("{} {}", operation, tag));
    }
}

impl Contents {
    fn exists(&self, tag: &str) -> bool {
        self.nodes.iter().any(|n| n.tag == tag)
    }

    fn delete(&mut self, tag: &str) {
        self.nodes.retain(|n| n.tag != tag);
        self.relationships.retain(|r| r.tag != tag);
    }

    fn create_nodes(&mut self, model: &MappedModel) -> usize {
        for node in &model.nodes {
            self.nodes.push(StoredNode {
                tag: node.tag.clone(),
                uid: node.uid.clone(),
                labels: node.labels.clone(),
                properties: node.properties.clone(),
            });
        }
        model.nodes.len()
    }

    fn create_relationships(&mut self, model: &MappedModel, fail: bool) -> Result<usize, AppError> {
        let mut created = 0;
        for (key, rels) in model.relationship_groups() {
            let present: Vec<_> = rels
                .iter()
                .filter(|r| !fail && self.has_node(&r.tag, &r.from) && self.has_node(&r.tag, &r.to))
                .collect();
            if present.len() < rels.len() {
                return Err(AppError::MissingEndpoints {
                    tag: model.tag.clone(),
                    rel_type: key.rel_type.to_string(),
                    expected: rels.len(),
                    created: present.len(),
                });
            }
            for rel in present {
                self.relationships.push(StoredRelationship {
                    tag: rel.tag.clone(),
                    rel_type: rel.rel_type.clone(),
                    from: rel.from.clone(),
                    to: rel.to.clone(),
                });
            }
            created += rels.len();
        }
        Ok(created)
    }

    fn has_node(&self, tag: &str, uid: &str) -> bool {
        self.nodes.iter().any(|n| n.tag == tag && n.uid == uid)
    }

    fn root(&self, label: &Identifier, id: &str) -> Option<&StoredNode> {
        self.nodes.iter().find(|n| {
            n.labels.contains(label) && n.properties.get("id").and_then(JsonValue::as_str) == Some(id)
        })
    }

    fn side(&self, root: &StoredNode, containment: &Containment) -> SideSnapshot {
        let key = |n: &StoredNode| (n.tag.clone(), n.uid.clone());
        let outgoing = |tag: &str, uid: &str, types: &[Identifier]| -> Vec<StoredRelationship> {
            self.relationships
                .iter()
                .filter(|r| r.tag == tag && r.from == uid && types.contains(&r.rel_type))
                .cloned()
                .collect()
        };

        let mut reached: BTreeSet<(String, String)> = BTreeSet::new();
        let mut queue = VecDeque::from([key(root)]);
        while let Some((tag, uid)) = queue.pop_front() {
            for rel in outgoing(&tag, &uid, &containment.descendants) {
                let next = (rel.tag.clone(), rel.to.clone());
                if reached.insert(next.clone()) {
                    queue.push_back(next);
                }
            }
        }

        let mut touched = reached.clone();
        touched.insert(key(root));
        let relationships = self
            .relationships
            .iter()
            .filter(|r| containment.descendants.contains(&r.rel_type))
            .filter(|r| {
                touched.contains(&(r.tag.clone(), r.from.clone()))
                    || touched.contains(&(r.tag.clone(), r.to.clone()))
            })
            .count();

        let mut seen = HashSet::new();
        let children = outgoing(&root.tag, &root.uid, &containment.children)
            .into_iter()
            .filter(|rel| seen.insert(rel.to.clone()))
            .filter_map(|rel| {
                self.nodes
                    .iter()
                    .find(|n| n.tag == rel.tag && n.uid == rel.to)
            })
            .map(|child| {
                ChildRef::new(
                    child.labels.iter().map(|l| l.to_string()).collect(),
                    child
                        .properties
                        .get("id")
                        .and_then(JsonValue::as_str)
                        .map(str::to_string),
                )
            })
            .collect();

        SideSnapshot {
            elements: reached.len() as u64,
            relationships: relationships as u64,
            children,
        }
    }
}

#[async_trait]
impl ModelStore for MemoryStore {
    async fn exists(&self, tag: &str) -> Result<bool, AppError> {
        tokio::task::yield_now().await;
        self.record("exists", tag);
        Ok(self.state.lock().unwrap().contents.exists(tag))
    }

    async fn delete(&self, tag: &str) -> Result<(), AppError> {
        tokio::task::yield_now().await;
        self.record("delete", tag);
        self.state.lock().unwrap().contents.delete(tag);
        Ok(())
    }

    async fn create_nodes(&self, model: &MappedModel) -> Result<usize, AppError> {
        tokio::task::yield_now().await;
        self.record("create_nodes", &model.tag);
        Ok(self.state.lock().unwrap().contents.create_nodes(model))
    }

    async fn create_relationships(&self, model: &MappedModel) -> Result<usize, AppError> {
        tokio::task::yield_now().await;
        self.record("create_relationships", &model.tag);
        let mut state = self.state.lock().unwrap();
        let fail = state.failing.contains(&model.tag);
        state.contents.create_relationships(model, fail)
    }

    async fn replace(&self, model: &MappedModel) -> Result<WriteSummary, AppError> {
        tokio::task::yield_now().await;
        self.record("replace", &model.tag);
        let mut state = self.state.lock().unwrap();
        let fail = state.failing.contains(&model.tag);

        let mut staged = state.contents.clone();
        let replaced = staged.exists(&model.tag);
        staged.delete(&model.tag);
        let nodes = staged.create_nodes(model);
        let relationships = staged.create_relationships(model, fail)?;

        state.contents = staged;
        Ok(WriteSummary {
            replaced,
            nodes,
            relationships,
        })
    }

    async fn snapshot(&self, tag_a: &str, tag_b: &str) -> Result<ComparisonSnapshot, AppError> {
        tokio::task::yield_now().await;
        self.record("snapshot", &format!("{} {}", tag_a, tag_b));
        let state = self.state.lock().unwrap();
        let label = Identifier::from_static("Model");
        let side = |id: &str| {
            state
                .contents
                .root(&label, id)
                .map(|root| state.contents.side(root, &self.containment))
        };
        Ok(ComparisonSnapshot {
            a: side(tag_a),
            b: side(tag_b),
        })
    }
}
