//! Mapper for pre-parsed model documents.
//!
//! A model document lists the elements of one model as generic nodes and
//! relationships:
//!
//! ```json
//! {
//!   "nodes": [
//!     {"uid": "model", "labels": ["Model"], "properties": {"id": "BIOMD0000000001", "name": "Edelstein1996"}},
//!     {"uid": "s1", "labels": ["Species"], "properties": {"id": "B", "initialAmount": 1.66e-21}}
//!   ],
//!   "relationships": [
//!     {"from": "model", "to": "s1", "type": "HAS_SPECIES"}
//!   ]
//! }
//! ```
//!
//! Elements without a matching template are dropped; kept elements are
//! projected onto the template's properties and stamped with the model tag.
//! A document must keep a root node carrying the root label with `id` equal
//! to the tag, otherwise the mapping fails and nothing is written.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use super::schema::{parse_labels, MappingSchema};
use super::ModelMapper;
use crate::error::AppError;
use crate::models::{Identifier, MappedModel, NodeRecord, RelationshipRecord};

#[derive(Deserialize)]
struct ModelDocument {
    #[serde(default)]
    nodes: Vec<DocumentNode>,
    #[serde(default)]
    relationships: Vec<DocumentRelationship>,
}

#[derive(Deserialize)]
struct DocumentNode {
    uid: String,
    labels: Vec<String>,
    #[serde(default)]
    properties: Map<String, JsonValue>,
}

#[derive(Deserialize)]
struct DocumentRelationship {
    from: String,
    to: String,
    #[serde(rename = "type")]
    rel_type: String,
    #[serde(default)]
    properties: Map<String, JsonValue>,
}

/// Maps JSON model documents through a [`MappingSchema`].
#[derive(Clone)]
pub struct DocumentMapper {
    schema: Arc<MappingSchema>,
    root_label: Identifier,
}

impl DocumentMapper {
    pub fn new(schema: MappingSchema, root_label: Identifier) -> Self {
        Self {
            schema: Arc::new(schema),
            root_label,
        }
    }

    fn map_document(&self, document: ModelDocument, tag: &str) -> Result<MappedModel, String> {
        let mut model = MappedModel::new(tag);
        let mut known: HashSet<String> = HashSet::new();
        let mut kept: HashMap<String, Vec<Identifier>> = HashMap::new();
        let mut dropped_nodes = 0usize;

        for node in document.nodes {
            if !known.insert(node.uid.clone()) {
                return Err(format!("duplicate node uid '{}'", node.uid));
            }
            let labels = parse_labels(&node.labels)?;
            let Some(template) = self.schema.node_template(&labels) else {
                dropped_nodes += 1;
                continue;
            };
            let properties = project(&node.properties, &template.properties)
                .map_err(|key| format!("node '{}' property '{}' is a nested map", node.uid, key))?;

            kept.insert(node.uid.clone(), labels.clone());
            model.nodes.push(NodeRecord {
                uid: node.uid,
                labels,
                tag: tag.to_string(),
                properties,
            });
        }

        if model.nodes.is_empty() {
            return Err(format!(
                "no node matches a schema template ({} dropped)",
                dropped_nodes
            ));
        }
        if !model.nodes.iter().any(|n| self.is_root(n, tag)) {
            return Err(format!(
                "no {} node with id '{}' survived mapping",
                self.root_label, tag
            ));
        }

        let mut dropped_relationships = 0usize;
        for rel in document.relationships {
            for endpoint in [&rel.from, &rel.to] {
                if !known.contains(endpoint) {
                    return Err(format!(
                        "{} relationship references unknown node '{}'",
                        rel.rel_type, endpoint
                    ));
                }
            }
            let rel_type = Identifier::parse(&rel.rel_type).map_err(|e| e.to_string())?;
            let endpoints = kept.get(&rel.from).zip(kept.get(&rel.to));
            let template = endpoints.and_then(|(from, to)| {
                self.schema
                    .relationship_template(&rel_type, from, to)
                    .map(|template| (template, from, to))
            });
            let Some((template, from_labels, to_labels)) = template else {
                dropped_relationships += 1;
                continue;
            };
            let properties = project(&rel.properties, &template.properties).map_err(|key| {
                format!(
                    "{} relationship {} -> {} property '{}' is a nested map",
                    rel_type, rel.from, rel.to, key
                )
            })?;

            model.relationships.push(RelationshipRecord {
                rel_type,
                from: rel.from,
                from_labels: from_labels.clone(),
                to: rel.to,
                to_labels: to_labels.clone(),
                tag: tag.to_string(),
                properties,
            });
        }

        tracing::debug!(
            tag,
            nodes = model.nodes.len(),
            relationships = model.relationships.len(),
            dropped_nodes,
            dropped_relationships,
            "Mapped model document"
        );

        Ok(model)
    }

    fn is_root(&self, node: &NodeRecord, tag: &str) -> bool {
        node.labels.contains(&self.root_label)
            && node.properties.get("id").and_then(JsonValue::as_str) == Some(tag)
    }
}

impl ModelMapper for DocumentMapper {
    fn map(&self, source: &Path, tag: &str) -> Result<MappedModel, AppError> {
        let contents = std::fs::read_to_string(source)
            .map_err(|e| AppError::mapping(source, format!("cannot read model: {}", e)))?;
        let document: ModelDocument = serde_json::from_str(&contents)
            .map_err(|e| AppError::mapping(source, format!("invalid model JSON: {}", e)))?;
        self.map_document(document, tag)
            .map_err(|message| AppError::mapping(source, message))
    }
}

/// Keeps the declared properties; the offending key is returned for values
/// a graph property cannot hold.
fn project(
    properties: &Map<String, JsonValue>,
    declared: &BTreeSet<String>,
) -> Result<Map<String, JsonValue>, String> {
    let mut projected = Map::new();
    for (key, value) in properties {
        if !declared.contains(key) {
            continue;
        }
        let storable = match value {
            JsonValue::Object(_) => false,
            JsonValue::Array(items) => items
                .iter()
                .all(|i| !matches!(i, JsonValue::Object(_) | JsonValue::Array(_))),
            _ => true,
        };
        if !storable {
            return Err(key.clone());
        }
        projected.insert(key.clone(), value.clone());
    }
    Ok(projected)
}
