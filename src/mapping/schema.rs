//! Node and relationship templates loaded from an arrows-style schema.
//!
//! The schema file is the JSON exported by arrows.app, either bare or wrapped
//! in a `graph` object:
//!
//! ```json
//! {
//!   "nodes": [
//!     {"id": "n0", "labels": ["Model"], "properties": {"id": "", "name": ""}},
//!     {"id": "n1", "labels": ["Species"], "properties": {"id": "", "initialAmount": ""}}
//!   ],
//!   "relationships": [
//!     {"id": "r0", "fromId": "n0", "toId": "n1", "type": "HAS_SPECIES", "properties": {}}
//!   ]
//! }
//! ```
//!
//! Property values are arrows captions and are ignored; only the names matter.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use crate::error::AppError;
use crate::models::Identifier;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTemplate {
    /// Sorted label set.
    pub labels: Vec<Identifier>,
    pub properties: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipTemplate {
    pub rel_type: Identifier,
    pub from: Vec<Identifier>,
    pub to: Vec<Identifier>,
    pub properties: BTreeSet<String>,
}

/// The templates a model document is projected onto.
#[derive(Debug, Clone, Default)]
pub struct MappingSchema {
    nodes: HashMap<Vec<Identifier>, NodeTemplate>,
    relationships: Vec<RelationshipTemplate>,
}

#[derive(Deserialize)]
struct ArrowsGraph {
    #[serde(default)]
    nodes: Vec<ArrowsNode>,
    #[serde(default)]
    relationships: Vec<ArrowsRelationship>,
}

#[derive(Deserialize)]
struct ArrowsNode {
    id: String,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    properties: Map<String, JsonValue>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArrowsRelationship {
    from_id: String,
    to_id: String,
    #[serde(rename = "type")]
    rel_type: String,
    #[serde(default)]
    properties: Map<String, JsonValue>,
}

impl MappingSchema {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AppError::mapping(path, format!("cannot read schema: {}", e)))?;
        Self::from_json(&contents).map_err(|message| AppError::mapping(path, message))
    }

    /// Parses an arrows export.
    ///
    /// A top-level `graph` key selects the wrapped form; otherwise the file
    /// itself must carry a `nodes` array. A schema without node templates is
    /// rejected.
    pub fn from_json(contents: &str) -> Result<Self, String> {
        let file: JsonValue =
            serde_json::from_str(contents).map_err(|e| format!("invalid schema JSON: {}", e))?;
        let JsonValue::Object(mut object) = file else {
            return Err("schema must be a JSON object".to_string());
        };
        let graph = match object.remove("graph") {
            Some(graph) => graph,
            None if object.contains_key("nodes") => JsonValue::Object(object),
            None => return Err("schema has neither a 'graph' nor a 'nodes' key".to_string()),
        };
        let graph: ArrowsGraph =
            serde_json::from_value(graph).map_err(|e| format!("invalid schema graph: {}", e))?;

        let mut schema = MappingSchema::default();
        let mut labels_by_id: HashMap<String, Vec<Identifier>> = HashMap::new();

        for node in graph.nodes {
            let labels = parse_labels(&node.labels)?;
            if labels.is_empty() {
                return Err(format!("schema node '{}' has no labels", node.id));
            }
            let template = schema
                .nodes
                .entry(labels.clone())
                .or_insert_with(|| NodeTemplate {
                    labels: labels.clone(),
                    properties: BTreeSet::new(),
                });
            template.properties.extend(node.properties.into_iter().map(|(k, _)| k));
            labels_by_id.insert(node.id, labels);
        }

        for rel in graph.relationships {
            let rel_type = Identifier::parse(&rel.rel_type).map_err(|e| e.to_string())?;
            let endpoint = |id: &str| {
                labels_by_id
                    .get(id)
                    .cloned()
                    .ok_or_else(|| format!("relationship {} references unknown node '{}'", rel_type, id))
            };
            let template = RelationshipTemplate {
                from: endpoint(&rel.from_id)?,
                to: endpoint(&rel.to_id)?,
                properties: rel.properties.into_iter().map(|(k, _)| k).collect(),
                rel_type,
            };
            schema.relationships.push(template);
        }

        if schema.nodes.is_empty() {
            return Err("schema declares no node templates".to_string());
        }
        Ok(schema)
    }

    /// Template for an exact (sorted) label set.
    pub fn node_template(&self, labels: &[Identifier]) -> Option<&NodeTemplate> {
        self.nodes.get(labels)
    }

    pub fn relationship_template(
        &self,
        rel_type: &Identifier,
        from: &[Identifier],
        to: &[Identifier],
    ) -> Option<&RelationshipTemplate> {
        self.relationships
            .iter()
            .find(|t| &t.rel_type == rel_type && t.from == from && t.to == to)
    }

    /// Every label used by a node template.
    pub fn node_labels(&self) -> BTreeSet<Identifier> {
        self.nodes.keys().flatten().cloned().collect()
    }
}

/// Parses and sorts a label list.
pub(crate) fn parse_labels(labels: &[String]) -> Result<Vec<Identifier>, String> {
    let mut parsed = labels
        .iter()
        .map(|l| Identifier::parse(l).map_err(|e| e.to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    parsed.sort();
    parsed.dedup();
    Ok(parsed)
}
