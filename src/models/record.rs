//! Node and relationship records produced by the mapper.

use std::collections::BTreeMap;

use serde_json::{Map, Value as JsonValue};

use crate::models::Identifier;

/// Property name linking every node and relationship to its model.
pub const TAG_PROPERTY: &str = "tag";

/// Property name holding a node's identity within its model.
pub const UID_PROPERTY: &str = "uid";

/// A node ready to be written to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    /// Unique within the model; relationships refer to nodes by this value.
    pub uid: String,
    pub labels: Vec<Identifier>,
    pub tag: String,
    pub properties: Map<String, JsonValue>,
}

impl NodeRecord {
    /// Property map as written to the store, including `tag` and `uid`.
    pub fn to_row(&self) -> JsonValue {
        let mut row = self.properties.clone();
        row.insert(TAG_PROPERTY.to_string(), JsonValue::from(self.tag.as_str()));
        row.insert(UID_PROPERTY.to_string(), JsonValue::from(self.uid.as_str()));
        JsonValue::Object(row)
    }
}

/// A directed relationship between two nodes of the same model.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipRecord {
    pub rel_type: Identifier,
    pub from: String,
    /// Sorted labels of the `from` node, used to hit the `(tag, uid)` index.
    pub from_labels: Vec<Identifier>,
    pub to: String,
    pub to_labels: Vec<Identifier>,
    pub tag: String,
    pub properties: Map<String, JsonValue>,
}

impl RelationshipRecord {
    /// UNWIND row: endpoint uids plus the relationship's own properties.
    pub fn to_row(&self) -> JsonValue {
        let mut properties = self.properties.clone();
        properties.insert(TAG_PROPERTY.to_string(), JsonValue::from(self.tag.as_str()));

        let mut row = Map::new();
        row.insert("tag".to_string(), JsonValue::from(self.tag.as_str()));
        row.insert("from".to_string(), JsonValue::from(self.from.as_str()));
        row.insert("to".to_string(), JsonValue::from(self.to.as_str()));
        row.insert("properties".to_string(), JsonValue::Object(properties));
        JsonValue::Object(row)
    }
}

/// Everything the importer writes for one model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedModel {
    pub tag: String,
    pub nodes: Vec<NodeRecord>,
    pub relationships: Vec<RelationshipRecord>,
}

impl MappedModel {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Nodes grouped by their label set, in a stable order.
    pub fn node_groups(&self) -> BTreeMap<Vec<Identifier>, Vec<&NodeRecord>> {
        let mut groups: BTreeMap<Vec<Identifier>, Vec<&NodeRecord>> = BTreeMap::new();
        for node in &self.nodes {
            groups.entry(sorted(&node.labels)).or_default().push(node);
        }
        groups
    }

    /// Relationships grouped by type and endpoint label sets, in a stable
    /// order.
    pub fn relationship_groups(&self) -> BTreeMap<RelationshipKey, Vec<&RelationshipRecord>> {
        let mut groups: BTreeMap<RelationshipKey, Vec<&RelationshipRecord>> = BTreeMap::new();
        for rel in &self.relationships {
            let key = RelationshipKey {
                rel_type: rel.rel_type.clone(),
                from: sorted(&rel.from_labels),
                to: sorted(&rel.to_labels),
            };
            groups.entry(key).or_default().push(rel);
        }
        groups
    }
}

/// Relationship type plus the label sets of both endpoints.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RelationshipKey {
    pub rel_type: Identifier,
    pub from: Vec<Identifier>,
    pub to: Vec<Identifier>,
}

fn sorted(labels: &[Identifier]) -> Vec<Identifier> {
    let mut labels = labels.to_vec();
    labels.sort();
    labels
}

/// Counts written for one model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// A previous version was removed first.
    pub replaced: bool,
    pub nodes: usize,
    pub relationships: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id(name: &str) -> Identifier {
        Identifier::parse(name).unwrap()
    }

    fn node(uid: &str, labels: &[&str]) -> NodeRecord {
        NodeRecord {
            uid: uid.to_string(),
            labels: labels.iter().map(|l| id(l)).collect(),
            tag: "M1".to_string(),
            properties: Map::new(),
        }
    }

    #[test]
    fn test_node_row_stamps_tag_and_uid() {
        let mut record = node("s1", &["Species"]);
        record.properties.insert("id".into(), json!("glucose"));

        assert_eq!(
            record.to_row(),
            json!({"id": "glucose", "tag": "M1", "uid": "s1"})
        );
    }

    #[test]
    fn test_tag_overrides_mapped_property() {
        let mut record = node("s1", &["Species"]);
        record.properties.insert("tag".into(), json!("spoofed"));
        assert_eq!(record.to_row()["tag"], json!("M1"));
    }

    #[test]
    fn test_relationship_row() {
        let rel = RelationshipRecord {
            rel_type: id("HAS_SPECIES"),
            from: "m".into(),
            from_labels: vec![id("Model")],
            to: "s1".into(),
            to_labels: vec![id("Species")],
            tag: "M1".into(),
            properties: Map::new(),
        };
        assert_eq!(
            rel.to_row(),
            json!({"tag": "M1", "from": "m", "to": "s1", "properties": {"tag": "M1"}})
        );
    }

    #[test]
    fn test_node_groups_ignore_label_order() {
        let mut model = MappedModel::new("M1");
        model.nodes.push(node("a", &["Species", "Boundary"]));
        model.nodes.push(node("b", &["Boundary", "Species"]));
        model.nodes.push(node("c", &["Compartment"]));

        let groups = model.node_groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&vec![id("Boundary"), id("Species")]].len(), 2);
    }

    #[test]
    fn test_relationship_groups_split_by_endpoint_labels() {
        let rel = |to: &str, to_labels: &[&str]| RelationshipRecord {
            rel_type: id("HAS_SPECIES"),
            from: "m".into(),
            from_labels: vec![id("Model")],
            to: to.into(),
            to_labels: to_labels.iter().map(|l| id(l)).collect(),
            tag: "M1".into(),
            properties: Map::new(),
        };
        let mut model = MappedModel::new("M1");
        model.relationships.push(rel("a", &["Species"]));
        model.relationships.push(rel("b", &["Species", "Boundary"]));
        model.relationships.push(rel("c", &["Boundary", "Species"]));

        let groups = model.relationship_groups();
        assert_eq!(groups.len(), 2);
        let boundary = RelationshipKey {
            rel_type: id("HAS_SPECIES"),
            from: vec![id("Model")],
            to: vec![id("Boundary"), id("Species")],
        };
        assert_eq!(groups[&boundary].len(), 2);
    }
}
