//! Structural similarity between two stored models.
//!
//! The store returns a [`ComparisonSnapshot`] (counts and direct children of
//! both roots); everything here is pure arithmetic over that snapshot.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::AppError;
use crate::models::Identifier;

/// Containment relationship types of the SBML schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainmentType {
    Compartment,
    UnitDefinition,
    Species,
    Reaction,
}

impl ContainmentType {
    pub const ALL: [ContainmentType; 4] = [
        ContainmentType::Compartment,
        ContainmentType::UnitDefinition,
        ContainmentType::Species,
        ContainmentType::Reaction,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContainmentType::Compartment => "HAS_COMPARTMENT",
            ContainmentType::UnitDefinition => "HAS_UNITDEFINITION",
            ContainmentType::Species => "HAS_SPECIES",
            ContainmentType::Reaction => "HAS_REACTION",
        }
    }

    /// Whether the type selects the direct children that are compared.
    pub fn compares_children(self) -> bool {
        !matches!(self, ContainmentType::UnitDefinition)
    }
}

/// Relationship types followed by the scorer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Containment {
    /// Followed to any depth for element and relationship counts.
    pub descendants: Vec<Identifier>,
    /// Followed one hop for the child comparison.
    pub children: Vec<Identifier>,
}

impl Default for Containment {
    fn default() -> Self {
        let ident = |t: ContainmentType| Identifier::from_static(t.as_str());
        Self {
            descendants: ContainmentType::ALL.into_iter().map(ident).collect(),
            children: ContainmentType::ALL
                .into_iter()
                .filter(|t| t.compares_children())
                .map(ident)
                .collect(),
        }
    }
}

impl Containment {
    pub fn from_names(descendants: &[String], children: &[String]) -> Result<Self, AppError> {
        let parse = |names: &[String], what: &str| -> Result<Vec<Identifier>, AppError> {
            if names.is_empty() {
                return Err(AppError::Validation(format!(
                    "at least one {} relationship type is required",
                    what
                )));
            }
            names.iter().map(|n| Identifier::parse(n)).collect()
        };
        Ok(Self {
            descendants: parse(descendants, "descendant")?,
            children: parse(children, "child")?,
        })
    }

    pub fn descendant_names(&self) -> Vec<String> {
        self.descendants.iter().map(|t| t.to_string()).collect()
    }

    pub fn child_names(&self) -> Vec<String> {
        self.children.iter().map(|t| t.to_string()).collect()
    }
}

/// Weights of the two score components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimilarityWeights {
    pub structure: f64,
    pub children: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            structure: 0.5,
            children: 0.5,
        }
    }
}

impl SimilarityWeights {
    /// Weights must be finite, non-negative and sum to 1.0.
    pub fn new(structure: f64, children: f64) -> Result<Self, AppError> {
        let valid = |w: f64| w.is_finite() && w >= 0.0;
        if !valid(structure) || !valid(children) {
            return Err(AppError::Validation(format!(
                "similarity weights must be non-negative, got {} and {}",
                structure, children
            )));
        }
        if ((structure + children) - 1.0).abs() > 1e-9 {
            return Err(AppError::Validation(format!(
                "similarity weights must sum to 1.0, got {}",
                structure + children
            )));
        }
        Ok(Self {
            structure,
            children,
        })
    }
}

/// A direct child of a model root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildRef {
    /// Sorted label set of the child node.
    pub labels: Vec<String>,
    /// Logical `id` attribute; children without one never match.
    pub id: Option<String>,
}

impl ChildRef {
    pub fn new(mut labels: Vec<String>, id: Option<String>) -> Self {
        labels.sort();
        Self { labels, id }
    }
}

/// Traversal results for one root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SideSnapshot {
    pub elements: u64,
    pub relationships: u64,
    pub children: Vec<ChildRef>,
}

/// Traversal results for both roots; `None` when the root does not exist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonSnapshot {
    pub a: Option<SideSnapshot>,
    pub b: Option<SideSnapshot>,
}

/// Scored comparison of two models.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimilarityScore {
    pub structural: f64,
    pub children: f64,
    pub score: f64,
}

/// `1 - |a - b| / (a + b)`, with zero against zero a perfect match.
pub fn relative_agreement(a: u64, b: u64) -> f64 {
    let total = a + b;
    if total == 0 {
        return 1.0;
    }
    1.0 - a.abs_diff(b) as f64 / total as f64
}

pub fn structural_similarity(a: &SideSnapshot, b: &SideSnapshot) -> f64 {
    if a.elements == b.elements && a.relationships == b.relationships {
        return 1.0;
    }
    0.5 * relative_agreement(a.elements, b.elements)
        + 0.5 * relative_agreement(a.relationships, b.relationships)
}

/// Share of A's comparable children whose `id` also appears among B's.
///
/// Only children whose label set occurs on both sides are considered, and
/// children without an `id` are left out entirely.
pub fn child_similarity(a: &[ChildRef], b: &[ChildRef]) -> f64 {
    let with_id = |c: &&ChildRef| c.id.is_some();
    let a_labels: HashSet<&[String]> = a.iter().filter(with_id).map(|c| &c.labels[..]).collect();
    let b_labels: HashSet<&[String]> = b.iter().filter(with_id).map(|c| &c.labels[..]).collect();

    let b_ids: HashSet<&str> = b
        .iter()
        .filter(|c| a_labels.contains(&c.labels[..]))
        .filter_map(|c| c.id.as_deref())
        .collect();

    let mut considered = 0usize;
    let mut matched = 0usize;
    for child in a.iter().filter(with_id) {
        if !b_labels.contains(&child.labels[..]) {
            continue;
        }
        considered += 1;
        if child.id.as_deref().is_some_and(|id| b_ids.contains(id)) {
            matched += 1;
        }
    }

    if considered == 0 {
        return 1.0;
    }
    matched as f64 / considered as f64
}

pub fn score(a: &SideSnapshot, b: &SideSnapshot, weights: SimilarityWeights) -> SimilarityScore {
    let structural = structural_similarity(a, b);
    let children = child_similarity(&a.children, &b.children);
    let score = (weights.structure * structural + weights.children * children).clamp(0.0, 1.0);
    SimilarityScore {
        structural,
        children,
        score,
    }
}
