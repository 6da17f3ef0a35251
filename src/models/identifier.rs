//! Validated Cypher identifiers for labels and relationship types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A label or relationship type name that is safe to interpolate into Cypher.
///
/// Labels and relationship types cannot be passed as query parameters, so
/// every name that ends up in query text goes through [`Identifier::parse`]
/// and is backtick-quoted by [`Identifier::quoted`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    pub fn parse(name: &str) -> Result<Self, AppError> {
        let mut chars = name.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            Ok(Self(name.to_string()))
        } else {
            Err(AppError::InvalidIdentifier(name.to_string()))
        }
    }

    /// For names known at compile time to be valid.
    pub(crate) fn from_static(name: &'static str) -> Self {
        debug_assert!(Self::parse(name).is_ok());
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Backtick-quoted form for query text.
    pub fn quoted(&self) -> String {
        format!("`{}`", self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Identifier {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Identifier> for String {
    fn from(value: Identifier) -> Self {
        value.0
    }
}

/// Joins identifiers into a Cypher label expression, e.g. `:`A`:`B``.
pub fn label_expression(labels: &[Identifier]) -> String {
    labels.iter().map(|l| format!(":{}", l.quoted())).collect()
}

/// Joins relationship types into a Cypher alternation, e.g. `:`A`|`B``.
pub fn type_alternation(types: &[Identifier]) -> String {
    let joined: Vec<String> = types.iter().map(Identifier::quoted).collect();
    format!(":{}", joined.join("|"))
}
