//! Index statements for the model store.

use std::collections::BTreeSet;

use crate::error::AppError;
use crate::graph::{CypherExecutor, QueryExt};
use crate::models::Identifier;

/// Statements creating the indexes used by sync and comparison.
///
/// Roots are looked up by `id` and `tag`; every other node is matched by
/// `(tag, uid)` when relationships are written.
pub fn schema_statements(root_label: &Identifier, labels: &BTreeSet<Identifier>) -> Vec<String> {
    let root_name = root_label.as_str().to_lowercase();
    let mut statements = vec![
        format!(
            "CREATE INDEX {}_root_id IF NOT EXISTS FOR (n:{}) ON (n.id)",
            root_name,
            root_label.quoted()
        ),
        format!(
            "CREATE INDEX {}_root_tag IF NOT EXISTS FOR (n:{}) ON (n.tag)",
            root_name,
            root_label.quoted()
        ),
    ];
    statements.extend(labels.iter().map(|label| {
        format!(
            "CREATE INDEX {}_tag_uid IF NOT EXISTS FOR (n:{}) ON (n.tag, n.uid)",
            label.as_str().to_lowercase(),
            label.quoted()
        )
    }));
    statements
}

/// Runs the schema statements. Safe to run multiple times.
pub async fn initialize_schema<E: CypherExecutor>(
    executor: &E,
    statements: &[String],
) -> Result<usize, AppError> {
    tracing::info!("Initializing Neo4j schema...");

    for statement in statements {
        executor.query(statement).run().await?;
    }

    tracing::info!("Neo4j schema initialized ({} statements)", statements.len());
    Ok(statements.len())
}
