//! Init command handler.

use color_eyre::Result;

use crate::config::Config;
use crate::context::connect_graph;
use crate::mapping::MappingSchema;
use crate::models::Identifier;
use crate::repositories::{initialize_schema, schema_statements};

use super::App;

impl App {
    /// Run the init command to create the store indexes.
    pub async fn run_init(&self, config: Config) -> Result<()> {
        let schema = MappingSchema::load(&config.models.schema)?;
        let root_label = Identifier::parse(&config.similarity.root_label)?;
        let statements = schema_statements(&root_label, &schema.node_labels());

        let graph = connect_graph(&config).await?;
        initialize_schema(graph.as_ref(), &statements).await?;

        println!("Initialized {} indexes", statements.len());
        Ok(())
    }
}
