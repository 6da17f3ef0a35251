//! CLI module for sbmlgraph.
//!
//! Subcommands:
//! - `init`: Create the store indexes
//! - `sync`: Synchronize new or given models, optionally comparing two
//! - `compare`: Score two stored models
//! - `exists` / `delete`: Inspect or remove one model

mod compare;
mod init;
mod model;
mod sync;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{Config, Overrides};

/// sbmlgraph - SBML models in a property graph
#[derive(Parser)]
#[command(name = "sbmlgraph")]
#[command(about = "Synchronize SBML models into Neo4j and compare them structurally")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to .sbmlgraph.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Folder holding the model documents
    #[arg(long, global = true, value_name = "DIR")]
    pub models: Option<PathBuf>,

    /// Mapping schema file
    #[arg(long, global = true, value_name = "FILE")]
    pub schema: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the indexes used by sync and compare
    Init,

    /// Synchronize models into the store
    Sync {
        /// Tags to synchronize (default: new or modified models in the folder)
        tags: Vec<String>,

        /// Compare two tags after synchronizing
        #[arg(long, num_args = 2, value_names = ["TAG_A", "TAG_B"])]
        compare: Option<Vec<String>>,
    },

    /// Compare two stored models
    Compare {
        tag_a: String,
        tag_b: String,
    },

    /// Check whether a model is stored
    Exists { tag: String },

    /// Remove a model and all its relationships
    Delete { tag: String },
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        let config = self.load_config()?;
        match &self.command {
            Command::Init => self.run_init(config).await,
            Command::Sync { tags, compare } => {
                self.run_sync(config, tags, compare.as_deref()).await
            }
            Command::Compare { tag_a, tag_b } => self.run_compare(config, tag_a, tag_b).await,
            Command::Exists { tag } => self.run_exists(config, tag).await,
            Command::Delete { tag } => self.run_delete(config, tag).await,
        }
    }

    fn load_config(&self) -> color_eyre::Result<Config> {
        let config = Config::load(&Overrides {
            config_file: self.config.clone(),
            models_folder: self.models.clone(),
            schema: self.schema.clone(),
        })?;
        config.validate()?;
        tracing::debug!(
            uri = %config.neo4j.uri,
            models = %config.models.folder.display(),
            mode = ?config.sync.mode,
            "Loaded configuration"
        );
        Ok(config)
    }
}
