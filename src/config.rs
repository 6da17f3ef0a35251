//! Configuration with layered resolution using figment.
//!
//! Resolution order (highest priority last):
//! 1. User config: `~/.config/sbmlgraph/config.toml` (XDG) or platform config dir
//! 2. Project config: `.sbmlgraph.toml`, or the file passed with `--config`
//! 3. Environment variables: `SBMLGRAPH_*`, nested keys split on `__`
//!    (e.g. `SBMLGRAPH_NEO4J__PASSWORD`)
//! 4. Path overrides from the command line (`--models`, `--schema`)
//!
//! # Example
//!
//! ```toml
//! [neo4j]
//! uri = "bolt://localhost:7687"
//! user = "neo4j"
//! password = "secret"
//!
//! [models]
//! folder = "biomodels"
//! schema = "L3V2.7-1.json"
//!
//! [sync]
//! mode = "transactional"
//! concurrency = 4
//!
//! [similarity]
//! structure_weight = 0.6
//! children_weight = 0.4
//! ```
//!
//! Every field has a default, so an empty configuration connects to a local
//! Neo4j and reads models from `./biomodels`.

use std::ops::Deref;
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::models::{Containment, SimilarityWeights};

/// Boxed wrapper for figment::Error to reduce Result size on the stack.
#[derive(Debug)]
pub struct ConfigError(Box<figment::Error>);

impl Deref for ConfigError {
    type Target = figment::Error;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self(Box::new(err))
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub neo4j: Neo4jConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub similarity: SimilarityConfig,
}

/// Neo4j connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Neo4jConfig {
    /// Bolt URI, e.g. `bolt://localhost:7687`.
    pub uri: String,
    pub user: String,
    pub password: Option<String>,
    /// Target database; the server default when unset.
    pub database: Option<String>,
    pub max_connections: usize,
    pub fetch_size: usize,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: None,
            database: None,
            max_connections: 4,
            fetch_size: 200,
        }
    }
}

/// Where model documents and the mapping schema live.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Directory holding one document per model, named `<tag>.<extension>`.
    pub folder: PathBuf,
    pub extension: String,
    /// Arrows-style JSON schema with the node and relationship templates.
    pub schema: PathBuf,
    /// Sync manifest file name, resolved inside `folder`.
    pub manifest: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("biomodels"),
            extension: "json".to_string(),
            schema: PathBuf::from("schema.json"),
            manifest: ".sync-manifest.json".to_string(),
        }
    }
}

impl ModelsConfig {
    /// Path of the source document for a model tag.
    pub fn source_path(&self, tag: &str) -> PathBuf {
        self.folder.join(format!("{}.{}", tag, self.extension))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.folder.join(&self.manifest)
    }
}

/// How a re-import replaces the previous version of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Existence check, delete and writes share one store transaction.
    #[default]
    Transactional,
    /// Separate auto-commit statements; a failure after the delete leaves
    /// the tag absent until the next successful sync. Each write chunk
    /// commits on its own, so a chunk with a missing endpoint writes nothing
    /// but chunks before it stay.
    Sequential,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    pub mode: SyncMode,
    /// Maximum number of tags synchronized at the same time.
    pub concurrency: usize,
    /// Stop starting new tags after the first failure.
    pub fail_fast: bool,
    /// Rows per UNWIND statement.
    pub batch_size: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            mode: SyncMode::default(),
            concurrency: 1,
            fail_fast: false,
            batch_size: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Label carried by model root nodes.
    pub root_label: String,
    pub structure_weight: f64,
    pub children_weight: f64,
    /// Relationship types followed to any depth for the structural counts.
    pub descendant_relationships: Vec<String>,
    /// Relationship types selecting the direct children that are compared.
    pub child_relationships: Vec<String>,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        let weights = SimilarityWeights::default();
        let containment = Containment::default();
        Self {
            root_label: "Model".to_string(),
            structure_weight: weights.structure,
            children_weight: weights.children,
            descendant_relationships: containment.descendant_names(),
            child_relationships: containment.child_names(),
        }
    }
}

impl SimilarityConfig {
    pub fn weights(&self) -> Result<SimilarityWeights, crate::error::AppError> {
        SimilarityWeights::new(self.structure_weight, self.children_weight)
    }

    pub fn containment(&self) -> Result<Containment, crate::error::AppError> {
        Containment::from_names(&self.descendant_relationships, &self.child_relationships)
    }
}

/// Command-line overrides, applied on top of every other layer.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_file: Option<PathBuf>,
    pub models_folder: Option<PathBuf>,
    pub schema: Option<PathBuf>,
}

impl Config {
    /// Load config with layered resolution (user → project → env → overrides).
    pub fn load(overrides: &Overrides) -> Result<Self, ConfigError> {
        let project_config = overrides
            .config_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(".sbmlgraph.toml"));

        let mut figment = Figment::new()
            // Layer 1: User config (lowest priority)
            .merge(Toml::file(Self::user_config_path()))
            // Layer 2: Project config
            .merge(Toml::file(project_config))
            // Layer 3: Environment variables
            .merge(Env::prefixed("SBMLGRAPH_").split("__"));

        // Layer 4: Command-line paths (highest priority)
        if let Some(folder) = &overrides.models_folder {
            figment = figment.merge(Serialized::default("models.folder", folder));
        }
        if let Some(schema) = &overrides.schema {
            figment = figment.merge(Serialized::default("models.schema", schema));
        }

        Self::from_figment(figment)
    }

    /// Load config from a single TOML file, ignoring user config and env.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_figment(Figment::new().merge(Toml::file(path)))
    }

    fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        figment
            .join(Serialized::defaults(Config::default()))
            .extract()
            .map_err(ConfigError::from)
    }

    /// Checks invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), crate::error::AppError> {
        use crate::error::AppError;

        if self.sync.concurrency == 0 {
            return Err(AppError::Validation(
                "sync.concurrency must be at least 1".into(),
            ));
        }
        if self.sync.batch_size == 0 {
            return Err(AppError::Validation(
                "sync.batch_size must be at least 1".into(),
            ));
        }
        crate::models::Identifier::parse(&self.similarity.root_label)?;
        self.similarity.weights()?;
        self.similarity.containment()?;
        Ok(())
    }

    /// User config path: ~/.config/sbmlgraph/config.toml (XDG) or platform config dir.
    fn user_config_path() -> PathBuf {
        // Prefer XDG config location (~/.config) on all platforms
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home.join(".config").join("sbmlgraph").join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }
        // Fall back to platform-specific config dir
        dirs::config_dir()
            .map(|p| p.join("sbmlgraph").join("config.toml"))
            .unwrap_or_default()
    }
}
