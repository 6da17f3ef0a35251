//! Application context providing the dependency injection root.

use std::sync::Arc;

use crate::config::Config;
use crate::di::FromRef;
use crate::error::AppError;
use crate::graph::backends::neo4j::Neo4jClient;
use crate::graph::Graph;
use crate::mapping::{DocumentMapper, MappingSchema, ModelMapper};
use crate::models::{Identifier, SimilarityWeights};
use crate::repositories::{ModelRepository, ModelStore};
use crate::services::TagLocks;

/// The store used by services.
pub type AppStore = Arc<dyn ModelStore>;

/// The mapper used by services.
pub type AppMapper = Arc<dyn ModelMapper>;

/// The Neo4j graph handle.
pub type AppGraph = Arc<Graph<Neo4jClient>>;

/// Root application context.
///
/// Holds every shared dependency once; services resolve their fields from
/// it with [`FromRef`], so one store session and one lock table are shared
/// by everything built from the same context.
#[derive(Clone)]
pub struct Context {
    pub store: AppStore,
    pub mapper: AppMapper,
    pub locks: TagLocks,
    pub weights: SimilarityWeights,
    pub config: Arc<Config>,
}

impl Context {
    /// Creates a context from already built dependencies.
    ///
    /// Fails when the configuration does not validate.
    pub fn new(store: AppStore, mapper: AppMapper, config: Config) -> Result<Self, AppError> {
        config.validate()?;
        let weights = config.similarity.weights()?;
        Ok(Self {
            store,
            mapper,
            locks: TagLocks::new(),
            weights,
            config: Arc::new(config),
        })
    }

    /// Connects to Neo4j and loads the mapping schema named in the config.
    pub async fn connect(config: Config) -> Result<Self, AppError> {
        config.validate()?;
        let schema = MappingSchema::load(&config.models.schema)?;
        let root_label = Identifier::parse(&config.similarity.root_label)?;
        let graph = connect_graph(&config).await?;
        let store = ModelRepository::new(graph, &config)?;
        Self::new(
            Arc::new(store),
            Arc::new(DocumentMapper::new(schema, root_label)),
            config,
        )
    }
}

/// Opens the Neo4j connection pool.
pub async fn connect_graph(config: &Config) -> Result<AppGraph, AppError> {
    tracing::info!(uri = %config.neo4j.uri, "Connecting to Neo4j");
    let client = Neo4jClient::connect(&config.neo4j).await?;
    tracing::info!("Connected to Neo4j");
    Ok(Arc::new(Graph::new(client)))
}

impl FromRef<Context> for AppStore {
    fn from_ref(ctx: &Context) -> Self {
        ctx.store.clone()
    }
}

impl FromRef<Context> for AppMapper {
    fn from_ref(ctx: &Context) -> Self {
        ctx.mapper.clone()
    }
}

impl FromRef<Context> for TagLocks {
    fn from_ref(ctx: &Context) -> Self {
        ctx.locks.clone()
    }
}

impl FromRef<Context> for SimilarityWeights {
    fn from_ref(ctx: &Context) -> Self {
        ctx.weights
    }
}

impl FromRef<Context> for Arc<Config> {
    fn from_ref(ctx: &Context) -> Self {
        ctx.config.clone()
    }
}
