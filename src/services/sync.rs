//! Model synchronization: replace-by-tag for one or many models.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::StreamExt;

use crate::config::{Config, SyncMode};
use crate::context::{AppMapper, AppStore, Context};
use crate::di::FromRef;
use crate::error::AppError;
use crate::models::{MappedModel, SyncReport, TagOutcome, TagStatus, WriteSummary};
use crate::services::TagLocks;

/// Orchestrates "exists? delete : nothing; then import" per tag.
#[derive(Clone)]
pub struct SyncService {
    store: AppStore,
    mapper: AppMapper,
    locks: TagLocks,
    config: Arc<Config>,
}

impl FromRef<Context> for SyncService {
    fn from_ref(ctx: &Context) -> Self {
        Self {
            store: FromRef::from_ref(ctx),
            mapper: FromRef::from_ref(ctx),
            locks: FromRef::from_ref(ctx),
            config: FromRef::from_ref(ctx),
        }
    }
}

impl SyncService {
    pub async fn exists(&self, tag: &str) -> Result<bool, AppError> {
        self.store.exists(tag).await
    }

    /// Detach-deletes the model. Absent tags are a no-op.
    pub async fn delete(&self, tag: &str) -> Result<(), AppError> {
        let _guard = self.locks.lock(tag).await;
        self.store.delete(tag).await
    }

    /// Synchronizes the model stored at `source` under `tag`.
    ///
    /// The source is mapped before the store is touched, so a malformed
    /// source leaves any previous version in place.
    pub async fn sync_one(&self, tag: &str, source: &Path) -> Result<WriteSummary, AppError> {
        let model = self.map(tag, source).await?;

        let _guard = self.locks.lock(tag).await;
        let summary = match self.config.sync.mode {
            SyncMode::Transactional => {
                let summary = self.store.replace(&model).await?;
                if summary.replaced {
                    tracing::info!(tag, "Replaced existing model");
                }
                summary
            }
            SyncMode::Sequential => self.replace_sequentially(&model).await?,
        };

        tracing::info!(
            tag,
            nodes = summary.nodes,
            relationships = summary.relationships,
            "Model synchronized"
        );
        Ok(summary)
    }

    /// Synchronizes a tag from its file in the configured model folder.
    pub async fn sync_tag(&self, tag: &str) -> Result<WriteSummary, AppError> {
        let source = self.config.models.source_path(tag);
        self.sync_one(tag, &source).await
    }

    /// Synchronizes every tag, reporting outcomes in input order.
    ///
    /// A failing tag does not stop the batch unless `sync.fail_fast` is set,
    /// in which case tags not yet started are reported as skipped.
    pub async fn sync_many(&self, tags: &[String]) -> SyncReport {
        if tags.is_empty() {
            return SyncReport::default();
        }

        let stop = AtomicBool::new(false);
        let fail_fast = self.config.sync.fail_fast;
        let concurrency = self.config.sync.concurrency.max(1);
        tracing::info!(count = tags.len(), concurrency, "Synchronizing models");

        let outcomes = futures::stream::iter(tags)
            .map(|tag| {
                let stop = &stop;
                async move {
                    if stop.load(Ordering::SeqCst) {
                        return TagOutcome {
                            tag: tag.clone(),
                            status: TagStatus::Skipped,
                        };
                    }
                    let status = match self.sync_tag(tag).await {
                        Ok(summary) => TagStatus::Synced(summary),
                        Err(err) => {
                            tracing::error!(tag = %tag, code = err.code(), kind = %err.kind(), error = %err, "Model sync failed");
                            if fail_fast {
                                stop.store(true, Ordering::SeqCst);
                            }
                            TagStatus::Failed(err)
                        }
                    };
                    TagOutcome {
                        tag: tag.clone(),
                        status,
                    }
                }
            })
            .buffered(concurrency)
            .collect::<Vec<_>>()
            .await;

        SyncReport { outcomes }
    }

    /// Separate auto-commit steps; a failure after the delete leaves the tag
    /// absent until the next successful sync.
    async fn replace_sequentially(&self, model: &MappedModel) -> Result<WriteSummary, AppError> {
        let replaced = self.store.exists(&model.tag).await?;
        if replaced {
            tracing::info!(tag = %model.tag, "Model exists, deleting before re-import");
            self.store.delete(&model.tag).await?;
        }
        let nodes = self.store.create_nodes(model).await?;
        let relationships = self.store.create_relationships(model).await?;
        Ok(WriteSummary {
            replaced,
            nodes,
            relationships,
        })
    }

    async fn map(&self, tag: &str, source: &Path) -> Result<MappedModel, AppError> {
        let mapper = Arc::clone(&self.mapper);
        let source: PathBuf = source.to_path_buf();
        let tag = tag.to_string();

        tokio::task::spawn_blocking(move || mapper.map(&source, &tag))
            .await
            .map_err(|e| AppError::Internal(format!("mapping task failed: {}", e)))?
    }
}
