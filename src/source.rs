//! Where the tags to synchronize come from.
//!
//! [`FolderSource`] treats every model document in the configured folder as
//! a candidate and keeps a JSON manifest of what was last synchronized, so a
//! run only picks up new or modified files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ModelsConfig;
use crate::error::AppError;

/// Tags ready for synchronization plus the entries that could not be read.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub tags: Vec<String>,
    /// `(entry, reason)` pairs; they do not prevent the other tags.
    pub failures: Vec<(String, String)>,
}

/// Produces the tags that are new or updated.
#[async_trait]
pub trait ModelSource: Send + Sync {
    async fn fetch(&self) -> Result<FetchReport, AppError>;

    /// Records that `tags` were synchronized successfully.
    async fn mark_synced(&self, tags: &[String]) -> Result<(), AppError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ManifestEntry {
    modified: DateTime<Utc>,
    synced_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Manifest {
    #[serde(default)]
    models: BTreeMap<String, ManifestEntry>,
}

/// Model documents in a local folder, one file per tag.
pub struct FolderSource {
    folder: PathBuf,
    extension: String,
    manifest: PathBuf,
    exclude: Vec<PathBuf>,
}

impl FolderSource {
    pub fn new(config: &ModelsConfig) -> Self {
        Self {
            folder: config.folder.clone(),
            extension: config.extension.clone(),
            manifest: config.manifest_path(),
            exclude: vec![config.schema.clone()],
        }
    }

    async fn load_manifest(&self) -> Result<Manifest, AppError> {
        match tokio::fs::read_to_string(&self.manifest).await {
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                AppError::source_error(&self.manifest, format!("invalid manifest: {}", e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Manifest::default()),
            Err(e) => Err(AppError::source_error(&self.manifest, e.to_string())),
        }
    }

    /// Tag for a candidate file, or `None` when the file is not a model.
    fn tag_for(&self, path: &Path) -> Option<String> {
        if path == self.manifest || self.exclude.iter().any(|p| p == path) {
            return None;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        if stem.starts_with('.') {
            return None;
        }
        Some(stem.to_string())
    }
}

async fn modified_at(path: &Path) -> std::io::Result<DateTime<Utc>> {
    let modified: SystemTime = tokio::fs::metadata(path).await?.modified()?;
    Ok(modified.into())
}

#[async_trait]
impl ModelSource for FolderSource {
    async fn fetch(&self) -> Result<FetchReport, AppError> {
        let manifest = self.load_manifest().await?;
        let mut entries = tokio::fs::read_dir(&self.folder)
            .await
            .map_err(|e| AppError::source_error(&self.folder, e.to_string()))?;

        let mut report = FetchReport::default();
        let mut scanned = 0usize;
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    report
                        .failures
                        .push((self.folder.display().to_string(), e.to_string()));
                    break;
                }
            };
            let path = entry.path();
            let Some(tag) = self.tag_for(&path) else {
                continue;
            };
            scanned += 1;

            let modified = match modified_at(&path).await {
                Ok(modified) => modified,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable model");
                    report.failures.push((path.display().to_string(), e.to_string()));
                    continue;
                }
            };
            let up_to_date = manifest
                .models
                .get(&tag)
                .is_some_and(|seen| modified <= seen.modified);
            if !up_to_date {
                report.tags.push(tag);
            }
        }

        report.tags.sort();
        tracing::info!(
            scanned,
            pending = report.tags.len(),
            failures = report.failures.len(),
            "Scanned model folder"
        );
        Ok(report)
    }

    async fn mark_synced(&self, tags: &[String]) -> Result<(), AppError> {
        if tags.is_empty() {
            return Ok(());
        }

        let mut manifest = self.load_manifest().await?;
        let now = Utc::now();
        for tag in tags {
            let path = self.folder.join(format!("{}.{}", tag, self.extension));
            match modified_at(&path).await {
                Ok(modified) => {
                    manifest.models.insert(
                        tag.clone(),
                        ManifestEntry {
                            modified,
                            synced_at: now,
                        },
                    );
                }
                Err(e) => {
                    tracing::warn!(tag = %tag, error = %e, "Not recording model in manifest");
                }
            }
        }

        let contents = serde_json::to_string_pretty(&manifest)
            .map_err(|e| AppError::Internal(format!("failed to encode manifest: {}", e)))?;
        tokio::fs::write(&self.manifest, contents)
            .await
            .map_err(|e| AppError::source_error(&self.manifest, e.to_string()))?;
        tracing::debug!(count = tags.len(), "Updated sync manifest");
        Ok(())
    }
}
