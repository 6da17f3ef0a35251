//! Sync command handler.

use color_eyre::eyre::eyre;
use color_eyre::Result;

use crate::config::Config;
use crate::context::Context;
use crate::di::FromRef;
use crate::models::{SyncReport, TagStatus};
use crate::services::SyncService;
use crate::source::{FolderSource, ModelSource};

use super::compare::compare;
use super::App;

impl App {
    /// Synchronize the given tags, or every new or modified model in the folder.
    pub async fn run_sync(
        &self,
        config: Config,
        tags: &[String],
        compare_tags: Option<&[String]>,
    ) -> Result<()> {
        let source = FolderSource::new(&config.models);
        let ctx = Context::connect(config).await?;

        let tags = if tags.is_empty() {
            let fetched = source.fetch().await?;
            for (entry, reason) in &fetched.failures {
                tracing::warn!(entry = %entry, reason = %reason, "Model source entry failed");
            }
            fetched.tags
        } else {
            tags.to_vec()
        };

        let report = SyncService::from_ref(&ctx).sync_many(&tags).await;
        println!("{}", format_report(&report));

        let synced: Vec<String> = report.succeeded().map(|o| o.tag.clone()).collect();
        source.mark_synced(&synced).await?;

        if let Some([tag_a, tag_b]) = compare_tags {
            compare(&ctx, tag_a, tag_b).await?;
        }

        if report.has_failures() {
            return Err(eyre!("{}", failure_summary(&report)));
        }
        Ok(())
    }
}

fn failure_summary(report: &SyncReport) -> String {
    let by_kind = report.failures_by_kind();
    let failed: usize = by_kind.values().sum();
    let kinds: Vec<String> = by_kind
        .iter()
        .map(|(kind, count)| format!("{} {}", count, kind))
        .collect();
    format!(
        "{} of {} models failed to synchronize ({})",
        failed,
        report.outcomes.len(),
        kinds.join(", ")
    )
}

fn format_report(report: &SyncReport) -> String {
    if report.is_empty() {
        return "No models to synchronize".to_string();
    }

    let mut lines = Vec::with_capacity(report.outcomes.len());
    for outcome in &report.outcomes {
        let line = match &outcome.status {
            TagStatus::Synced(summary) => format!(
                "  synced   {}  ({} nodes, {} relationships{})",
                outcome.tag,
                summary.nodes,
                summary.relationships,
                if summary.replaced { ", replaced" } else { "" }
            ),
            TagStatus::Failed(err) => {
                format!("  failed   {}  [{}] {}", outcome.tag, err.code(), err)
            }
            TagStatus::Skipped => format!("  skipped  {}", outcome.tag),
        };
        lines.push(line);
    }
    lines.join("\n")
}
