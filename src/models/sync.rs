//! Per-tag results of a synchronization batch.

use std::collections::BTreeMap;

use crate::error::{AppError, ErrorKind};
use crate::models::WriteSummary;

/// What happened to one tag.
#[derive(Debug)]
pub enum TagStatus {
    Synced(WriteSummary),
    Failed(AppError),
    /// Not started because the batch stopped early.
    Skipped,
}

#[derive(Debug)]
pub struct TagOutcome {
    pub tag: String,
    pub status: TagStatus,
}

impl TagOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, TagStatus::Synced(_))
    }
}

/// Outcomes of a batch, in input order.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub outcomes: Vec<TagOutcome>,
}

impl SyncReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &TagOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &AppError)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            TagStatus::Failed(err) => Some((o.tag.as_str(), err)),
            _ => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, TagStatus::Skipped))
            .map(|o| o.tag.as_str())
    }

    /// Failure counts per error kind.
    pub fn failures_by_kind(&self) -> BTreeMap<ErrorKind, usize> {
        let mut counts = BTreeMap::new();
        for (_, err) in self.failed() {
            *counts.entry(err.kind()).or_insert(0) += 1;
        }
        counts
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}
