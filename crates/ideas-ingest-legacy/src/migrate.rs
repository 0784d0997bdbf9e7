//! One-shot migration of legacy ideas into the store.
//!
//! A run is a bulk replace: read both legacy files, transform every entry,
//! delete every static idea, insert the new set. Reading happens before any
//! write, so an unreadable file leaves the store untouched. The transformed
//! batch is also checked against the canonical schema before the delete, so a
//! bad record or a repeated `originalId` fails the run without wiping the
//! ideas a previous run left.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use ideas_model::ValidationError;
use ideas_storage::{IdeaFilter, IdeaStore, StoreError};

use crate::legacy::{self, DetailedIdea, LegacyError, LegacyIdea, SummaryIdea};
use crate::transform::{transform, FallbackCounts};

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error(transparent)]
    Legacy(#[from] LegacyError),

    #[error("legacy record #{index} (`{title}`) does not fit the idea schema: {source}")]
    InvalidRecord {
        index: usize,
        title: String,
        #[source]
        source: ValidationError,
    },

    #[error("legacy originalId {0} appears more than once")]
    DuplicateOriginalId(u64),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl MigrationError {
    pub fn is_connection(&self) -> bool {
        matches!(self, MigrationError::Store(e) if e.is_connection())
    }
}

/// Both legacy collections, parsed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegacyBatch {
    pub summary: Vec<SummaryIdea>,
    pub detailed: Vec<DetailedIdea>,
}

impl LegacyBatch {
    /// Summary entries first, then detailed ones, each in source order.
    pub fn into_records(self) -> Vec<LegacyIdea> {
        self.summary
            .into_iter()
            .map(LegacyIdea::Summary)
            .chain(self.detailed.into_iter().map(LegacyIdea::Detailed))
            .collect()
    }
}

/// Where legacy records come from.
#[async_trait]
pub trait LegacySource: Send + Sync {
    fn describe(&self) -> String;

    async fn load(&self) -> Result<LegacyBatch, LegacyError>;
}

#[async_trait]
impl LegacySource for LegacyBatch {
    fn describe(&self) -> String {
        format!(
            "in-memory batch ({} summary, {} detailed)",
            self.summary.len(),
            self.detailed.len()
        )
    }

    async fn load(&self) -> Result<LegacyBatch, LegacyError> {
        Ok(self.clone())
    }
}

/// The two legacy JSON files on disk.
#[derive(Debug, Clone)]
pub struct LegacyFiles {
    pub summary: PathBuf,
    pub detailed: PathBuf,
}

impl LegacyFiles {
    pub fn new(summary: impl Into<PathBuf>, detailed: impl Into<PathBuf>) -> Self {
        Self {
            summary: summary.into(),
            detailed: detailed.into(),
        }
    }
}

async fn read(path: &Path) -> Result<Vec<u8>, LegacyError> {
    tokio::fs::read(path).await.map_err(|source| LegacyError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[async_trait]
impl LegacySource for LegacyFiles {
    fn describe(&self) -> String {
        format!("{} + {}", self.summary.display(), self.detailed.display())
    }

    async fn load(&self) -> Result<LegacyBatch, LegacyError> {
        let summary = legacy::parse_summary(&read(&self.summary).await?)?;
        let detailed = legacy::parse_detailed(&read(&self.detailed).await?)?;
        Ok(LegacyBatch { summary, detailed })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub summary_records: usize,
    pub detailed_records: usize,
    pub deleted: usize,
    pub inserted: usize,
    /// How many records fell back to a default, per normalizer.
    pub fallbacks: FallbackCounts,
}

/// Replace every static idea in `store` with the records from `source`.
///
/// The store handle belongs to the caller, who opens it before and closes it
/// after, whatever this returns.
pub async fn run_migration(
    store: &IdeaStore,
    source: &dyn LegacySource,
) -> Result<MigrationReport, MigrationError> {
    let batch = source.load().await?;
    let mut report = MigrationReport {
        summary_records: batch.summary.len(),
        detailed_records: batch.detailed.len(),
        ..Default::default()
    };
    tracing::info!(
        source = %source.describe(),
        summary = report.summary_records,
        detailed = report.detailed_records,
        "legacy records loaded"
    );

    let mut ideas = Vec::with_capacity(report.summary_records + report.detailed_records);
    let mut original_ids = HashSet::new();
    for (index, record) in batch.into_records().iter().enumerate() {
        let transformed = transform(record);
        if transformed.fallbacks != Default::default() {
            tracing::debug!(
                index,
                original_id = ?record.original_id(),
                fallbacks = ?transformed.fallbacks,
                "normalizer fell back to default"
            );
        }
        report.fallbacks.record(transformed.fallbacks);

        transformed
            .idea
            .validate()
            .map_err(|source| MigrationError::InvalidRecord {
                index,
                title: record.title().to_string(),
                source,
            })?;
        if let Some(id) = transformed.idea.original_id {
            if !original_ids.insert(id) {
                return Err(MigrationError::DuplicateOriginalId(id));
            }
        }
        ideas.push(transformed.idea);
    }

    report.deleted = store.delete_ideas(&IdeaFilter::static_ideas()).await?;
    report.inserted = store.insert_ideas(ideas).await?.len();

    if report.fallbacks.total() > 0 {
        tracing::warn!(fallbacks = ?report.fallbacks, "some legacy values were not recognized");
    }
    tracing::info!(
        deleted = report.deleted,
        inserted = report.inserted,
        "migration complete"
    );
    Ok(report)
}
