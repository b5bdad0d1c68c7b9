//! Failure manifest: a persisted account of what a batch could not retrieve.
//!
//! The manifest lets a caller come back to a batch later and retry, ignore,
//! or report the identifiers that failed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::types::{BatchOutcome, FetchResult, Identifier};

/// One failed identifier in a manifest
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Position of the identifier in the batch input
    pub index: usize,
    /// The identifier that failed
    pub identifier: Identifier,
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Number of fetch calls made for this identifier
    pub attempts: u32,
}

/// Serializable report of one batch and its failures
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FailureManifest {
    /// When the manifest was created
    pub generated_at: DateTime<Utc>,
    /// Number of identifiers in the batch
    pub total: usize,
    /// Number of identifiers that produced a record
    pub succeeded: usize,
    /// Number of identifiers that failed
    pub failed: usize,
    /// Failed identifiers, in input order
    pub failures: Vec<ManifestEntry>,
}

impl FailureManifest {
    /// Build a manifest from a finished batch
    pub fn from_outcome<R>(outcome: &BatchOutcome<R>) -> Self {
        let failures: Vec<ManifestEntry> = outcome
            .iter()
            .enumerate()
            .filter_map(|(index, result)| match result {
                FetchResult::Failure { identifier, error } => Some(ManifestEntry {
                    index,
                    identifier: identifier.clone(),
                    code: error.code.clone(),
                    message: error.message.clone(),
                    attempts: error.attempts,
                }),
                FetchResult::Success { .. } => None,
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            total: outcome.len(),
            succeeded: outcome.len() - failures.len(),
            failed: failures.len(),
            failures,
        }
    }

    /// True when the batch had no failures
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failed identifiers in input order, ready to feed into another batch
    pub fn retry_identifiers(&self) -> Vec<Identifier> {
        self.failures.iter().map(|e| e.identifier.clone()).collect()
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a manifest from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the manifest to `path` as JSON, creating parent directories
    pub async fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, self.to_json()?).await?;
        tracing::info!(
            path = %path.display(),
            failed = self.failed,
            total = self.total,
            "Wrote failure manifest"
        );
        Ok(())
    }

    /// Read a manifest previously written with [`write_to`](Self::write_to)
    pub async fn read_from(path: impl AsRef<Path>) -> Result<Self> {
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json(&json)
    }
}
