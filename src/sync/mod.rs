//! Reference Synchronizer - archive provenance documents next to generated code.
//!
//! Each reference is handled on its own: a failure is reported for that index
//! and the remaining references are still archived.

mod fetch;
mod selector;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use log::{debug, error, info};
use tempfile::NamedTempFile;

use crate::error::{Result, ToolgenError};
use crate::model::{Reference, Tool};

pub use fetch::{DEFAULT_FETCH_TIMEOUT, Fetcher, HttpFetcher, StaticFetcher};
pub use selector::{extract_text, to_css};

/// Default number of reference downloads in flight per tool.
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 4;

/// What happened to one reference.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceStatus {
    /// Written to its archive file.
    Archived { bytes: usize },
    /// Dry run: would be fetched and written.
    Planned,
    /// Fetch, extraction or write failed; the message names index and file.
    Failed(String),
}

/// Outcome for the reference at `index`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceOutcome {
    pub index: usize,
    pub reference: Reference,
    pub path: PathBuf,
    pub status: ReferenceStatus,
}

impl ReferenceOutcome {
    pub fn failed(&self) -> bool {
        matches!(self.status, ReferenceStatus::Failed(_))
    }
}

/// Fetches, extracts and archives a tool's references.
pub struct ReferenceSynchronizer {
    fetcher: Arc<dyn Fetcher>,
    fetch_timeout: Duration,
    max_concurrent: usize,
}

impl ReferenceSynchronizer {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            max_concurrent: DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// List the archive files a run would write, without fetching.
    pub fn plan(&self, tool: &Tool) -> Vec<ReferenceOutcome> {
        tool.references
            .iter()
            .enumerate()
            .map(|(index, reference)| ReferenceOutcome {
                index,
                reference: reference.clone(),
                path: tool.reference_path(index),
                status: ReferenceStatus::Planned,
            })
            .collect()
    }

    /// Archive every reference of `tool`. Never fails as a whole.
    pub async fn synchronize(&self, tool: &Tool) -> Vec<ReferenceOutcome> {
        let file = tool.definition_file_name();

        let outcomes: Vec<ReferenceOutcome> = stream::iter(tool.references.iter().enumerate())
            .map(|(index, reference)| {
                let path = tool.reference_path(index);
                let file = file.as_str();
                async move {
                    let status = match self.archive(reference, &path).await {
                        Ok(bytes) => {
                            debug!("Archived reference #{} for {} to {}", index, file, path.display());
                            ReferenceStatus::Archived { bytes }
                        }
                        Err(e) => {
                            let err = ToolgenError::reference(index, file, e);
                            error!("{}", err);
                            ReferenceStatus::Failed(err.to_string())
                        }
                    };
                    ReferenceOutcome {
                        index,
                        reference: reference.clone(),
                        path,
                        status,
                    }
                }
            })
            .buffered(self.max_concurrent)
            .collect()
            .await;

        let failed = outcomes.iter().filter(|o| o.failed()).count();
        info!(
            "Synchronized {} of {} references for {}",
            outcomes.len() - failed,
            outcomes.len(),
            file
        );
        outcomes
    }

    /// Fetch into a temp file, extract, and write the archive. Returns bytes written.
    async fn archive(&self, reference: &Reference, path: &Path) -> Result<usize> {
        let download = NamedTempFile::new()?;

        tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(reference.url(), download.path()))
            .await
            .map_err(|_| ToolgenError::Http(format!("timed out after {:?}", self.fetch_timeout)))??;

        let raw = tokio::fs::read(download.path()).await?;
        let text = String::from_utf8_lossy(&raw);
        let archived = match reference.selector() {
            Some(selector) => extract_text(&text, selector)?,
            None => text.into_owned(),
        };

        tokio::fs::write(path, &archived).await?;
        Ok(archived.len())
    }
}
