//! Raw document retrieval for references.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;

use crate::error::{Result, ToolgenError};

/// Default per-fetch timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Downloads a URL's raw content into a local file.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, target: &Path) -> Result<()>;
}

/// HTTP(S) fetcher; `file://` URLs are copied from disk.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ToolgenError::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, target: &Path) -> Result<()> {
        if let Some(local) = url.strip_prefix("file://") {
            tokio::fs::copy(local, target).await?;
            return Ok(());
        }

        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ToolgenError::Http(e.to_string()))?;
        let body = response
            .bytes()
            .await
            .map_err(|e| ToolgenError::Http(e.to_string()))?;
        tokio::fs::write(target, &body).await?;
        Ok(())
    }
}

/// In-memory fetcher serving fixed documents; unknown URLs fail.
#[derive(Debug, Default, Clone)]
pub struct StaticFetcher {
    documents: HashMap<String, String>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.documents.insert(url.into(), body.into());
        self
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str, target: &Path) -> Result<()> {
        let body = self.documents.get(url).ok_or_else(|| {
            ToolgenError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("unreachable: {}", url),
            ))
        })?;
        tokio::fs::write(target, body).await?;
        Ok(())
    }
}
