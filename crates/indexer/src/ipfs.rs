//! Content-addressed metadata retrieval.
//!
//! [`ContentFetcher`] is the `cat(key) -> bytes | absent` primitive. The HTTP
//! implementation ([`IpfsGateway`]) talks to a path gateway such as
//! `https://ipfs.io/ipfs/`; [`InMemoryFetcher`] serves fixed documents.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use raftbadge_core::append_metadata_path;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

use crate::config::IpfsConfig;

/// Fetch primitive over content-addressed storage.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch the bytes stored under `key` (`<cid>` or `<cid>/<path>`).
    ///
    /// Returns `None` when nothing could be retrieved.
    async fn cat(&self, key: &str) -> Option<Vec<u8>>;
}

#[async_trait]
impl<'a, F: ContentFetcher + ?Sized> ContentFetcher for &'a F {
    async fn cat(&self, key: &str) -> Option<Vec<u8>> {
        (**self).cat(key).await
    }
}

#[async_trait]
impl<F: ContentFetcher + ?Sized> ContentFetcher for std::sync::Arc<F> {
    async fn cat(&self, key: &str) -> Option<Vec<u8>> {
        (**self).cat(key).await
    }
}

/// Fetch the metadata document for a content identifier.
///
/// Tries the bare identifier first, then `<cid>/metadata.json`.
pub async fn fetch_metadata_bytes<F>(fetcher: &F, cid: &str) -> Option<Vec<u8>>
where
    F: ContentFetcher + ?Sized,
{
    if let Some(bytes) = fetcher.cat(cid).await {
        return Some(bytes);
    }

    fetcher.cat(&append_metadata_path(cid)).await
}

/// HTTP path-gateway client.
#[derive(Clone)]
pub struct IpfsGateway {
    client: Client,
    gateway: String,
    max_bytes: usize,
}

impl IpfsGateway {
    /// Build a gateway client with explicit settings.
    pub fn new(gateway: &str, max_bytes: usize, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("raftbadge-indexer/ipfs")
            .build()
            .context("Failed to build IPFS gateway HTTP client")?;

        let mut gateway = gateway.trim().to_string();
        if !gateway.ends_with('/') {
            gateway.push('/');
        }

        Ok(Self {
            client,
            gateway,
            max_bytes,
        })
    }

    /// Build a gateway client from the `[ipfs]` config section.
    pub fn from_config(config: &IpfsConfig) -> Result<Self> {
        Self::new(&config.gateway, config.max_bytes, config.timeout_secs)
    }

    /// Full URL for a key.
    pub fn url_for(&self, key: &str) -> String {
        format!("{}{}", self.gateway, key.trim_start_matches('/'))
    }

    async fn try_cat(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if key.is_empty() {
            return Ok(None);
        }

        let response = self
            .client
            .get(self.url_for(key))
            .send()
            .await
            .context("IPFS gateway request failed")?;

        if !response.status().is_success() {
            debug!("IPFS gateway returned {} for {}", response.status(), key);
            return Ok(None);
        }

        // Directory CIDs render as an HTML index; a native node would refuse to cat them.
        let is_html = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("text/html"))
            .unwrap_or(false);
        if is_html {
            debug!("IPFS gateway returned a directory listing for {}", key);
            return Ok(None);
        }

        if let Some(len) = response.content_length() {
            if len as usize > self.max_bytes {
                debug!("IPFS object {} exceeds {} bytes", key, self.max_bytes);
                return Ok(None);
            }
        }

        let bytes = response
            .bytes()
            .await
            .context("Failed to read IPFS gateway response")?;
        if bytes.len() > self.max_bytes {
            debug!("IPFS object {} exceeds {} bytes", key, self.max_bytes);
            return Ok(None);
        }

        Ok(Some(bytes.to_vec()))
    }
}

#[async_trait]
impl ContentFetcher for IpfsGateway {
    async fn cat(&self, key: &str) -> Option<Vec<u8>> {
        match self.try_cat(key).await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("IPFS cat {} failed: {:#}", key, e);
                None
            }
        }
    }
}

/// Map-backed fetcher serving fixed documents by key.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFetcher {
    objects: HashMap<String, Vec<u8>>,
}

impl InMemoryFetcher {
    /// Create an empty fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `bytes` under `key`.
    pub fn with_object(mut self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.objects.insert(key.into(), bytes.into());
        self
    }
}

#[async_trait]
impl ContentFetcher for InMemoryFetcher {
    async fn cat(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.get(key).cloned()
    }
}
