use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::trace;

use crate::tiles::{TileError, TileResult, VectorTile};

/// Retrieves the raw payload of one tile.
///
/// Implementors can fetch over HTTP, read from disk, or serve fixtures in tests.
#[async_trait]
pub trait TileFetcher: Send + Sync + Debug {
    /// Fetches the bytes behind `url`.
    async fn fetch(&self, url: &str) -> TileResult<Vec<u8>>;
}

/// Shared tile fetcher trait object.
pub type BoxedFetcher = Arc<dyn TileFetcher>;

/// Turns a raw payload into per-layer features.
pub trait TileDecoder: Send + Sync + Debug {
    /// Decodes one tile payload.
    fn decode(&self, data: &[u8]) -> TileResult<VectorTile>;
}

/// Shared tile decoder trait object.
pub type BoxedDecoder = Arc<dyn TileDecoder>;

/// Fetches tiles over HTTP(S). Non-success statuses are reported as errors, without retries.
#[derive(Debug, Clone)]
pub struct HttpTileFetcher {
    client: Client,
}

impl HttpTileFetcher {
    /// Wraps an existing client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client with the given user agent and per-request timeout.
    pub fn with_settings(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl TileFetcher for HttpTileFetcher {
    async fn fetch(&self, url: &str) -> TileResult<Vec<u8>> {
        trace!("Fetching tile {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TileError::FetchError(e, url.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TileError::HttpStatusError(status.as_u16(), url.to_string()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TileError::FetchError(e, url.to_string()))?;
        trace!("Fetched {} bytes from {url}", bytes.len());
        Ok(bytes.to_vec())
    }
}
