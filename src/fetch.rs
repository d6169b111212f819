use crate::error::NetworkError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

/// Single-attempt GET. No retries, no timeout.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, NetworkError>;

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, NetworkError>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, NetworkError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| NetworkError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(NetworkError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(resp)
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, NetworkError> {
        let resp = self.get(url).await?;
        resp.text().await.map_err(|source| NetworkError::Transport {
            url: url.to_string(),
            source,
        })
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
        let resp = self.get(url).await?;
        let bytes = resp.bytes().await.map_err(|source| NetworkError::Transport {
            url: url.to_string(),
            source,
        })?;
        Ok(bytes.to_vec())
    }
}
