//! Publisher side of the update protocol.

use std::time::Duration;

use reqwest::StatusCode;
use zeroize::Zeroizing;

use quire_core::{envelope, ContentRecord};

use crate::error::{Result, ServerError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client that pushes records to a quire server.
pub struct Publisher {
    client: reqwest::Client,
    base: String,
    secret: Zeroizing<Vec<u8>>,
}

impl Publisher {
    /// Client for the server at `base_url` using the shared `secret`.
    pub fn new(base_url: &str, secret: impl Into<Vec<u8>>) -> Result<Self> {
        let secret = Zeroizing::new(secret.into());
        if secret.is_empty() {
            return Err(ServerError::Config("update secret is empty".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base: base_url.trim_end_matches('/').to_string(),
            secret,
        })
    }

    fn update_url(&self) -> String {
        format!("{}/update", self.base)
    }

    /// Ask the server for a fresh challenge.
    pub async fn fetch_challenge(&self) -> Result<i64> {
        let response = self.client.get(self.update_url()).send().await?;
        if response.status() != StatusCode::OK {
            return Err(ServerError::Http(format!(
                "challenge request: bad status {}",
                response.status()
            )));
        }

        let body = response.bytes().await?;
        let bytes: [u8; 8] = body.as_ref().try_into().map_err(|_| {
            ServerError::Http(format!("challenge must be 8 bytes, got {}", body.len()))
        })?;
        Ok(i64::from_le_bytes(bytes))
    }

    /// Seal `record` under `name` for `seed` and post it.
    pub async fn push(&self, seed: i64, name: &str, record: &ContentRecord) -> Result<()> {
        let body = envelope::encode(seed, &self.secret, record, name)?.to_json()?;

        let response = self
            .client
            .post(self.update_url())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::FORBIDDEN => Err(ServerError::NotAuthorized),
            status => Err(ServerError::Http(format!("update: bad status {status}"))),
        }
    }

    /// Fetch a challenge and push `record` against it.
    pub async fn publish(&self, name: &str, record: &ContentRecord) -> Result<()> {
        let seed = self.fetch_challenge().await?;
        self.push(seed, name, record).await?;
        tracing::info!(name, "record published");
        Ok(())
    }
}
