//! HTTP artifact downloads.
//!
//! Fetches the raw bytes behind an item's `artifact_url`. Decoding the
//! bytes (image formats etc.) is left to the consumer; the artifact keeps
//! the `Content-Type` header so it can decide how.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use std::time::Duration;
use tracing::debug;

use crate::config::ArtifactsConfig;
use crate::error::ArtifactFetchError;
use crate::models::Artifact;
use crate::traits::ArtifactSource;

/// An [`ArtifactSource`] backed by `reqwest`.
pub struct HttpArtifactSource {
    client: reqwest::Client,
    max_bytes: Option<u64>,
}

impl HttpArtifactSource {
    pub fn new(config: &ArtifactsConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            max_bytes: config.max_bytes,
        })
    }

    fn check_size(&self, url: &str, size: u64) -> Result<(), ArtifactFetchError> {
        match self.max_bytes {
            Some(limit) if size > limit => Err(ArtifactFetchError::TooLarge {
                url: url.to_string(),
                size,
                limit,
            }),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ArtifactSource for HttpArtifactSource {
    async fn download(&self, url: &str) -> Result<Artifact, ArtifactFetchError> {
        let parsed =
            Url::parse(url).map_err(|_| ArtifactFetchError::InvalidUrl(url.to_string()))?;
        debug!(url = %parsed, "downloading artifact");

        let mut resp = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| ArtifactFetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ArtifactFetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // Reject early when the server announces the size
        if let Some(len) = resp.content_length() {
            self.check_size(url, len)?;
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        // Stop reading as soon as the cap is passed, whatever the headers said
        let mut body = Vec::new();
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| ArtifactFetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?
        {
            body.extend_from_slice(&chunk);
            self.check_size(url, body.len() as u64)?;
        }

        Ok(Artifact::new(body, content_type))
    }
}
