//! External risk classifier
//!
//! [`RiskClassifier`] is the seam the resolver talks to; [`HttpRiskClassifier`]
//! is the production implementation backed by the third-party HTTP API.

use crate::error::{Error, Result};
use crate::types::{RemoteRiskOutcome, RiskResolutionRequest};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, error};

/// Response bodies above this size are rejected
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Only this much of an error body is kept for diagnostics
const MAX_ERROR_BODY_BYTES: usize = 4 * 1024;

/// A single classification attempt against some external service
#[async_trait]
pub trait RiskClassifier: Send + Sync {
    /// Attempt to classify the transaction once.
    ///
    /// Implementations report connection problems as [`Error::Transport`] so
    /// the caller can tell them apart from bad payloads.
    async fn classify(&self, request: &RiskResolutionRequest) -> Result<RemoteRiskOutcome>;
}

/// HTTP client for the third-party risk API
#[derive(Debug, Clone)]
pub struct HttpRiskClassifier {
    base_url: String,
    client: Client,
}

impl HttpRiskClassifier {
    /// Create a client for `base_url`.
    ///
    /// `connect_timeout` only bounds connection setup; the overall attempt
    /// budget is enforced by the resolver.
    pub fn new(base_url: impl Into<String>, connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(base_url, client))
    }

    /// Create a client reusing an existing connection pool
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        HttpRiskClassifier { base_url, client }
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl RiskClassifier for HttpRiskClassifier {
    async fn classify(&self, request: &RiskResolutionRequest) -> Result<RemoteRiskOutcome> {
        let url = format!("{}/consultar", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!("Risk classifier request failed: {}", e);
                Error::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = read_capped(response, MAX_ERROR_BODY_BYTES)
                .await
                .map(|(bytes, _)| String::from_utf8_lossy(&bytes).into_owned())
                .unwrap_or_default();
            return Err(Error::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        if let Some(len) = response.content_length() {
            if len > MAX_BODY_BYTES as u64 {
                return Err(Error::InvalidResponse(format!(
                    "Response body too large: {} bytes",
                    len
                )));
            }
        }

        let (body, truncated) = read_capped(response, MAX_BODY_BYTES).await?;
        if truncated {
            return Err(Error::InvalidResponse(format!(
                "Response body too large: over {} bytes",
                MAX_BODY_BYTES
            )));
        }

        let outcome = serde_json::from_slice::<RemoteRiskOutcome>(&body)
            .map_err(|e| Error::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        debug!(
            "Risk classifier answered {} (score: {:?})",
            outcome.tier, outcome.raw_score
        );

        Ok(outcome)
    }
}

/// Read at most `limit` bytes of the body, chunk by chunk.
///
/// The flag is set when the body had more than `limit` bytes; reading stops
/// there and the rest is never buffered.
async fn read_capped(mut response: Response, limit: usize) -> Result<(Vec<u8>, bool)> {
    let mut body = Vec::new();

    while let Some(chunk) = response.chunk().await.map_err(Error::from)? {
        let room = limit - body.len();
        if chunk.len() > room {
            body.extend_from_slice(&chunk[..room]);
            return Ok((body, true));
        }
        body.extend_from_slice(&chunk);
    }

    Ok((body, false))
}
