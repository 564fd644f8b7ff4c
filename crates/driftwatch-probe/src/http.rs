//! HTTP identity probe.

use std::time::Duration;

use driftwatch_core::Identity;
use reqwest::header::ACCEPT;

use crate::error::{MalformedResponseError, ProbeError};
use crate::payload::parse_identity;
use crate::probe::IdentityProbe;

/// Default per-request timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Largest identity body accepted. Anything bigger is not an identity.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Probes `GET <url>` and expects `{"version": .., "instanceId": ..}`.
#[derive(Debug, Clone)]
pub struct HttpIdentityProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpIdentityProbe {
    pub fn new(url: impl Into<String>) -> Result<Self, ProbeError> {
        Self::with_timeout(url, DEFAULT_PROBE_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProbeError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl IdentityProbe for HttpIdentityProbe {
    async fn probe(&self) -> Result<Identity, ProbeError> {
        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ProbeError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status(status.as_u16()));
        }

        let body = read_capped(response, MAX_BODY_BYTES).await?;
        let identity = parse_identity(&body)?;
        tracing::trace!(%identity, url = %self.url, "identity probed");
        Ok(identity)
    }
}

/// Read the body chunk by chunk, giving up as soon as it passes `limit`.
async fn read_capped(mut response: reqwest::Response, limit: usize) -> Result<Vec<u8>, ProbeError> {
    if response
        .content_length()
        .is_some_and(|len| len > limit as u64)
    {
        return Err(MalformedResponseError::TooLarge(limit).into());
    }
    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| ProbeError::Transport(e.to_string()))?
    {
        if body.len() + chunk.len() > limit {
            return Err(MalformedResponseError::TooLarge(limit).into());
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}
