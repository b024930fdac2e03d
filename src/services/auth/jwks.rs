//! JSON Web Key Set retrieval.
//!
//! `KeySetSource` is the seam between the authorizer and wherever the keys
//! come from. Production uses [`HttpKeySetSource`], which GETs the identity
//! provider's `/.well-known/jwks.json` with a per-attempt timeout and bounded
//! exponential backoff on transient failures.
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{StatusCode, header};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// One published signing key. Only the RSA public components are used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningKey {
    #[serde(default)]
    pub kid: String,
    #[serde(default)]
    pub kty: String,
    #[serde(rename = "use", default)]
    pub key_use: String,
    #[serde(default)]
    pub n: String,
    #[serde(default)]
    pub e: String,
}

/// `{"keys": [...]}` as published by the identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonWebKeySet {
    pub keys: Vec<SigningKey>,
}

impl JsonWebKeySet {
    pub fn find(&self, kid: &str) -> Option<&SigningKey> {
        if kid.is_empty() {
            return None;
        }
        self.keys.iter().find(|k| k.kid == kid)
    }
}

#[derive(Debug, Clone, Error)]
pub enum KeySetError {
    #[error("key set request failed: {0}")]
    Transport(String),
    #[error("key set endpoint answered {0}")]
    Status(StatusCode),
    #[error("key set document is malformed: {0}")]
    Malformed(String),
}

impl KeySetError {
    /// Worth another attempt: network trouble or a 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status(status) => status.is_server_error(),
            Self::Malformed(_) => false,
        }
    }
}

#[async_trait]
pub trait KeySetSource: Send + Sync + 'static {
    // Where the keys come from (for logging).
    fn describe(&self) -> String;

    async fn fetch(&self) -> Result<JsonWebKeySet, KeySetError>;
}

/// Bounded exponential backoff between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts in total, including the first one.
    pub attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Backoff to wait after the given (1-based) failed attempt.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

#[derive(Debug, Clone)]
pub struct HttpKeySetSource {
    client: reqwest::Client,
    url: Url,
    retry: RetryPolicy,
}

impl HttpKeySetSource {
    pub fn new(url: Url, timeout: Duration, retry: RetryPolicy) -> Result<Self, KeySetError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KeySetError::Transport(e.to_string()))?;

        Ok(Self { client, url, retry })
    }

    async fn fetch_once(&self) -> Result<JsonWebKeySet, KeySetError> {
        let resp = self
            .client
            .get(self.url.clone())
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| KeySetError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(KeySetError::Status(status));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| KeySetError::Transport(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| KeySetError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl KeySetSource for HttpKeySetSource {
    fn describe(&self) -> String {
        self.url.to_string()
    }

    async fn fetch(&self) -> Result<JsonWebKeySet, KeySetError> {
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.fetch_once().await {
                Ok(set) => return Ok(set),
                Err(err) if err.is_transient() && attempt < attempts => {
                    let wait = self.retry.backoff(attempt);
                    tracing::warn!(
                        url = %self.url,
                        attempt,
                        wait_ms = wait.as_millis() as u64,
                        error = %err,
                        "key set fetch failed, retrying"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
