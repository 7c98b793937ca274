//! Authentication state for the compression service.
//!
//! One session is shared by every compression attempt for the life of the
//! process. The cached token lives behind an async mutex that stays locked
//! while a refresh is in flight, so concurrent callers wait for that refresh
//! instead of signing in again.

use super::types::{AuthRequest, AuthResponse};
use crate::config::CompressionConfig;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

/// How long an issued token is trusted. No early-refresh margin.
pub const CREDENTIAL_LIFETIME: Duration = Duration::from_secs(2 * 60 * 60);

/// A bearer token and the moment it stops being trusted.
#[derive(Clone, PartialEq, Eq)]
pub struct CompressionCredential {
    token: String,
    expires_at_ms: u64,
}

impl CompressionCredential {
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at_ms(&self) -> u64 {
        self.expires_at_ms
    }

    pub fn is_valid_at(&self, now_ms: u64) -> bool {
        now_ms < self.expires_at_ms
    }
}

impl std::fmt::Debug for CompressionCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompressionCredential")
            .field("token", &"<redacted>")
            .field("expires_at_ms", &self.expires_at_ms)
            .finish()
    }
}

pub struct CompressionSession {
    http: reqwest::Client,
    auth_url: String,
    public_key: Option<String>,
    credential: Mutex<Option<CompressionCredential>>,
}

impl CompressionSession {
    pub fn new(http: reqwest::Client, config: &CompressionConfig) -> Self {
        Self {
            http,
            auth_url: config.auth_url.clone(),
            public_key: config.public_key.clone(),
            credential: Mutex::new(None),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.public_key.is_some()
    }

    /// Returns the cached credential, signing in first if it is missing or
    /// expired.
    pub async fn get_credential(&self) -> Result<CompressionCredential, AuthError> {
        let public_key = self.public_key.as_deref().ok_or(AuthError::NotConfigured)?;

        let mut cached = self.credential.lock().await;
        if let Some(credential) = cached.as_ref() {
            if credential.is_valid_at(now_ms()) {
                return Ok(credential.clone());
            }
            log::info!("[AUTH] Cached token expired — refreshing");
        }

        let credential = self.authenticate(public_key).await?;
        *cached = Some(credential.clone());
        Ok(credential)
    }

    async fn authenticate(&self, public_key: &str) -> Result<CompressionCredential, AuthError> {
        let start = std::time::Instant::now();

        let response = self
            .http
            .post(&self.auth_url)
            .json(&AuthRequest { public_key })
            .send()
            .await
            .map_err(|e| AuthError::Request {
                status: e.status().map(|s| s.as_u16()),
                body: None,
                reason: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| AuthError::Request {
            status: Some(status.as_u16()),
            body: None,
            reason: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(AuthError::Request {
                status: Some(status.as_u16()),
                reason: format!("HTTP {}", status),
                body: Some(body),
            });
        }

        let token = serde_json::from_str::<AuthResponse>(&body)
            .ok()
            .and_then(|parsed| parsed.token)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AuthError::Request {
                status: Some(status.as_u16()),
                reason: "response contained no token".to_string(),
                body: Some(body),
            })?;

        log::info!("[AUTH] Token issued in {}ms", start.elapsed().as_millis());

        Ok(CompressionCredential {
            token,
            expires_at_ms: now_ms() + CREDENTIAL_LIFETIME.as_millis() as u64,
        })
    }

    #[cfg(test)]
    async fn expire_cached(&self) {
        if let Some(credential) = self.credential.lock().await.as_mut() {
            credential.expires_at_ms = 0;
        }
    }
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AuthError {
    #[error("No compression API key configured")]
    NotConfigured,

    #[error("Authentication request failed: {reason}")]
    Request {
        status: Option<u16>,
        body: Option<String>,
        reason: String,
    },
}
