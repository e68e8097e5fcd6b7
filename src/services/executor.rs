// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Resilient request execution against the Scoutbook API.
//!
//! Every call goes through the same pipeline:
//! - a valid session token from [`SessionManager`]
//! - a slot from the shared [`RateLimiter`]
//! - the HTTP call with the headers the provider insists on
//! - retry with exponential backoff for network failures and 429s
//! - a single forced re-authentication on 401

use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::services::rate_limit::RateLimiter;
use crate::services::session::SessionManager;
use reqwest::header::{ACCEPT, ORIGIN, REFERER};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// Origin the provider requires on API calls.
pub const PROVIDER_ORIGIN: &str = "https://advancements.scouting.org";
/// Referer the provider requires on API calls.
pub const PROVIDER_REFERER: &str = "https://advancements.scouting.org/";
/// Versioned Accept header for the v2 API.
pub const PROVIDER_ACCEPT: &str = "application/json; version=2";

/// Retry budget and backoff base for one logical call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries shared by network failures and 429s
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.retry_base_delay,
        }
    }

    /// Delay before retry number `attempt + 1`: `base * 2^attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .checked_mul(2u32.saturating_pow(attempt))
            .unwrap_or(Duration::MAX)
    }

    /// Backoff to sleep before retrying, or `None` once the budget is spent.
    fn next_retry(&self, attempt: u32) -> Option<Duration> {
        (attempt < self.max_retries).then(|| self.backoff(attempt))
    }
}

/// Executes authenticated, rate-limited, retried requests.
pub struct RequestExecutor {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionManager>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
}

impl RequestExecutor {
    pub fn new(
        config: &Config,
        http: reqwest::Client,
        session: Arc<SessionManager>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            http,
            base_url: config.api_url.clone(),
            session,
            limiter,
            retry: RetryPolicy::from_config(config),
        }
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// GET `path` and decode the JSON body.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::GET, path, None).await
    }

    /// POST a JSON body to `path` and decode the JSON response.
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        self.request(Method::POST, path, Some(body)).await
    }

    /// Issue one logical request, retrying per [`RetryPolicy`].
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt: u32 = 0;
        let mut reauthenticated = false;

        loop {
            // Fresh check every attempt; a retry may straddle the refresh buffer.
            let token = self.session.ensure_valid().await?;
            self.limiter.wait().await;

            let mut builder = self
                .http
                .request(method.clone(), &url)
                .bearer_auth(&token)
                .header(ACCEPT, PROVIDER_ACCEPT)
                .header(ORIGIN, PROVIDER_ORIGIN)
                .header(REFERER, PROVIDER_REFERER);
            if let Some(body) = body {
                builder = builder.json(body);
            }

            tracing::debug!(%method, path, attempt, "Sending Scoutbook request");

            let outcome = match builder.send().await {
                Err(e) => Err(SyncError::Network(format!("{} {}: {}", method, path, e))),
                Ok(response) if response.status() == StatusCode::UNAUTHORIZED => {
                    if reauthenticated {
                        tracing::error!(%method, path, "Still unauthorized after re-authentication");
                        return Err(SyncError::Unauthorized {
                            path: path.to_string(),
                        });
                    }
                    tracing::warn!(%method, path, "Unauthorized, forcing re-authentication");
                    self.session.invalidate().await;
                    reauthenticated = true;
                    continue;
                }
                Ok(response) => Self::read_response(response, &method, path, attempt).await,
            };

            let error = match outcome {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            match self.retry.next_retry(attempt) {
                Some(backoff) if error.is_transient() => {
                    tracing::warn!(
                        %method,
                        path,
                        attempt = attempt + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %error,
                        "Transient Scoutbook failure, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                _ => return Err(error),
            }
        }
    }

    /// Map a non-401 response to a decoded body or an error.
    async fn read_response<T: DeserializeOwned>(
        response: reqwest::Response,
        method: &Method,
        path: &str,
        attempt: u32,
    ) -> Result<T> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SyncError::RateLimited {
                path: path.to_string(),
                attempts: attempt + 1,
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%method, path, status = status.as_u16(), "Scoutbook request failed");
            return Err(SyncError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SyncError::Network(format!("{} {}: {}", method, path, e)))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| SyncError::Decode(format!("{} {}: {}", method, path, e)))
    }
}
