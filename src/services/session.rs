// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scoutbook session management.
//!
//! Holds the single bearer token for the configured account. The token is
//! refreshed proactively when it comes within the refresh buffer of its own
//! `exp` claim, and reactively when the executor sees a 401 and calls
//! [`SessionManager::invalidate`].

use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::services::executor::{PROVIDER_ORIGIN, PROVIDER_REFERER};
use crate::time_utils::{Clock, SystemClock};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use reqwest::header::{ACCEPT, ORIGIN, REFERER};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// An authenticated session. Replaced whole on refresh, never edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// Provider user ID of the authenticated account, when known
    pub subject_id: Option<String>,
}

impl Session {
    /// Whether `now` is inside the refresh buffer before expiry.
    pub fn needs_refresh(&self, now: DateTime<Utc>, buffer: Duration) -> bool {
        let Ok(buffer) = chrono::Duration::from_std(buffer) else {
            return true;
        };
        match self.expires_at.checked_sub_signed(buffer) {
            Some(deadline) => now >= deadline,
            None => true,
        }
    }
}

/// Body of the authenticate endpoint response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    token: Option<String>,
    account: Option<AuthAccount>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthAccount {
    user_id: Option<serde_json::Value>,
}

/// Claims we read from the provider's token. The signature is not ours to
/// verify; only the expiry and subject matter.
#[derive(Debug, Deserialize)]
struct TokenClaims {
    exp: i64,
    #[serde(default)]
    sub: Option<String>,
}

/// Owns the provider session for one credential set.
pub struct SessionManager {
    http: reqwest::Client,
    auth_url: String,
    username: String,
    password: String,
    refresh_buffer: Duration,
    clock: Arc<dyn Clock>,
    session: Mutex<Option<Session>>,
}

impl SessionManager {
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        Self {
            http,
            auth_url: config.auth_url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            refresh_buffer: config.session_refresh_buffer,
            clock: Arc::new(SystemClock),
            session: Mutex::new(None),
        }
    }

    /// Replace the clock (tests use a manually advanced one).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Return a token that is valid for at least the refresh buffer,
    /// authenticating first if needed.
    ///
    /// The session lock is held across authentication so concurrent callers
    /// wait for one login instead of each performing their own.
    ///
    /// A freshly granted session that already falls inside the refresh buffer
    /// is rejected with [`SyncError::Auth`] and not stored.
    pub async fn ensure_valid(&self) -> Result<String> {
        let mut current = self.session.lock().await;
        let now = self.clock.now();

        if let Some(session) = current.as_ref() {
            if !session.needs_refresh(now, self.refresh_buffer) {
                return Ok(session.token.clone());
            }
            tracing::info!(
                expires_at = %session.expires_at,
                "Session within refresh buffer, re-authenticating"
            );
        }

        let session = self.authenticate().await?;
        if session.needs_refresh(now, self.refresh_buffer) {
            tracing::error!(
                expires_at = %session.expires_at,
                "Provider granted a session shorter than the refresh buffer"
            );
            *current = None;
            return Err(SyncError::Auth(format!(
                "Session expires at {}, inside the {}s refresh buffer",
                session.expires_at,
                self.refresh_buffer.as_secs()
            )));
        }

        let token = session.token.clone();
        *current = Some(session);
        Ok(token)
    }

    /// Drop the current session so the next call re-authenticates.
    pub async fn invalidate(&self) {
        let mut current = self.session.lock().await;
        if current.take().is_some() {
            tracing::info!("Session invalidated");
        }
    }

    /// Snapshot of the current session, if any.
    pub async fn current(&self) -> Option<Session> {
        self.session.lock().await.clone()
    }

    /// Log in with the configured credentials.
    async fn authenticate(&self) -> Result<Session> {
        let url = format!(
            "{}/api/users/{}/authenticate",
            self.auth_url,
            urlencoding::encode(&self.username)
        );

        tracing::debug!(username = %self.username, "Authenticating with Scoutbook");

        let response = self
            .http
            .post(&url)
            .header(ACCEPT, "application/json")
            .header(ORIGIN, PROVIDER_ORIGIN)
            .header(REFERER, PROVIDER_REFERER)
            .json(&serde_json::json!({ "password": self.password }))
            .send()
            .await
            .map_err(|e| SyncError::Network(format!("Authentication request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, "Scoutbook authentication failed");
            return Err(SyncError::Auth(format!("HTTP {}: {}", status, body)));
        }

        let body: AuthResponse = response.json().await.map_err(|e| {
            SyncError::Auth(format!("Failed to parse authentication response: {}", e))
        })?;

        let token = body
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                SyncError::Auth("Authentication response did not include a token".to_string())
            })?;

        let claims = decode_claims(&token)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| SyncError::Auth(format!("Token expiry out of range: {}", claims.exp)))?;

        let subject_id = body
            .account
            .and_then(|a| a.user_id)
            .map(|id| match id {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .or(claims.sub);

        tracing::info!(
            expires_at = %expires_at,
            subject_id = subject_id.as_deref().unwrap_or("<unknown>"),
            "Authenticated with Scoutbook"
        );

        Ok(Session {
            token,
            expires_at,
            subject_id,
        })
    }
}

/// Read the claims of a provider token without verifying its signature.
fn decode_claims(token: &str) -> Result<TokenClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.set_required_spec_claims(&["exp"]);

    decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| SyncError::Auth(format!("Token has no readable expiry claim: {}", e)))
}
