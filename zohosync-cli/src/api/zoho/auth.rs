//! Zoho OAuth token handling
//!
//! Access tokens come from the refresh-token grant and live for about an
//! hour; the manager caches the current token and refreshes it a minute
//! before expiry.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::sync::error::SyncError;

/// Refresh this many seconds before the reported expiry
const EXPIRY_SKEW_SECS: i64 = 60;

pub struct ZohoAuth {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    token_url: String,
    cached: Mutex<Option<CachedToken>>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    error: Option<String>,
}

impl ZohoAuth {
    pub fn new(
        http: reqwest::Client,
        client_id: String,
        client_secret: String,
        refresh_token: String,
        region: &str,
    ) -> Self {
        Self {
            http,
            client_id,
            client_secret,
            refresh_token,
            token_url: format!("https://accounts.zoho.{}/oauth/v2/token", region),
            cached: Mutex::new(None),
        }
    }

    /// Current access token, refreshing through the token endpoint when
    /// the cached one is missing or about to expire
    pub async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Utc::now() < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }

        log::info!("refreshing Zoho access token");
        let response = self
            .http
            .post(&self.token_url)
            .query(&[
                ("refresh_token", self.refresh_token.as_str()),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .context("Zoho token endpoint unreachable")?;

        let body: TokenResponse = response
            .json()
            .await
            .context("malformed Zoho token response")?;

        if let Some(error) = body.error {
            return Err(SyncError::Auth {
                system: "Zoho".to_string(),
                reason: format!("token refresh rejected: {}", error),
            }
            .into());
        }
        let access_token = body.access_token.ok_or_else(|| SyncError::Auth {
            system: "Zoho".to_string(),
            reason: "token response carried no access_token".to_string(),
        })?;

        let ttl = body.expires_in.unwrap_or(3600) - EXPIRY_SKEW_SECS;
        *cached = Some(CachedToken {
            access_token: access_token.clone(),
            expires_at: Utc::now() + TimeDelta::seconds(ttl.max(0)),
        });
        Ok(access_token)
    }
}
