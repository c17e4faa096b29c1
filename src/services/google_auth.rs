// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Service-account access tokens for Google APIs.
//!
//! Tokens are minted with the JWT-bearer grant: an RS256 assertion signed
//! with the service account's private key is exchanged at the key's token
//! URI. The resulting access token is cached until shortly before expiry.

use crate::config::{ConfigError, GOOGLE_TOKEN_URI};
use crate::error::AppError;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::Mutex;

/// Scopes needed to find a spreadsheet by name and append to it.
pub const SHEETS_SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];

const DEFAULT_SERVICE_ACCOUNT_FILE: &str = "service_account.json";

/// Lifetime requested for each assertion (Google's maximum).
const ASSERTION_LIFETIME_SECS: i64 = 60 * 60;

/// Margin before expiry when a cached token is replaced.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// The fields of a service-account key file this service uses.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Invalid {
            name: "service account key",
            reason: e.to_string(),
        })
    }

    /// Load the key from `GOOGLE_SERVICE_ACCOUNT_JSON`, falling back to the
    /// file named by `GOOGLE_SERVICE_ACCOUNT_FILE` (default
    /// `service_account.json`).
    pub fn load(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(json) = lookup("GOOGLE_SERVICE_ACCOUNT_JSON").filter(|v| !v.trim().is_empty())
        {
            return Self::from_json(&json);
        }

        let path = lookup("GOOGLE_SERVICE_ACCOUNT_FILE")
            .unwrap_or_else(|| DEFAULT_SERVICE_ACCOUNT_FILE.to_string());
        if !Path::new(&path).exists() {
            return Err(ConfigError::Missing("GOOGLE_SERVICE_ACCOUNT_JSON"));
        }

        tracing::info!(path = %path, "Loading service account key from file");
        Self::from_json(&std::fs::read_to_string(&path)?)
    }
}

/// JWT-bearer assertion claims.
#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Access-token provider for one service account and scope set.
pub struct ServiceAccountTokenSource {
    http: reqwest::Client,
    client_email: String,
    token_uri: String,
    scope: String,
    signing_key: EncodingKey,
    /// Held across a refresh so concurrent callers share one token request.
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokenSource {
    /// Parse the key's PEM up front so a bad key fails at startup.
    pub fn new(key: &ServiceAccountKey, scopes: &[&str]) -> Result<Self, ConfigError> {
        let signing_key =
            EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|e| {
                ConfigError::Invalid {
                    name: "service account private key",
                    reason: e.to_string(),
                }
            })?;

        Ok(Self {
            http: reqwest::Client::new(),
            client_email: key.client_email.clone(),
            token_uri: key.token_uri.clone(),
            scope: scopes.join(" "),
            signing_key,
            cached: Mutex::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    /// A valid access token, minting a new one when the cache is stale.
    pub async fn access_token(&self) -> Result<String, AppError> {
        let margin = Duration::seconds(TOKEN_REFRESH_MARGIN_SECS);
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if Utc::now() + margin < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }

        let token = self.fetch_token().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);

        tracing::debug!(client_email = %self.client_email, "Service account token refreshed");
        Ok(access_token)
    }

    async fn fetch_token(&self) -> Result<CachedToken, AppError> {
        let now = Utc::now();
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: &self.scope,
            aud: &self.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };

        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT signing failed: {}", e)))?;

        let response = self
            .http
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| AppError::Spreadsheet(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Service account token request rejected");
            return Err(AppError::Spreadsheet(format!(
                "Service account token request failed with status {}",
                status
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Spreadsheet(format!("Failed to parse token response: {}", e)))?;

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        })
    }
}
