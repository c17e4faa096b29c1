// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! The OAuth web client is assembled in memory, either from a client-secrets
//! JSON file (when one is present) or from individual environment variables.
//! Nothing is ever written back to disk.

use ring::rand::{SecureRandom, SystemRandom};
use serde::Deserialize;
use std::env;
use std::path::Path;

/// Google's OAuth authorization endpoint.
pub const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
/// Google's OAuth token endpoint.
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const DEFAULT_CLIENT_SECRETS_FILE: &str = "client_secret_web.json";
const DEFAULT_SHEET_NAME: &str = "All_subscriptions";

/// OAuth web-client configuration used by the authorization flow.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_uri: String,
    pub token_uri: String,
}

impl std::fmt::Debug for OAuthClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("auth_uri", &self.auth_uri)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

/// Layout of a Google "web application" client-secrets download.
#[derive(Deserialize)]
struct ClientSecretsFile {
    web: WebClientSecrets,
}

#[derive(Deserialize)]
struct WebClientSecrets {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
    auth_uri: Option<String>,
    token_uri: Option<String>,
}

impl OAuthClientConfig {
    /// Assemble the client from `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`
    /// and `GOOGLE_REDIRECT_URI`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        Ok(Self {
            client_id: get("GOOGLE_CLIENT_ID")?,
            client_secret: get("GOOGLE_CLIENT_SECRET")?,
            redirect_uri: get("GOOGLE_REDIRECT_URI")?,
            auth_uri: GOOGLE_AUTH_URI.to_string(),
            token_uri: GOOGLE_TOKEN_URI.to_string(),
        })
    }

    /// Read a client-secrets JSON file. `redirect_override` (normally
    /// `GOOGLE_REDIRECT_URI`) wins over the file's first redirect URI.
    pub fn from_file(path: &Path, redirect_override: Option<String>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let parsed: ClientSecretsFile =
            serde_json::from_str(&raw).map_err(|e| ConfigError::Invalid {
                name: "client secrets file",
                reason: e.to_string(),
            })?;
        let web = parsed.web;

        let redirect_uri = redirect_override
            .filter(|v| !v.trim().is_empty())
            .or_else(|| web.redirect_uris.into_iter().next())
            .ok_or(ConfigError::Missing("GOOGLE_REDIRECT_URI"))?;

        Ok(Self {
            client_id: web.client_id,
            client_secret: web.client_secret,
            redirect_uri,
            auth_uri: web.auth_uri.unwrap_or_else(|| GOOGLE_AUTH_URI.to_string()),
            token_uri: web.token_uri.unwrap_or_else(|| GOOGLE_TOKEN_URI.to_string()),
        })
    }

    /// Load the client, preferring a client-secrets file when one exists.
    pub fn load(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let path = lookup("GOOGLE_CLIENT_SECRETS_FILE")
            .unwrap_or_else(|| DEFAULT_CLIENT_SECRETS_FILE.to_string());
        let path = Path::new(&path);

        if path.exists() {
            tracing::info!(path = %path.display(), "Using OAuth client secrets file");
            return Self::from_file(path, lookup("GOOGLE_REDIRECT_URI"));
        }

        Self::from_lookup(lookup)
    }
}

/// Which spreadsheet receives the harvested rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpreadsheetTarget {
    /// Spreadsheet id, used as is.
    Id(String),
    /// Spreadsheet name, resolved through Drive at startup.
    Name(String),
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// OAuth web client; `None` when neither env vars nor file are usable.
    /// Authorization routes report a configuration error in that case.
    pub oauth_client: Option<OAuthClientConfig>,
    /// Target spreadsheet
    pub spreadsheet: SpreadsheetTarget,
    /// HMAC key for the OAuth state parameter (raw bytes)
    pub oauth_state_key: Vec<u8>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            port: 8080,
            oauth_client: Some(OAuthClientConfig {
                client_id: "test_client_id".to_string(),
                client_secret: "test_secret".to_string(),
                redirect_uri: "http://localhost:8080/oauth2callback".to_string(),
                auth_uri: GOOGLE_AUTH_URI.to_string(),
                token_uri: GOOGLE_TOKEN_URI.to_string(),
            }),
            spreadsheet: SpreadsheetTarget::Name(DEFAULT_SHEET_NAME.to_string()),
            oauth_state_key: b"test_state_key_32_bytes_minimum!".to_vec(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let oauth_client = match OAuthClientConfig::load(&lookup) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "OAuth client is not configured; login will fail");
                None
            }
        };

        let spreadsheet = match lookup("SPREADSHEET_ID").filter(|v| !v.trim().is_empty()) {
            Some(id) => SpreadsheetTarget::Id(id.trim().to_string()),
            None => SpreadsheetTarget::Name(
                lookup("SHEET_NAME").unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string()),
            ),
        };

        let oauth_state_key = match lookup("OAUTH_STATE_KEY").filter(|v| !v.is_empty()) {
            Some(key) => key.into_bytes(),
            None => {
                tracing::warn!(
                    "OAUTH_STATE_KEY not set; using a per-process random key \
                     (logins started on another instance will be rejected)"
                );
                random_key()?
            }
        };

        Ok(Self {
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            oauth_client,
            spreadsheet,
            oauth_state_key,
        })
    }
}

fn random_key() -> Result<Vec<u8>, ConfigError> {
    let mut key = vec![0u8; 32];
    SystemRandom::new()
        .fill(&mut key)
        .map_err(|_| ConfigError::Invalid {
            name: "OAUTH_STATE_KEY",
            reason: "system random source unavailable".to_string(),
        })?;
    Ok(key)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
}
