// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth authorization-code flow.
//!
//! Handles:
//! - Authorization URL construction (offline access, forced consent)
//! - Signed `state` parameter bound to a per-login nonce
//! - Exchange of the callback URL for a short-lived credential

use crate::config::{Config, OAuthClientConfig};
use crate::error::AppError;
use axum::http::Uri;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use reqwest::Url;
use ring::rand::{SecureRandom, SystemRandom};
use serde::Deserialize;
use sha2::Sha256;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

/// Read-only access to the user's YouTube account.
pub const YOUTUBE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/youtube.readonly";

/// How long a login may take between `/login` and the callback.
pub const STATE_MAX_AGE_MS: u128 = 10 * 60 * 1000;

/// Tolerated clock drift for states stamped slightly in the future.
const STATE_CLOCK_SKEW_MS: u128 = 60 * 1000;

/// Access/refresh token pair obtained from the authorization exchange.
///
/// Lives only for the duration of the callback request.
#[derive(Clone)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds, if the provider said.
    pub expires_in: Option<u64>,
    /// Scopes the credential is bound to.
    pub scopes: Vec<String>,
}

impl Credential {
    /// Credential carrying only an access token (tests and tooling).
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_in: None,
            scopes: vec![YOUTUBE_READONLY_SCOPE.to_string()],
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_in", &self.expires_in)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// A freshly built authorization redirect.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// Provider consent URL to redirect the browser to.
    pub url: String,
    /// Nonce embedded in `state`; the caller binds it to the browser.
    pub nonce: String,
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    scope: Option<String>,
}

/// Authorization flow for one OAuth web client and scope set.
#[derive(Clone)]
pub struct AuthorizationFlow {
    http: reqwest::Client,
    client: Option<OAuthClientConfig>,
    scopes: Vec<String>,
    state_key: Vec<u8>,
}

impl AuthorizationFlow {
    pub fn new(client: Option<OAuthClientConfig>, scopes: Vec<String>, state_key: Vec<u8>) -> Self {
        Self {
            http: reqwest::Client::new(),
            client,
            scopes,
            state_key,
        }
    }

    /// Flow requesting read-only YouTube access, configured from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.oauth_client.clone(),
            vec![YOUTUBE_READONLY_SCOPE.to_string()],
            config.oauth_state_key.clone(),
        )
    }

    fn client(&self) -> Result<&OAuthClientConfig, AppError> {
        self.client.as_ref().ok_or_else(|| {
            AppError::Configuration(
                "OAuth client is not configured (set GOOGLE_CLIENT_ID, GOOGLE_CLIENT_SECRET \
                 and GOOGLE_REDIRECT_URI, or provide a client secrets file)"
                    .to_string(),
            )
        })
    }

    /// The registered callback address.
    pub fn redirect_uri(&self) -> Result<&str, AppError> {
        Ok(&self.client()?.redirect_uri)
    }

    /// Build the consent URL for this flow's scopes and redirect URI.
    ///
    /// Requests offline access, forces the consent prompt every time and asks
    /// for previously granted scopes to be kept.
    pub fn build_authorization_url(&self) -> Result<AuthorizationRequest, AppError> {
        let client = self.client()?;

        let nonce = random_nonce()?;
        let state = sign_state(&nonce, now_millis()?, &self.state_key)?;

        let url = format!(
            "{}?\
             response_type=code&\
             client_id={}&\
             redirect_uri={}&\
             scope={}&\
             access_type=offline&\
             include_granted_scopes=true&\
             prompt=consent&\
             state={}",
            client.auth_uri,
            urlencoding::encode(&client.client_id),
            urlencoding::encode(&client.redirect_uri),
            urlencoding::encode(&self.scopes.join(" ")),
            state
        );

        Ok(AuthorizationRequest { url, nonce })
    }

    /// Reconstruct the absolute callback URL from the request URI the
    /// server received (path and query only).
    pub fn callback_url(&self, request_uri: &Uri) -> Result<String, AppError> {
        let base = Url::parse(self.redirect_uri()?).map_err(|e| {
            AppError::Configuration(format!("Invalid GOOGLE_REDIRECT_URI: {}", e))
        })?;

        let path_and_query = request_uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        base.join(path_and_query)
            .map(|url| url.to_string())
            .map_err(|e| AppError::BadRequest(format!("Invalid callback URI: {}", e)))
    }

    /// Exchange the full callback URL (with provider query parameters) for a
    /// credential.
    ///
    /// `expected_nonce` is the nonce bound to the browser at login; the
    /// `state` parameter must carry it, be correctly signed and be fresh.
    pub async fn exchange(
        &self,
        callback_url: &str,
        expected_nonce: Option<&str>,
    ) -> Result<Credential, AppError> {
        let client = self.client()?;

        let url = Url::parse(callback_url)
            .map_err(|e| AppError::Authorization(format!("Malformed callback URL: {}", e)))?;
        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();

        if let Some(error) = params.get("error") {
            tracing::warn!(error = %error, "OAuth error from provider");
            return Err(AppError::Authorization(format!(
                "Provider returned error: {}",
                error
            )));
        }

        let state = params
            .get("state")
            .ok_or_else(|| AppError::Authorization("Missing state parameter".to_string()))?;
        let nonce = verify_state(state, &self.state_key, now_millis()?)
            .ok_or_else(|| AppError::Authorization("Invalid or expired state".to_string()))?;
        if expected_nonce != Some(nonce.as_str()) {
            tracing::warn!("OAuth state nonce does not match the login cookie");
            return Err(AppError::Authorization(
                "Login session mismatch; start again from /login".to_string(),
            ));
        }

        let code = params
            .get("code")
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AppError::Authorization("Missing authorization code".to_string()))?;

        tracing::info!("Exchanging authorization code for tokens");

        let response = self
            .http
            .post(&client.token_uri)
            .form(&[
                ("code", code.as_str()),
                ("client_id", client.client_id.as_str()),
                ("client_secret", client.client_secret.as_str()),
                ("redirect_uri", client.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Token exchange failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "Token exchange rejected");
            if status.is_client_error() {
                return Err(AppError::Authorization(format!(
                    "Token exchange failed with status {}",
                    status
                )));
            }
            return Err(AppError::Internal(anyhow::anyhow!(
                "Token endpoint returned status {}",
                status
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to parse token response: {}", e))
            })?;

        let scopes = match token.scope {
            Some(scope) => scope.split_whitespace().map(str::to_string).collect(),
            None => self.scopes.clone(),
        };

        Ok(Credential {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_in: token.expires_in,
            scopes,
        })
    }
}

fn random_nonce() -> Result<String, AppError> {
    let mut bytes = [0u8; 16];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System random source unavailable")))?;
    Ok(hex::encode(bytes))
}

fn now_millis() -> Result<u128, AppError> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis())
}

/// Encode `nonce|timestamp_hex|signature_hex` as URL-safe base64.
pub fn sign_state(nonce: &str, timestamp_ms: u128, key: &[u8]) -> Result<String, AppError> {
    let payload = format!("{}|{:x}", nonce, timestamp_ms);

    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = mac.finalize().into_bytes();

    let signed = format!("{}|{}", payload, hex::encode(signature));
    Ok(URL_SAFE_NO_PAD.encode(signed.as_bytes()))
}

/// Verify a state produced by [`sign_state`] and return its nonce.
pub fn verify_state(state: &str, key: &[u8], now_ms: u128) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    let parts: Vec<&str> = state_str.splitn(3, '|').collect();
    let [nonce, timestamp_hex, signature_hex] = parts.as_slice() else {
        return None;
    };

    let payload = format!("{}|{}", nonce, timestamp_hex);
    let signature = hex::decode(signature_hex).ok()?;

    let mut mac = HmacSha256::new_from_slice(key).ok()?;
    mac.update(payload.as_bytes());
    if mac.verify_slice(&signature).is_err() {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    let issued_at = u128::from_str_radix(timestamp_hex, 16).ok()?;
    if issued_at > now_ms + STATE_CLOCK_SKEW_MS || now_ms.saturating_sub(issued_at) > STATE_MAX_AGE_MS
    {
        tracing::warn!("OAuth state expired");
        return None;
    }

    Some(nonce.to_string())
}
