// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth routes: login redirect and the harvesting callback.

use axum::{
    extract::{OriginalUri, State},
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;

use crate::error::Result;
use crate::services::oauth::STATE_MAX_AGE_MS;
use crate::services::HarvestReport;
use crate::AppState;

/// Path of the OAuth callback; also scopes the nonce cookie.
pub const CALLBACK_PATH: &str = "/oauth2callback";

/// Cookie binding a login's `state` nonce to the browser that started it.
pub const NONCE_COOKIE: &str = "harvest_oauth_nonce";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", get(login))
        .route(CALLBACK_PATH, get(oauth2callback))
}

/// Start OAuth flow - redirect to Google consent.
async fn login(State(state): State<Arc<AppState>>, jar: CookieJar) -> Result<Response> {
    let request = state.auth_flow.build_authorization_url()?;
    let secure = state.auth_flow.redirect_uri()?.starts_with("https://");

    let cookie = Cookie::build((NONCE_COOKIE, request.nonce))
        .path(CALLBACK_PATH)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::milliseconds(STATE_MAX_AGE_MS as i64));

    tracing::info!("Starting OAuth flow, redirecting to Google");

    Ok((
        StatusCode::FOUND,
        jar.add(cookie),
        [(header::LOCATION, request.url)],
    )
        .into_response())
}

/// OAuth callback - exchange the code, harvest subscriptions, report count.
async fn oauth2callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    OriginalUri(uri): OriginalUri,
) -> (CookieJar, Result<Html<String>>) {
    let nonce = jar.get(NONCE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(Cookie::build(NONCE_COOKIE).path(CALLBACK_PATH));

    let result = harvest_from_callback(&state, &uri, nonce.as_deref())
        .await
        .map(|report| Html(confirmation_page(report.saved)));

    (jar, result)
}

async fn harvest_from_callback(
    state: &AppState,
    uri: &Uri,
    nonce: Option<&str>,
) -> Result<HarvestReport> {
    let callback_url = state.auth_flow.callback_url(uri)?;
    let credential = state.auth_flow.exchange(&callback_url, nonce).await?;

    state.harvest_pipeline().run(&credential).await
}

fn confirmation_page(saved: usize) -> String {
    format!(
        "<h3>Thank you!</h3>\n\
         <p>Saved {} subscriptions.</p>\n\
         <p>You can close this window.</p>\n",
        saved
    )
}
