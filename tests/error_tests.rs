// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use subscription_harvester::error::AppError;

async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[test]
fn test_is_youtube_token_error_matches() {
    let err = AppError::YouTubeApi(AppError::YOUTUBE_TOKEN_ERROR.to_string());
    assert!(err.is_youtube_token_error());

    let err = AppError::YouTubeApi(format!("{} (HTTP 401)", AppError::YOUTUBE_TOKEN_ERROR));
    assert!(err.is_youtube_token_error());
}

#[test]
fn test_is_youtube_token_error_no_match() {
    let err = AppError::YouTubeApi("HTTP 500 Internal Server Error: oops".to_string());
    assert!(!err.is_youtube_token_error());

    let err = AppError::Spreadsheet(AppError::YOUTUBE_TOKEN_ERROR.to_string());
    assert!(!err.is_youtube_token_error());
}

#[tokio::test]
async fn test_authorization_error_is_client_error_with_details() {
    let (status, body) = render(AppError::Authorization("Missing authorization code".into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "authorization_error");
    assert_eq!(body["details"], "Missing authorization code");
}

#[tokio::test]
async fn test_upstream_errors_are_bad_gateway() {
    let (status, body) = render(AppError::YouTubeApi("HTTP 503: unavailable".into())).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "youtube_error");

    let (status, body) = render(AppError::Spreadsheet("HTTP 403: caller lacks permission".into())).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "spreadsheet_error");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_server_side_errors_hide_details() {
    let (status, body) = render(AppError::Configuration("GOOGLE_CLIENT_SECRET missing".into())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "configuration_error");
    assert!(body.get("details").is_none());

    let (status, body) = render(AppError::Internal(anyhow::anyhow!("boom"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal_error");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_rejected_youtube_credential_is_unauthorized() {
    let err = AppError::YouTubeApi(format!("{} (HTTP 401 Unauthorized)", AppError::YOUTUBE_TOKEN_ERROR));
    let (status, body) = render(err).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "youtube_error");
    assert!(body["details"].as_str().unwrap().ends_with("start again from /login"));
}
