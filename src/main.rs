// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Subscription Harvester API Server
//!
//! Lets visitors authorize read-only YouTube access and appends their
//! anonymized subscription lists to a shared research spreadsheet.

use std::sync::Arc;
use subscription_harvester::{
    config::Config,
    services::{
        google_auth::SHEETS_SCOPES, AuthorizationFlow, ServiceAccountKey,
        ServiceAccountTokenSource, SheetsClient, YouTubeClient,
    },
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Subscription Harvester");

    // Spreadsheet access via service account
    let key = ServiceAccountKey::load(|name| std::env::var(name).ok())
        .expect("Failed to load service account key");
    let tokens = ServiceAccountTokenSource::new(&key, &SHEETS_SCOPES)
        .expect("Failed to initialize service account credentials");

    let sheet = SheetsClient::open(tokens, &config.spreadsheet)
        .await
        .expect("Failed to open spreadsheet");
    tracing::info!(
        spreadsheet_id = %sheet.spreadsheet_id(),
        worksheet = %sheet.worksheet_title(),
        "Harvested rows will be appended here"
    );

    let auth_flow = AuthorizationFlow::from_config(&config);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        auth_flow,
        youtube: Arc::new(YouTubeClient::new()),
        sheet: Arc::new(sheet),
    });

    // Build router
    let app = subscription_harvester::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("subscription_harvester=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
