// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use subscription_harvester::config::{Config, OAuthClientConfig};
use subscription_harvester::error::AppError;
use subscription_harvester::routes::create_router;
use subscription_harvester::services::youtube::{SubscribedChannel, SubscriptionPage};
use subscription_harvester::services::{
    AuthorizationFlow, Credential, InMemorySheet, SubscriptionSource,
};
use subscription_harvester::AppState;

/// Scripted YouTube account: an optional channel and a fixed list of pages.
#[allow(dead_code)]
#[derive(Default)]
pub struct FakeYouTube {
    pub channel_id: Option<String>,
    pub pages: Vec<Vec<SubscribedChannel>>,
    /// Zero-based page index that fails instead of returning.
    pub fail_on_page: Option<usize>,
    /// Error returned by the channel lookup instead of the channel.
    pub identity_error: Option<String>,
    /// Page tokens received, in call order.
    pub requested_tokens: Mutex<Vec<Option<String>>>,
}

#[allow(dead_code)]
impl FakeYouTube {
    pub fn new(channel_id: Option<&str>, pages: Vec<Vec<SubscribedChannel>>) -> Self {
        Self {
            channel_id: channel_id.map(str::to_string),
            pages,
            ..Default::default()
        }
    }

    /// Account with `sizes[i]` subscriptions on page `i`.
    pub fn with_page_sizes(channel_id: Option<&str>, sizes: &[usize]) -> Self {
        let mut next = 0;
        let pages = sizes
            .iter()
            .map(|&size| {
                let page: Vec<SubscribedChannel> = (next..next + size).map(channel).collect();
                next += size;
                page
            })
            .collect();
        Self::new(channel_id, pages)
    }

    pub fn requested_tokens(&self) -> Vec<Option<String>> {
        self.requested_tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubscriptionSource for FakeYouTube {
    async fn my_channel_id(&self, _credential: &Credential) -> Result<Option<String>, AppError> {
        if let Some(message) = &self.identity_error {
            return Err(AppError::YouTubeApi(message.clone()));
        }
        Ok(self.channel_id.clone())
    }

    async fn subscriptions_page(
        &self,
        _credential: &Credential,
        page_token: Option<&str>,
    ) -> Result<SubscriptionPage, AppError> {
        self.requested_tokens
            .lock()
            .unwrap()
            .push(page_token.map(str::to_string));

        let index = match page_token {
            None => 0,
            Some(token) => token
                .strip_prefix("page-")
                .and_then(|n| n.parse().ok())
                .expect("unexpected page token"),
        };

        if self.fail_on_page == Some(index) {
            return Err(AppError::YouTubeApi("HTTP 500: backend error".to_string()));
        }

        let channels = self.pages.get(index).cloned().unwrap_or_default();
        let next_page_token = (index + 1 < self.pages.len()).then(|| format!("page-{}", index + 1));

        Ok(SubscriptionPage {
            channels,
            next_page_token,
        })
    }
}

/// Deterministic subscribed channel number `i`.
#[allow(dead_code)]
pub fn channel(i: usize) -> SubscribedChannel {
    SubscribedChannel {
        channel_id: format!("UCchannel{:04}", i),
        channel_title: format!("Channel {}", i),
    }
}

/// Test configuration whose OAuth token endpoint is `token_uri`.
#[allow(dead_code)]
pub fn test_config(token_uri: &str) -> Config {
    let mut config = Config::default();
    config.oauth_client = Some(OAuthClientConfig {
        token_uri: token_uri.to_string(),
        ..config.oauth_client.clone().unwrap()
    });
    config
}

/// Create a test app over the given fakes.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app(
    config: Config,
    youtube: Arc<FakeYouTube>,
    sheet: InMemorySheet,
) -> (axum::Router, Arc<AppState>) {
    let auth_flow = AuthorizationFlow::from_config(&config);

    let state = Arc::new(AppState {
        config,
        auth_flow,
        youtube,
        sheet: Arc::new(sheet),
    });

    (create_router(state.clone()), state)
}
