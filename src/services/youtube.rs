// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! YouTube Data API client.
//!
//! Handles:
//! - Looking up the caller's own channel ID
//! - Listing the caller's subscriptions one page at a time

use crate::error::AppError;
use crate::services::oauth::Credential;
use async_trait::async_trait;
use serde::Deserialize;

/// Largest page the subscriptions endpoint will return.
pub const SUBSCRIPTIONS_PAGE_SIZE: u32 = 50;

const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// A channel the caller subscribes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribedChannel {
    pub channel_id: String,
    pub channel_title: String,
}

/// One page of the subscriptions listing.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionPage {
    pub channels: Vec<SubscribedChannel>,
    /// Cursor for the next page; `None` on the last page.
    pub next_page_token: Option<String>,
}

/// Source of the caller's identity and subscriptions.
#[async_trait]
pub trait SubscriptionSource: Send + Sync {
    /// The caller's own channel ID, if the account has a channel.
    async fn my_channel_id(&self, credential: &Credential) -> Result<Option<String>, AppError>;

    /// One page of subscriptions, starting at `page_token` (first page if `None`).
    async fn subscriptions_page(
        &self,
        credential: &Credential,
        page_token: Option<&str>,
    ) -> Result<SubscriptionPage, AppError>;
}

/// YouTube Data API v3 client.
#[derive(Clone)]
pub struct YouTubeClient {
    http: reqwest::Client,
    base_url: String,
}

impl Default for YouTubeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl YouTubeClient {
    pub fn new() -> Self {
        Self::with_base_url(YOUTUBE_API_BASE)
    }

    /// Client talking to a different API root (used by tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        access_token: &str,
        query: &[(&str, &str)],
    ) -> Result<T, AppError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::YouTubeApi(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(AppError::YouTubeApi(format!(
                    "{} (HTTP {})",
                    AppError::YOUTUBE_TOKEN_ERROR,
                    status
                )));
            }

            return Err(AppError::YouTubeApi(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::YouTubeApi(format!("JSON parse error: {}", e)))
    }
}

#[async_trait]
impl SubscriptionSource for YouTubeClient {
    async fn my_channel_id(&self, credential: &Credential) -> Result<Option<String>, AppError> {
        let url = format!("{}/channels", self.base_url);
        let response: ChannelListResponse = self
            .get_json(
                &url,
                &credential.access_token,
                &[("part", "id"), ("mine", "true")],
            )
            .await?;

        Ok(response
            .items
            .into_iter()
            .map(|item| item.id)
            .find(|id| !id.is_empty()))
    }

    async fn subscriptions_page(
        &self,
        credential: &Credential,
        page_token: Option<&str>,
    ) -> Result<SubscriptionPage, AppError> {
        let url = format!("{}/subscriptions", self.base_url);
        let page_size = SUBSCRIPTIONS_PAGE_SIZE.to_string();

        let mut query = vec![
            ("part", "snippet"),
            ("mine", "true"),
            ("maxResults", page_size.as_str()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let response: SubscriptionListResponse = self
            .get_json(&url, &credential.access_token, &query)
            .await?;

        Ok(response.into_page())
    }
}

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionListResponse {
    #[serde(default)]
    items: Vec<SubscriptionItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionItem {
    id: Option<String>,
    snippet: Option<SubscriptionSnippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionSnippet {
    title: Option<String>,
    resource_id: Option<ResourceId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    channel_id: Option<String>,
}

impl SubscriptionListResponse {
    fn into_page(self) -> SubscriptionPage {
        let channels = self
            .items
            .into_iter()
            .filter_map(|item| {
                let snippet = item.snippet;
                let channel_id = snippet
                    .as_ref()
                    .and_then(|s| s.resource_id.as_ref())
                    .and_then(|r| r.channel_id.clone());
                let channel_title = snippet.and_then(|s| s.title);

                match (channel_id, channel_title) {
                    (Some(channel_id), Some(channel_title)) => Some(SubscribedChannel {
                        channel_id,
                        channel_title,
                    }),
                    _ => {
                        tracing::warn!(
                            subscription_id = ?item.id,
                            "Skipping subscription without channel ID or title"
                        );
                        None
                    }
                }
            })
            .collect();

        SubscriptionPage {
            channels,
            next_page_token: self.next_page_token.filter(|t| !t.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subscription_page() {
        let json = r#"{
            "kind": "youtube#subscriptionListResponse",
            "nextPageToken": "CDIQAA",
            "items": [
                {"id": "s1", "snippet": {"title": "First", "resourceId": {"kind": "youtube#channel", "channelId": "UC1"}}},
                {"id": "s2", "snippet": {"title": "Second", "resourceId": {"kind": "youtube#channel", "channelId": "UC2"}}}
            ]
        }"#;

        let page = serde_json::from_str::<SubscriptionListResponse>(json)
            .unwrap()
            .into_page();

        assert_eq!(page.next_page_token.as_deref(), Some("CDIQAA"));
        assert_eq!(
            page.channels,
            vec![
                SubscribedChannel {
                    channel_id: "UC1".to_string(),
                    channel_title: "First".to_string()
                },
                SubscribedChannel {
                    channel_id: "UC2".to_string(),
                    channel_title: "Second".to_string()
                },
            ]
        );
    }

    #[test]
    fn last_page_has_no_token() {
        let json = r#"{"items": [], "nextPageToken": ""}"#;
        let page = serde_json::from_str::<SubscriptionListResponse>(json)
            .unwrap()
            .into_page();
        assert!(page.channels.is_empty());
        assert!(page.next_page_token.is_none());

        let page = serde_json::from_str::<SubscriptionListResponse>("{}")
            .unwrap()
            .into_page();
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn skips_items_without_resource_id() {
        let json = r#"{"items": [
            {"id": "s1", "snippet": {"title": "No resource"}},
            {"id": "s2"},
            {"id": "s3", "snippet": {"title": "Ok", "resourceId": {"channelId": "UC3"}}}
        ]}"#;

        let page = serde_json::from_str::<SubscriptionListResponse>(json)
            .unwrap()
            .into_page();
        assert_eq!(page.channels.len(), 1);
        assert_eq!(page.channels[0].channel_id, "UC3");
    }
}
