// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Harvest pipeline: identify → paginate → assemble → persist.
//!
//! Rows are written only after every page has been fetched, so a failure
//! part-way through pagination writes nothing.

use crate::error::AppError;
use crate::models::{SubscriptionRecord, UserId};
use crate::services::oauth::Credential;
use crate::services::sheets::SpreadsheetWriter;
use crate::services::youtube::{SubscribedChannel, SubscriptionSource};
use std::sync::Arc;

/// Outcome of a successful harvest.
#[derive(Debug, Clone)]
pub struct HarvestReport {
    pub user_id: UserId,
    /// Number of subscription rows written (header excluded).
    pub saved: usize,
}

/// Harvests one user's subscriptions into the shared spreadsheet.
#[derive(Clone)]
pub struct HarvestPipeline {
    source: Arc<dyn SubscriptionSource>,
    sheet: Arc<dyn SpreadsheetWriter>,
}

impl HarvestPipeline {
    pub fn new(source: Arc<dyn SubscriptionSource>, sheet: Arc<dyn SpreadsheetWriter>) -> Self {
        Self { source, sheet }
    }

    /// Run the full pipeline for the owner of `credential`.
    pub async fn run(&self, credential: &Credential) -> Result<HarvestReport, AppError> {
        let user_id = self.identify(credential).await?;
        let channels = self.collect_channels(credential).await?;
        let records = assemble(&user_id, channels);

        self.sheet.append(&records).await?;

        tracing::info!(user_id = %user_id, count = records.len(), "Harvest complete");

        Ok(HarvestReport {
            user_id,
            saved: records.len(),
        })
    }

    /// Hash of the caller's channel ID, or a fresh anonymous ID when the
    /// account has no channel.
    pub async fn identify(&self, credential: &Credential) -> Result<UserId, AppError> {
        match self.source.my_channel_id(credential).await? {
            Some(channel_id) => Ok(UserId::from_channel_id(&channel_id)),
            None => {
                let user_id = UserId::anonymous()?;
                tracing::info!(user_id = %user_id, "No channel for account, using anonymous ID");
                Ok(user_id)
            }
        }
    }

    /// Every subscribed channel, pages concatenated in provider order.
    pub async fn collect_channels(
        &self,
        credential: &Credential,
    ) -> Result<Vec<SubscribedChannel>, AppError> {
        let mut channels = Vec::new();
        let mut page_token: Option<String> = None;
        let mut page = 0u32;

        loop {
            page += 1;
            let result = self
                .source
                .subscriptions_page(credential, page_token.as_deref())
                .await
                .inspect_err(|e| {
                    tracing::warn!(page, error = %e, "Subscription listing failed, aborting harvest");
                })?;

            tracing::debug!(page, items = result.channels.len(), "Fetched subscriptions page");
            channels.extend(result.channels);

            match result.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        Ok(channels)
    }
}

/// Stamp each channel with the owner's ID, preserving order.
pub fn assemble(user_id: &UserId, channels: Vec<SubscribedChannel>) -> Vec<SubscriptionRecord> {
    channels
        .into_iter()
        .map(|channel| SubscriptionRecord {
            user_id: user_id.clone(),
            channel_id: channel.channel_id,
            channel_title: channel.channel_title,
        })
        .collect()
}
