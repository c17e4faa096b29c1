// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Subscription rows written to the research spreadsheet.

use super::UserId;
use serde::Serialize;

/// One subscription of one (anonymized) user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionRecord {
    /// Anonymized owner of the subscription list
    pub user_id: UserId,
    /// Subscribed channel ID
    pub channel_id: String,
    /// Subscribed channel title
    pub channel_title: String,
}

impl SubscriptionRecord {
    /// Column names, in the order `to_row` emits values.
    pub const HEADER: [&'static str; 3] = ["user_id", "channel_id", "channel_title"];

    /// Spreadsheet row for this record.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.user_id.as_str().to_string(),
            self.channel_id.clone(),
            self.channel_title.clone(),
        ]
    }

    /// Header row as owned strings.
    pub fn header_row() -> Vec<String> {
        Self::HEADER.iter().map(|s| s.to_string()).collect()
    }
}
