// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod google_auth;
pub mod harvest;
pub mod oauth;
pub mod sheets;
pub mod youtube;

pub use google_auth::{ServiceAccountKey, ServiceAccountTokenSource};
pub use harvest::{HarvestPipeline, HarvestReport};
pub use oauth::{AuthorizationFlow, Credential};
pub use sheets::{InMemorySheet, SheetsClient, SpreadsheetWriter};
pub use youtube::{SubscriptionSource, YouTubeClient};
