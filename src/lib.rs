// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Subscription Harvester: collect YouTube subscriptions for research
//!
//! This crate provides a small web service that lets a visitor authorize
//! read-only access to their YouTube account and appends their (anonymized)
//! subscription list to a shared spreadsheet.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use services::{AuthorizationFlow, HarvestPipeline, SpreadsheetWriter, SubscriptionSource};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub auth_flow: AuthorizationFlow,
    pub youtube: Arc<dyn SubscriptionSource>,
    pub sheet: Arc<dyn SpreadsheetWriter>,
}

impl AppState {
    /// Harvest pipeline over this state's YouTube source and spreadsheet.
    pub fn harvest_pipeline(&self) -> HarvestPipeline {
        HarvestPipeline::new(self.youtube.clone(), self.sheet.clone())
    }
}
