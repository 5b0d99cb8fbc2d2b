// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Prompt Marketplace Contributors

use std::sync::Arc;

use crate::auth::TokenIssuer;
use crate::chain::PaymentLedger;
use crate::config::AppConfig;
use crate::content::{ContentStore, GatewayStore};
use crate::registry::MarketStore;

#[cfg(test)]
use crate::registry::memory::InMemoryRegistry;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MarketStore>,
    pub tokens: Arc<TokenIssuer>,
    pub content: Arc<dyn ContentStore>,
    pub ledger: Arc<PaymentLedger>,
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn MarketStore>,
        ledger: PaymentLedger,
    ) -> Self {
        Self {
            store,
            tokens: Arc::new(TokenIssuer::new(config)),
            content: Arc::new(GatewayStore::new(config.content_gateway.clone())),
            ledger: Arc::new(ledger),
        }
    }

    /// In-memory state with a trusting ledger.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self::new(
            &AppConfig::for_tests(),
            Arc::new(InMemoryRegistry::new()),
            PaymentLedger::Trusting,
        )
    }

    /// In-memory state with a fixed payment fixture.
    #[cfg(test)]
    pub fn with_ledger(ledger: PaymentLedger) -> Self {
        Self::new(
            &AppConfig::for_tests(),
            Arc::new(InMemoryRegistry::new()),
            ledger,
        )
    }
}
