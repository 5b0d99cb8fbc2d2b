// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Prompt Marketplace Contributors

//! On-chain payment lookup.
//!
//! Purchases reference a payment transaction by hash. When an RPC endpoint
//! is configured the ledger resolves that hash to the payer and amount so
//! the registry can check them against the listing. Without an RPC endpoint
//! the ledger is `Trusting` and the reference is recorded as given.

use std::collections::HashMap;
use std::str::FromStr;

use alloy::{
    consensus::Transaction as _,
    network::Ethereum,
    primitives::B256,
    providers::{
        fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
        Identity, Provider, ProviderBuilder, RootProvider,
    },
};
use thiserror::Error;

use crate::models::WalletAddress;
use crate::registry::format_amount;

/// Native currency symbol reported for plain value transfers.
pub const NATIVE_CURRENCY: &str = "ETH";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("Invalid transaction hash")]
    InvalidTxHash,

    #[error("Payment transaction not found")]
    TxNotFound,

    #[error("Payment amount exceeds supported range")]
    AmountOverflow,

    #[error("RPC request failed: {0}")]
    Rpc(String),
}

/// What a payment transaction resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDetails {
    pub payer: WalletAddress,
    pub amount: String,
    pub currency: String,
}

/// HTTP provider type (with the default filler stack).
type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider<Ethereum>,
>;

/// JSON-RPC client for the configured EVM chain.
pub struct ChainClient {
    provider: HttpProvider,
}

impl ChainClient {
    pub fn new(rpc_url: &url::Url) -> Self {
        let provider = ProviderBuilder::new().connect_http(rpc_url.clone());
        Self { provider }
    }

    /// Look up a transaction by hash and project it to payment details.
    async fn lookup(&self, tx_hash: &str) -> Result<PaymentDetails, ChainError> {
        let hash = B256::from_str(tx_hash).map_err(|_| ChainError::InvalidTxHash)?;

        let tx = self
            .provider
            .get_transaction_by_hash(hash)
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?
            .ok_or(ChainError::TxNotFound)?;

        let wei = u128::try_from(tx.value()).map_err(|_| ChainError::AmountOverflow)?;

        Ok(PaymentDetails {
            payer: WalletAddress::from(tx.inner.signer().to_string()),
            amount: format_amount(wei),
            currency: NATIVE_CURRENCY.to_string(),
        })
    }
}

/// Source of payment truth for purchases.
pub enum PaymentLedger {
    /// No RPC configured: payment references are recorded unverified.
    Trusting,
    /// Resolve payment hashes against a live chain.
    Chain(ChainClient),
    /// Fixed hash-to-payment map, for tests.
    Static(HashMap<String, PaymentDetails>),
}

impl PaymentLedger {
    /// `Ok(None)` means the ledger has nothing to check the purchase
    /// against; the registry then accepts the reference as-is.
    pub async fn payment_details(
        &self,
        tx_hash: &str,
    ) -> Result<Option<PaymentDetails>, ChainError> {
        match self {
            PaymentLedger::Trusting => Ok(None),
            PaymentLedger::Chain(client) => client.lookup(tx_hash).await.map(Some),
            PaymentLedger::Static(map) => {
                map.get(tx_hash).cloned().map(Some).ok_or(ChainError::TxNotFound)
            }
        }
    }
}
