// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Prompt Marketplace Contributors

//! Content-addressed metadata storage.
//!
//! Prompt metadata is pinned as a JSON document and referred to by hash.
//! `GatewayStore` addresses documents by the SHA-256 of their serialized
//! bytes and hands out gateway URLs for retrieval.

use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Failed to serialize content: {0}")]
    Serialize(String),

    #[error("Content not found")]
    NotFound,

    #[error("Content store unavailable: {0}")]
    Store(String),
}

/// An uploaded document: its content address and a retrieval URL.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoredContent {
    pub hash: String,
    pub url: String,
}

/// Pinning backend for prompt metadata.
pub trait ContentStore: Send + Sync {
    /// Pin a JSON document, returning its content address.
    fn put_json(&self, document: &Value) -> Result<StoredContent, ContentError>;

    /// Resolve a content address to a retrieval URL.
    fn resolve(&self, hash: &str) -> Result<url::Url, ContentError>;
}

/// Store that hashes documents locally and serves them through a public
/// gateway URL.
pub struct GatewayStore {
    gateway: url::Url,
    pinned: RwLock<HashMap<String, Vec<u8>>>,
}

impl GatewayStore {
    pub fn new(gateway: url::Url) -> Self {
        Self {
            gateway,
            pinned: RwLock::new(HashMap::new()),
        }
    }

    fn gateway_url(&self, hash: &str) -> Result<url::Url, ContentError> {
        self.gateway
            .join(hash)
            .map_err(|e| ContentError::Store(e.to_string()))
    }
}

impl ContentStore for GatewayStore {
    fn put_json(&self, document: &Value) -> Result<StoredContent, ContentError> {
        let bytes = serde_json::to_vec(document).map_err(|e| ContentError::Serialize(e.to_string()))?;
        let hash = alloy::hex::encode(Sha256::digest(&bytes));

        self.pinned
            .write()
            .map_err(|_| ContentError::Store("content lock poisoned".to_string()))?
            .insert(hash.clone(), bytes);

        let url = self.gateway_url(&hash)?;
        Ok(StoredContent {
            hash,
            url: url.to_string(),
        })
    }

    fn resolve(&self, hash: &str) -> Result<url::Url, ContentError> {
        if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ContentError::NotFound);
        }
        self.gateway_url(hash)
    }
}
