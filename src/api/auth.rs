// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Prompt Marketplace Contributors

//! Wallet login endpoints.
//!
//! Login is a two-step dance: the client fetches a nonce message for its
//! address, signs it with the wallet key, and posts the signature back.
//! A valid signature yields a bearer token for the signing wallet.

use axum::{extract::Path, extract::State, Json};
use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;

use super::success;
use crate::auth::verify_wallet_signature;
use crate::error::ApiError;
use crate::models::WalletAddress;
use crate::state::AppState;

/// Prefix of the message the wallet is asked to sign.
pub const NONCE_PREFIX: &str = "Sign this message to authenticate with AI Prompt Marketplace";

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub address: String,
    pub signature: String,
    pub message: String,
}

#[utoipa::path(
    get,
    path = "/auth/nonce/{address}",
    params(("address" = String, Path, description = "Wallet address requesting a nonce")),
    tag = "Auth",
    responses((status = 200, description = "Nonce message to sign"))
)]
pub async fn nonce(Path(_address): Path<String>) -> Json<serde_json::Value> {
    // Stateless: the timestamp makes each message unique, and the token is
    // only issued to whoever actually signed it.
    let nonce = format!("{NONCE_PREFIX}: {}", Utc::now().timestamp_millis());
    success(serde_json::json!({ "nonce": nonce }))
}

#[utoipa::path(
    post,
    path = "/auth/verify",
    request_body = VerifyRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Session token and user identity"),
        (status = 400, description = "Missing fields"),
        (status = 401, description = "Signature does not match the address"),
    )
)]
pub async fn verify(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if request.address.is_empty() || request.signature.is_empty() || request.message.is_empty() {
        return Err(ApiError::validation(
            "Address, signature, and message are required",
        ));
    }

    let claimed = WalletAddress::from(request.address);
    verify_wallet_signature(&claimed, &request.message, &request.signature)?;

    let token = state.tokens.issue(&claimed)?;
    Ok(success(serde_json::json!({
        "token": token,
        "user": { "id": &claimed, "address": &claimed },
    })))
}
