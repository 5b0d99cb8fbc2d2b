// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Prompt Marketplace Contributors

//! Metadata pinning endpoints.

use axum::{
    extract::{Path, State},
    response::Redirect,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use super::success;
use crate::auth::Auth;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadJsonRequest {
    /// Arbitrary JSON metadata document to pin.
    pub metadata: Option<serde_json::Value>,
}

#[utoipa::path(
    post,
    path = "/ipfs/upload-json",
    request_body = UploadJsonRequest,
    tag = "Ipfs",
    responses(
        (status = 200, description = "Content address and gateway URL"),
        (status = 400, description = "No metadata provided"),
        (status = 401, description = "Not authenticated"),
    )
)]
pub async fn upload_json(
    State(state): State<AppState>,
    Auth(_identity): Auth,
    Json(request): Json<UploadJsonRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let metadata = request
        .metadata
        .ok_or_else(|| ApiError::validation("No metadata provided"))?;

    let stored = state.content.put_json(&metadata)?;
    Ok(success(serde_json::json!({
        "hash": stored.hash,
        "url": stored.url,
        "metadata": metadata,
    })))
}

#[utoipa::path(
    get,
    path = "/ipfs/{hash}",
    params(("hash" = String, Path, description = "Content address")),
    tag = "Ipfs",
    responses(
        (status = 307, description = "Redirect to the gateway URL"),
        (status = 404, description = "Not a valid content address"),
    )
)]
pub async fn resolve(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Redirect, ApiError> {
    let url = state.content.resolve(&hash)?;
    Ok(Redirect::temporary(url.as_str()))
}
