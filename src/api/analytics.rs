// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Prompt Marketplace Contributors

use axum::{extract::State, Json};

use super::success;
use crate::error::ApiError;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/analytics/marketplace",
    tag = "Analytics",
    responses((status = 200, description = "Marketplace-wide aggregates"))
)]
pub async fn marketplace(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let analytics = state.store.analytics()?;
    Ok(success(serde_json::json!({ "analytics": analytics })))
}
