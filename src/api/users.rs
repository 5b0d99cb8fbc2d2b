// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Prompt Marketplace Contributors

//! User profile endpoints. All of these act on the authenticated wallet.

use axum::{extract::State, Json};

use super::success;
use crate::auth::Auth;
use crate::error::ApiError;
use crate::models::UpdateProfileRequest;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/users/profile",
    tag = "Users",
    responses(
        (status = 200, description = "Profile with activity stats"),
        (status = 401, description = "Not authenticated"),
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Auth(identity): Auth,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = state.store.profile(&identity.address)?;
    Ok(success(serde_json::json!({ "user": user })))
}

#[utoipa::path(
    put,
    path = "/users/profile",
    request_body = UpdateProfileRequest,
    tag = "Users",
    responses(
        (status = 200, description = "Updated profile"),
        (status = 401, description = "Not authenticated"),
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    Auth(identity): Auth,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = state.store.update_profile(&identity, request)?;
    Ok(success(serde_json::json!({ "user": user })))
}

#[utoipa::path(
    get,
    path = "/users/prompts",
    tag = "Users",
    responses(
        (status = 200, description = "Prompts created by the caller"),
        (status = 401, description = "Not authenticated"),
    )
)]
pub async fn my_prompts(
    State(state): State<AppState>,
    Auth(identity): Auth,
) -> Result<Json<serde_json::Value>, ApiError> {
    let prompts = state.store.prompts_by_creator(&identity.address)?;
    // The caller created these, so content is never gated here.
    let views: Vec<_> = prompts.iter().map(|p| p.view(true)).collect();
    Ok(success(serde_json::json!({ "prompts": views })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Identity;
    use crate::models::CreatePromptRequest;

    fn wallet() -> Identity {
        Identity::for_wallet("0xAAaA00000000000000000000000000000000aaaa")
    }

    #[tokio::test]
    async fn profile_defaults_then_updates() {
        let state = AppState::for_tests();

        let response = get_profile(State(state.clone()), Auth(wallet())).await.unwrap();
        assert_eq!(response.0["data"]["user"]["address"], wallet().address.0);
        assert!(response.0["data"]["user"]["username"].is_null());

        let response = update_profile(
            State(state.clone()),
            Auth(wallet()),
            Json(UpdateProfileRequest {
                username: Some("promptsmith".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.0["data"]["user"]["username"], "promptsmith");

        let response = get_profile(State(state), Auth(wallet())).await.unwrap();
        assert_eq!(response.0["data"]["user"]["username"], "promptsmith");
    }

    #[tokio::test]
    async fn my_prompts_returns_full_content() {
        let state = AppState::for_tests();
        state
            .store
            .create_prompt(
                &wallet(),
                CreatePromptRequest {
                    title: "Mine".to_string(),
                    description: "d".to_string(),
                    category: "writing".to_string(),
                    content: "secret".to_string(),
                    price: "0.1".to_string(),
                    tags: vec![],
                    ipfs_hash: None,
                },
            )
            .unwrap();

        let response = my_prompts(State(state), Auth(wallet())).await.unwrap();
        let prompts = response.0["data"]["prompts"].as_array().unwrap();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0]["content"], "secret");
    }
}
