// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Prompt Marketplace Contributors

//! Prompt asset endpoints.
//!
//! Reads are public but content-gated: the prompt text only appears in a
//! response when the caller is the creator or a confirmed buyer. The
//! permissive auth gate means an invalid token browses as anonymous
//! rather than failing.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::success;
use crate::auth::{Auth, Identity, OptionalAuth};
use crate::error::ApiError;
use crate::models::{CreatePromptRequest, MarketQuery, Prompt, PromptView};
use crate::state::AppState;

/// Project a prompt for the given viewer, gating the content field.
fn project(
    state: &AppState,
    prompt: &Prompt,
    viewer: Option<&Identity>,
) -> Result<PromptView, ApiError> {
    let entitled = match viewer {
        Some(identity) => {
            prompt.creator.matches(&identity.address)
                || state.store.has_purchased(&identity.address, &prompt.id)?
        }
        None => false,
    };
    Ok(prompt.view(entitled))
}

#[utoipa::path(
    get,
    path = "/prompts",
    params(MarketQuery),
    tag = "Prompts",
    responses((status = 200, description = "Prompts visible to the caller"))
)]
pub async fn list_prompts(
    State(state): State<AppState>,
    OptionalAuth(viewer): OptionalAuth,
    Query(query): Query<MarketQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let prompts = state.store.list_prompts(&query)?;
    let views = prompts
        .iter()
        .map(|p| project(&state, p, viewer.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(success(serde_json::json!({ "prompts": views })))
}

#[utoipa::path(
    get,
    path = "/prompts/{id}",
    params(("id" = String, Path, description = "Prompt identifier")),
    tag = "Prompts",
    responses(
        (status = 200, description = "Prompt, content included when entitled"),
        (status = 404, description = "Unknown prompt"),
    )
)]
pub async fn get_prompt(
    State(state): State<AppState>,
    OptionalAuth(viewer): OptionalAuth,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let prompt = state.store.get_prompt(&id)?;
    let view = project(&state, &prompt, viewer.as_ref())?;
    Ok(success(serde_json::json!({ "prompt": view })))
}

#[utoipa::path(
    post,
    path = "/prompts",
    request_body = CreatePromptRequest,
    tag = "Prompts",
    responses(
        (status = 201, description = "Created prompt"),
        (status = 400, description = "Missing or malformed fields"),
        (status = 401, description = "Not authenticated"),
    )
)]
pub async fn create_prompt(
    State(state): State<AppState>,
    Auth(identity): Auth,
    Json(request): Json<CreatePromptRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    if request.title.trim().is_empty()
        || request.description.trim().is_empty()
        || request.category.trim().is_empty()
        || request.content.is_empty()
    {
        return Err(ApiError::validation(
            "Title, description, category, and content are required",
        ));
    }
    if crate::registry::parse_amount(&request.price).is_none() {
        return Err(ApiError::validation("Price must be a non-negative decimal"));
    }

    let prompt = state.store.create_prompt(&identity, request)?;
    Ok((
        StatusCode::CREATED,
        success(serde_json::json!({ "prompt": prompt.view(true) })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WalletAddress;

    fn request(title: &str) -> CreatePromptRequest {
        CreatePromptRequest {
            title: title.to_string(),
            description: "d".to_string(),
            category: "writing".to_string(),
            content: "secret text".to_string(),
            price: "0.1".to_string(),
            tags: vec![],
            ipfs_hash: None,
        }
    }

    #[tokio::test]
    async fn create_prompt_echoes_creator_and_content() {
        let state = AppState::for_tests();
        let identity = Identity::for_wallet("0xAAaA00000000000000000000000000000000aaaa");

        let (status, body) = create_prompt(
            State(state),
            Auth(identity.clone()),
            Json(request("My prompt")),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        let prompt = &body.0["data"]["prompt"];
        assert_eq!(prompt["creator"], identity.address.0);
        assert_eq!(prompt["content"], "secret text");
    }

    #[tokio::test]
    async fn create_prompt_validates_fields() {
        let state = AppState::for_tests();
        let identity = Identity::for_wallet("0xAAaA00000000000000000000000000000000aaaa");

        let err = create_prompt(State(state.clone()), Auth(identity.clone()), Json(request("")))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let mut bad_price = request("T");
        bad_price.price = "-1".to_string();
        let err = create_prompt(State(state), Auth(identity), Json(bad_price))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn anonymous_read_is_gated() {
        let state = AppState::for_tests();
        let identity = Identity::for_wallet("0xAAaA00000000000000000000000000000000aaaa");
        let (_, body) = create_prompt(State(state.clone()), Auth(identity), Json(request("T")))
            .await
            .unwrap();
        let id = body.0["data"]["prompt"]["id"].as_str().unwrap().to_string();

        let response = get_prompt(State(state), OptionalAuth(None), Path(id))
            .await
            .unwrap();
        let prompt = &response.0["data"]["prompt"];
        assert_eq!(prompt["title"], "T");
        assert!(prompt.get("content").is_none());
    }

    #[tokio::test]
    async fn creator_read_includes_content() {
        let state = AppState::for_tests();
        let identity = Identity::for_wallet("0xAAaA00000000000000000000000000000000aaaa");
        let (_, body) = create_prompt(
            State(state.clone()),
            Auth(identity.clone()),
            Json(request("T")),
        )
        .await
        .unwrap();
        let id = body.0["data"]["prompt"]["id"].as_str().unwrap().to_string();

        // Same wallet, different checksum casing.
        let recased = Identity::for_wallet(WalletAddress::from(
            identity.address.0.to_ascii_uppercase().replace("0X", "0x"),
        ));
        let response = get_prompt(State(state), OptionalAuth(Some(recased)), Path(id))
            .await
            .unwrap();
        assert_eq!(response.0["data"]["prompt"]["content"], "secret text");
    }

    #[tokio::test]
    async fn unknown_prompt_is_not_found() {
        let state = AppState::for_tests();
        let err = get_prompt(State(state), OptionalAuth(None), Path("missing".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
