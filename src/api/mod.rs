// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Prompt Marketplace Contributors

//! HTTP surface.
//!
//! All success responses use the envelope `{"status":"success","data":...}`
//! and all failures `{"status":"error","message":...}`. Swagger UI is
//! mounted at `/docs`.

use axum::{
    routing::{delete, get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        CategoryCount, CreateListingRequest, CreatePromptRequest, Listing, ListingWithPrompt,
        MarketplaceAnalytics, Prompt, PromptView, ProfileWithStats, Purchase, PurchaseRequest,
        UpdateProfileRequest, UserProfile, UserStats, WalletAddress,
    },
    state::AppState,
};

pub mod analytics;
pub mod auth;
pub mod health;
pub mod ipfs;
pub mod marketplace;
pub mod prompts;
pub mod users;

/// Wrap handler output in the success envelope.
pub(crate) fn success(data: serde_json::Value) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "success", "data": data }))
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .route("/auth/nonce/{address}", get(auth::nonce))
        .route("/auth/verify", post(auth::verify))
        .route(
            "/prompts",
            get(prompts::list_prompts).post(prompts::create_prompt),
        )
        .route("/prompts/{id}", get(prompts::get_prompt))
        .route(
            "/marketplace/listings",
            get(marketplace::list_listings).post(marketplace::create_listing),
        )
        .route(
            "/marketplace/listings/{id}",
            delete(marketplace::cancel_listing),
        )
        .route("/marketplace/purchase", post(marketplace::purchase))
        .route(
            "/users/profile",
            get(users::get_profile).put(users::update_profile),
        )
        .route("/users/prompts", get(users::my_prompts))
        .route("/analytics/marketplace", get(analytics::marketplace))
        .route("/ipfs/upload-json", post(ipfs::upload_json))
        .route("/ipfs/{hash}", get(ipfs::resolve))
        .with_state(state);

    Router::new()
        .merge(api_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::live,
        health::ready,
        auth::nonce,
        auth::verify,
        prompts::list_prompts,
        prompts::get_prompt,
        prompts::create_prompt,
        marketplace::list_listings,
        marketplace::create_listing,
        marketplace::purchase,
        marketplace::cancel_listing,
        users::get_profile,
        users::update_profile,
        users::my_prompts,
        analytics::marketplace,
        ipfs::upload_json,
        ipfs::resolve
    ),
    components(
        schemas(
            WalletAddress,
            Prompt,
            PromptView,
            CreatePromptRequest,
            Listing,
            ListingWithPrompt,
            CreateListingRequest,
            Purchase,
            PurchaseRequest,
            UserProfile,
            UserStats,
            ProfileWithStats,
            UpdateProfileRequest,
            MarketplaceAnalytics,
            CategoryCount,
            auth::VerifyRequest,
            ipfs::UploadJsonRequest,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    tags(
        (name = "Health", description = "Service probes"),
        (name = "Auth", description = "Wallet signature login"),
        (name = "Prompts", description = "Prompt assets"),
        (name = "Marketplace", description = "Listings and purchases"),
        (name = "Users", description = "Profiles"),
        (name = "Analytics", description = "Marketplace aggregates"),
        (name = "Ipfs", description = "Metadata pinning")
    )
)]
struct ApiDoc;
