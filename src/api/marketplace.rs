// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Prompt Marketplace Contributors

//! Marketplace listing and purchase endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::success;
use crate::auth::Auth;
use crate::error::ApiError;
use crate::models::{CreateListingRequest, MarketQuery, PurchaseRequest};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/marketplace/listings",
    params(MarketQuery),
    tag = "Marketplace",
    responses((status = 200, description = "Active listings with prompt metadata"))
)]
pub async fn list_listings(
    State(state): State<AppState>,
    Query(query): Query<MarketQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let listings = state.store.list_active(&query)?;
    Ok(success(serde_json::json!({ "listings": listings })))
}

#[utoipa::path(
    post,
    path = "/marketplace/listings",
    request_body = CreateListingRequest,
    tag = "Marketplace",
    responses(
        (status = 201, description = "Created listing"),
        (status = 400, description = "Missing or malformed fields"),
        (status = 403, description = "Caller does not own the prompt"),
        (status = 409, description = "Prompt already has an active listing"),
    )
)]
pub async fn create_listing(
    State(state): State<AppState>,
    Auth(identity): Auth,
    Json(request): Json<CreateListingRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    if request.prompt_id.trim().is_empty() || request.currency.trim().is_empty() {
        return Err(ApiError::validation("Prompt ID and currency are required"));
    }
    if crate::registry::parse_amount(&request.price).is_none() {
        return Err(ApiError::validation("Price must be a non-negative decimal"));
    }

    let listing = state.store.create_listing(&identity, request)?;
    Ok((
        StatusCode::CREATED,
        success(serde_json::json!({ "listing": listing })),
    ))
}

#[utoipa::path(
    post,
    path = "/marketplace/purchase",
    request_body = PurchaseRequest,
    tag = "Marketplace",
    responses(
        (status = 201, description = "Purchase record"),
        (status = 404, description = "Unknown listing"),
        (status = 409, description = "Listing inactive, self purchase, or payment mismatch"),
        (status = 502, description = "Payment lookup failed"),
    )
)]
pub async fn purchase(
    State(state): State<AppState>,
    Auth(identity): Auth,
    Json(request): Json<PurchaseRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    if request.listing_id.trim().is_empty() || request.transaction_hash.trim().is_empty() {
        return Err(ApiError::validation(
            "Listing ID and transaction hash are required",
        ));
    }

    let payment = state.ledger.payment_details(&request.transaction_hash).await?;
    let purchase = state
        .store
        .purchase(&identity, &request, payment.as_ref())?;
    Ok((
        StatusCode::CREATED,
        success(serde_json::json!({ "purchase": purchase })),
    ))
}

#[utoipa::path(
    delete,
    path = "/marketplace/listings/{id}",
    params(("id" = String, Path, description = "Listing identifier")),
    tag = "Marketplace",
    responses(
        (status = 200, description = "Cancelled listing"),
        (status = 403, description = "Caller is not the seller"),
        (status = 404, description = "Unknown listing"),
        (status = 409, description = "Listing already inactive"),
    )
)]
pub async fn cancel_listing(
    State(state): State<AppState>,
    Auth(identity): Auth,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let listing = state.store.cancel_listing(&identity, &id)?;
    Ok(success(serde_json::json!({ "listing": listing })))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::auth::Identity;
    use crate::chain::{PaymentDetails, PaymentLedger};
    use crate::models::{CreatePromptRequest, WalletAddress};

    fn seller() -> Identity {
        Identity::for_wallet("0xAAaA00000000000000000000000000000000aaaa")
    }

    fn buyer() -> Identity {
        Identity::for_wallet("0xBBbB00000000000000000000000000000000bbbb")
    }

    fn seed_listing(state: &AppState, price: &str) -> String {
        let prompt = state
            .store
            .create_prompt(
                &seller(),
                CreatePromptRequest {
                    title: "T".to_string(),
                    description: "d".to_string(),
                    category: "writing".to_string(),
                    content: "secret".to_string(),
                    price: price.to_string(),
                    tags: vec![],
                    ipfs_hash: None,
                },
            )
            .unwrap();
        state
            .store
            .create_listing(
                &seller(),
                CreateListingRequest {
                    prompt_id: prompt.id,
                    price: price.to_string(),
                    currency: "ETH".to_string(),
                    duration_days: None,
                },
            )
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn purchase_with_trusting_ledger_succeeds() {
        let state = AppState::for_tests();
        let listing_id = seed_listing(&state, "0.1");

        let (status, body) = purchase(
            State(state),
            Auth(buyer()),
            Json(PurchaseRequest {
                listing_id: listing_id.clone(),
                transaction_hash: "0xdeadbeef".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body.0["data"]["purchase"]["listingId"], listing_id);
    }

    #[tokio::test]
    async fn purchase_checks_payment_against_listing() {
        let mut payments = HashMap::new();
        payments.insert(
            "0xgood".to_string(),
            PaymentDetails {
                payer: buyer().address,
                amount: "0.1".to_string(),
                currency: "ETH".to_string(),
            },
        );
        payments.insert(
            "0xshort".to_string(),
            PaymentDetails {
                payer: buyer().address,
                amount: "0.05".to_string(),
                currency: "ETH".to_string(),
            },
        );
        let state = AppState::with_ledger(PaymentLedger::Static(payments));
        let listing_id = seed_listing(&state, "0.1");

        // Underpayment is rejected and the listing stays purchasable.
        let err = purchase(
            State(state.clone()),
            Auth(buyer()),
            Json(PurchaseRequest {
                listing_id: listing_id.clone(),
                transaction_hash: "0xshort".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        // An unknown payment hash is also rejected.
        let err = purchase(
            State(state.clone()),
            Auth(buyer()),
            Json(PurchaseRequest {
                listing_id: listing_id.clone(),
                transaction_hash: "0xunknown".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let (status, _) = purchase(
            State(state),
            Auth(buyer()),
            Json(PurchaseRequest {
                listing_id,
                transaction_hash: "0xgood".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn purchase_of_unknown_listing_is_not_found() {
        let state = AppState::for_tests();
        let err = purchase(
            State(state),
            Auth(buyer()),
            Json(PurchaseRequest {
                listing_id: "missing".to_string(),
                transaction_hash: "0x1".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cancel_requires_the_seller() {
        let state = AppState::for_tests();
        let listing_id = seed_listing(&state, "0.1");

        let err = cancel_listing(State(state.clone()), Auth(buyer()), Path(listing_id.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        // The failed cancel left the listing active.
        assert!(state.store.get_listing(&listing_id).unwrap().is_active);

        let response = cancel_listing(State(state), Auth(seller()), Path(listing_id))
            .await
            .unwrap();
        assert_eq!(response.0["data"]["listing"]["isActive"], false);
    }

    #[tokio::test]
    async fn listing_validation() {
        let state = AppState::for_tests();
        let err = create_listing(
            State(state),
            Auth(seller()),
            Json(CreateListingRequest {
                prompt_id: "p".to_string(),
                price: "not-a-number".to_string(),
                currency: "ETH".to_string(),
                duration_days: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn browse_includes_prompt_metadata() {
        let state = AppState::for_tests();
        seed_listing(&state, "0.1");

        let response = list_listings(State(state), Query(MarketQuery::default()))
            .await
            .unwrap();
        let listings = response.0["data"]["listings"].as_array().unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0]["prompt"]["title"], "T");
        assert_eq!(
            listings[0]["seller"],
            WalletAddress::from("0xAAaA00000000000000000000000000000000aaaa").0
        );
    }
}
