// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Prompt Marketplace Contributors

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::chain::PaymentLedger;
use crate::state::AppState;

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Health check response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall health status ("ok").
    pub status: String,
    /// Individual health checks and their results.
    pub checks: HealthChecks,
}

/// Individual health check results.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// Registry availability.
    pub registry: String,
    /// Payment verification mode ("chain" or "trusting").
    pub payments: String,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses((status = 200, body = HealthResponse))
)]
pub async fn live() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses((status = 200, body = ReadyResponse))
)]
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    let registry = match state.store.analytics() {
        Ok(_) => "ok".to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "registry readiness probe failed");
            "degraded".to_string()
        }
    };
    let payments = match state.ledger.as_ref() {
        PaymentLedger::Trusting => "trusting".to_string(),
        _ => "chain".to_string(),
    };

    Json(ReadyResponse {
        status: "ok".to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            registry,
            payments,
        },
    })
}
