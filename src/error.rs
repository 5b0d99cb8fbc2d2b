// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Prompt Marketplace Contributors

//! API error taxonomy.
//!
//! Every handler failure is converted into the common response envelope
//! `{"status":"error","message":...}` with a status code determined by the
//! error class. Internal and upstream failures are logged with full detail
//! and surfaced to the caller as a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::AuthError;
use crate::chain::ChainError;
use crate::content::ContentError;
use crate::registry::RegistryError;

/// Handler-level error, mapped onto the response envelope.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed request fields (400).
    #[error("{0}")]
    Validation(String),

    /// Missing, invalid, or expired credential (401/403).
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Acting identity lacks rights over the target resource (403).
    #[error("{0}")]
    Forbidden(String),

    /// Target resource does not exist (404).
    #[error("{0}")]
    NotFound(String),

    /// Request conflicts with current resource state (409).
    #[error("{0}")]
    Conflict(String),

    /// A remote collaborator (storage, ledger) failed (502).
    #[error("{0}")]
    Upstream(String),

    /// Unexpected failure (500). Detail is logged, not returned.
    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    status: &'static str,
    message: String,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(e) => e.status_code(),
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::PromptNotFound | RegistryError::ListingNotFound => {
                ApiError::NotFound(err.to_string())
            }
            RegistryError::NotPromptOwner | RegistryError::NotSeller => {
                ApiError::Forbidden(err.to_string())
            }
            RegistryError::DuplicateActiveListing
            | RegistryError::ListingInactive
            | RegistryError::SelfPurchase
            | RegistryError::PaymentMismatch(_) => ApiError::Conflict(err.to_string()),
            RegistryError::Store(detail) => ApiError::Internal(detail),
        }
    }
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::InvalidTxHash => ApiError::Validation(err.to_string()),
            ChainError::TxNotFound | ChainError::AmountOverflow => {
                ApiError::Conflict(err.to_string())
            }
            ChainError::Rpc(detail) => ApiError::Upstream(detail),
        }
    }
}

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::Serialize(detail) => ApiError::Validation(detail),
            ContentError::NotFound => ApiError::NotFound(err.to_string()),
            ContentError::Store(detail) => ApiError::Internal(detail),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Never leak internal detail to callers; log it instead.
        let message = match &self {
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "internal error");
                "Internal Server Error".to_string()
            }
            ApiError::Upstream(detail) => {
                tracing::error!(detail = %detail, "upstream collaborator failed");
                "Upstream service unavailable".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ErrorBody {
            status: "error",
            message,
        });
        (status, body).into_response()
    }
}
