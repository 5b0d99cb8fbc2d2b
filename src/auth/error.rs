// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Prompt Marketplace Contributors

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication error type.
///
/// Covers both credential validation on inbound requests and wallet
/// signature verification during login.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No authorization header present.
    #[error("Access denied. No token provided.")]
    MissingAuthHeader,

    /// Authorization header is not `Bearer <token>`.
    #[error("Invalid authorization header format (expected 'Bearer <token>')")]
    InvalidAuthHeader,

    /// Token is structurally invalid.
    #[error("Invalid token.")]
    MalformedToken,

    /// Token signature check failed.
    #[error("Invalid token.")]
    TamperedToken,

    /// Token has expired.
    #[error("Token has expired")]
    TokenExpired,

    /// Wallet address is not a valid 20-byte hex address.
    #[error("Invalid wallet address")]
    InvalidAddress,

    /// Wallet signature does not recover to the claimed address.
    #[error("Invalid signature")]
    SignatureMismatch,

    /// Wallet signature is not a parseable 65-byte signature.
    #[error("Malformed signature")]
    MalformedSignature,
}

#[derive(Serialize)]
struct AuthErrorBody {
    status: &'static str,
    message: String,
}

impl AuthError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::MalformedToken
            | AuthError::TamperedToken
            | AuthError::TokenExpired
            | AuthError::SignatureMismatch => StatusCode::UNAUTHORIZED,
            AuthError::InvalidAddress | AuthError::MalformedSignature => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            status: "error",
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn missing_auth_returns_401_envelope() {
        let response = AuthError::MissingAuthHeader.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Access denied. No token provided.");
    }

    #[test]
    fn malformed_login_inputs_are_400() {
        assert_eq!(
            AuthError::MalformedSignature.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::InvalidAddress.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn credential_failures_are_401() {
        for err in [
            AuthError::MissingAuthHeader,
            AuthError::InvalidAuthHeader,
            AuthError::MalformedToken,
            AuthError::TamperedToken,
            AuthError::TokenExpired,
            AuthError::SignatureMismatch,
        ] {
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        }
    }
}
