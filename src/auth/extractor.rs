// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Prompt Marketplace Contributors

//! Axum extractors for authenticated identities.
//!
//! Use the `Auth` extractor in handlers that require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(identity): Auth) -> impl IntoResponse {
//!     // identity is the verified Identity
//! }
//! ```
//!
//! Use `OptionalAuth` on public endpoints that can show caller-specific
//! data: it never rejects, and downstream code must treat `None` as a valid
//! state rather than an error.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::{error::AuthError, token::Identity};
use crate::state::AppState;

/// Strict gate: requires a valid, non-expired session token.
pub struct Auth(pub Identity);

/// Pull the bearer token out of the Authorization header.
fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::InvalidAuthHeader)
}

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let identity = state.tokens.verify(token)?;
        Ok(Auth(identity))
    }
}

/// Permissive gate: attempts the same validation as [`Auth`] but silently
/// continues without an identity on any failure.
pub struct OptionalAuth(pub Option<Identity>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match Auth::from_request_parts(parts, state).await {
            Ok(Auth(identity)) => Ok(OptionalAuth(Some(identity))),
            Err(_) => Ok(OptionalAuth(None)),
        }
    }
}
