// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Prompt Marketplace Contributors

//! Session token issuance and verification.
//!
//! On successful wallet-signature verification, the issuer signs an HS256
//! token binding the subject identity to the wallet address for a fixed
//! validity window (7 days by default). The issuer is stateless: any holder
//! of the key can verify a token without contacting the issuer, and there
//! is no revocation path short of expiry.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::AuthError;
use crate::config::AppConfig;
use crate::models::WalletAddress;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Claims carried by a session token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Subject: the wallet address (no separate account concept).
    sub: String,
    /// Wallet address, duplicated for explicit binding.
    address: String,
    /// Issued-at timestamp.
    iat: i64,
    /// Expiry timestamp.
    exp: i64,
}

/// Authenticated identity resolved from a verified token.
///
/// Parsed at the trust boundary; handlers only ever see this typed record,
/// never raw claims. `id` equals `address` in this system.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Identity {
    pub id: WalletAddress,
    pub address: WalletAddress,
}

impl Identity {
    pub fn for_wallet(address: impl Into<WalletAddress>) -> Self {
        let address = address.into();
        Self {
            id: address.clone(),
            address,
        }
    }
}

/// Stateless HS256 session token issuer.
///
/// The only state is the signing key, held as process configuration.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(&config.jwt_secret),
            decoding: DecodingKey::from_secret(&config.jwt_secret),
            ttl: Duration::days(config.token_ttl_days),
        }
    }

    /// Issue a token for `address`, valid from now until now + ttl.
    pub fn issue(&self, address: &WalletAddress) -> Result<String, AuthError> {
        self.issue_at(address, Utc::now().timestamp())
    }

    /// Issue a token with an explicit issued-at instant.
    ///
    /// Exposed for tests that need to exercise the expiry boundary.
    pub(crate) fn issue_at(
        &self,
        address: &WalletAddress,
        issued_at: i64,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            sub: address.0.clone(),
            address: address.0.clone(),
            iat: issued_at,
            exp: issued_at + self.ttl.num_seconds(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| AuthError::MalformedToken)
    }

    /// Verify a token and resolve the identity it binds.
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.validate_aud = false;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::TamperedToken,
                _ => AuthError::MalformedToken,
            }
        })?;

        Ok(Identity {
            id: WalletAddress(data.claims.sub),
            address: WalletAddress(data.claims.address),
        })
    }
}
