// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Prompt Marketplace Contributors

//! # Authentication Module
//!
//! Wallet-signature authentication for the marketplace API.
//!
//! ## Auth Flow
//!
//! 1. Client fetches a nonce message for its wallet address
//! 2. Wallet signs the message (EIP-191 personal sign)
//! 3. `POST /auth/verify` recovers the signer and, on a match, issues a
//!    time-limited HS256 session token binding `sub` to the wallet address
//! 4. Subsequent requests send `Authorization: Bearer <token>`
//!
//! ## Security
//!
//! - The token issuer is stateless: no session store, no revocation list;
//!   expiry is the only invalidation path
//! - The signing key lives in process configuration, never in responses
//! - Clock skew tolerance is 60 seconds

pub mod error;
pub mod extractor;
pub mod signature;
pub mod token;

pub use error::AuthError;
pub use extractor::{Auth, OptionalAuth};
pub use signature::verify_wallet_signature;
pub use token::{Identity, TokenIssuer};
