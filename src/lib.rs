// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Prompt Marketplace Contributors

//! AI Prompt Marketplace - REST backend
//!
//! Wallet-signature login, tokenized prompt assets, and a marketplace
//! listing lifecycle with atomic purchase semantics.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Wallet signature verification and session tokens
//! - `registry` - Listing registry (in-memory and redb backings)
//! - `chain` - On-chain payment lookup (alloy)
//! - `content` - Content-addressed metadata storage
//! - `workflow` - Client-side create/purchase state machines

pub mod api;
pub mod auth;
pub mod chain;
pub mod config;
pub mod content;
pub mod error;
pub mod models;
pub mod registry;
pub mod state;
pub mod workflow;
