// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Prompt Marketplace Contributors

//! # API Data Models
//!
//! Request and response data structures for the REST API. All wire types
//! derive `Serialize`, `Deserialize`, and `ToSchema` for automatic JSON
//! handling and OpenAPI documentation. Field names follow the JSON wire
//! convention (camelCase).
//!
//! ## Wallet Address Type
//!
//! The [`WalletAddress`] newtype wraps Ethereum-style addresses (0x-prefixed,
//! 40 hex characters). Addresses are compared case-insensitively: two
//! addresses that differ only in checksum casing refer to the same wallet.
//!
//! ## Model Categories
//!
//! - **Prompts**: Tokenized AI prompt assets and their gated projections
//! - **Listings**: Marketplace offers over prompts
//! - **Purchases**: Immutable records of completed sales
//! - **Profiles**: Per-wallet user profiles and computed stats

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Wallet Address Type
// =============================================================================

/// Ethereum-compatible wallet address wrapper.
///
/// Provides type safety for wallet addresses throughout the API.
/// Format: `0x` followed by 40 hexadecimal characters (20 bytes).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WalletAddress(pub String);

impl WalletAddress {
    /// Case-insensitive address equality.
    ///
    /// EIP-55 checksum casing varies between clients, so ownership checks
    /// must never compare the raw strings.
    pub fn matches(&self, other: &WalletAddress) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }

    /// Lowercased form, used as a storage key.
    pub fn normalized(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for WalletAddress {
    fn from(value: String) -> Self {
        WalletAddress(value)
    }
}

impl From<&str> for WalletAddress {
    fn from(value: &str) -> Self {
        WalletAddress(value.to_string())
    }
}

impl From<WalletAddress> for String {
    fn from(value: WalletAddress) -> Self {
        value.0
    }
}

// =============================================================================
// Prompt Models
// =============================================================================

/// A tokenized AI prompt asset.
///
/// The `content` field is the asset itself and is only ever serialized
/// through [`PromptView`], which gates it to the creator and confirmed
/// buyers.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    /// Unique identifier for this prompt.
    pub id: String,
    /// Short display title.
    pub title: String,
    /// Public description shown to all users.
    pub description: String,
    /// Category tag (e.g. "writing", "coding").
    pub category: String,
    /// The prompt text. Gated: creator and buyers only.
    pub content: String,
    /// Free-form search tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Asking price in `currency` units, decimal string (e.g. "0.1").
    pub price: String,
    /// Wallet that created this prompt.
    pub creator: WalletAddress,
    /// Content-addressed metadata reference, set once uploaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipfs_hash: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Prompt {
    /// Project this prompt for a given viewer.
    ///
    /// `entitled` is true when the viewer is the creator or a confirmed
    /// buyer; only then does the projection carry the full content.
    pub fn view(&self, entitled: bool) -> PromptView {
        PromptView {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            content: entitled.then(|| self.content.clone()),
            tags: self.tags.clone(),
            price: self.price.clone(),
            creator: self.creator.clone(),
            ipfs_hash: self.ipfs_hash.clone(),
            created_at: self.created_at,
        }
    }
}

/// Viewer-specific projection of a [`Prompt`].
///
/// `content` is `None` for viewers without access; the field is omitted from
/// the JSON body rather than serialized as null.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PromptView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub price: String,
    pub creator: WalletAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipfs_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request to create a new prompt.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePromptRequest {
    pub title: String,
    pub description: String,
    pub category: String,
    pub content: String,
    pub price: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Content-addressed metadata reference from a prior upload, if any.
    #[serde(default)]
    pub ipfs_hash: Option<String>,
}

// =============================================================================
// Listing Models
// =============================================================================

/// A marketplace listing offering a prompt for sale.
///
/// A listing is mutated by exactly three paths: purchase (deactivates it and
/// records a [`Purchase`] in the same step), seller cancellation, and natural
/// expiry. At most one active listing exists per prompt.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    /// Unique identifier for this listing.
    pub id: String,
    /// The prompt being offered.
    pub prompt_id: String,
    /// Sale price, decimal string in `currency` units.
    pub price: String,
    /// Settlement currency symbol (e.g. "ETH").
    pub currency: String,
    /// Wallet that created this listing (the prompt's rights-holder).
    pub seller: WalletAddress,
    /// Whether the listing can still be purchased.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Expiry timestamp; the listing is not purchasable past this instant.
    pub expires_at: DateTime<Utc>,
}

impl Listing {
    /// True when the listing is purchasable at `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now < self.expires_at
    }
}

/// Listing enriched with public prompt metadata, as returned by the
/// marketplace browse endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ListingWithPrompt {
    #[serde(flatten)]
    pub listing: Listing,
    /// Public metadata of the listed prompt (no content).
    pub prompt: ListedPromptSummary,
}

/// Public prompt metadata embedded in marketplace listings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ListedPromptSummary {
    pub title: String,
    pub description: String,
    pub category: String,
}

/// Request to create a marketplace listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingRequest {
    pub prompt_id: String,
    pub price: String,
    pub currency: String,
    /// Seller-chosen listing lifetime. Defaults to 30 days.
    #[serde(default)]
    pub duration_days: Option<i64>,
}

// =============================================================================
// Purchase Models
// =============================================================================

/// An immutable record of a completed sale.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    /// Unique identifier for this purchase.
    pub id: String,
    /// The listing that was bought.
    pub listing_id: String,
    /// Wallet that bought the listing.
    pub buyer: WalletAddress,
    /// On-chain payment reference supplied by the buyer.
    pub transaction_hash: String,
    /// Completion timestamp.
    pub purchased_at: DateTime<Utc>,
}

/// Request to purchase a listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub listing_id: String,
    pub transaction_hash: String,
}

// =============================================================================
// Profile Models
// =============================================================================

/// Per-wallet user profile. All fields except the address are optional and
/// user-editable.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Canonical user ID. Equal to the wallet address in this system.
    pub id: WalletAddress,
    pub address: WalletAddress,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Fresh profile for a wallet that has never saved one.
    pub fn empty(address: WalletAddress, now: DateTime<Utc>) -> Self {
        Self {
            id: address.clone(),
            address,
            username: None,
            email: None,
            bio: None,
            avatar: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Marketplace activity totals for one wallet.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub prompts_created: u64,
    pub prompts_purchased: u64,
    /// Lifetime sale proceeds, decimal string.
    pub total_earnings: String,
    /// Lifetime purchase spend, decimal string.
    pub total_spent: String,
}

/// Profile plus computed stats, as returned by `GET /users/profile`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileWithStats {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub stats: UserStats,
}

/// Request to update the caller's profile.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

// =============================================================================
// Query Models
// =============================================================================

/// Sort key for prompt and listing queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    CreatedAt,
    Price,
}

/// Sort direction for prompt and listing queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Browse filter shared by `GET /prompts` and `GET /marketplace/listings`.
///
/// Ordering contract: stable, caller-chosen key, newest-first by default,
/// ties broken by ID ascending.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct MarketQuery {
    /// Restrict results to one category.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sort_by: SortKey,
    #[serde(default)]
    pub order: SortOrder,
}

// =============================================================================
// Analytics Models
// =============================================================================

/// Marketplace-wide aggregates.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceAnalytics {
    pub total_prompts: u64,
    pub total_sales: u64,
    /// Sum of sale prices, decimal string.
    pub total_volume: String,
    pub active_listings: u64,
    /// Categories ordered by listing count, descending.
    pub top_categories: Vec<CategoryCount>,
    /// Most recent purchases, newest first.
    pub recent_sales: Vec<Purchase>,
}

/// One category with its active-listing count.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category: String,
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_address_matches_ignores_case() {
        let checksummed = WalletAddress::from("0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12");
        let lower = WalletAddress::from("0x742d35cc6634c0532925a3b844bc9e7595f4ab12");
        assert!(checksummed.matches(&lower));
        assert_ne!(checksummed, lower);
        assert_eq!(checksummed.normalized(), lower.0);
    }

    #[test]
    fn prompt_view_gates_content() {
        let prompt = Prompt {
            id: "p1".into(),
            title: "T".into(),
            description: "D".into(),
            category: "writing".into(),
            content: "secret".into(),
            tags: vec![],
            price: "0.1".into(),
            creator: WalletAddress::from("0xabc"),
            ipfs_hash: None,
            created_at: Utc::now(),
        };

        assert_eq!(prompt.view(true).content.as_deref(), Some("secret"));
        assert!(prompt.view(false).content.is_none());

        let public = serde_json::to_value(prompt.view(false)).unwrap();
        assert!(public.get("content").is_none());
    }

    #[test]
    fn listing_liveness_requires_active_and_unexpired() {
        let now = Utc::now();
        let listing = Listing {
            id: "l1".into(),
            prompt_id: "p1".into(),
            price: "0.1".into(),
            currency: "ETH".into(),
            seller: WalletAddress::from("0xabc"),
            is_active: true,
            created_at: now,
            expires_at: now + chrono::Duration::days(30),
        };
        assert!(listing.is_live(now));

        let mut sold = listing.clone();
        sold.is_active = false;
        assert!(!sold.is_live(now));

        assert!(!listing.is_live(now + chrono::Duration::days(31)));
    }

    #[test]
    fn market_query_defaults_to_newest_first() {
        let query: MarketQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.sort_by, SortKey::CreatedAt);
        assert_eq!(query.order, SortOrder::Desc);
        assert!(query.category.is_none());
    }
}
