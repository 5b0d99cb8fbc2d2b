// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Prompt Marketplace Contributors

//! # Listing Registry
//!
//! The registry is the only shared mutable resource in the system. All
//! mutation goes through the [`MarketStore`] operations, each independently
//! atomic; no caller reads-modifies-writes a listing directly.
//!
//! Two backing implementations exist behind the trait:
//!
//! - [`memory::InMemoryRegistry`] - single-process, used in tests and when
//!   no `DATA_DIR` is configured
//! - [`durable::RedbRegistry`] - embedded ACID database (redb)
//!
//! ## Invariants
//!
//! - A listing references exactly one prompt and one seller (the prompt's
//!   rights-holder at listing time)
//! - At most one active listing per prompt
//! - Purchase flips `is_active` and records the purchase in one atomic
//!   step: concurrent purchases of the same listing yield exactly one
//!   winner, the rest fail with [`RegistryError::ListingInactive`]

pub mod durable;
pub mod memory;

use std::cmp::Ordering;

use crate::auth::Identity;
use crate::chain::PaymentDetails;
use crate::models::{
    CreateListingRequest, CreatePromptRequest, Listing, ListingWithPrompt, MarketQuery,
    MarketplaceAnalytics, ProfileWithStats, Prompt, Purchase, PurchaseRequest,
    UpdateProfileRequest, UserProfile, WalletAddress,
};

/// Default listing lifetime when the seller does not choose one.
pub const DEFAULT_LISTING_DURATION_DAYS: i64 = 30;

/// Number of purchases returned in the analytics recent-sales feed.
pub const RECENT_SALES_LIMIT: usize = 10;

/// Registry operation failures.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Prompt not found")]
    PromptNotFound,

    #[error("Listing not found")]
    ListingNotFound,

    /// Caller does not hold rights over the prompt being listed.
    #[error("Only the prompt owner can list it for sale")]
    NotPromptOwner,

    /// Caller is not the seller of the listing being cancelled.
    #[error("Only the seller can cancel this listing")]
    NotSeller,

    /// The prompt already has an active, unexpired listing.
    #[error("This prompt already has an active listing")]
    DuplicateActiveListing,

    /// The listing was already sold, cancelled, or has expired.
    #[error("Listing is no longer active")]
    ListingInactive,

    /// Buyer and seller are the same wallet.
    #[error("Cannot purchase your own listing")]
    SelfPurchase,

    /// Payment amount/currency does not match the listing.
    #[error("Payment does not match listing: {0}")]
    PaymentMismatch(String),

    /// Backing store failure.
    #[error("registry store error: {0}")]
    Store(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Abstract marketplace store.
///
/// Methods take `&self`; implementations provide their own interior
/// mutability and atomicity (a write lock or a write transaction).
pub trait MarketStore: Send + Sync {
    // --- prompts -----------------------------------------------------------

    fn create_prompt(&self, creator: &Identity, req: CreatePromptRequest)
        -> RegistryResult<Prompt>;

    fn get_prompt(&self, id: &str) -> RegistryResult<Prompt>;

    fn list_prompts(&self, query: &MarketQuery) -> RegistryResult<Vec<Prompt>>;

    fn prompts_by_creator(&self, address: &WalletAddress) -> RegistryResult<Vec<Prompt>>;

    /// True when `buyer` has a confirmed purchase of any listing of
    /// `prompt_id`.
    fn has_purchased(&self, buyer: &WalletAddress, prompt_id: &str) -> RegistryResult<bool>;

    // --- listings ----------------------------------------------------------

    fn create_listing(
        &self,
        seller: &Identity,
        req: CreateListingRequest,
    ) -> RegistryResult<Listing>;

    fn get_listing(&self, id: &str) -> RegistryResult<Listing>;

    /// Active, unexpired listings with public prompt metadata attached.
    fn list_active(&self, query: &MarketQuery) -> RegistryResult<Vec<ListingWithPrompt>>;

    /// Purchase a listing: deactivate it and record the purchase as one
    /// atomic step. `payment`, when present, must match the listing's price
    /// and currency and the buyer's wallet.
    fn purchase(
        &self,
        buyer: &Identity,
        req: &PurchaseRequest,
        payment: Option<&PaymentDetails>,
    ) -> RegistryResult<Purchase>;

    fn cancel_listing(&self, seller: &Identity, listing_id: &str) -> RegistryResult<Listing>;

    // --- profiles ----------------------------------------------------------

    fn profile(&self, address: &WalletAddress) -> RegistryResult<ProfileWithStats>;

    fn update_profile(
        &self,
        identity: &Identity,
        req: UpdateProfileRequest,
    ) -> RegistryResult<UserProfile>;

    // --- analytics ---------------------------------------------------------

    fn analytics(&self) -> RegistryResult<MarketplaceAnalytics>;
}

// =============================================================================
// Decimal Amount Helpers
// =============================================================================
//
// Prices travel as decimal strings ("0.1"). Comparisons and aggregation
// must not go through floats, so amounts are scaled to fixed-point integers
// with 18 fractional digits (the native EVM token scale).

const AMOUNT_FRACTION_DIGITS: u32 = 18;
const AMOUNT_SCALE: u128 = 10u128.pow(AMOUNT_FRACTION_DIGITS);

/// Parse a non-negative decimal string into scaled integer units.
///
/// Returns `None` for empty input, negative values, non-decimal characters,
/// or more than 18 significant fractional digits.
pub(crate) fn parse_amount(raw: &str) -> Option<u128> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('-') || raw.starts_with('+') {
        return None;
    }

    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i, f),
        None => (raw, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let int_units: u128 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().ok()?
    };

    let frac_trimmed = frac_part.trim_end_matches('0');
    if frac_trimmed.len() as u32 > AMOUNT_FRACTION_DIGITS {
        return None;
    }
    let frac_units: u128 = if frac_trimmed.is_empty() {
        0
    } else {
        let digits: u128 = frac_trimmed.parse().ok()?;
        digits * 10u128.pow(AMOUNT_FRACTION_DIGITS - frac_trimmed.len() as u32)
    };

    int_units
        .checked_mul(AMOUNT_SCALE)?
        .checked_add(frac_units)
}

/// Format scaled integer units back into a decimal string, trimming
/// trailing fractional zeros.
pub(crate) fn format_amount(units: u128) -> String {
    let int = units / AMOUNT_SCALE;
    let frac = units % AMOUNT_SCALE;
    if frac == 0 {
        int.to_string()
    } else {
        let frac_str = format!("{frac:018}");
        format!("{int}.{}", frac_str.trim_end_matches('0'))
    }
}

/// Numeric equality of two decimal strings ("0.10" == "0.1").
pub(crate) fn amounts_equal(a: &str, b: &str) -> bool {
    match (parse_amount(a), parse_amount(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn price_ord(a: &str, b: &str) -> Ordering {
    parse_amount(a)
        .unwrap_or(0)
        .cmp(&parse_amount(b).unwrap_or(0))
}

// =============================================================================
// Query Application
// =============================================================================
//
// Filtering and ordering are computed lazily over the scan result, shared
// by both backings. Ordering contract: caller-chosen key, newest-first by
// default, ties broken by ID ascending.

use crate::models::{SortKey, SortOrder};

pub(crate) fn apply_prompt_query(mut prompts: Vec<Prompt>, query: &MarketQuery) -> Vec<Prompt> {
    if let Some(category) = &query.category {
        prompts.retain(|p| p.category.eq_ignore_ascii_case(category));
    }
    prompts.sort_by(|a, b| {
        let key = match query.sort_by {
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::Price => price_ord(&a.price, &b.price),
        };
        let key = match query.order {
            SortOrder::Asc => key,
            SortOrder::Desc => key.reverse(),
        };
        key.then_with(|| a.id.cmp(&b.id))
    });
    prompts
}

pub(crate) fn apply_listing_query(
    mut listings: Vec<ListingWithPrompt>,
    query: &MarketQuery,
) -> Vec<ListingWithPrompt> {
    if let Some(category) = &query.category {
        listings.retain(|l| l.prompt.category.eq_ignore_ascii_case(category));
    }
    listings.sort_by(|a, b| {
        let key = match query.sort_by {
            SortKey::CreatedAt => a.listing.created_at.cmp(&b.listing.created_at),
            SortKey::Price => price_ord(&a.listing.price, &b.listing.price),
        };
        let key = match query.order {
            SortOrder::Asc => key,
            SortOrder::Desc => key.reverse(),
        };
        key.then_with(|| a.listing.id.cmp(&b.listing.id))
    });
    listings
}

// =============================================================================
// Purchase Checks
// =============================================================================

/// Pre-flight checks shared by both backings, run inside the atomic
/// section against the current listing state.
pub(crate) fn check_purchasable(
    listing: &Listing,
    buyer: &Identity,
    payment: Option<&PaymentDetails>,
    now: chrono::DateTime<chrono::Utc>,
) -> RegistryResult<()> {
    if !listing.is_live(now) {
        return Err(RegistryError::ListingInactive);
    }
    if listing.seller.matches(&buyer.address) {
        return Err(RegistryError::SelfPurchase);
    }
    if let Some(details) = payment {
        if !details.currency.eq_ignore_ascii_case(&listing.currency) {
            return Err(RegistryError::PaymentMismatch(format!(
                "expected {} payment, got {}",
                listing.currency, details.currency
            )));
        }
        if !amounts_equal(&details.amount, &listing.price) {
            return Err(RegistryError::PaymentMismatch(format!(
                "expected {} {}, got {}",
                listing.price, listing.currency, details.amount
            )));
        }
        if !details.payer.matches(&buyer.address) {
            return Err(RegistryError::PaymentMismatch(
                "payment was sent from a different wallet".to_string(),
            ));
        }
    }
    Ok(())
}

// =============================================================================
// Aggregation
// =============================================================================
//
// Stats and analytics are derived from full scans; both backings load their
// tables into maps and defer to these.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::models::{CategoryCount, UserStats};

pub(crate) fn compute_stats(
    address: &WalletAddress,
    prompts: &HashMap<String, Prompt>,
    listings: &HashMap<String, Listing>,
    purchases: &[Purchase],
) -> UserStats {
    let prompts_created = prompts
        .values()
        .filter(|p| p.creator.matches(address))
        .count() as u64;

    let mut prompts_purchased = 0u64;
    let mut spent = 0u128;
    let mut earned = 0u128;
    for purchase in purchases {
        let Some(listing) = listings.get(&purchase.listing_id) else {
            continue;
        };
        let units = parse_amount(&listing.price).unwrap_or(0);
        if purchase.buyer.matches(address) {
            prompts_purchased += 1;
            spent = spent.saturating_add(units);
        }
        if listing.seller.matches(address) {
            earned = earned.saturating_add(units);
        }
    }

    UserStats {
        prompts_created,
        prompts_purchased,
        total_earnings: format_amount(earned),
        total_spent: format_amount(spent),
    }
}

pub(crate) fn compute_analytics(
    prompts: &HashMap<String, Prompt>,
    listings: &HashMap<String, Listing>,
    purchases: &[Purchase],
    now: DateTime<Utc>,
) -> MarketplaceAnalytics {
    let mut volume = 0u128;
    for purchase in purchases {
        if let Some(listing) = listings.get(&purchase.listing_id) {
            volume = volume.saturating_add(parse_amount(&listing.price).unwrap_or(0));
        }
    }

    let mut category_counts: HashMap<String, u64> = HashMap::new();
    let mut active_listings = 0u64;
    for listing in listings.values() {
        if !listing.is_live(now) {
            continue;
        }
        active_listings += 1;
        if let Some(prompt) = prompts.get(&listing.prompt_id) {
            *category_counts.entry(prompt.category.clone()).or_default() += 1;
        }
    }
    let mut top_categories: Vec<CategoryCount> = category_counts
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect();
    top_categories.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));

    let mut recent_sales: Vec<Purchase> = purchases.to_vec();
    recent_sales.sort_by(|a, b| b.purchased_at.cmp(&a.purchased_at).then_with(|| a.id.cmp(&b.id)));
    recent_sales.truncate(RECENT_SALES_LIMIT);

    MarketplaceAnalytics {
        total_prompts: prompts.len() as u64,
        total_sales: purchases.len() as u64,
        total_volume: format_amount(volume),
        active_listings,
        top_categories,
        recent_sales,
    }
}
