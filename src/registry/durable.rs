// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Prompt Marketplace Contributors

//! Durable registry backing on redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `prompts`: prompt_id → serialized Prompt (JSON bytes)
//! - `listings`: listing_id → serialized Listing
//! - `purchases`: purchase_id → serialized Purchase
//! - `profiles`: normalized wallet address → serialized UserProfile
//! - `active_by_prompt`: prompt_id → listing_id (the at-most-one active
//!   listing per prompt)
//!
//! Purchase runs inside a single write transaction: the listing flip, the
//! `active_by_prompt` removal, and the purchase insert commit together or
//! not at all. redb serializes writers, so concurrent purchases of the
//! same listing see each other's committed state and at most one wins.

use std::collections::HashMap;
use std::path::Path;

use chrono::{Duration, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use super::{
    apply_listing_query, apply_prompt_query, check_purchasable, compute_analytics, compute_stats,
    MarketStore, RegistryError, RegistryResult, DEFAULT_LISTING_DURATION_DAYS,
};
use crate::auth::Identity;
use crate::chain::PaymentDetails;
use crate::models::{
    CreateListingRequest, CreatePromptRequest, ListedPromptSummary, Listing, ListingWithPrompt,
    MarketQuery, MarketplaceAnalytics, ProfileWithStats, Prompt, Purchase, PurchaseRequest,
    UpdateProfileRequest, UserProfile, WalletAddress,
};

const PROMPTS: TableDefinition<&str, &[u8]> = TableDefinition::new("prompts");
const LISTINGS: TableDefinition<&str, &[u8]> = TableDefinition::new("listings");
const PURCHASES: TableDefinition<&str, &[u8]> = TableDefinition::new("purchases");
const PROFILES: TableDefinition<&str, &[u8]> = TableDefinition::new("profiles");
const ACTIVE_BY_PROMPT: TableDefinition<&str, &str> = TableDefinition::new("active_by_prompt");

fn store_err(e: impl std::fmt::Display) -> RegistryError {
    RegistryError::Store(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> RegistryResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(store_err)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> RegistryResult<T> {
    serde_json::from_slice(bytes).map_err(store_err)
}

/// Embedded ACID marketplace store.
pub struct RedbRegistry {
    db: Database,
}

impl RedbRegistry {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> RegistryResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path).map_err(store_err)?;

        // Pre-create all tables so later read transactions don't fail.
        let txn = db.begin_write().map_err(store_err)?;
        {
            let _ = txn.open_table(PROMPTS).map_err(store_err)?;
            let _ = txn.open_table(LISTINGS).map_err(store_err)?;
            let _ = txn.open_table(PURCHASES).map_err(store_err)?;
            let _ = txn.open_table(PROFILES).map_err(store_err)?;
            let _ = txn.open_table(ACTIVE_BY_PROMPT).map_err(store_err)?;
        }
        txn.commit().map_err(store_err)?;

        Ok(Self { db })
    }

    fn load_table<T: DeserializeOwned>(
        &self,
        table: TableDefinition<&str, &[u8]>,
    ) -> RegistryResult<HashMap<String, T>> {
        let txn = self.db.begin_read().map_err(store_err)?;
        let table = txn.open_table(table).map_err(store_err)?;
        let mut out = HashMap::new();
        for entry in table.iter().map_err(store_err)? {
            let (key, value) = entry.map_err(store_err)?;
            out.insert(key.value().to_string(), decode(value.value())?);
        }
        Ok(out)
    }

    fn load_purchases(&self) -> RegistryResult<Vec<Purchase>> {
        Ok(self
            .load_table::<Purchase>(PURCHASES)?
            .into_values()
            .collect())
    }

    fn get_record<T: DeserializeOwned>(
        &self,
        table: TableDefinition<&str, &[u8]>,
        key: &str,
    ) -> RegistryResult<Option<T>> {
        let txn = self.db.begin_read().map_err(store_err)?;
        let table = txn.open_table(table).map_err(store_err)?;
        match table.get(key).map_err(store_err)? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }
}

impl MarketStore for RedbRegistry {
    fn create_prompt(
        &self,
        creator: &Identity,
        req: CreatePromptRequest,
    ) -> RegistryResult<Prompt> {
        let prompt = Prompt {
            id: Uuid::new_v4().to_string(),
            title: req.title,
            description: req.description,
            category: req.category,
            content: req.content,
            tags: req.tags,
            price: req.price,
            creator: creator.address.clone(),
            ipfs_hash: req.ipfs_hash,
            created_at: Utc::now(),
        };

        let txn = self.db.begin_write().map_err(store_err)?;
        {
            let mut prompts = txn.open_table(PROMPTS).map_err(store_err)?;
            prompts
                .insert(prompt.id.as_str(), encode(&prompt)?.as_slice())
                .map_err(store_err)?;
        }
        txn.commit().map_err(store_err)?;
        Ok(prompt)
    }

    fn get_prompt(&self, id: &str) -> RegistryResult<Prompt> {
        self.get_record(PROMPTS, id)?
            .ok_or(RegistryError::PromptNotFound)
    }

    fn list_prompts(&self, query: &MarketQuery) -> RegistryResult<Vec<Prompt>> {
        let prompts = self
            .load_table::<Prompt>(PROMPTS)?
            .into_values()
            .collect();
        Ok(apply_prompt_query(prompts, query))
    }

    fn prompts_by_creator(&self, address: &WalletAddress) -> RegistryResult<Vec<Prompt>> {
        let mut prompts: Vec<Prompt> = self
            .load_table::<Prompt>(PROMPTS)?
            .into_values()
            .filter(|p| p.creator.matches(address))
            .collect();
        prompts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(prompts)
    }

    fn has_purchased(&self, buyer: &WalletAddress, prompt_id: &str) -> RegistryResult<bool> {
        let listings = self.load_table::<Listing>(LISTINGS)?;
        Ok(self.load_purchases()?.iter().any(|purchase| {
            purchase.buyer.matches(buyer)
                && listings
                    .get(&purchase.listing_id)
                    .is_some_and(|l| l.prompt_id == prompt_id)
        }))
    }

    fn create_listing(
        &self,
        seller: &Identity,
        req: CreateListingRequest,
    ) -> RegistryResult<Listing> {
        let now = Utc::now();
        let duration = Duration::days(
            req.duration_days
                .filter(|d| *d > 0)
                .unwrap_or(DEFAULT_LISTING_DURATION_DAYS),
        );

        let txn = self.db.begin_write().map_err(store_err)?;
        let listing = {
            let prompts = txn.open_table(PROMPTS).map_err(store_err)?;
            let prompt: Prompt = match prompts.get(req.prompt_id.as_str()).map_err(store_err)? {
                Some(value) => decode(value.value())?,
                None => return Err(RegistryError::PromptNotFound),
            };
            if !prompt.creator.matches(&seller.address) {
                return Err(RegistryError::NotPromptOwner);
            }
            drop(prompts);

            // The index may hold an expired listing; only a live one blocks.
            let mut listings = txn.open_table(LISTINGS).map_err(store_err)?;
            let mut active = txn.open_table(ACTIVE_BY_PROMPT).map_err(store_err)?;
            if let Some(existing_id) = active.get(req.prompt_id.as_str()).map_err(store_err)? {
                let existing_id = existing_id.value().to_string();
                if let Some(existing) = listings.get(existing_id.as_str()).map_err(store_err)? {
                    let existing: Listing = decode(existing.value())?;
                    if existing.is_live(now) {
                        return Err(RegistryError::DuplicateActiveListing);
                    }
                }
            }

            let listing = Listing {
                id: Uuid::new_v4().to_string(),
                prompt_id: req.prompt_id.clone(),
                price: req.price,
                currency: req.currency,
                seller: seller.address.clone(),
                is_active: true,
                created_at: now,
                expires_at: now + duration,
            };
            listings
                .insert(listing.id.as_str(), encode(&listing)?.as_slice())
                .map_err(store_err)?;
            active
                .insert(req.prompt_id.as_str(), listing.id.as_str())
                .map_err(store_err)?;
            listing
        };
        txn.commit().map_err(store_err)?;
        Ok(listing)
    }

    fn get_listing(&self, id: &str) -> RegistryResult<Listing> {
        self.get_record(LISTINGS, id)?
            .ok_or(RegistryError::ListingNotFound)
    }

    fn list_active(&self, query: &MarketQuery) -> RegistryResult<Vec<ListingWithPrompt>> {
        let now = Utc::now();
        let prompts = self.load_table::<Prompt>(PROMPTS)?;
        let listings = self
            .load_table::<Listing>(LISTINGS)?
            .into_values()
            .filter(|l| l.is_live(now))
            .filter_map(|l| {
                let prompt = prompts.get(&l.prompt_id)?;
                Some(ListingWithPrompt {
                    prompt: ListedPromptSummary {
                        title: prompt.title.clone(),
                        description: prompt.description.clone(),
                        category: prompt.category.clone(),
                    },
                    listing: l,
                })
            })
            .collect();
        Ok(apply_listing_query(listings, query))
    }

    fn purchase(
        &self,
        buyer: &Identity,
        req: &PurchaseRequest,
        payment: Option<&PaymentDetails>,
    ) -> RegistryResult<Purchase> {
        let now = Utc::now();

        let txn = self.db.begin_write().map_err(store_err)?;
        let purchase = {
            let mut listings = txn.open_table(LISTINGS).map_err(store_err)?;
            let listing: Listing = match listings.get(req.listing_id.as_str()).map_err(store_err)? {
                Some(value) => decode(value.value())?,
                None => return Err(RegistryError::ListingNotFound),
            };
            check_purchasable(&listing, buyer, payment, now)?;

            let mut sold = listing.clone();
            sold.is_active = false;
            listings
                .insert(req.listing_id.as_str(), encode(&sold)?.as_slice())
                .map_err(store_err)?;
            drop(listings);

            let mut active = txn.open_table(ACTIVE_BY_PROMPT).map_err(store_err)?;
            active
                .remove(sold.prompt_id.as_str())
                .map_err(store_err)?;
            drop(active);

            let purchase = Purchase {
                id: Uuid::new_v4().to_string(),
                listing_id: req.listing_id.clone(),
                buyer: buyer.address.clone(),
                transaction_hash: req.transaction_hash.clone(),
                purchased_at: now,
            };
            let mut purchases = txn.open_table(PURCHASES).map_err(store_err)?;
            purchases
                .insert(purchase.id.as_str(), encode(&purchase)?.as_slice())
                .map_err(store_err)?;
            purchase
        };
        txn.commit().map_err(store_err)?;
        Ok(purchase)
    }

    fn cancel_listing(&self, seller: &Identity, listing_id: &str) -> RegistryResult<Listing> {
        let txn = self.db.begin_write().map_err(store_err)?;
        let cancelled = {
            let mut listings = txn.open_table(LISTINGS).map_err(store_err)?;
            let listing: Listing = match listings.get(listing_id).map_err(store_err)? {
                Some(value) => decode(value.value())?,
                None => return Err(RegistryError::ListingNotFound),
            };
            if !listing.seller.matches(&seller.address) {
                return Err(RegistryError::NotSeller);
            }
            if !listing.is_active {
                return Err(RegistryError::ListingInactive);
            }

            let mut cancelled = listing;
            cancelled.is_active = false;
            listings
                .insert(listing_id, encode(&cancelled)?.as_slice())
                .map_err(store_err)?;
            drop(listings);

            let mut active = txn.open_table(ACTIVE_BY_PROMPT).map_err(store_err)?;
            active
                .remove(cancelled.prompt_id.as_str())
                .map_err(store_err)?;
            cancelled
        };
        txn.commit().map_err(store_err)?;
        Ok(cancelled)
    }

    fn profile(&self, address: &WalletAddress) -> RegistryResult<ProfileWithStats> {
        let profile = self
            .get_record::<UserProfile>(PROFILES, &address.normalized())?
            .unwrap_or_else(|| UserProfile::empty(address.clone(), Utc::now()));

        let prompts = self.load_table::<Prompt>(PROMPTS)?;
        let listings = self.load_table::<Listing>(LISTINGS)?;
        let purchases = self.load_purchases()?;
        let stats = compute_stats(address, &prompts, &listings, &purchases);

        Ok(ProfileWithStats { profile, stats })
    }

    fn update_profile(
        &self,
        identity: &Identity,
        req: UpdateProfileRequest,
    ) -> RegistryResult<UserProfile> {
        let now = Utc::now();
        let key = identity.address.normalized();

        let txn = self.db.begin_write().map_err(store_err)?;
        let profile = {
            let mut profiles = txn.open_table(PROFILES).map_err(store_err)?;
            let mut profile: UserProfile = match profiles.get(key.as_str()).map_err(store_err)? {
                Some(value) => decode(value.value())?,
                None => UserProfile::empty(identity.address.clone(), now),
            };

            if req.username.is_some() {
                profile.username = req.username;
            }
            if req.email.is_some() {
                profile.email = req.email;
            }
            if req.bio.is_some() {
                profile.bio = req.bio;
            }
            if req.avatar.is_some() {
                profile.avatar = req.avatar;
            }
            profile.updated_at = now;

            profiles
                .insert(key.as_str(), encode(&profile)?.as_slice())
                .map_err(store_err)?;
            profile
        };
        txn.commit().map_err(store_err)?;
        Ok(profile)
    }

    fn analytics(&self) -> RegistryResult<MarketplaceAnalytics> {
        let prompts = self.load_table::<Prompt>(PROMPTS)?;
        let listings = self.load_table::<Listing>(LISTINGS)?;
        let purchases = self.load_purchases()?;
        Ok(compute_analytics(&prompts, &listings, &purchases, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::*;
    use crate::registry::conformance;

    fn store() -> (RedbRegistry, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        let registry = RedbRegistry::open(&dir.path().join("registry.redb")).expect("open db");
        (registry, dir)
    }

    #[test]
    fn prompt_lifecycle() {
        let (registry, _dir) = store();
        conformance::prompt_lifecycle(&registry);
    }

    #[test]
    fn listing_requires_ownership() {
        let (registry, _dir) = store();
        conformance::listing_requires_ownership(&registry);
    }

    #[test]
    fn duplicate_active_listing_rejected() {
        let (registry, _dir) = store();
        conformance::duplicate_active_listing_rejected(&registry);
    }

    #[test]
    fn relisting_allowed_after_cancel() {
        let (registry, _dir) = store();
        conformance::relisting_allowed_after_cancel(&registry);
    }

    #[test]
    fn purchase_happy_path() {
        let (registry, _dir) = store();
        conformance::purchase_happy_path(&registry);
    }

    #[test]
    fn purchase_failure_modes() {
        let (registry, _dir) = store();
        conformance::purchase_failure_modes(&registry);
    }

    #[test]
    fn concurrent_purchase_single_winner() {
        let (registry, _dir) = store();
        conformance::concurrent_purchase_single_winner(Arc::new(registry));
    }

    #[test]
    fn cancel_listing_rules() {
        let (registry, _dir) = store();
        conformance::cancel_listing_rules(&registry);
    }

    #[test]
    fn active_listing_browse() {
        let (registry, _dir) = store();
        conformance::active_listing_browse(&registry);
    }

    #[test]
    fn profile_and_stats() {
        let (registry, _dir) = store();
        conformance::profile_and_stats(&registry);
    }

    #[test]
    fn analytics_aggregates() {
        let (registry, _dir) = store();
        conformance::analytics_aggregates(&registry);
    }

    #[test]
    fn data_survives_reopen() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("registry.redb");

        let prompt = {
            let registry = RedbRegistry::open(&path).expect("open db");
            registry
                .create_prompt(
                    &conformance::seller(),
                    conformance::prompt_request("T", "writing", "0.1"),
                )
                .unwrap()
        };

        let reopened = RedbRegistry::open(&path).expect("reopen db");
        assert_eq!(reopened.get_prompt(&prompt.id).unwrap(), prompt);
    }
}
