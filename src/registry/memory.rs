// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Prompt Marketplace Contributors

//! In-memory registry backing.
//!
//! Used in tests and when no `DATA_DIR` is configured. Every operation
//! takes the single lock once; purchase performs its check-and-flip and
//! the purchase-record insert under one write guard, which is what makes
//! concurrent purchases yield exactly one winner.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{Duration, Utc};
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

#[derive(Default)]
struct Inner {
    prompts: HashMap<String, Prompt>,
    listings: HashMap<String, Listing>,
    purchases: Vec<Purchase>,
    /// Keyed by normalized (lowercased) wallet address.
    profiles: HashMap<String, UserProfile>,
}

/// Single-process marketplace store.
#[derive(Default)]
pub struct InMemoryRegistry {
    inner: RwLock<Inner>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RegistryResult<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| RegistryError::Store("registry lock poisoned".to_string()))
    }

    fn write(&self) -> RegistryResult<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| RegistryError::Store("registry lock poisoned".to_string()))
    }
}

impl MarketStore for InMemoryRegistry {
    fn create_prompt(
        &self,
        creator: &Identity,
        req: CreatePromptRequest,
    ) -> RegistryResult<Prompt> {
        let mut inner = self.write()?;
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
        inner.prompts.insert(prompt.id.clone(), prompt.clone());
        Ok(prompt)
    }

    fn get_prompt(&self, id: &str) -> RegistryResult<Prompt> {
        self.read()?
            .prompts
            .get(id)
            .cloned()
            .ok_or(RegistryError::PromptNotFound)
    }

    fn list_prompts(&self, query: &MarketQuery) -> RegistryResult<Vec<Prompt>> {
        let prompts = self.read()?.prompts.values().cloned().collect();
        Ok(apply_prompt_query(prompts, query))
    }

    fn prompts_by_creator(&self, address: &WalletAddress) -> RegistryResult<Vec<Prompt>> {
        let mut prompts: Vec<Prompt> = self
            .read()?
            .prompts
            .values()
            .filter(|p| p.creator.matches(address))
            .cloned()
            .collect();
        prompts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(prompts)
    }

    fn has_purchased(&self, buyer: &WalletAddress, prompt_id: &str) -> RegistryResult<bool> {
        let inner = self.read()?;
        Ok(inner.purchases.iter().any(|purchase| {
            purchase.buyer.matches(buyer)
                && inner
                    .listings
                    .get(&purchase.listing_id)
                    .is_some_and(|l| l.prompt_id == prompt_id)
        }))
    }

    fn create_listing(
        &self,
        seller: &Identity,
        req: CreateListingRequest,
    ) -> RegistryResult<Listing> {
        let mut inner = self.write()?;
        let now = Utc::now();

        let prompt = inner
            .prompts
            .get(&req.prompt_id)
            .ok_or(RegistryError::PromptNotFound)?;
        if !prompt.creator.matches(&seller.address) {
            return Err(RegistryError::NotPromptOwner);
        }
        if inner
            .listings
            .values()
            .any(|l| l.prompt_id == req.prompt_id && l.is_live(now))
        {
            return Err(RegistryError::DuplicateActiveListing);
        }

        let duration = Duration::days(
            req.duration_days
                .filter(|d| *d > 0)
                .unwrap_or(DEFAULT_LISTING_DURATION_DAYS),
        );
        let listing = Listing {
            id: Uuid::new_v4().to_string(),
            prompt_id: req.prompt_id,
            price: req.price,
            currency: req.currency,
            seller: seller.address.clone(),
            is_active: true,
            created_at: now,
            expires_at: now + duration,
        };
        inner.listings.insert(listing.id.clone(), listing.clone());
        Ok(listing)
    }

    fn get_listing(&self, id: &str) -> RegistryResult<Listing> {
        self.read()?
            .listings
            .get(id)
            .cloned()
            .ok_or(RegistryError::ListingNotFound)
    }

    fn list_active(&self, query: &MarketQuery) -> RegistryResult<Vec<ListingWithPrompt>> {
        let inner = self.read()?;
        let now = Utc::now();
        let listings = inner
            .listings
            .values()
            .filter(|l| l.is_live(now))
            .filter_map(|l| {
                let prompt = inner.prompts.get(&l.prompt_id)?;
                Some(ListingWithPrompt {
                    listing: l.clone(),
                    prompt: ListedPromptSummary {
                        title: prompt.title.clone(),
                        description: prompt.description.clone(),
                        category: prompt.category.clone(),
                    },
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
        // Check and flip under one write guard: the atomic step that
        // guarantees at most one winner.
        let mut inner = self.write()?;
        let now = Utc::now();

        let listing = inner
            .listings
            .get_mut(&req.listing_id)
            .ok_or(RegistryError::ListingNotFound)?;
        check_purchasable(listing, buyer, payment, now)?;

        listing.is_active = false;
        let purchase = Purchase {
            id: Uuid::new_v4().to_string(),
            listing_id: req.listing_id.clone(),
            buyer: buyer.address.clone(),
            transaction_hash: req.transaction_hash.clone(),
            purchased_at: now,
        };
        inner.purchases.push(purchase.clone());
        Ok(purchase)
    }

    fn cancel_listing(&self, seller: &Identity, listing_id: &str) -> RegistryResult<Listing> {
        let mut inner = self.write()?;
        let listing = inner
            .listings
            .get_mut(listing_id)
            .ok_or(RegistryError::ListingNotFound)?;

        if !listing.seller.matches(&seller.address) {
            return Err(RegistryError::NotSeller);
        }
        if !listing.is_active {
            return Err(RegistryError::ListingInactive);
        }

        listing.is_active = false;
        Ok(listing.clone())
    }

    fn profile(&self, address: &WalletAddress) -> RegistryResult<ProfileWithStats> {
        let inner = self.read()?;
        let profile = inner
            .profiles
            .get(&address.normalized())
            .cloned()
            .unwrap_or_else(|| UserProfile::empty(address.clone(), Utc::now()));
        let stats = compute_stats(address, &inner.prompts, &inner.listings, &inner.purchases);
        Ok(ProfileWithStats { profile, stats })
    }

    fn update_profile(
        &self,
        identity: &Identity,
        req: UpdateProfileRequest,
    ) -> RegistryResult<UserProfile> {
        let mut inner = self.write()?;
        let now = Utc::now();
        let profile = inner
            .profiles
            .entry(identity.address.normalized())
            .or_insert_with(|| UserProfile::empty(identity.address.clone(), now));

        // Merge semantics: provided fields replace, absent fields persist.
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

        Ok(profile.clone())
    }

    fn analytics(&self) -> RegistryResult<MarketplaceAnalytics> {
        let inner = self.read()?;
        Ok(compute_analytics(
            &inner.prompts,
            &inner.listings,
            &inner.purchases,
            Utc::now(),
        ))
    }
}
