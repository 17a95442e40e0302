//! The listing store: posting, expiry sweeps and stock updates.

use chrono::{DateTime, Utc};
use rusty_money::{Money, iso::Currency};
use slotmap::SlotMap;
use thiserror::Error;
use tracing::debug;

use crate::{
    listings::{Listing, ListingDraft, ListingKey},
    sellers::SellerKey,
};

/// Errors from store operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The draft's price was below zero.
    #[error("price must not be negative, got {0}")]
    NegativePrice(Money<'static, Currency>),

    /// The draft was priced in a currency the store does not trade in.
    #[error("store trades in {expected}, listing priced in {found}")]
    CurrencyMismatch {
        /// ISO code of the store's currency.
        expected: &'static str,

        /// ISO code of the draft's currency.
        found: &'static str,
    },

    /// The draft's location is outside the valid degree ranges.
    #[error("invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate {
        /// Latitude as given.
        latitude: f64,

        /// Longitude as given.
        longitude: f64,
    },

    /// No listing with this key is in the store.
    #[error("listing {0:?} not found")]
    NotFound(ListingKey),

    /// A stock decrement asked for more units than remain.
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock {
        /// Units the caller asked to take.
        requested: u32,

        /// Units actually left.
        available: u32,
    },
}

/// Holds every posted listing for one marketplace, in posting order.
///
/// A store trades in a single currency; drafts priced in anything else are
/// rejected at the door. Expired listings stay in place until a sweep or an
/// explicit removal, so readers see a consistent snapshot between sweeps.
#[derive(Debug)]
pub struct ListingStore {
    listings: SlotMap<ListingKey, Listing>,
    order: Vec<ListingKey>,
    currency: &'static Currency,
}

impl ListingStore {
    /// Create an empty store trading in the given currency.
    #[must_use]
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            listings: SlotMap::with_key(),
            order: Vec::new(),
            currency,
        }
    }

    /// The currency this store trades in.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Post a draft, stamping it with a fresh key and the posting time.
    ///
    /// # Errors
    ///
    /// Returns an error if the draft's price is negative or in the wrong
    /// currency, or if its location is outside the valid degree ranges.
    pub fn add(
        &mut self,
        draft: ListingDraft,
        now: DateTime<Utc>,
    ) -> Result<ListingKey, StoreError> {
        if draft.price.to_minor_units() < 0 {
            return Err(StoreError::NegativePrice(draft.price));
        }

        if draft.price.currency() != self.currency {
            return Err(StoreError::CurrencyMismatch {
                expected: self.currency.iso_alpha_code,
                found: draft.price.currency().iso_alpha_code,
            });
        }

        if !draft.location.is_valid() {
            return Err(StoreError::InvalidCoordinate {
                latitude: draft.location.latitude,
                longitude: draft.location.longitude,
            });
        }

        let key = self
            .listings
            .insert_with_key(|key| Listing::new(key, draft, now));
        self.order.push(key);

        Ok(key)
    }

    /// Take a listing down. Returns the listing, or `None` if it was
    /// already gone.
    pub fn remove(&mut self, key: ListingKey) -> Option<Listing> {
        let removed = self.listings.remove(key);

        if removed.is_some() {
            self.order.retain(|&held| held != key);
        }

        removed
    }

    /// Remove every listing whose expiry time has passed.
    ///
    /// Returns the keys that were removed, in posting order. Listings at
    /// exactly their expiry instant are removed too.
    pub fn sweep_expired(&mut self, now: DateTime<Utc>) -> Vec<ListingKey> {
        let listings = &mut self.listings;
        let mut removed = Vec::new();

        self.order.retain(|&key| {
            let expired = listings
                .get(key)
                .is_some_and(|listing| listing.is_expired(now));

            if expired {
                listings.remove(key);
                removed.push(key);
            }

            !expired
        });

        if !removed.is_empty() {
            debug!(count = removed.len(), "swept expired listings");
        }

        removed
    }

    /// Take units out of a listing's stock.
    ///
    /// The listing stays in the store even at zero stock; it just stops
    /// being active. Returns the quantity remaining after the decrement.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing is not in the store, or if it has
    /// fewer units left than requested.
    pub fn decrement_quantity(&mut self, key: ListingKey, amount: u32) -> Result<u32, StoreError> {
        let listing = self
            .listings
            .get_mut(key)
            .ok_or(StoreError::NotFound(key))?;
        let available = listing.quantity_available();

        if amount > available {
            return Err(StoreError::InsufficientStock {
                requested: amount,
                available,
            });
        }

        listing.reduce_quantity(amount);

        Ok(listing.quantity_available())
    }

    /// Snapshot of every active listing, in posting order.
    ///
    /// Active means unexpired with stock left. Expired listings that have
    /// not been swept yet are filtered out here, so browsing stays correct
    /// between sweeps.
    #[must_use]
    pub fn active_listings(&self, now: DateTime<Utc>) -> Vec<Listing> {
        self.order
            .iter()
            .filter_map(|&key| self.listings.get(key))
            .filter(|listing| listing.is_active(now))
            .cloned()
            .collect()
    }

    /// Snapshot of one seller's listings, in posting order.
    ///
    /// Includes sold-out listings still awaiting a sweep, so sellers see
    /// everything they currently have posted.
    #[must_use]
    pub fn listings_by_seller(&self, seller: SellerKey) -> Vec<Listing> {
        self.order
            .iter()
            .filter_map(|&key| self.listings.get(key))
            .filter(|listing| listing.seller().key() == seller)
            .cloned()
            .collect()
    }

    /// Look up a listing by key.
    #[must_use]
    pub fn get(&self, key: ListingKey) -> Option<&Listing> {
        self.listings.get(key)
    }

    /// Number of listings held, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listings.len()
    }

    /// Whether the store holds no listings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}
