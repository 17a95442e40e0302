//! Listings: perishable goods posted by sellers, live for a fixed window.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{
    Money,
    iso::{Currency, EUR, GBP, USD},
};
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use thiserror::Error;

use crate::{geo::Coordinate, sellers::SellerRef};

/// Hours a listing stays live before the expiry sweep removes it.
pub const LISTING_TTL_HOURS: i64 = 8;

new_key_type! {
    /// Unique key for a listing held in a store.
    pub struct ListingKey;
}

/// Produce categories a listing can be posted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Fresh vegetables.
    Vegetables,

    /// Fresh fruit and berries.
    Fruits,

    /// Milk, cheese and other dairy.
    Dairy,

    /// Bread and baked goods.
    Bakery,

    /// Anything that fits no other category.
    Other,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Self; 5] = [
        Self::Vegetables,
        Self::Fruits,
        Self::Dairy,
        Self::Bakery,
        Self::Other,
    ];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Vegetables => "Vegetables",
            Self::Fruits => "Fruits",
            Self::Dairy => "Dairy",
            Self::Bakery => "Bakery",
            Self::Other => "Other",
        };

        f.write_str(label)
    }
}

/// Error from reading a [`Category`] out of text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vegetables" => Ok(Self::Vegetables),
            "fruits" => Ok(Self::Fruits),
            "dairy" => Ok(Self::Dairy),
            "bakery" => Ok(Self::Bakery),
            "other" => Ok(Self::Other),
            unknown => Err(UnknownCategory(unknown.to_string())),
        }
    }
}

/// Errors from [`parse_price`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParsePriceError {
    /// The string was not in the form "AMOUNT CURRENCY", or the amount
    /// could not be read as a decimal.
    #[error("invalid price: {0}")]
    InvalidPrice(String),

    /// The currency code is not one the marketplace trades in.
    #[error("unknown currency: {0}")]
    UnknownCurrency(String),
}

/// Parse a price string like "3.50 EUR" into money.
///
/// The amount is taken in major units and converted to minor units with
/// banker's rounding, so "3.50 EUR" becomes 350 cents.
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount cannot be parsed as a decimal, or if the currency code
/// is not recognized.
pub fn parse_price(s: &str) -> Result<Money<'static, Currency>, ParsePriceError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    if parts.len() != 2 {
        return Err(ParsePriceError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    }

    let amount = parts
        .first()
        .ok_or_else(|| ParsePriceError::InvalidPrice(s.to_string()))?
        .parse::<Decimal>()
        .map_err(|_err| ParsePriceError::InvalidPrice(s.to_string()))?;

    let minor_units = amount
        .checked_mul(Decimal::new(100, 0))
        .and_then(|value| value.round_dp(0).to_i64())
        .ok_or_else(|| ParsePriceError::InvalidPrice(s.to_string()))?;

    let currency_code = parts
        .get(1)
        .ok_or_else(|| ParsePriceError::InvalidPrice(s.to_string()))?;

    let currency = match *currency_code {
        "EUR" => EUR,
        "USD" => USD,
        "GBP" => GBP,
        other => return Err(ParsePriceError::UnknownCurrency(other.to_string())),
    };

    Ok(Money::from_minor(minor_units, currency))
}

/// Everything a seller provides when posting a listing.
///
/// The store turns a draft into a [`Listing`] by stamping it with a key and
/// the posting time.
#[derive(Debug, Clone)]
pub struct ListingDraft {
    /// Short title shown in discovery results.
    pub name: String,

    /// Longer free-text description.
    pub description: String,

    /// Price per unit.
    pub price: Money<'static, Currency>,

    /// Units the seller has on hand.
    pub quantity_available: u32,

    /// Category the listing is posted under.
    pub category: Category,

    /// Where the goods are.
    pub location: Coordinate,

    /// Human-readable pickup spot, e.g. a street or market name.
    pub location_name: String,

    /// Image URLs, first one used as the thumbnail.
    pub images: Vec<String>,

    /// Whether the seller offers delivery as well as pickup.
    pub allow_delivery: bool,

    /// The seller posting the listing.
    pub seller: SellerRef,
}

impl ListingDraft {
    /// Create a draft with the required fields; the rest start empty.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        price: Money<'static, Currency>,
        quantity_available: u32,
        category: Category,
        location: Coordinate,
        seller: SellerRef,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            price,
            quantity_available,
            category,
            location,
            location_name: String::new(),
            images: Vec::new(),
            allow_delivery: false,
            seller,
        }
    }

    /// Set the free-text description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the human-readable pickup spot.
    #[must_use]
    pub fn with_location_name(mut self, location_name: impl Into<String>) -> Self {
        self.location_name = location_name.into();
        self
    }

    /// Append an image URL.
    #[must_use]
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.images.push(url.into());
        self
    }

    /// Offer delivery in addition to pickup.
    #[must_use]
    pub fn with_delivery(mut self) -> Self {
        self.allow_delivery = true;
        self
    }
}

/// A live listing: a draft stamped with its key, posting time and expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    key: ListingKey,
    name: String,
    description: String,
    price: Money<'static, Currency>,
    quantity_available: u32,
    category: Category,
    location: Coordinate,
    location_name: String,
    images: Vec<String>,
    allow_delivery: bool,
    seller: SellerRef,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Listing {
    pub(crate) fn new(key: ListingKey, draft: ListingDraft, now: DateTime<Utc>) -> Self {
        Self {
            key,
            name: draft.name,
            description: draft.description,
            price: draft.price,
            quantity_available: draft.quantity_available,
            category: draft.category,
            location: draft.location,
            location_name: draft.location_name,
            images: draft.images,
            allow_delivery: draft.allow_delivery,
            seller: draft.seller,
            created_at: now,
            expires_at: now + Duration::hours(LISTING_TTL_HOURS),
        }
    }

    /// The listing's key in its store.
    #[must_use]
    pub fn key(&self) -> ListingKey {
        self.key
    }

    /// Short title shown in discovery results.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Longer free-text description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Price per unit.
    #[must_use]
    pub fn price(&self) -> Money<'static, Currency> {
        self.price
    }

    /// Units still available.
    #[must_use]
    pub fn quantity_available(&self) -> u32 {
        self.quantity_available
    }

    /// Category the listing is posted under.
    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    /// Where the goods are.
    #[must_use]
    pub fn location(&self) -> Coordinate {
        self.location
    }

    /// Human-readable pickup spot.
    #[must_use]
    pub fn location_name(&self) -> &str {
        &self.location_name
    }

    /// Image URLs, first one used as the thumbnail.
    #[must_use]
    pub fn images(&self) -> &[String] {
        &self.images
    }

    /// Whether the seller offers delivery.
    #[must_use]
    pub fn allow_delivery(&self) -> bool {
        self.allow_delivery
    }

    /// The seller who posted the listing.
    #[must_use]
    pub fn seller(&self) -> &SellerRef {
        &self.seller
    }

    /// When the listing was posted.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the listing expires.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether the listing has reached its expiry time.
    ///
    /// A listing is expired from the expiry instant itself, so a sweep at
    /// exactly `created_at` plus the TTL removes it.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether the listing can still be bought: unexpired with stock left.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired(now) && self.quantity_available > 0
    }

    /// Time left before expiry, clamped to zero once passed.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }

    pub(crate) fn reduce_quantity(&mut self, amount: u32) {
        self.quantity_available = self.quantity_available.saturating_sub(amount);
    }
}
