//! The cart: lines aggregated from listings, with stock-aware quantities.

use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;
use tracing::warn;

use crate::{
    listings::{Listing, ListingKey},
    sellers::SellerRef,
};

/// Errors from cart operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CartError {
    /// The listing is priced in a currency the cart does not hold.
    #[error("cart holds {expected}, listing priced in {found}")]
    CurrencyMismatch {
        /// ISO code of the cart's currency.
        expected: &'static str,

        /// ISO code of the listing's currency.
        found: &'static str,
    },

    /// An add asked for zero units.
    #[error("quantity must be at least one")]
    ZeroQuantity,

    /// The listing has no stock left to add.
    #[error("listing {0:?} is out of stock")]
    OutOfStock(ListingKey),

    /// No cart line refers to this listing.
    #[error("listing {0:?} is not in the cart")]
    NotFound(ListingKey),

    /// A line total does not fit in minor units.
    #[error("line total does not fit in minor units")]
    AmountOverflow,

    /// Wrapper for money errors.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// What a cart line remembers about its listing from the moment it was added.
///
/// Carts outlive expiry sweeps, so lines keep their own copy of the fields
/// they need instead of borrowing from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingSnapshot {
    listing: ListingKey,
    name: String,
    unit_price: Money<'static, Currency>,
    seller: SellerRef,
    image: Option<String>,
    available: u32,
}

impl ListingSnapshot {
    fn of(listing: &Listing) -> Self {
        Self {
            listing: listing.key(),
            name: listing.name().to_string(),
            unit_price: listing.price(),
            seller: listing.seller().clone(),
            image: listing.images().first().cloned(),
            available: listing.quantity_available(),
        }
    }

    /// Key of the listing this snapshot was taken from.
    #[must_use]
    pub fn listing(&self) -> ListingKey {
        self.listing
    }

    /// Listing name at add time.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Price per unit at add time.
    #[must_use]
    pub fn unit_price(&self) -> Money<'static, Currency> {
        self.unit_price
    }

    /// The seller behind the listing.
    #[must_use]
    pub fn seller(&self) -> &SellerRef {
        &self.seller
    }

    /// Thumbnail image, if the listing had one.
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// Stock bound the cart last saw for this listing.
    #[must_use]
    pub fn available(&self) -> u32 {
        self.available
    }
}

/// One listing in the cart, at some quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    snapshot: ListingSnapshot,
    quantity: u32,
}

impl CartLine {
    /// The add-time snapshot this line is built on.
    #[must_use]
    pub fn snapshot(&self) -> &ListingSnapshot {
        &self.snapshot
    }

    /// Units of the listing in the cart.
    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Unit price times quantity.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not fit in minor units.
    pub fn line_total(&self) -> Result<Money<'static, Currency>, CartError> {
        let minor = self
            .snapshot
            .unit_price
            .to_minor_units()
            .checked_mul(i64::from(self.quantity))
            .ok_or(CartError::AmountOverflow)?;

        Ok(Money::from_minor(minor, self.snapshot.unit_price.currency()))
    }
}

/// Outcome of an add or update: the line's new quantity, and whether the
/// request was cut down to the available stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineChange {
    /// The listing whose line changed.
    pub listing: ListingKey,

    /// Quantity the line holds now.
    pub quantity: u32,

    /// Whether the requested quantity exceeded stock and was clamped.
    pub clamped: bool,
}

/// A buyer's cart, holding lines in the order they were first added.
///
/// Quantities never exceed the stock bound carried by each line's snapshot;
/// requests over the bound are clamped, never rejected.
#[derive(Debug, Clone)]
pub struct Cart {
    lines: Vec<CartLine>,
    currency: &'static Currency,
}

impl Cart {
    /// Create an empty cart holding the given currency.
    #[must_use]
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            lines: Vec::new(),
            currency,
        }
    }

    /// The currency this cart holds.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Put units of a listing in the cart.
    ///
    /// Adding a listing already in the cart merges into its line, adding the
    /// quantities and refreshing the line's stock bound from the listing.
    /// Either way the resulting quantity is clamped to that bound.
    ///
    /// # Errors
    ///
    /// Returns an error if the quantity is zero, the listing has no stock at
    /// all, or the listing is priced in a different currency than the cart.
    pub fn add_item(&mut self, listing: &Listing, quantity: u32) -> Result<LineChange, CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }

        if listing.price().currency() != self.currency {
            return Err(CartError::CurrencyMismatch {
                expected: self.currency.iso_alpha_code,
                found: listing.price().currency().iso_alpha_code,
            });
        }

        if listing.quantity_available() == 0 {
            return Err(CartError::OutOfStock(listing.key()));
        }

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.snapshot.listing == listing.key())
        {
            line.snapshot.available = listing.quantity_available();

            let requested = line.quantity.saturating_add(quantity);
            let granted = requested.min(line.snapshot.available);
            let available = line.snapshot.available;

            if granted < requested {
                warn!(
                    listing = ?listing.key(),
                    requested,
                    available,
                    "clamped cart quantity to available stock"
                );
            }

            line.quantity = granted;

            return Ok(LineChange {
                listing: listing.key(),
                quantity: granted,
                clamped: granted < requested,
            });
        }

        let snapshot = ListingSnapshot::of(listing);
        let granted = quantity.min(snapshot.available);
        let available = snapshot.available;

        if granted < quantity {
            warn!(
                listing = ?listing.key(),
                requested = quantity,
                available,
                "clamped cart quantity to available stock"
            );
        }

        self.lines.push(CartLine {
            snapshot,
            quantity: granted,
        });

        Ok(LineChange {
            listing: listing.key(),
            quantity: granted,
            clamped: granted < quantity,
        })
    }

    /// Set a line to an exact quantity, clamped to its stock bound.
    ///
    /// Setting zero removes the line and returns `Ok(None)` whether or not a
    /// line was there, the same quiet no-op as `remove_item`.
    ///
    /// # Errors
    ///
    /// Returns an error if the quantity is nonzero and no line refers to the
    /// listing.
    pub fn update_quantity(
        &mut self,
        listing: ListingKey,
        quantity: u32,
    ) -> Result<Option<LineChange>, CartError> {
        if quantity == 0 {
            self.remove_item(listing);

            return Ok(None);
        }

        let line = self
            .lines
            .iter_mut()
            .find(|line| line.snapshot.listing == listing)
            .ok_or(CartError::NotFound(listing))?;

        let granted = quantity.min(line.snapshot.available);
        let available = line.snapshot.available;

        if granted < quantity {
            warn!(
                listing = ?listing,
                requested = quantity,
                available,
                "clamped cart quantity to available stock"
            );
        }

        line.quantity = granted;

        Ok(Some(LineChange {
            listing,
            quantity: granted,
            clamped: granted < quantity,
        }))
    }

    /// Take a line out of the cart. Returns the line, or `None` if no line
    /// referred to the listing.
    pub fn remove_item(&mut self, listing: ListingKey) -> Option<CartLine> {
        let index = self
            .lines
            .iter()
            .position(|line| line.snapshot.listing == listing)?;

        Some(self.lines.remove(index))
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Grand total across every line.
    ///
    /// An empty cart totals to zero in the cart's currency.
    ///
    /// # Errors
    ///
    /// Returns an error if a line total overflows or money arithmetic fails.
    pub fn total(&self) -> Result<Money<'static, Currency>, CartError> {
        self.lines
            .iter()
            .try_fold(Money::from_minor(0, self.currency), |acc, line| {
                Ok(acc.add(line.line_total()?)?)
            })
    }

    /// The cart's lines, in first-add order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Look up the line for a listing.
    #[must_use]
    pub fn line(&self, listing: ListingKey) -> Option<&CartLine> {
        self.lines
            .iter()
            .find(|line| line.snapshot.listing == listing)
    }

    /// Total units across every line, the number a cart badge shows.
    #[must_use]
    pub fn unit_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Number of distinct listings in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use rusty_money::iso::{EUR, USD};
    use testresult::TestResult;

    use crate::{
        geo::Coordinate,
        listings::{Category, ListingDraft},
        sellers::{SellerDirectory, SellerRef},
        store::ListingStore,
    };

    use super::*;

    fn posted_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
    }

    fn seller(name: &str) -> SellerRef {
        let mut directory = SellerDirectory::new();

        directory.register(name)
    }

    fn stocked_store(quantity: u32) -> TestResult<(ListingStore, ListingKey)> {
        let mut store = ListingStore::new(EUR);

        let key = store.add(
            ListingDraft::new(
                "Fresh Tomatoes",
                Money::from_minor(300, EUR),
                quantity,
                Category::Vegetables,
                Coordinate::new(59.437, 24.754),
                seller("Maria's Garden"),
            )
            .with_image("https://example.com/tomato.jpg"),
            posted_at(),
        )?;

        Ok((store, key))
    }

    fn listing(store: &ListingStore, key: ListingKey) -> TestResult<Listing> {
        Ok(store.get(key).ok_or(CartError::NotFound(key))?.clone())
    }

    #[test]
    fn add_snapshots_the_listing() -> TestResult {
        let (store, key) = stocked_store(4)?;
        let mut cart = Cart::new(EUR);

        let change = cart.add_item(&listing(&store, key)?, 2)?;

        assert_eq!(change, LineChange { listing: key, quantity: 2, clamped: false });

        let line = cart.line(key).ok_or(CartError::NotFound(key))?;

        assert_eq!(line.snapshot().name(), "Fresh Tomatoes");
        assert_eq!(line.snapshot().unit_price(), Money::from_minor(300, EUR));
        assert_eq!(line.snapshot().image(), Some("https://example.com/tomato.jpg"));
        assert_eq!(line.snapshot().seller().name(), "Maria's Garden");

        Ok(())
    }

    #[test]
    fn adding_the_same_listing_merges_quantities() -> TestResult {
        let (store, key) = stocked_store(10)?;
        let mut cart = Cart::new(EUR);

        cart.add_item(&listing(&store, key)?, 2)?;
        let change = cart.add_item(&listing(&store, key)?, 3)?;

        assert_eq!(change.quantity, 5);
        assert!(!change.clamped);
        assert_eq!(cart.len(), 1);

        Ok(())
    }

    #[test]
    fn first_add_clamps_to_available_stock() -> TestResult {
        let (store, key) = stocked_store(4)?;
        let mut cart = Cart::new(EUR);

        let change = cart.add_item(&listing(&store, key)?, 10)?;

        assert_eq!(change, LineChange { listing: key, quantity: 4, clamped: true });

        Ok(())
    }

    #[test]
    fn merged_add_clamps_against_a_refreshed_bound() -> TestResult {
        let (mut store, key) = stocked_store(4)?;
        let mut cart = Cart::new(EUR);

        cart.add_item(&listing(&store, key)?, 2)?;

        // Someone else bought a unit; the merge sees the tighter bound.
        store.decrement_quantity(key, 1)?;
        let change = cart.add_item(&listing(&store, key)?, 5)?;

        assert_eq!(change.quantity, 3);
        assert!(change.clamped);

        Ok(())
    }

    #[test]
    fn zero_quantity_add_is_rejected() -> TestResult {
        let (store, key) = stocked_store(4)?;
        let mut cart = Cart::new(EUR);

        let result = cart.add_item(&listing(&store, key)?, 0);

        assert_eq!(result, Err(CartError::ZeroQuantity));
        assert!(cart.is_empty());

        Ok(())
    }

    #[test]
    fn sold_out_listing_cannot_be_added() -> TestResult {
        let (mut store, key) = stocked_store(2)?;
        store.decrement_quantity(key, 2)?;
        let mut cart = Cart::new(EUR);

        let result = cart.add_item(&listing(&store, key)?, 1);

        assert_eq!(result, Err(CartError::OutOfStock(key)));

        Ok(())
    }

    #[test]
    fn currency_mismatch_is_rejected() -> TestResult {
        let (store, key) = stocked_store(4)?;
        let mut cart = Cart::new(USD);

        let result = cart.add_item(&listing(&store, key)?, 1);

        assert_eq!(
            result,
            Err(CartError::CurrencyMismatch {
                expected: "USD",
                found: "EUR"
            })
        );

        Ok(())
    }

    #[test]
    fn update_clamps_and_reports_it() -> TestResult {
        let (store, key) = stocked_store(4)?;
        let mut cart = Cart::new(EUR);

        cart.add_item(&listing(&store, key)?, 1)?;
        let change = cart.update_quantity(key, 10)?;

        assert_eq!(change, Some(LineChange { listing: key, quantity: 4, clamped: true }));

        Ok(())
    }

    #[test]
    fn update_to_zero_removes_the_line() -> TestResult {
        let (store, key) = stocked_store(4)?;
        let mut cart = Cart::new(EUR);

        cart.add_item(&listing(&store, key)?, 2)?;

        assert_eq!(cart.update_quantity(key, 0)?, None);
        assert!(cart.is_empty());

        // Adding again starts a fresh line; nothing lingers from the old one.
        let change = cart.add_item(&listing(&store, key)?, 1)?;

        assert_eq!(change, LineChange { listing: key, quantity: 1, clamped: false });

        Ok(())
    }

    #[test]
    fn update_of_a_missing_line_is_an_error() {
        let mut cart = Cart::new(EUR);

        let result = cart.update_quantity(ListingKey::default(), 2);

        assert!(matches!(result, Err(CartError::NotFound(_))));
    }

    #[test]
    fn update_to_zero_is_idempotent_like_remove() -> TestResult {
        let (store, key) = stocked_store(4)?;
        let mut cart = Cart::new(EUR);

        cart.add_item(&listing(&store, key)?, 2)?;

        // Zeroing twice, or zeroing a key that was never added, stays quiet.
        assert_eq!(cart.update_quantity(key, 0)?, None);
        assert_eq!(cart.update_quantity(key, 0)?, None);
        assert_eq!(cart.update_quantity(ListingKey::default(), 0)?, None);

        Ok(())
    }

    #[test]
    fn remove_is_idempotent() -> TestResult {
        let (store, key) = stocked_store(4)?;
        let mut cart = Cart::new(EUR);

        cart.add_item(&listing(&store, key)?, 2)?;

        assert!(cart.remove_item(key).is_some());
        assert!(cart.remove_item(key).is_none());

        Ok(())
    }

    #[test]
    fn total_sums_unit_price_times_quantity() -> TestResult {
        let mut store = ListingStore::new(EUR);
        let maria = seller("Maria's Garden");

        let tomatoes = store.add(
            ListingDraft::new(
                "Fresh Tomatoes",
                Money::from_minor(300, EUR),
                5,
                Category::Vegetables,
                Coordinate::new(59.437, 24.754),
                maria.clone(),
            ),
            posted_at(),
        )?;
        let bread = store.add(
            ListingDraft::new(
                "Rye Bread",
                Money::from_minor(500, EUR),
                2,
                Category::Bakery,
                Coordinate::new(59.437, 24.754),
                maria,
            ),
            posted_at(),
        )?;

        let mut cart = Cart::new(EUR);
        cart.add_item(&listing(&store, tomatoes)?, 2)?;
        cart.add_item(&listing(&store, bread)?, 1)?;

        assert_eq!(cart.total()?, Money::from_minor(1100, EUR));
        assert_eq!(cart.unit_count(), 3);

        Ok(())
    }

    #[test]
    fn empty_cart_totals_to_zero() -> TestResult {
        let cart = Cart::new(EUR);

        assert_eq!(cart.total()?, Money::from_minor(0, EUR));

        Ok(())
    }

    #[test]
    fn cart_lines_outlive_the_listing() -> TestResult {
        let (mut store, key) = stocked_store(4)?;
        let mut cart = Cart::new(EUR);

        cart.add_item(&listing(&store, key)?, 2)?;
        store.remove(key);

        assert_eq!(cart.total()?, Money::from_minor(600, EUR));
        assert_eq!(cart.line(key).map(CartLine::quantity), Some(2));

        Ok(())
    }

    #[test]
    fn line_total_overflow_is_reported() -> TestResult {
        let mut store = ListingStore::new(EUR);

        let key = store.add(
            ListingDraft::new(
                "Gold Leaf Lettuce",
                Money::from_minor(i64::MAX, EUR),
                2,
                Category::Vegetables,
                Coordinate::new(59.437, 24.754),
                seller("Maria's Garden"),
            ),
            posted_at(),
        )?;

        let mut cart = Cart::new(EUR);
        cart.add_item(&listing(&store, key)?, 2)?;

        assert_eq!(cart.total(), Err(CartError::AmountOverflow));

        Ok(())
    }
}
