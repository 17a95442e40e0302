//! Turg prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartError, CartLine, LineChange, ListingSnapshot},
    checkout::{
        CheckoutError, CheckoutReadiness, ContactDetails, DeliveryAddress, FulfillmentMethod,
        MissingField, OrderGroup, OrderReference, OrderSummary, PaymentMethod, group, readiness,
        summarize,
    },
    discovery::{CategoryFilter, DEFAULT_RADIUS_KM, DiscoveryError, DiscoveryQuery, filter},
    geo::{Coordinate, distance_km},
    listings::{
        Category, LISTING_TTL_HOURS, Listing, ListingDraft, ListingKey, ParsePriceError,
        UnknownCategory, parse_price,
    },
    schedule::{AvailabilityBook, PickupWindow, ScheduleError, WindowDraft, WindowKey},
    sellers::{Seller, SellerDirectory, SellerKey, SellerRef},
    store::{ListingStore, StoreError},
};
