//! Discovery: narrowing live listings by text, category and distance.

use thiserror::Error;

use crate::{
    geo::{Coordinate, distance_km},
    listings::{Category, Listing},
};

/// Search radius applied when the caller does not pick one, in kilometres.
pub const DEFAULT_RADIUS_KM: f64 = 10.0;

/// Scope of a query's category test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    /// Match listings in any category.
    #[default]
    All,

    /// Match only listings posted under one category.
    Only(Category),
}

/// Errors from query validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiscoveryError {
    /// The query's origin is outside the valid degree ranges.
    #[error("invalid origin: latitude {latitude}, longitude {longitude}")]
    InvalidOrigin {
        /// Latitude as given.
        latitude: f64,

        /// Longitude as given.
        longitude: f64,
    },

    /// The search radius was zero, negative or not a number.
    #[error("search radius must be positive, got {0}")]
    NonPositiveRadius(f64),
}

/// A browse query: free text, a category and an optional distance cut.
///
/// Every part is optional; the empty query matches everything. Tests are
/// combined with AND, mirroring how a buyer narrows a busy feed.
#[derive(Debug, Clone)]
pub struct DiscoveryQuery {
    /// Case-insensitive text matched against listing names and
    /// descriptions. Blank or missing text matches everything.
    pub text: Option<String>,

    /// Category test, [`CategoryFilter::All`] by default.
    pub category: CategoryFilter,

    /// Buyer's position. Without one the distance test is skipped.
    pub origin: Option<Coordinate>,

    /// Maximum distance from the origin, [`DEFAULT_RADIUS_KM`] by default.
    pub max_distance_km: f64,
}

impl Default for DiscoveryQuery {
    fn default() -> Self {
        Self {
            text: None,
            category: CategoryFilter::All,
            origin: None,
            max_distance_km: DEFAULT_RADIUS_KM,
        }
    }
}

impl DiscoveryQuery {
    /// Match listing names and descriptions against free text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Match only listings posted under one category.
    #[must_use]
    pub fn in_category(mut self, category: Category) -> Self {
        self.category = CategoryFilter::Only(category);
        self
    }

    /// Measure distances from this origin.
    #[must_use]
    pub fn near(mut self, origin: Coordinate) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Cap matches at this many kilometres from the origin.
    #[must_use]
    pub fn within_km(mut self, max_distance_km: f64) -> Self {
        self.max_distance_km = max_distance_km;
        self
    }

    /// Check the query's geographic parts.
    ///
    /// Without an origin there is nothing to measure from, so the radius
    /// goes unchecked.
    ///
    /// # Errors
    ///
    /// Returns an error if an origin is set but invalid, or if an origin is
    /// set and the radius is not a positive number.
    pub fn validate(&self) -> Result<(), DiscoveryError> {
        if let Some(origin) = self.origin {
            if !origin.is_valid() {
                return Err(DiscoveryError::InvalidOrigin {
                    latitude: origin.latitude,
                    longitude: origin.longitude,
                });
            }

            if self.max_distance_km.is_nan() || self.max_distance_km <= 0.0 {
                return Err(DiscoveryError::NonPositiveRadius(self.max_distance_km));
            }
        }

        Ok(())
    }

    /// Whether a listing passes every test the query sets.
    #[must_use]
    pub fn matches(&self, listing: &Listing) -> bool {
        self.matches_text(listing)
            && self.matches_category(listing)
            && self.matches_distance(listing)
    }

    fn matches_text(&self, listing: &Listing) -> bool {
        let Some(text) = &self.text else {
            return true;
        };

        let needle = text.trim().to_lowercase();

        needle.is_empty()
            || listing.name().to_lowercase().contains(&needle)
            || listing.description().to_lowercase().contains(&needle)
    }

    fn matches_category(&self, listing: &Listing) -> bool {
        match self.category {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => listing.category() == category,
        }
    }

    fn matches_distance(&self, listing: &Listing) -> bool {
        let Some(origin) = self.origin else {
            return true;
        };

        distance_km(origin, listing.location()) <= self.max_distance_km
    }
}

/// Filter a snapshot of listings down to those matching the query.
///
/// Input order is preserved, so results stay in posting order when fed from
/// the store. The query is validated first; a bad origin or radius fails
/// loudly instead of silently matching nothing.
///
/// # Errors
///
/// Returns an error if the query fails [`DiscoveryQuery::validate`].
pub fn filter<'a>(
    listings: &'a [Listing],
    query: &DiscoveryQuery,
) -> Result<Vec<&'a Listing>, DiscoveryError> {
    query.validate()?;

    Ok(listings
        .iter()
        .filter(|listing| query.matches(listing))
        .collect())
}
