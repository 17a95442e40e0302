//! Sellers and the directory that issues their keys.

use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Unique key for a registered seller.
    pub struct SellerKey;
}

/// A seller registered with the marketplace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seller {
    /// Display name shown on listings and order groups.
    pub name: String,
}

/// A seller's key paired with the display name it was registered under.
///
/// Listings and cart lines carry this instead of a bare [`SellerKey`] so that
/// grouping and rendering never need a directory lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellerRef {
    key: SellerKey,
    name: String,
}

impl SellerRef {
    /// The seller's key.
    #[must_use]
    pub fn key(&self) -> SellerKey {
        self.key
    }

    /// The seller's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Registry of sellers, keyed by [`SellerKey`].
#[derive(Debug, Default)]
pub struct SellerDirectory {
    sellers: SlotMap<SellerKey, Seller>,
}

impl SellerDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a seller and return a reference carrying its new key.
    pub fn register(&mut self, name: impl Into<String>) -> SellerRef {
        let name = name.into();
        let key = self.sellers.insert(Seller { name: name.clone() });

        SellerRef { key, name }
    }

    /// Look up a seller by key.
    #[must_use]
    pub fn get(&self, key: SellerKey) -> Option<&Seller> {
        self.sellers.get(key)
    }

    /// Number of registered sellers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sellers.len()
    }

    /// Whether no sellers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sellers.is_empty()
    }
}
