//! Turg
//!
//! Turg is a geo-aware listing discovery and cart aggregation engine for hyper-local perishables marketplaces, written in Rust.

pub mod cart;
pub mod checkout;
pub mod discovery;
pub mod geo;
pub mod listings;
pub mod prelude;
pub mod schedule;
pub mod sellers;
pub mod store;
pub mod utils;
