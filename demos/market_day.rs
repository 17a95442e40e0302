//! Market Day Demo
//!
//! Seeds a small Tallinn marketplace, runs a discovery query over it, fills
//! a cart across two sellers and prints the per-seller order summary.
//!
//! Use `--latitude` / `--longitude` to move the buyer
//! Use `-r` to change the search radius
//! Use `-s` to search listing names and descriptions
//! Use `-c` to only show one category

use std::{io, io::Write, time::Instant};

use anyhow::{Context, Result};
use chrono::{NaiveTime, Utc};
use clap::Parser;
use humanize_duration::{Truncate, prelude::DurationExt};
use rusty_money::iso::EUR;

use turg::{
    cart::Cart,
    checkout::{self, ContactDetails, FulfillmentMethod, OrderReference, PaymentMethod},
    discovery::{self, DiscoveryQuery},
    geo::Coordinate,
    listings::{Category, ListingDraft, parse_price},
    schedule::{AvailabilityBook, WindowDraft},
    sellers::SellerDirectory,
    store::ListingStore,
    utils::MarketDemoArgs,
};

/// Market Day Demo
#[expect(clippy::print_stdout, reason = "Example program output to user")]
pub fn main() -> Result<()> {
    let args = MarketDemoArgs::parse();
    let now = Utc::now();

    let mut directory = SellerDirectory::new();
    let maria = directory.register("Maria's Garden");
    let jaan = directory.register("Jaan's Bakery");

    let mut store = ListingStore::new(EUR);

    let tomatoes = store.add(
        ListingDraft::new(
            "Fresh Tomatoes",
            parse_price("3.00 EUR")?,
            5,
            Category::Vegetables,
            Coordinate::new(59.440, 24.760),
            maria.clone(),
        )
        .with_description("Vine-ripened, picked this morning")
        .with_location_name("Kalamaja"),
        now,
    )?;

    store.add(
        ListingDraft::new(
            "Strawberries",
            parse_price("5.50 EUR")?,
            8,
            Category::Fruits,
            Coordinate::new(58.378, 26.729),
            maria.clone(),
        )
        .with_location_name("Tartu turg"),
        now,
    )?;

    let bread = store.add(
        ListingDraft::new(
            "Rye Bread",
            parse_price("5.00 EUR")?,
            4,
            Category::Bakery,
            Coordinate::new(59.430, 24.740),
            jaan.clone(),
        )
        .with_description("Dark sourdough loaf, baked today")
        .with_location_name("Telliskivi")
        .with_delivery(),
        now,
    )?;

    store.add(
        ListingDraft::new(
            "Farm Eggs",
            parse_price("4.20 EUR")?,
            12,
            Category::Other,
            Coordinate::new(59.445, 24.770),
            jaan.clone(),
        ),
        now,
    )?;

    let mut query = DiscoveryQuery::default()
        .near(Coordinate::new(args.latitude, args.longitude))
        .within_km(args.radius);

    if let Some(search) = args.search.as_deref() {
        query = query.with_text(search);
    }

    if let Some(category) = args.category.as_deref() {
        query = query.in_category(category.parse::<Category>()?);
    }

    let snapshot = store.active_listings(now);
    let matches = discovery::filter(&snapshot, &query)?;

    println!("Found {} listings near the buyer:", matches.len());

    for listing in &matches {
        let left = listing.remaining(now).to_std()?;

        println!(
            " {} x{} at {} from {} ({} left)",
            listing.name(),
            listing.quantity_available(),
            listing.price(),
            listing.seller().name(),
            left.human(Truncate::Minute),
        );
    }

    let start = Instant::now();

    let mut cart = Cart::new(EUR);

    let tomatoes = store
        .get(tomatoes)
        .context("tomatoes left the store")?
        .clone();
    let bread = store.get(bread).context("bread left the store")?.clone();

    cart.add_item(&tomatoes, 2)?;
    let change = cart.add_item(&bread, 10)?;

    if change.clamped {
        println!(
            "\nOnly {} loaves left, cart adjusted to match.",
            change.quantity
        );
    }

    let contact = ContactDetails {
        name: "Liis Tamm".to_string(),
        phone: "+372 5555 1234".to_string(),
        email: "liis@example.com".to_string(),
    };
    let check = checkout::readiness(&cart, &contact, FulfillmentMethod::Pickup, None);

    if !check.is_ready() {
        for field in check.missing() {
            println!("Still needed: {field}");
        }

        return Ok(());
    }

    let summary = checkout::summarize(&cart)?;
    let elapsed = start.elapsed();

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    summary.write_to(&mut handle)?;

    writeln!(
        handle,
        " {} ({}s)",
        elapsed.human(Truncate::Nano),
        elapsed.as_secs_f32()
    )?;

    let mut book = AvailabilityBook::new();
    let tomorrow = now.date_naive().succ_opt().context("calendar ran out")?;

    book.add_window(
        maria.key(),
        WindowDraft {
            date: tomorrow,
            start: NaiveTime::from_hms_opt(10, 0, 0).context("bad window start")?,
            end: NaiveTime::from_hms_opt(12, 0, 0).context("bad window end")?,
            location: Coordinate::new(59.440, 24.760),
            location_name: "Kalamaja".to_string(),
        },
    )?;

    let reference = OrderReference::generate(&mut rand::rng());
    let payment = PaymentMethod::default();

    writeln!(handle, "\nOrder {reference} confirmed, paid by {payment}.")?;

    for window in book.windows_for(maria.key()) {
        writeln!(
            handle,
            "Pick up from {} at {} on {}, {} to {}.",
            maria.name(),
            window.location_name(),
            window.date(),
            window.start(),
            window.end(),
        )?;
    }

    Ok(())
}
