//! Utils

use clap::Parser;

/// Arguments for the market day demo
#[derive(Debug, Parser)]
pub struct MarketDemoArgs {
    /// Buyer latitude for the discovery query
    #[clap(long, default_value_t = 59.437)]
    pub latitude: f64,

    /// Buyer longitude for the discovery query
    #[clap(long, default_value_t = 24.754)]
    pub longitude: f64,

    /// Search radius in kilometres
    #[clap(short, long, default_value_t = 10.0)]
    pub radius: f64,

    /// Free text matched against listing names and descriptions
    #[clap(short, long)]
    pub search: Option<String>,

    /// Only show listings posted under this category
    #[clap(short, long)]
    pub category: Option<String>,
}
