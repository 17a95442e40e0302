//! Checkout: per-seller grouping, readiness checks and order summaries.

use std::{fmt, io};

use rand::Rng;
use rusty_money::{Money, MoneyError, iso::Currency};
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    cart::{Cart, CartError, CartLine},
    sellers::SellerRef,
};

/// Errors that can occur while preparing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Wrapper for cart errors.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Wrapper for money errors.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// Error writing a rendered summary.
    #[error("failed to write order summary")]
    Io,
}

/// How the buyer takes possession of an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentMethod {
    /// Collect from the seller's pickup spot.
    #[default]
    Pickup,

    /// The seller brings the order to the buyer's address.
    Delivery,
}

/// How the buyer pays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Card, charged on confirmation.
    #[default]
    Card,

    /// Manual bank transfer.
    #[serde(rename = "bank")]
    BankTransfer,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Card => "card",
            Self::BankTransfer => "bank transfer",
        };

        f.write_str(label)
    }
}

/// Who the sellers hand the order to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    /// Buyer's full name.
    pub name: String,

    /// Phone number sellers can reach the buyer on.
    pub phone: String,

    /// Email the confirmation goes to.
    pub email: String,
}

/// Where a delivery order goes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    /// Street and house number.
    pub street: String,

    /// Town or city.
    pub city: String,

    /// Postal code.
    pub postal_code: String,
}

/// A required checkout field found empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    /// The cart has no lines to order.
    CartItems,

    /// Buyer's full name.
    ContactName,

    /// Buyer's phone number.
    ContactPhone,

    /// Buyer's email address.
    ContactEmail,

    /// Delivery street, required for delivery orders.
    Street,

    /// Delivery city, required for delivery orders.
    City,

    /// Delivery postal code, required for delivery orders.
    PostalCode,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::CartItems => "cart items",
            Self::ContactName => "full name",
            Self::ContactPhone => "phone number",
            Self::ContactEmail => "email address",
            Self::Street => "street address",
            Self::City => "city",
            Self::PostalCode => "postal code",
        };

        f.write_str(label)
    }
}

/// Outcome of the pre-payment completeness check.
#[derive(Debug, Clone, Default)]
pub struct CheckoutReadiness {
    missing: SmallVec<[MissingField; 7]>,
}

impl CheckoutReadiness {
    /// Whether every required field is filled in.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.missing.is_empty()
    }

    /// The fields still needed, in check order.
    #[must_use]
    pub fn missing(&self) -> &[MissingField] {
        &self.missing
    }
}

/// Check that a cart and its details are complete enough to pay for.
///
/// Whitespace-only entries count as empty. The address is only consulted for
/// [`FulfillmentMethod::Delivery`]; pickup orders ignore it entirely.
#[must_use]
pub fn readiness(
    cart: &Cart,
    contact: &ContactDetails,
    method: FulfillmentMethod,
    address: Option<&DeliveryAddress>,
) -> CheckoutReadiness {
    let mut missing = SmallVec::new();

    if cart.is_empty() {
        missing.push(MissingField::CartItems);
    }

    if contact.name.trim().is_empty() {
        missing.push(MissingField::ContactName);
    }

    if contact.phone.trim().is_empty() {
        missing.push(MissingField::ContactPhone);
    }

    if contact.email.trim().is_empty() {
        missing.push(MissingField::ContactEmail);
    }

    if method == FulfillmentMethod::Delivery {
        let fallback = DeliveryAddress::default();
        let address = address.unwrap_or(&fallback);

        if address.street.trim().is_empty() {
            missing.push(MissingField::Street);
        }

        if address.city.trim().is_empty() {
            missing.push(MissingField::City);
        }

        if address.postal_code.trim().is_empty() {
            missing.push(MissingField::PostalCode);
        }
    }

    CheckoutReadiness { missing }
}

/// One seller's share of a cart: their lines, in cart order, and a subtotal.
#[derive(Debug)]
pub struct OrderGroup<'a> {
    seller: SellerRef,
    lines: Vec<&'a CartLine>,
    subtotal: Money<'static, Currency>,
}

impl<'a> OrderGroup<'a> {
    /// The seller this group belongs to.
    #[must_use]
    pub fn seller(&self) -> &SellerRef {
        &self.seller
    }

    /// The cart lines bought from this seller.
    #[must_use]
    pub fn lines(&self) -> &[&'a CartLine] {
        &self.lines
    }

    /// Sum of this seller's line totals.
    #[must_use]
    pub fn subtotal(&self) -> Money<'static, Currency> {
        self.subtotal
    }
}

/// Split a cart into per-seller groups.
///
/// Groups appear in the order their seller first appears in the cart, and
/// lines keep their cart order within each group. Every cart line lands in
/// exactly one group.
///
/// # Errors
///
/// Returns an error if a line total overflows or money arithmetic fails.
pub fn group(cart: &Cart) -> Result<Vec<OrderGroup<'_>>, CheckoutError> {
    let mut groups: Vec<OrderGroup<'_>> = Vec::new();

    for line in cart.lines() {
        let seller_key = line.snapshot().seller().key();
        let line_total = line.line_total()?;

        if let Some(existing) = groups
            .iter_mut()
            .find(|group| group.seller.key() == seller_key)
        {
            existing.subtotal = existing.subtotal.add(line_total)?;
            existing.lines.push(line);
        } else {
            groups.push(OrderGroup {
                seller: line.snapshot().seller().clone(),
                lines: vec![line],
                subtotal: line_total,
            });
        }
    }

    Ok(groups)
}

/// A cart broken down by seller, ready to confirm.
#[derive(Debug)]
pub struct OrderSummary<'a> {
    groups: Vec<OrderGroup<'a>>,
    total: Money<'static, Currency>,
    currency: &'static Currency,
}

impl OrderSummary<'_> {
    /// The per-seller groups, in first-appearance order.
    #[must_use]
    pub fn groups(&self) -> &[OrderGroup<'_>] {
        &self.groups
    }

    /// Grand total across every group.
    #[must_use]
    pub fn total(&self) -> Money<'static, Currency> {
        self.total
    }

    /// Currency used for all monetary values.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Render the summary as a table, one block of rows per seller.
    ///
    /// # Errors
    ///
    /// Returns an error if the summary cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), CheckoutError> {
        let mut builder = Builder::default();

        builder.push_record(["Seller", "Item", "Qty", "Unit", "Subtotal"]);

        let mut group_boundary_rows: SmallVec<[usize; 8]> = smallvec![];
        let mut current_row = 1;

        for group in &self.groups {
            group_boundary_rows.push(current_row);

            for (idx, line) in group.lines.iter().enumerate() {
                let seller_cell = if idx == 0 {
                    group.seller.name().to_string()
                } else {
                    String::new()
                };

                builder.push_record([
                    seller_cell,
                    line.snapshot().name().to_string(),
                    line.quantity().to_string(),
                    format!("{}", line.snapshot().unit_price()),
                    String::new(),
                ]);

                current_row += 1;
            }

            builder.push_record([
                String::new(),
                String::new(),
                String::new(),
                "Subtotal:".to_string(),
                format!("{}", group.subtotal),
            ]);

            current_row += 1;
        }

        let mut table = builder.build();
        let mut theme = Theme::from(Style::modern_rounded());
        let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

        theme.remove_horizontal_lines();

        for &row in &group_boundary_rows {
            theme.insert_horizontal_line(row, separator);
        }

        table.with(theme);
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Columns::new(2..5), Alignment::right());

        writeln!(out, "\n{table}").map_err(|_err| CheckoutError::Io)?;
        writeln!(out, " \x1b[1mTotal: {}\x1b[0m", self.total).map_err(|_err| CheckoutError::Io)
    }
}

/// Break a cart down by seller and total it up.
///
/// The grand total always equals the sum of the group subtotals, which in
/// turn equals the cart's own total.
///
/// # Errors
///
/// Returns an error if a line total overflows or money arithmetic fails.
pub fn summarize(cart: &Cart) -> Result<OrderSummary<'_>, CheckoutError> {
    let groups = group(cart)?;
    let total = groups
        .iter()
        .try_fold(Money::from_minor(0, cart.currency()), |acc, group| {
            acc.add(group.subtotal)
        })?;

    Ok(OrderSummary {
        groups,
        total,
        currency: cart.currency(),
    })
}

/// Human-readable order number, e.g. "ORD-483920".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderReference(String);

impl OrderReference {
    /// Generate a reference with a random six-digit suffix.
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        Self(format!("ORD-{}", rng.random_range(100_000..1_000_000)))
    }

    /// The reference as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
