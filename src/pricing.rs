//! Invoice arithmetic.
//!
//! Everything here is a pure function of resolved catalog prices, so the
//! same order against the same catalog always produces the same totals.
//! Amounts are exact decimals; nothing is rounded.

use bigdecimal::{BigDecimal, Zero};

use crate::models::PizzaSize;

/// Order numbers start right after this value.
pub const ORDER_NO_BASE: i64 = 9999;

/// A topping selection with its price resolved from the catalog.
#[derive(Debug, Clone)]
pub struct PricedTopping {
    pub topping_id: i32,
    pub name: String,
    pub quantity: i32,
    pub price: BigDecimal,
}

/// An order line with its unit price and topping prices resolved.
#[derive(Debug, Clone)]
pub struct PricedLine {
    pub item_id: i32,
    pub item_name: String,
    pub size: Option<PizzaSize>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub toppings: Vec<PricedTopping>,
}

impl PricedLine {
    /// Toppings cost for a single unit of this line.
    pub fn toppings_per_unit(&self) -> BigDecimal {
        self.toppings
            .iter()
            .fold(BigDecimal::zero(), |acc, topping| {
                acc + &topping.price * BigDecimal::from(topping.quantity)
            })
    }

    /// Base price times quantity, toppings excluded.
    pub fn subtotal(&self) -> BigDecimal {
        &self.unit_price * BigDecimal::from(self.quantity)
    }

    /// `(unit price + toppings per unit) * quantity`.
    pub fn line_total(&self) -> BigDecimal {
        (&self.unit_price + self.toppings_per_unit()) * BigDecimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceTotals {
    pub total_amount: BigDecimal,
    pub tax_amount: BigDecimal,
}

pub fn invoice_totals(lines: &[PricedLine], tax_rate: &BigDecimal) -> InvoiceTotals {
    let total_amount = lines
        .iter()
        .fold(BigDecimal::zero(), |acc, line| acc + line.line_total());
    let tax_amount = &total_amount * tax_rate;

    InvoiceTotals {
        total_amount,
        tax_amount,
    }
}

/// Suggests the order number following `latest`. Advisory only: two callers
/// reading the same `latest` get the same suggestion.
pub fn next_order_no(latest: Option<i64>) -> String {
    (latest.unwrap_or(ORDER_NO_BASE) + 1).to_string()
}
