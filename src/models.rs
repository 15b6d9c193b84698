use std::{collections::BTreeMap, fmt};

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::{
    Selectable,
    prelude::{AsChangeset, Associations, Identifiable, Insertable, Queryable},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Enumerations

/// Sizes a pizza can be priced and ordered in.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PizzaSize {
    Small,
    Medium,
    Large,
}

impl PizzaSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            PizzaSize::Small => "small",
            PizzaSize::Medium => "medium",
            PizzaSize::Large => "large",
        }
    }
}

impl fmt::Display for PizzaSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of an invoice. Only `Pending` is written by this service.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }
}

// Items

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ItemEntity {
    pub id: i32,
    pub name: String,
    pub category: String,
    pub description: String,
    pub is_available: bool,
    #[schema(value_type = Option<String>)]
    pub price: Option<BigDecimal>,
    pub image_path: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::items)]
pub struct CreateItemEntity {
    pub name: String,
    pub category: String,
    pub description: String,
    pub is_available: bool,
    pub price: Option<BigDecimal>,
    pub image_path: String,
}

/// Partial update of an item. `None` fields are left out of the `SET` clause,
/// so the stored value stays as it is.
#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = crate::schema::items)]
pub struct UpdateItemEntity {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_available: Option<bool>,
    pub price: Option<BigDecimal>,
    pub image_path: Option<String>,
}

impl UpdateItemEntity {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.is_available.is_none()
            && self.price.is_none()
            && self.image_path.is_none()
    }
}

// Pizza prices

#[derive(Queryable, Selectable, Identifiable, Associations, Serialize, Debug, Clone, ToSchema)]
#[diesel(belongs_to(ItemEntity, foreign_key = item_id))]
#[diesel(table_name = crate::schema::pizza_base_prices)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PizzaBasePriceEntity {
    pub id: i32,
    pub item_id: i32,
    pub size: String,
    #[schema(value_type = String)]
    pub price: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::pizza_base_prices)]
pub struct CreatePizzaPriceEntity {
    pub item_id: i32,
    pub size: String,
    pub price: BigDecimal,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = crate::schema::pizza_base_prices)]
pub struct UpdatePizzaPriceEntity {
    pub size: Option<String>,
    pub price: Option<BigDecimal>,
}

impl UpdatePizzaPriceEntity {
    pub fn is_empty(&self) -> bool {
        self.size.is_none() && self.price.is_none()
    }
}

/// A pizza item together with its price for every size it is offered in.
#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct PizzaWithPrices {
    #[serde(flatten)]
    pub item: ItemEntity,
    #[schema(value_type = BTreeMap<String, String>)]
    pub prices: BTreeMap<String, BigDecimal>,
}

// Toppings

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::toppings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ToppingEntity {
    pub id: i32,
    pub name: String,
    #[schema(value_type = String)]
    pub price: BigDecimal,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::toppings)]
pub struct CreateToppingEntity {
    pub name: String,
    pub price: BigDecimal,
    pub is_available: bool,
}

// Invoices

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::invoices)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct InvoiceEntity {
    pub id: i32,
    pub order_no: String,
    #[schema(value_type = String)]
    pub total_amount: BigDecimal,
    #[schema(value_type = String)]
    pub tax_amount: BigDecimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::invoices)]
pub struct CreateInvoiceEntity {
    pub order_no: String,
    pub total_amount: BigDecimal,
    pub tax_amount: BigDecimal,
    pub status: String,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Serialize, Debug, Clone, ToSchema)]
#[diesel(belongs_to(InvoiceEntity, foreign_key = invoice_id))]
#[diesel(table_name = crate::schema::invoice_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct InvoiceItemEntity {
    pub id: i32,
    pub invoice_id: i32,
    pub item_id: Option<i32>,
    pub item_name: String,
    pub size: Option<String>,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub unit_price: BigDecimal,
    #[schema(value_type = String)]
    pub subtotal: BigDecimal,
    #[schema(value_type = String)]
    pub line_total: BigDecimal,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::invoice_items)]
pub struct CreateInvoiceItemEntity {
    pub invoice_id: i32,
    pub item_id: Option<i32>,
    pub item_name: String,
    pub size: Option<String>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub subtotal: BigDecimal,
    pub line_total: BigDecimal,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Serialize, Debug, Clone, ToSchema)]
#[diesel(belongs_to(InvoiceItemEntity, foreign_key = invoice_item_id))]
#[diesel(table_name = crate::schema::invoice_item_toppings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct InvoiceItemToppingEntity {
    pub id: i32,
    pub invoice_item_id: i32,
    pub topping_id: Option<i32>,
    pub topping_name: String,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub price: BigDecimal,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::invoice_item_toppings)]
pub struct CreateInvoiceItemToppingEntity {
    pub invoice_item_id: i32,
    pub topping_id: Option<i32>,
    pub topping_name: String,
    pub quantity: i32,
    pub price: BigDecimal,
}
