//! Invoice engine: prices an order against the catalog and stores it as one
//! atomic aggregate.

use anyhow::Context;
use bigdecimal::BigDecimal;
use diesel::{
    BelongingToDsl, ExpressionMethods, GroupedBy, OptionalExtension, QueryDsl, QueryableByName,
    SelectableHelper,
    result::DatabaseErrorKind,
    sql_types::{BigInt, Nullable},
};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::{
    aliases::DieselError,
    app_error::AppError,
    models::{
        CreateInvoiceEntity, CreateInvoiceItemEntity, CreateInvoiceItemToppingEntity,
        InvoiceEntity, InvoiceItemEntity, InvoiceItemToppingEntity, InvoiceStatus, PizzaSize,
    },
    pricing::{self, PricedLine, PricedTopping},
    schema::{invoice_item_toppings, invoice_items, invoices},
    services::catalog,
    validation::{ORDER_NO_MAX_LEN, max_len_check},
};

// Input

#[derive(Deserialize, Debug, Clone, ToSchema)]
pub struct CreateInvoiceReq {
    pub order_no: String,
    pub items: Vec<CreateInvoiceItemReq>,
}

#[derive(Deserialize, Debug, Clone, ToSchema)]
pub struct CreateInvoiceItemReq {
    pub item_id: i32,
    /// Required for items priced per size (pizzas), omitted for flat-priced items.
    pub size: Option<PizzaSize>,
    pub quantity: i32,
    #[serde(default)]
    pub toppings: Vec<CreateInvoiceToppingReq>,
}

#[derive(Deserialize, Debug, Clone, ToSchema)]
pub struct CreateInvoiceToppingReq {
    pub topping_id: i32,
    pub quantity: i32,
}

impl CreateInvoiceReq {
    /// Checks required fields. Runs before any database access.
    pub fn validate(&self) -> Result<(), AppError> {
        let order_no = self.order_no.trim();
        if order_no.is_empty() {
            return Err(AppError::BadRequest("order_no is required".into()));
        }
        max_len_check("order_no", order_no, ORDER_NO_MAX_LEN)?;
        if self.items.is_empty() {
            return Err(AppError::BadRequest(
                "An invoice needs at least one item".into(),
            ));
        }

        for (index, item) in self.items.iter().enumerate() {
            if item.quantity <= 0 {
                return Err(AppError::BadRequest(format!(
                    "items[{}].quantity must be greater than zero",
                    index
                )));
            }
            for (topping_index, topping) in item.toppings.iter().enumerate() {
                if topping.quantity <= 0 {
                    return Err(AppError::BadRequest(format!(
                        "items[{}].toppings[{}].quantity must be greater than zero",
                        index, topping_index
                    )));
                }
            }
        }

        Ok(())
    }
}

// Output

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct InvoiceDetails {
    #[serde(flatten)]
    pub invoice: InvoiceEntity,
    pub items: Vec<InvoiceItemDetails>,
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct InvoiceItemDetails {
    #[serde(flatten)]
    pub item: InvoiceItemEntity,
    pub toppings: Vec<InvoiceItemToppingEntity>,
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct LatestOrderNo {
    pub order_no: String,
}

/// Prices every line, then inserts the invoice, its items and their
/// toppings in that order inside one transaction. Any failure, including an
/// unresolvable item, size or topping, rolls the whole invoice back.
pub async fn create_invoice(
    conn: &mut AsyncPgConnection,
    req: CreateInvoiceReq,
    tax_rate: BigDecimal,
) -> Result<InvoiceDetails, AppError> {
    req.validate()?;

    let details = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let mut lines = Vec::with_capacity(req.items.len());
                for item in &req.items {
                    lines.push(price_line(conn, item).await?);
                }

                let totals = pricing::invoice_totals(&lines, &tax_rate);

                let order_no = req.order_no.trim();
                let invoice = diesel::insert_into(invoices::table)
                    .values(CreateInvoiceEntity {
                        order_no: order_no.to_string(),
                        total_amount: totals.total_amount,
                        tax_amount: totals.tax_amount,
                        status: InvoiceStatus::Pending.as_str().into(),
                    })
                    .returning(InvoiceEntity::as_returning())
                    .get_result(conn)
                    .await
                    .map_err(|err| insert_invoice_error(err, order_no))?;

                let mut items = Vec::with_capacity(lines.len());
                for line in lines {
                    items.push(insert_line(conn, invoice.id, line).await?);
                }

                Ok::<InvoiceDetails, AppError>(InvoiceDetails { invoice, items })
            })
        })
        .await?;

    info!(
        invoice_id = details.invoice.id,
        order_no = %details.invoice.order_no,
        total = %details.invoice.total_amount,
        "Created invoice"
    );
    Ok(details)
}

async fn price_line(
    conn: &mut AsyncPgConnection,
    item: &CreateInvoiceItemReq,
) -> Result<PricedLine, AppError> {
    let resolved = catalog::resolve_unit_price(conn, item.item_id, item.size).await?;

    let mut toppings = Vec::with_capacity(item.toppings.len());
    for selection in &item.toppings {
        let topping = catalog::get_topping(conn, selection.topping_id).await?;
        toppings.push(PricedTopping {
            topping_id: topping.id,
            name: topping.name,
            quantity: selection.quantity,
            price: topping.price,
        });
    }

    Ok(PricedLine {
        item_id: resolved.item_id,
        item_name: resolved.item_name,
        size: item.size,
        quantity: item.quantity,
        unit_price: resolved.unit_price,
        toppings,
    })
}

async fn insert_line(
    conn: &mut AsyncPgConnection,
    invoice_id: i32,
    line: PricedLine,
) -> Result<InvoiceItemDetails, AppError> {
    let subtotal = line.subtotal();
    let line_total = line.line_total();

    let item = diesel::insert_into(invoice_items::table)
        .values(CreateInvoiceItemEntity {
            invoice_id,
            item_id: Some(line.item_id),
            item_name: line.item_name,
            size: line.size.map(|size| size.as_str().to_string()),
            quantity: line.quantity,
            unit_price: line.unit_price,
            subtotal,
            line_total,
        })
        .returning(InvoiceItemEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create invoice item")?;

    let mut toppings = Vec::with_capacity(line.toppings.len());
    for topping in line.toppings {
        let topping = diesel::insert_into(invoice_item_toppings::table)
            .values(CreateInvoiceItemToppingEntity {
                invoice_item_id: item.id,
                topping_id: Some(topping.topping_id),
                topping_name: topping.name,
                quantity: topping.quantity,
                price: topping.price,
            })
            .returning(InvoiceItemToppingEntity::as_returning())
            .get_result(conn)
            .await
            .context("Failed to create invoice item topping")?;
        toppings.push(topping);
    }

    Ok(InvoiceItemDetails { item, toppings })
}

fn insert_invoice_error(err: DieselError, order_no: &str) -> AppError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => AppError::Other(
            anyhow::anyhow!("Order number {} is already used by another invoice", order_no),
        ),
        err => AppError::Other(anyhow::Error::new(err).context("Failed to create invoice")),
    }
}

/// Loads an invoice with all of its items and toppings, each in insertion order.
pub async fn get_invoice(conn: &mut AsyncPgConnection, id: i32) -> Result<InvoiceDetails, AppError> {
    let invoice: InvoiceEntity = invoices::table
        .find(id)
        .select(InvoiceEntity::as_select())
        .first(conn)
        .await
        .optional()
        .context("Failed to get invoice")?
        .ok_or_else(|| AppError::not_found("Invoice", id))?;

    let items: Vec<InvoiceItemEntity> = InvoiceItemEntity::belonging_to(&invoice)
        .select(InvoiceItemEntity::as_select())
        .order_by(invoice_items::id.asc())
        .load(conn)
        .await
        .context("Failed to get invoice items")?;

    let toppings: Vec<InvoiceItemToppingEntity> = InvoiceItemToppingEntity::belonging_to(&items)
        .select(InvoiceItemToppingEntity::as_select())
        .order_by(invoice_item_toppings::id.asc())
        .load(conn)
        .await
        .context("Failed to get invoice item toppings")?;

    let items = toppings
        .grouped_by(&items)
        .into_iter()
        .zip(items)
        .map(|(toppings, item)| InvoiceItemDetails { item, toppings })
        .collect();

    Ok(InvoiceDetails { invoice, items })
}

/// Invoice headers, newest first.
pub async fn list_invoices(conn: &mut AsyncPgConnection) -> Result<Vec<InvoiceEntity>, AppError> {
    let invoices = invoices::table
        .select(InvoiceEntity::as_select())
        .order_by(invoices::created_at.desc())
        .then_order_by(invoices::id.desc())
        .load(conn)
        .await
        .context("Failed to get invoices")?;

    Ok(invoices)
}

#[derive(QueryableByName)]
struct MaxOrderNo {
    #[diesel(sql_type = Nullable<BigInt>)]
    max_order_no: Option<i64>,
}

/// Suggests the next order number from the largest numeric `order_no` on
/// file. Nothing is reserved, so concurrent callers can get the same value;
/// the unique constraint on `invoices.order_no` rejects the second insert.
pub async fn latest_order_no(conn: &mut AsyncPgConnection) -> Result<String, AppError> {
    let row: MaxOrderNo = diesel::sql_query(
        "SELECT MAX(order_no::BIGINT) AS max_order_no FROM invoices \
         WHERE order_no ~ '^[0-9]{1,18}$'",
    )
    .get_result(conn)
    .await
    .context("Failed to get latest order number")?;

    Ok(pricing::next_order_no(row.max_order_no))
}
