//! Menu catalog: items, per-size pizza prices and toppings.

use std::collections::BTreeMap;

use anyhow::Context;
use bigdecimal::BigDecimal;
use diesel::{
    ExpressionMethods, NullableExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper,
};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;

use crate::{
    app_error::AppError,
    models::{
        CreateItemEntity, CreatePizzaPriceEntity, CreateToppingEntity, ItemEntity,
        PizzaBasePriceEntity, PizzaSize, PizzaWithPrices, ToppingEntity, UpdateItemEntity,
        UpdatePizzaPriceEntity,
    },
    schema::{items, pizza_base_prices, toppings},
};

/// Category whose items are priced per size.
pub const PIZZA_CATEGORY: &str = "pizza";

pub async fn list_items(
    conn: &mut AsyncPgConnection,
    category: Option<&str>,
) -> Result<Vec<ItemEntity>, AppError> {
    let mut query = items::table
        .select(ItemEntity::as_select())
        .order_by(items::id.asc())
        .into_boxed();

    if let Some(category) = category {
        query = query.filter(items::category.eq(category));
    }

    let items = query.load(conn).await.context("Failed to get items")?;
    Ok(items)
}

pub async fn get_item(conn: &mut AsyncPgConnection, id: i32) -> Result<ItemEntity, AppError> {
    items::table
        .find(id)
        .select(ItemEntity::as_select())
        .first(conn)
        .await
        .optional()
        .context("Failed to get item")?
        .ok_or_else(|| AppError::not_found("Item", id))
}

pub async fn create_item(
    conn: &mut AsyncPgConnection,
    new_item: CreateItemEntity,
) -> Result<ItemEntity, AppError> {
    let item = diesel::insert_into(items::table)
        .values(new_item)
        .returning(ItemEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create item")?;

    debug!(item_id = item.id, "Created item");
    Ok(item)
}

/// Applies only the supplied fields; everything else keeps its stored value.
pub async fn update_item(
    conn: &mut AsyncPgConnection,
    id: i32,
    changes: UpdateItemEntity,
) -> Result<ItemEntity, AppError> {
    if changes.is_empty() {
        return get_item(conn, id).await;
    }

    diesel::update(items::table.find(id))
        .set(&changes)
        .returning(ItemEntity::as_returning())
        .get_result(conn)
        .await
        .optional()
        .context("Failed to update item")?
        .ok_or_else(|| AppError::not_found("Item", id))
}

/// Deletes an item together with its pizza prices. Nothing is removed when
/// the item does not exist.
pub async fn delete_item(conn: &mut AsyncPgConnection, id: i32) -> Result<(), AppError> {
    let deleted_prices = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let deleted_prices = diesel::delete(
                    pizza_base_prices::table.filter(pizza_base_prices::item_id.eq(id)),
                )
                .execute(conn)
                .await
                .context("Failed to delete pizza prices")?;

                let deleted_items = diesel::delete(items::table.find(id))
                    .execute(conn)
                    .await
                    .context("Failed to delete item")?;

                if deleted_items == 0 {
                    return Err(AppError::not_found("Item", id));
                }

                Ok::<usize, AppError>(deleted_prices)
            })
        })
        .await?;

    debug!(item_id = id, deleted_prices, "Deleted item");
    Ok(())
}

pub async fn create_pizza_price(
    conn: &mut AsyncPgConnection,
    new_price: CreatePizzaPriceEntity,
) -> Result<PizzaBasePriceEntity, AppError> {
    // Surface a missing item as 404 rather than a foreign key failure.
    get_item(conn, new_price.item_id).await?;

    let price = diesel::insert_into(pizza_base_prices::table)
        .values(new_price)
        .returning(PizzaBasePriceEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create pizza price")?;

    Ok(price)
}

pub async fn update_pizza_price(
    conn: &mut AsyncPgConnection,
    id: i32,
    changes: UpdatePizzaPriceEntity,
) -> Result<PizzaBasePriceEntity, AppError> {
    if changes.is_empty() {
        return pizza_base_prices::table
            .find(id)
            .select(PizzaBasePriceEntity::as_select())
            .first(conn)
            .await
            .optional()
            .context("Failed to get pizza price")?
            .ok_or_else(|| AppError::not_found("Pizza price", id));
    }

    diesel::update(pizza_base_prices::table.find(id))
        .set(&changes)
        .returning(PizzaBasePriceEntity::as_returning())
        .get_result(conn)
        .await
        .optional()
        .context("Failed to update pizza price")?
        .ok_or_else(|| AppError::not_found("Pizza price", id))
}

pub async fn pizzas_with_prices(
    conn: &mut AsyncPgConnection,
) -> Result<Vec<PizzaWithPrices>, AppError> {
    let rows: Vec<(ItemEntity, Option<PizzaBasePriceEntity>)> = items::table
        .left_join(pizza_base_prices::table)
        .filter(items::category.eq(PIZZA_CATEGORY))
        .order_by(items::id.asc())
        .then_order_by(pizza_base_prices::id.nullable().asc())
        .select((
            ItemEntity::as_select(),
            Option::<PizzaBasePriceEntity>::as_select(),
        ))
        .load(conn)
        .await
        .context("Failed to get pizzas with prices")?;

    Ok(group_pizza_prices(rows))
}

/// Folds joined `(item, price)` rows into one entry per item, ordered by
/// item id. Items without any price row keep an empty price map.
pub fn group_pizza_prices(
    rows: Vec<(ItemEntity, Option<PizzaBasePriceEntity>)>,
) -> Vec<PizzaWithPrices> {
    let mut grouped: BTreeMap<i32, PizzaWithPrices> = BTreeMap::new();

    for (item, price) in rows {
        let entry = grouped.entry(item.id).or_insert_with(|| PizzaWithPrices {
            item,
            prices: BTreeMap::new(),
        });

        if let Some(price) = price {
            entry.prices.insert(price.size, price.price);
        }
    }

    grouped.into_values().collect()
}

pub async fn list_available_toppings(
    conn: &mut AsyncPgConnection,
) -> Result<Vec<ToppingEntity>, AppError> {
    let toppings = toppings::table
        .filter(toppings::is_available.eq(true))
        .order_by(toppings::name.asc())
        .then_order_by(toppings::id.asc())
        .select(ToppingEntity::as_select())
        .load(conn)
        .await
        .context("Failed to get toppings")?;

    Ok(toppings)
}

pub async fn create_topping(
    conn: &mut AsyncPgConnection,
    new_topping: CreateToppingEntity,
) -> Result<ToppingEntity, AppError> {
    let topping = diesel::insert_into(toppings::table)
        .values(new_topping)
        .returning(ToppingEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create topping")?;

    Ok(topping)
}

pub async fn get_topping(conn: &mut AsyncPgConnection, id: i32) -> Result<ToppingEntity, AppError> {
    toppings::table
        .find(id)
        .select(ToppingEntity::as_select())
        .first(conn)
        .await
        .optional()
        .context("Failed to get topping")?
        .ok_or_else(|| AppError::not_found("Topping", id))
}

/// Current price of one unit of `item_id`, either for the given pizza size or
/// the item's flat price.
#[derive(Debug, Clone)]
pub struct ResolvedPrice {
    pub item_id: i32,
    pub item_name: String,
    pub unit_price: BigDecimal,
}

pub async fn resolve_unit_price(
    conn: &mut AsyncPgConnection,
    item_id: i32,
    size: Option<PizzaSize>,
) -> Result<ResolvedPrice, AppError> {
    let item = get_item(conn, item_id).await?;

    let unit_price = match size {
        Some(size) => pizza_base_prices::table
            .filter(pizza_base_prices::item_id.eq(item_id))
            .filter(pizza_base_prices::size.eq(size.as_str()))
            .select(pizza_base_prices::price)
            .first::<BigDecimal>(conn)
            .await
            .optional()
            .context("Failed to get pizza price")?
            .ok_or_else(|| {
                AppError::NotFound(format!("No {} price for item {}", size, item_id))
            })?,
        None => item.price.ok_or_else(|| {
            AppError::NotFound(format!(
                "Item {} has no flat price; a pizza size is required",
                item_id
            ))
        })?,
    };

    Ok(ResolvedPrice {
        item_id,
        item_name: item.name,
        unit_price,
    })
}
