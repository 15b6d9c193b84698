//! Service tests against a real PostgreSQL database.
//!
//! Set `TEST_DATABASE_URL` to run them; without it every test returns early.
//! Each test creates its own uniquely named catalog rows, so they can share
//! one database and run in parallel.

use std::{
    str::FromStr,
    sync::atomic::{AtomicU32, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

use bigdecimal::BigDecimal;
use diesel_async::AsyncPgConnection;
use diesel_migrations::{EmbeddedMigrations, embed_migrations};
use pizza_shop::{
    aliases::DbPool,
    app_error::AppError,
    config::DatabaseConfig,
    db,
    models::{
        CreateItemEntity, CreatePizzaPriceEntity, CreateToppingEntity, ItemEntity, PizzaSize,
        ToppingEntity, UpdateItemEntity, UpdatePizzaPriceEntity,
    },
    services::{
        catalog,
        invoices::{self, CreateInvoiceItemReq, CreateInvoiceReq, CreateInvoiceToppingReq},
    },
};
use tokio::sync::OnceCell;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

static MIGRATED: OnceCell<()> = OnceCell::const_new();
static SEQUENCE: AtomicU32 = AtomicU32::new(0);

async fn test_pool() -> Option<DbPool> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;

    MIGRATED
        .get_or_init(|| async {
            db::run_migrations_blocking(MIGRATIONS, &url)
                .await
                .expect("Failed to run migrations");
        })
        .await;

    let pool = db::create_pool(&DatabaseConfig {
        url,
        max_connections: 2,
    })
    .await
    .expect("Failed to create pool");
    Some(pool)
}

fn unique(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!(
        "{}-{}-{}",
        prefix,
        nanos % 1_000_000_000_000,
        SEQUENCE.fetch_add(1, Ordering::SeqCst)
    )
}

fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

async fn pizza(conn: &mut AsyncPgConnection, prices: &[(PizzaSize, &str)]) -> ItemEntity {
    let item = catalog::create_item(
        conn,
        CreateItemEntity {
            name: unique("Pizza"),
            category: catalog::PIZZA_CATEGORY.to_string(),
            description: "Test pizza".to_string(),
            is_available: true,
            price: None,
            image_path: String::new(),
        },
    )
    .await
    .unwrap();

    for (size, price) in prices {
        catalog::create_pizza_price(
            conn,
            CreatePizzaPriceEntity {
                item_id: item.id,
                size: size.as_str().to_string(),
                price: dec(price),
            },
        )
        .await
        .unwrap();
    }

    item
}

async fn topping(conn: &mut AsyncPgConnection, price: &str) -> ToppingEntity {
    catalog::create_topping(
        conn,
        CreateToppingEntity {
            name: unique("Topping"),
            price: dec(price),
            is_available: true,
        },
    )
    .await
    .unwrap()
}

fn line(
    item_id: i32,
    size: Option<PizzaSize>,
    quantity: i32,
    toppings: &[(i32, i32)],
) -> CreateInvoiceItemReq {
    CreateInvoiceItemReq {
        item_id,
        size,
        quantity,
        toppings: toppings
            .iter()
            .map(|&(topping_id, quantity)| CreateInvoiceToppingReq {
                topping_id,
                quantity,
            })
            .collect(),
    }
}

#[tokio::test]
async fn invoice_totals_include_toppings_and_tax() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let conn = &mut pool.get().await.unwrap();

    let margherita = pizza(conn, &[(PizzaSize::Large, "10.00")]).await;
    let cheese = topping(conn, "1.00").await;
    let olives = topping(conn, "1.50").await;

    let order_no = unique("T");
    let created = invoices::create_invoice(
        conn,
        CreateInvoiceReq {
            order_no: order_no.clone(),
            items: vec![line(
                margherita.id,
                Some(PizzaSize::Large),
                1,
                &[(cheese.id, 2), (olives.id, 1)],
            )],
        },
        dec("0.05"),
    )
    .await
    .unwrap();

    assert_eq!(created.invoice.order_no, order_no);
    assert_eq!(created.invoice.status, "pending");
    assert_eq!(created.invoice.total_amount, dec("13.50"));
    assert_eq!(created.invoice.tax_amount, dec("0.675"));
    assert_eq!(created.items.len(), 1);
    assert_eq!(created.items[0].item.subtotal, dec("10.00"));
    assert_eq!(created.items[0].item.line_total, dec("13.50"));
    assert_eq!(created.items[0].toppings.len(), 2);

    let fetched = invoices::get_invoice(conn, created.invoice.id).await.unwrap();
    assert_eq!(fetched.invoice.total_amount, dec("13.50"));
    assert_eq!(fetched.items.len(), 1);
    assert_eq!(fetched.items[0].item.item_name, margherita.name);
    assert_eq!(fetched.items[0].item.size.as_deref(), Some("large"));
    assert_eq!(fetched.items[0].toppings[0].topping_name, cheese.name);
    assert_eq!(fetched.items[0].toppings[0].quantity, 2);
    assert_eq!(fetched.items[0].toppings[1].topping_name, olives.name);

    let listed = invoices::list_invoices(conn).await.unwrap();
    assert!(listed.iter().any(|invoice| invoice.id == created.invoice.id));
}

#[tokio::test]
async fn unknown_topping_rolls_back_the_whole_invoice() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let conn = &mut pool.get().await.unwrap();

    let item = pizza(conn, &[(PizzaSize::Small, "7.00")]).await;
    let order_no = unique("T");

    let err = invoices::create_invoice(
        conn,
        CreateInvoiceReq {
            order_no: order_no.clone(),
            items: vec![
                line(item.id, Some(PizzaSize::Small), 1, &[]),
                line(item.id, Some(PizzaSize::Small), 1, &[(i32::MAX, 1)]),
            ],
        },
        dec("0.05"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let listed = invoices::list_invoices(conn).await.unwrap();
    assert!(listed.iter().all(|invoice| invoice.order_no != order_no));
}

#[tokio::test]
async fn missing_size_price_is_not_found() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let conn = &mut pool.get().await.unwrap();

    let item = pizza(conn, &[(PizzaSize::Small, "7.00")]).await;

    let err = invoices::create_invoice(
        conn,
        CreateInvoiceReq {
            order_no: unique("T"),
            items: vec![line(item.id, Some(PizzaSize::Large), 1, &[])],
        },
        dec("0.05"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = invoices::create_invoice(
        conn,
        CreateInvoiceReq {
            order_no: unique("T"),
            items: vec![line(item.id, None, 1, &[])],
        },
        dec("0.05"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn duplicate_order_no_is_rejected() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let conn = &mut pool.get().await.unwrap();

    let item = pizza(conn, &[(PizzaSize::Medium, "9.00")]).await;
    let order_no = unique("T");
    let req = CreateInvoiceReq {
        order_no: order_no.clone(),
        items: vec![line(item.id, Some(PizzaSize::Medium), 1, &[])],
    };

    invoices::create_invoice(conn, req.clone(), dec("0.05"))
        .await
        .unwrap();

    let padded = CreateInvoiceReq {
        order_no: format!("  {} ", order_no),
        ..req
    };
    let err = invoices::create_invoice(conn, padded, dec("0.05"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Other(_)));
    assert_eq!(
        err.to_string(),
        format!("Order number {} is already used by another invoice", order_no)
    );
}

#[tokio::test]
async fn invoices_keep_prices_after_catalog_changes() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let conn = &mut pool.get().await.unwrap();

    let item = pizza(conn, &[(PizzaSize::Medium, "9.00")]).await;
    let created = invoices::create_invoice(
        conn,
        CreateInvoiceReq {
            order_no: unique("T"),
            items: vec![line(item.id, Some(PizzaSize::Medium), 2, &[])],
        },
        dec("0.05"),
    )
    .await
    .unwrap();

    let price_count = catalog::pizzas_with_prices(conn)
        .await
        .unwrap()
        .into_iter()
        .find(|pizza| pizza.item.id == item.id)
        .map(|pizza| pizza.prices.len())
        .unwrap();
    assert_eq!(price_count, 1);

    catalog::delete_item(conn, item.id).await.unwrap();

    let fetched = invoices::get_invoice(conn, created.invoice.id).await.unwrap();
    assert_eq!(fetched.invoice.total_amount, dec("18.00"));
    assert_eq!(fetched.items[0].item.unit_price, dec("9.00"));
    assert_eq!(fetched.items[0].item.item_name, item.name);
    assert_eq!(fetched.items[0].item.item_id, None);
}

#[tokio::test]
async fn deleting_an_item_removes_its_prices() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let conn = &mut pool.get().await.unwrap();

    let item = pizza(conn, &[(PizzaSize::Small, "7.00"), (PizzaSize::Large, "11.00")]).await;

    catalog::delete_item(conn, item.id).await.unwrap();

    let err = catalog::resolve_unit_price(conn, item.id, Some(PizzaSize::Small))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let pizzas = catalog::pizzas_with_prices(conn).await.unwrap();
    assert!(pizzas.iter().all(|pizza| pizza.item.id != item.id));

    let err = catalog::delete_item(conn, item.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn partial_update_keeps_other_fields() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let conn = &mut pool.get().await.unwrap();

    let item = catalog::create_item(
        conn,
        CreateItemEntity {
            name: unique("Cola"),
            category: "beverage".to_string(),
            description: "Chilled".to_string(),
            is_available: true,
            price: Some(dec("1.99")),
            image_path: "/img/cola.png".to_string(),
        },
    )
    .await
    .unwrap();

    let updated = catalog::update_item(
        conn,
        item.id,
        UpdateItemEntity {
            is_available: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert!(!updated.is_available);
    assert_eq!(updated.name, item.name);
    assert_eq!(updated.description, "Chilled");
    assert_eq!(updated.price, Some(dec("1.99")));
    assert_eq!(updated.image_path, "/img/cola.png");

    let beverages = catalog::list_items(conn, Some("beverage")).await.unwrap();
    assert!(beverages.iter().any(|listed| listed.id == item.id));

    let err = catalog::update_item(
        conn,
        i32::MAX,
        UpdateItemEntity {
            is_available: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn flat_priced_items_are_invoiced_without_size() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let conn = &mut pool.get().await.unwrap();

    let cola = catalog::create_item(
        conn,
        CreateItemEntity {
            name: unique("Cola"),
            category: "beverage".to_string(),
            description: String::new(),
            is_available: true,
            price: Some(dec("2.50")),
            image_path: String::new(),
        },
    )
    .await
    .unwrap();

    let created = invoices::create_invoice(
        conn,
        CreateInvoiceReq {
            order_no: unique("T"),
            items: vec![line(cola.id, None, 4, &[])],
        },
        dec("0.1"),
    )
    .await
    .unwrap();

    assert_eq!(created.invoice.total_amount, dec("10.00"));
    assert_eq!(created.invoice.tax_amount, dec("1.000"));
    assert_eq!(created.items[0].item.size, None);
}

#[tokio::test]
async fn pizza_prices_can_be_updated() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let conn = &mut pool.get().await.unwrap();

    let item = pizza(conn, &[]).await;
    let price = catalog::create_pizza_price(
        conn,
        CreatePizzaPriceEntity {
            item_id: item.id,
            size: PizzaSize::Small.as_str().to_string(),
            price: dec("6.00"),
        },
    )
    .await
    .unwrap();

    let updated = catalog::update_pizza_price(
        conn,
        price.id,
        UpdatePizzaPriceEntity {
            price: Some(dec("6.50")),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.price, dec("6.50"));
    assert_eq!(updated.size, "small");

    let resolved = catalog::resolve_unit_price(conn, item.id, Some(PizzaSize::Small))
        .await
        .unwrap();
    assert_eq!(resolved.unit_price, dec("6.50"));
}

#[tokio::test]
async fn latest_order_no_follows_the_largest_numeric_order() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let conn = &mut pool.get().await.unwrap();

    let item = pizza(conn, &[(PizzaSize::Large, "10.00")]).await;

    let next = invoices::latest_order_no(conn).await.unwrap();
    let next_value: i64 = next.parse().unwrap();
    assert!(next_value >= 10000);

    invoices::create_invoice(
        conn,
        CreateInvoiceReq {
            order_no: next.clone(),
            items: vec![line(item.id, Some(PizzaSize::Large), 1, &[])],
        },
        dec("0.05"),
    )
    .await
    .unwrap();

    let after = invoices::latest_order_no(conn).await.unwrap();
    assert_eq!(after, (next_value + 1).to_string());
}

#[tokio::test]
async fn available_toppings_are_sorted_by_name() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let conn = &mut pool.get().await.unwrap();

    let prefix = unique("Sorted");
    for (suffix, is_available) in [("c", true), ("a", true), ("d", false), ("b", true)] {
        catalog::create_topping(
            conn,
            CreateToppingEntity {
                name: format!("{} {}", prefix, suffix),
                price: dec("0.50"),
                is_available,
            },
        )
        .await
        .unwrap();
    }

    let names: Vec<String> = catalog::list_available_toppings(conn)
        .await
        .unwrap()
        .into_iter()
        .filter(|topping| topping.name.starts_with(&prefix))
        .map(|topping| topping.name)
        .collect();

    assert_eq!(
        names,
        vec![
            format!("{} a", prefix),
            format!("{} b", prefix),
            format!("{} c", prefix),
        ]
    );
}

#[tokio::test]
async fn catalog_prices_are_stored_exactly() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let conn = &mut pool.get().await.unwrap();

    let item = catalog::create_item(
        conn,
        CreateItemEntity {
            name: unique("Garlic bread"),
            category: "side".to_string(),
            description: String::new(),
            is_available: true,
            price: Some(dec("99999999.99")),
            image_path: String::new(),
        },
    )
    .await
    .unwrap();
    assert_eq!(item.price, Some(dec("99999999.99")));

    let stored = catalog::list_items(conn, Some("side"))
        .await
        .unwrap()
        .into_iter()
        .find(|listed| listed.id == item.id)
        .unwrap();
    assert_eq!(stored.price, Some(dec("99999999.99")));

    let extra = topping(conn, "1.25").await;
    assert_eq!(catalog::get_topping(conn, extra.id).await.unwrap().price, dec("1.25"));
}
