use anyhow::Context;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, AppJson, AppPath, StdResponse},
    app_state::AppState,
    models::{
        CreatePizzaPriceEntity, PizzaBasePriceEntity, PizzaSize, PizzaWithPrices,
        UpdatePizzaPriceEntity,
    },
    services::catalog,
    validation::check_price,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(get_pizzas_with_prices))
        .nest(
            "/pizzaprice",
            OpenApiRouter::new()
                .routes(utoipa_axum::routes!(create_pizza_price))
                .routes(utoipa_axum::routes!(update_pizza_price)),
        )
}

/// Fetch every pizza with its price per size.
#[utoipa::path(
    get,
    path = "/pizzas-with-prices",
    tags = ["Pizza prices"],
    responses(
        (status = 200, description = "Pizzas with their size prices", body = StdResponse<Vec<PizzaWithPrices>, String>)
    )
)]
async fn get_pizzas_with_prices(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let pizzas = catalog::pizzas_with_prices(conn).await?;

    Ok(StdResponse {
        data: Some(pizzas),
        message: Some("Get pizzas with prices successfully"),
    })
}

#[derive(Deserialize, Serialize, Debug, ToSchema)]
pub struct CreatePizzaPriceReq {
    pub item_id: i32,
    pub size: PizzaSize,
    #[schema(value_type = String)]
    pub price: BigDecimal,
}

/// Set the price of a pizza in one size.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Pizza prices"],
    request_body = CreatePizzaPriceReq,
    responses(
        (status = 201, description = "Created pizza price successfully", body = StdResponse<PizzaBasePriceEntity, String>),
        (status = 400, description = "Invalid size or price"),
        (status = 404, description = "Item not found")
    )
)]
async fn create_pizza_price(
    State(state): State<AppState>,
    AppJson(body): AppJson<CreatePizzaPriceReq>,
) -> Result<impl IntoResponse, AppError> {
    check_price("price", Some(&body.price))?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let price = catalog::create_pizza_price(
        conn,
        CreatePizzaPriceEntity {
            item_id: body.item_id,
            size: body.size.as_str().to_string(),
            price: body.price,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(price),
            message: Some("Created pizza price successfully"),
        },
    ))
}

#[derive(Deserialize, Serialize, Debug, ToSchema)]
pub struct UpdatePizzaPriceReq {
    pub size: Option<PizzaSize>,
    #[schema(value_type = Option<String>)]
    pub price: Option<BigDecimal>,
}

/// Change the size or amount of an existing pizza price.
#[utoipa::path(
    put,
    path = "/{id}",
    tags = ["Pizza prices"],
    params(
        ("id" = i32, Path, description = "Pizza price ID to update")
    ),
    request_body = UpdatePizzaPriceReq,
    responses(
        (status = 200, description = "Updated pizza price successfully", body = StdResponse<PizzaBasePriceEntity, String>),
        (status = 404, description = "Pizza price not found")
    )
)]
async fn update_pizza_price(
    AppPath(id): AppPath<i32>,
    State(state): State<AppState>,
    AppJson(body): AppJson<UpdatePizzaPriceReq>,
) -> Result<impl IntoResponse, AppError> {
    check_price("price", body.price.as_ref())?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let price = catalog::update_pizza_price(
        conn,
        id,
        UpdatePizzaPriceEntity {
            size: body.size.map(|size| size.as_str().to_string()),
            price: body.price,
        },
    )
    .await?;

    Ok(StdResponse {
        data: Some(price),
        message: Some("Updated pizza price successfully"),
    })
}
