use anyhow::Context;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, AppJson, StdResponse},
    app_state::AppState,
    models::{CreateToppingEntity, ToppingEntity},
    services::catalog,
    validation::{NAME_MAX_LEN, check_price, required},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/toppings",
        OpenApiRouter::new().routes(utoipa_axum::routes!(get_toppings, create_topping)),
    )
}

/// Fetch the toppings currently available, ordered by name.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Toppings"],
    responses(
        (status = 200, description = "Available toppings", body = StdResponse<Vec<ToppingEntity>, String>)
    )
)]
async fn get_toppings(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let toppings = catalog::list_available_toppings(conn).await?;

    Ok(StdResponse {
        data: Some(toppings),
        message: Some("Get toppings successfully"),
    })
}

#[derive(Deserialize, Serialize, Debug, ToSchema)]
pub struct CreateToppingReq {
    pub name: String,
    #[schema(value_type = String)]
    pub price: BigDecimal,
    pub is_available: Option<bool>,
}

/// Add a topping to the catalog.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Toppings"],
    request_body = CreateToppingReq,
    responses(
        (status = 201, description = "Created topping successfully", body = StdResponse<ToppingEntity, String>),
        (status = 400, description = "Missing or invalid field")
    )
)]
async fn create_topping(
    State(state): State<AppState>,
    AppJson(body): AppJson<CreateToppingReq>,
) -> Result<impl IntoResponse, AppError> {
    let name = required("name", body.name, NAME_MAX_LEN)?;
    check_price("price", Some(&body.price))?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let topping = catalog::create_topping(
        conn,
        CreateToppingEntity {
            name,
            price: body.price,
            is_available: body.is_available.unwrap_or(true),
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(topping),
            message: Some("Created topping successfully"),
        },
    ))
}
