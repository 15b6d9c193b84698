use axum::{Json, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::app_state::AppState;

pub mod invoices;
pub mod items;
pub mod pizza_prices;
pub mod toppings;
pub mod uploads;

/// Every route of the service with its OpenAPI description. Business routes
/// live under `/api`, the liveness probe at `/health`.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest(
            "/api",
            items::routes_with_openapi()
                .merge(pizza_prices::routes_with_openapi())
                .merge(toppings::routes_with_openapi())
                .merge(invoices::routes_with_openapi())
                .merge(uploads::routes_with_openapi()),
        )
        .routes(utoipa_axum::routes!(health))
}

#[derive(Serialize, ToSchema)]
pub struct HealthRes {
    status: &'static str,
}

/// Liveness probe. Does not touch the database.
#[utoipa::path(
    get,
    path = "/health",
    tags = ["Health"],
    responses(
        (status = 200, description = "Service is up", body = HealthRes)
    )
)]
async fn health() -> impl IntoResponse {
    Json(HealthRes { status: "ok" })
}
