use anyhow::Context;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, AppJson, AppPath, StdResponse},
    app_state::AppState,
    models::InvoiceEntity,
    services::invoices::{self, CreateInvoiceReq, InvoiceDetails, LatestOrderNo},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/invoices",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_invoices, create_invoice))
            .routes(utoipa_axum::routes!(get_latest_order_no))
            .routes(utoipa_axum::routes!(get_invoice)),
    )
}

/// Fetch invoice headers, newest first.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Invoices"],
    responses(
        (status = 200, description = "List invoices", body = StdResponse<Vec<InvoiceEntity>, String>)
    )
)]
async fn get_invoices(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let invoices = invoices::list_invoices(conn).await?;

    Ok(StdResponse {
        data: Some(invoices),
        message: Some("Get invoices successfully"),
    })
}

/// Price an order against the current catalog and store it as an invoice.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Invoices"],
    request_body = CreateInvoiceReq,
    responses(
        (status = 201, description = "Created invoice successfully", body = StdResponse<InvoiceDetails, String>),
        (status = 400, description = "Invalid order"),
        (status = 404, description = "Unknown item, size or topping")
    )
)]
async fn create_invoice(
    State(state): State<AppState>,
    AppJson(body): AppJson<CreateInvoiceReq>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let invoice = invoices::create_invoice(conn, body, state.tax_rate.clone()).await?;

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(invoice),
            message: Some("Created invoice successfully"),
        },
    ))
}

/// Suggest the next order number.
#[utoipa::path(
    get,
    path = "/latest-order-no",
    tags = ["Invoices"],
    responses(
        (status = 200, description = "Next order number", body = StdResponse<LatestOrderNo, String>)
    )
)]
async fn get_latest_order_no(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let order_no = invoices::latest_order_no(conn).await?;

    Ok(StdResponse {
        data: Some(LatestOrderNo { order_no }),
        message: Some("Get latest order number successfully"),
    })
}

/// Fetch one invoice with its items and toppings.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Invoices"],
    params(
        ("id" = i32, Path, description = "Invoice ID")
    ),
    responses(
        (status = 200, description = "Invoice details", body = StdResponse<InvoiceDetails, String>),
        (status = 404, description = "Invoice not found")
    )
)]
async fn get_invoice(
    AppPath(id): AppPath<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let invoice = invoices::get_invoice(conn, id).await?;

    Ok(StdResponse {
        data: Some(invoice),
        message: Some("Get invoice successfully"),
    })
}
