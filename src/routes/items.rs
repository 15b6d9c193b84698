use anyhow::Context;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, AppJson, AppPath, StdResponse},
    app_state::AppState,
    models::{CreateItemEntity, ItemEntity, UpdateItemEntity},
    services::catalog,
    validation::{CATEGORY_MAX_LEN, NAME_MAX_LEN, check_price, required},
};

/// Menu item routes. `{key}` is a category for `GET` and an item id for
/// `PUT`/`DELETE`; the router allows a single parameter name per segment.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/items",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_items, create_item))
            .routes(utoipa_axum::routes!(
                get_items_by_category,
                update_item,
                delete_item
            )),
    )
}

/// Fetch every menu item.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Items"],
    responses(
        (status = 200, description = "List items", body = StdResponse<Vec<ItemEntity>, String>)
    )
)]
async fn get_items(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let items = catalog::list_items(conn, None).await?;

    Ok(StdResponse {
        data: Some(items),
        message: Some("Get items successfully"),
    })
}

/// Fetch the menu items of one category.
#[utoipa::path(
    get,
    path = "/{key}",
    tags = ["Items"],
    params(
        ("key" = String, Path, description = "Category to filter by, e.g. pizza")
    ),
    responses(
        (status = 200, description = "List items in category", body = StdResponse<Vec<ItemEntity>, String>)
    )
)]
async fn get_items_by_category(
    AppPath(category): AppPath<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let items = catalog::list_items(conn, Some(&category)).await?;

    Ok(StdResponse {
        data: Some(items),
        message: Some("Get items successfully"),
    })
}

#[derive(Deserialize, Serialize, Debug, ToSchema)]
pub struct CreateItemReq {
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    /// Flat price; leave empty for items priced per size.
    #[schema(value_type = Option<String>)]
    pub price: Option<BigDecimal>,
    pub image_path: Option<String>,
    pub is_available: Option<bool>,
}

impl CreateItemReq {
    fn into_entity(self) -> Result<CreateItemEntity, AppError> {
        let name = required("name", self.name, NAME_MAX_LEN)?;
        let category = required("category", self.category, CATEGORY_MAX_LEN)?;
        check_price("price", self.price.as_ref())?;

        Ok(CreateItemEntity {
            name,
            category,
            description: self.description.unwrap_or_default(),
            is_available: self.is_available.unwrap_or(true),
            price: self.price,
            image_path: self.image_path.unwrap_or_default(),
        })
    }
}

/// Create a new menu item.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Items"],
    request_body = CreateItemReq,
    responses(
        (status = 201, description = "Created item successfully", body = StdResponse<ItemEntity, String>),
        (status = 400, description = "Missing or invalid field")
    )
)]
async fn create_item(
    State(state): State<AppState>,
    AppJson(body): AppJson<CreateItemReq>,
) -> Result<impl IntoResponse, AppError> {
    let new_item = body.into_entity()?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let item = catalog::create_item(conn, new_item).await?;

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(item),
            message: Some("Created item successfully"),
        },
    ))
}

/// Every field is optional; omitted fields keep their stored value.
#[derive(Deserialize, Serialize, Debug, Default, ToSchema)]
pub struct UpdateItemReq {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_available: Option<bool>,
    #[schema(value_type = Option<String>)]
    pub price: Option<BigDecimal>,
    pub image_path: Option<String>,
}

impl UpdateItemReq {
    fn into_entity(self) -> Result<UpdateItemEntity, AppError> {
        let name = self
            .name
            .map(|name| required("name", name, NAME_MAX_LEN))
            .transpose()?;
        check_price("price", self.price.as_ref())?;

        Ok(UpdateItemEntity {
            name,
            description: self.description,
            is_available: self.is_available,
            price: self.price,
            image_path: self.image_path,
        })
    }
}

/// Partially update a menu item.
#[utoipa::path(
    put,
    path = "/{key}",
    tags = ["Items"],
    params(
        ("key" = i32, Path, description = "Item ID to update")
    ),
    request_body = UpdateItemReq,
    responses(
        (status = 200, description = "Updated item successfully", body = StdResponse<ItemEntity, String>),
        (status = 404, description = "Item not found")
    )
)]
async fn update_item(
    AppPath(id): AppPath<i32>,
    State(state): State<AppState>,
    AppJson(body): AppJson<UpdateItemReq>,
) -> Result<impl IntoResponse, AppError> {
    let changes = body.into_entity()?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let item = catalog::update_item(conn, id, changes).await?;

    Ok(StdResponse {
        data: Some(item),
        message: Some("Updated item successfully"),
    })
}

/// Delete a menu item and its pizza prices.
#[utoipa::path(
    delete,
    path = "/{key}",
    tags = ["Items"],
    params(
        ("key" = i32, Path, description = "Item ID to delete")
    ),
    responses(
        (status = 200, description = "Deleted item successfully"),
        (status = 404, description = "Item not found")
    )
)]
async fn delete_item(
    AppPath(id): AppPath<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    catalog::delete_item(conn, id).await?;

    Ok(StdResponse::<(), &str> {
        data: None,
        message: Some("Item deleted successfully"),
    })
}
