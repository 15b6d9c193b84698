pub mod aliases;
pub mod app_error;
pub mod app_state;
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod models;
pub mod pricing;
pub mod routes;
pub mod schema;
pub mod services;
pub mod swagger;
pub mod validation;

use axum::{
    Router,
    http::{Method, header},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::openapi::InfoBuilder;

use crate::app_state::AppState;

/// Full HTTP application: API routes, Swagger UI, CORS and request tracing.
pub fn app(state: AppState) -> Router {
    let (routes, mut openapi) = routes::routes_with_openapi().split_for_parts();
    openapi.info = InfoBuilder::new()
        .title("Pizza Shop API")
        .version(env!("CARGO_PKG_VERSION"))
        .build();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN]);

    Router::new()
        .merge(routes.with_state(state))
        .merge(swagger::create_swagger_ui(openapi))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
