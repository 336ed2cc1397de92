use crate::{config::Config, doc::ApiDoc, routes::health};
use axum::{Router, middleware, routing::get};
use models::tab::TabTypeRegistry;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod config;
pub mod doc;
pub mod dtos;
pub mod error;
pub mod routes;
pub mod tasks;
pub mod utils;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub registry: Arc<TabTypeRegistry>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        Self {
            db,
            registry: Arc::new(TabTypeRegistry::default()),
            config: Arc::new(config),
        }
    }
}

/// Routes that act on behalf of a caller, plus their OpenAPI description
///
/// Callers are identified by the [`auth::Requester`] extension, which is
/// filled in from validated JWT claims when an auth layer wraps this router.
pub fn api_router(state: AppState) -> (Router, utoipa::openapi::OpenApi) {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(routes::tabs::router())
        .merge(routes::programs::router())
        .merge(routes::program_enrollments::router())
        .merge(routes::program_course_enrollments::router())
        .merge(routes::grades::router())
        .merge(routes::overview::router())
        .merge(routes::social_auth::router())
        .merge(routes::reset::router())
        .split_for_parts();

    let router = router
        .layer(middleware::from_fn(auth::identify_requester))
        .with_state(state);
    (router, api)
}

/// Health check and API docs, reachable without credentials
pub fn public_router(state: AppState, api: utoipa::openapi::OpenApi) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api))
}

/// Full application without an auth layer
pub fn build_router(state: AppState) -> Router {
    let (api_routes, api) = api_router(state.clone());

    Router::new()
        .merge(api_routes)
        .merge(public_router(state, api))
        .layer(ServiceBuilder::new().layer(CompressionLayer::new()))
}
