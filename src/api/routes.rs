//! HTTP route definitions

use crate::api::handlers;
use crate::api::models::*;
use crate::api::relay_handlers;
use crate::config::CorsConfig;
use crate::task::{GenerationResult, ImageRecord};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, MethodRouter},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Gen Task Gateway API",
        description = "Drives asynchronous image-generation tasks to completion and relays single-shot chat completions.",
        license(name = "MIT"),
    ),
    paths(
        handlers::generate_image,
        handlers::health_check,
        relay_handlers::translate,
        relay_handlers::relay,
    ),
    components(schemas(
        GenerateImageBody,
        GenerationResult,
        ImageRecord,
        TaskFailureResponse,
        TaskInProgressResponse,
        ErrorResponse,
        RelayBody,
        RelayResponse,
        HealthResponse,
    )),
    tags(
        (name = "Images", description = "Image generation endpoints"),
        (name = "Relays", description = "Single-call chat relay endpoints"),
        (name = "Health", description = "Health and monitoring endpoints"),
    )
)]
pub struct ApiDoc;

/// POST-only endpoint: bare OPTIONS answers 200, every other method 405
fn post_only<H, T>(handler: H) -> MethodRouter<Arc<crate::AppState>>
where
    H: axum::handler::Handler<T, Arc<crate::AppState>>,
    T: 'static,
{
    post(handler)
        .options(handlers::preflight)
        .fallback(handlers::method_not_allowed)
}

/// CORS for browser callers; preflights are answered by the layer itself
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = if config.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Create the main application router
pub fn create_router(state: Arc<crate::AppState>) -> Router {
    let api_routes = Router::new()
        .route("/generate-image", post_only(handlers::generate_image))
        .route("/translate", post_only(relay_handlers::translate))
        .route("/relay/:name", post_only(relay_handlers::relay));

    let cors = cors_layer(&state.settings.cors);

    Router::new()
        // Health check endpoint
        .route("/health", get(handlers::health_check))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_routes)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
