//! Axum router construction.

use std::path::PathBuf;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::context::AppContext;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

/// JSON request bodies are tiny; anything larger is rejected.
const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::cut::cut,
        routes::files::get_file,
        routes::files::test_file,
        routes::admin::cleanup,
        routes::admin::tools,
        routes::health::health,
    ),
    components(schemas(
        routes::cut::CutRequest,
        routes::cut::CutResponse,
        routes::files::TestFileResponse,
        routes::admin::CleanupResponse,
        routes::health::HealthResponse,
        cf_pipeline::RetentionReport,
        cf_av::ToolInfo,
    ))
)]
pub struct ApiDoc;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext, static_dir: Option<PathBuf>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/cut", post(routes::cut::cut))
        .route("/test-file/{filename}", get(routes::files::test_file))
        .route("/cleanup", post(routes::admin::cleanup))
        .route("/tools", get(routes::admin::tools))
        .route("/health", get(routes::health::health));

    let mut app = Router::new()
        .nest("/api", api)
        .route("/files/{filename}", get(routes::files::get_file))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx);

    // Optional pre-built web UI with SPA fallback.
    if let Some(dir) = static_dir {
        if dir.exists() {
            tracing::info!("Serving static files from {:?}", dir);
            let index_path = dir.join("index.html");
            app = app.fallback_service(
                tower_http::services::ServeDir::new(&dir)
                    .append_index_html_on_directories(true)
                    .not_found_service(tower_http::services::ServeFile::new(index_path)),
            );
        } else {
            tracing::warn!("Static directory {:?} does not exist; UI disabled", dir);
        }
    }

    app
}
