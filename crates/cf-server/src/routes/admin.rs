//! Maintenance and diagnostics.

use axum::extract::State;
use axum::Json;
use cf_pipeline::RetentionReport;
use serde::Serialize;

use crate::context::AppContext;

/// Result of a forced retention pass.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CleanupResponse {
    pub ok: bool,
    pub message: String,
    #[serde(flatten)]
    pub report: RetentionReport,
}

/// POST /api/cleanup
#[utoipa::path(
    post,
    path = "/api/cleanup",
    responses(
        (status = 200, description = "Retention pass finished", body = CleanupResponse)
    )
)]
pub async fn cleanup(State(ctx): State<AppContext>) -> Json<CleanupResponse> {
    let report = ctx.pipeline.force_retention_pass().await;
    Json(CleanupResponse {
        ok: true,
        message: "Cleanup completed".into(),
        report,
    })
}

/// GET /api/tools
#[utoipa::path(
    get,
    path = "/api/tools",
    responses(
        (status = 200, description = "External tool availability", body = Vec<cf_av::ToolInfo>)
    )
)]
pub async fn tools(State(ctx): State<AppContext>) -> Json<Vec<cf_av::ToolInfo>> {
    // Version detection spawns the tool synchronously.
    let tools = ctx.tools.clone();
    Json(blocking_list(move || tools.check_all()).await)
}

/// Run `f` on the blocking pool; a panicked task yields an empty list.
async fn blocking_list<T, F>(f: F) -> Vec<T>
where
    T: Send + 'static,
    F: FnOnce() -> Vec<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!("Tool check task failed: {e}");
            Vec::new()
        }
    }
}
