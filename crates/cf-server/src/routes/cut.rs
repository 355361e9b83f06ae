//! POST /api/cut: run one clip job.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::request_id::RequestId;

/// Request body for a cut.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CutRequest {
    /// Source media reference (an `http(s)://` URL).
    pub url: Option<String>,
    /// Comma-separated `mm:ss-mm:ss` ranges, in output order.
    pub timestamps: Option<String>,
}

/// Successful cut.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CutResponse {
    pub ok: bool,
    pub filename: String,
    pub download_url: String,
    pub preview_url: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

/// URL under which a stored artifact is served.
pub fn file_url(filename: &str) -> String {
    format!("/files/{filename}")
}

/// POST /api/cut
#[utoipa::path(
    post,
    path = "/api/cut",
    request_body = CutRequest,
    responses(
        (status = 200, description = "Clip produced", body = CutResponse),
        (status = 400, description = "Missing fields or malformed ranges"),
        (status = 422, description = "Extraction or concatenation failed"),
        (status = 502, description = "Source could not be fetched")
    )
)]
pub async fn cut(
    State(ctx): State<AppContext>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<CutRequest>, JsonRejection>,
) -> Result<Json<CutResponse>, AppError> {
    let reject = |e: cf_core::Error| AppError::from(e).with_request_id(request_id.0.clone());

    let Json(payload) = payload
        .map_err(|e| reject(cf_core::Error::InvalidInput(format!("invalid request body: {e}"))))?;

    let (Some(url), Some(timestamps)) = (payload.url, payload.timestamps) else {
        return Err(reject(cf_core::Error::InvalidInput(
            "url and timestamps are required".into(),
        )));
    };

    let artifact = ctx.pipeline.run(&url, &timestamps).await.map_err(reject)?;

    let url = file_url(&artifact.filename);
    Ok(Json(CutResponse {
        ok: true,
        download_url: url.clone(),
        preview_url: url,
        filename: artifact.filename,
        size: artifact.size,
        created_at: artifact.created_at,
    }))
}
