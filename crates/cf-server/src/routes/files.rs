//! Retrieval of finished clips.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use crate::context::AppContext;
use crate::error::AppError;
use crate::routes::cut::file_url;
use crate::routes::streaming::serve_file;

/// GET /files/{filename}
#[utoipa::path(
    get,
    path = "/files/{filename}",
    params(("filename" = String, Path, description = "Output file name")),
    responses(
        (status = 200, description = "Clip bytes"),
        (status = 206, description = "Partial clip bytes"),
        (status = 404, description = "No such clip")
    )
)]
pub async fn get_file(
    State(ctx): State<AppContext>,
    Path(filename): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let (file, artifact) = ctx.pipeline.retrieve(&filename).await?;
    let range = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
    Ok(serve_file(file, &artifact.filename, artifact.size, range).await?)
}

/// Existence probe for a clip.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct TestFileResponse {
    pub ok: bool,
    pub filename: String,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// GET /api/test-file/{filename}
#[utoipa::path(
    get,
    path = "/api/test-file/{filename}",
    params(("filename" = String, Path, description = "Output file name")),
    responses(
        (status = 200, description = "Whether the clip exists", body = TestFileResponse)
    )
)]
pub async fn test_file(
    State(ctx): State<AppContext>,
    Path(filename): Path<String>,
) -> Result<Json<TestFileResponse>, AppError> {
    let response = match ctx.pipeline.stat(&filename).await? {
        Some(artifact) => TestFileResponse {
            ok: true,
            exists: true,
            size: Some(artifact.size),
            url: Some(file_url(&artifact.filename)),
            filename,
        },
        None => TestFileResponse {
            ok: false,
            exists: false,
            size: None,
            url: None,
            filename,
        },
    };
    Ok(Json(response))
}
