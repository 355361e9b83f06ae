//! Chunked file responses with HTTP Range support.

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

const CHUNK_SIZE: usize = 64 * 1024;
const CACHE_CONTROL: &str = "public, max-age=3600";

/// Parse a `Range: bytes=START-END` header value.
///
/// Returns `(start, Option<end>)` where `end` is `None` for open-ended ranges
/// like `bytes=500-`. Suffix ranges (`bytes=-500`) and multi-range requests
/// are not supported and yield `None`.
pub fn parse_range_header(value: &str) -> Option<(u64, Option<u64>)> {
    let range_set = value.strip_prefix("bytes=")?;
    if range_set.contains(',') {
        return None;
    }
    let (start_str, end_str) = range_set.split_once('-')?;

    let start: u64 = start_str.trim().parse().ok()?;
    let end_str = end_str.trim();
    let end = if end_str.is_empty() {
        None
    } else {
        Some(end_str.parse().ok()?)
    };

    Some((start, end))
}

/// Guess the MIME type from a file extension.
pub fn guess_content_type(file_name: &str) -> &'static str {
    let ext = file_name.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "ts" => "video/mp2t",
        _ => "application/octet-stream",
    }
}

/// Stream an already opened file of `file_size` bytes, honouring an optional
/// `Range` header.
pub async fn serve_file(
    mut file: tokio::fs::File,
    file_name: &str,
    file_size: u64,
    range_header: Option<&str>,
) -> Result<Response, cf_core::Error> {
    let content_type = guess_content_type(file_name);

    let Some((start, end_opt)) = range_header.and_then(parse_range_header) else {
        let body = Body::from_stream(ReaderStream::with_capacity(file, CHUNK_SIZE));
        return Ok((
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, content_type.to_string()),
                (header::CONTENT_LENGTH, file_size.to_string()),
                (header::ACCEPT_RANGES, "bytes".to_string()),
                (header::CACHE_CONTROL, CACHE_CONTROL.to_string()),
            ],
            body,
        )
            .into_response());
    };

    if file_size == 0 || start >= file_size || end_opt.is_some_and(|end| end < start) {
        return Ok((
            StatusCode::RANGE_NOT_SATISFIABLE,
            [(header::CONTENT_RANGE, format!("bytes */{file_size}"))],
            Body::empty(),
        )
            .into_response());
    }

    let end = end_opt.unwrap_or(file_size - 1).min(file_size - 1);
    let length = end - start + 1;

    file.seek(std::io::SeekFrom::Start(start)).await?;
    let body = Body::from_stream(ReaderStream::with_capacity(file.take(length), CHUNK_SIZE));

    Ok((
        StatusCode::PARTIAL_CONTENT,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_RANGE, format!("bytes {start}-{end}/{file_size}")),
            (header::CONTENT_LENGTH, length.to_string()),
            (header::ACCEPT_RANGES, "bytes".to_string()),
            (header::CACHE_CONTROL, CACHE_CONTROL.to_string()),
        ],
        body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_range_full() {
        assert_eq!(parse_range_header("bytes=0-999"), Some((0, Some(999))));
    }

    #[test]
    fn parse_range_open_end() {
        assert_eq!(parse_range_header("bytes=500-"), Some((500, None)));
    }

    #[test]
    fn parse_range_rejects_unsupported_forms() {
        assert_eq!(parse_range_header("bytes=-500"), None);
        assert_eq!(parse_range_header("bytes=0-1,4-5"), None);
        assert_eq!(parse_range_header("items=0-1"), None);
    }

    #[test]
    fn content_types() {
        assert_eq!(guess_content_type("clip_x.mp4"), "video/mp4");
        assert_eq!(guess_content_type("clip_x.MKV"), "video/x-matroska");
        assert_eq!(guess_content_type("clip_x"), "application/octet-stream");
    }

    #[tokio::test]
    async fn range_past_end_is_416() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"0123456789").unwrap();
        let file = tokio::fs::File::open(&path).await.unwrap();

        let response = serve_file(file, "clip.mp4", 10, Some("bytes=10-")).await.unwrap();
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    }
}
