//! Unified error type for clipforge.
//!
//! All crates funnel their failures into [`Error`], which carries enough context
//! for API handlers to derive an HTTP status code via [`Error::http_status`]
//! and a caller-safe message via [`Error::public_message`].

use std::fmt;

use crate::range::RangeError;

/// Unified error type covering all failure modes of a clip job.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request was malformed or semantically invalid (bad range string,
    /// missing source reference). User-correctable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The media-fetch collaborator could not produce a local source file.
    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    /// Extracting one segment failed; `index` is the zero-based range index.
    #[error("Extraction failed for segment {index}: {message}")]
    ExtractionFailed {
        /// Position of the failing range in the caller's list.
        index: usize,
        /// Collaborator-provided detail.
        message: String,
    },

    /// Joining the extracted segments failed.
    #[error("Concat failed: {0}")]
    ConcatFailed(String),

    /// The pipeline reported success but the output file is absent or empty.
    #[error("Artifact missing: {0}")]
    ArtifactMissing(String),

    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "file").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// An external tool (ffmpeg) returned an error.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable machine-readable name of the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "invalid_input",
            Error::FetchFailed(_) => "fetch_failed",
            Error::ExtractionFailed { .. } => "extraction_failed",
            Error::ConcatFailed(_) => "concat_failed",
            Error::ArtifactMissing(_) => "artifact_missing",
            Error::NotFound { .. } => "not_found",
            Error::Tool { .. } => "tool_error",
            Error::Io { .. } => "internal_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::InvalidInput(_) => 400,
            Error::NotFound { .. } => 404,
            Error::FetchFailed(_) => 502,
            Error::ExtractionFailed { .. } => 422,
            Error::ConcatFailed(_) => 422,
            Error::Tool { .. } => 502,
            Error::ArtifactMissing(_) => 500,
            Error::Io { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Message that is safe to hand back to an API caller.
    ///
    /// Internal failures collapse to a generic sentence so filesystem paths
    /// and tool invocations never leave the process.
    pub fn public_message(&self) -> String {
        match self {
            Error::ArtifactMissing(_) => "output file was not produced".into(),
            Error::Io { .. } | Error::Internal(_) | Error::Tool { .. } => {
                "internal error".into()
            }
            other => other.to_string(),
        }
    }

    /// Whether the failure is user-correctable rather than a server fault.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.http_status())
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::ExtractionFailed`].
    pub fn extraction(index: usize, message: impl fmt::Display) -> Self {
        Error::ExtractionFailed {
            index,
            message: message.to_string(),
        }
    }
}

impl From<RangeError> for Error {
    fn from(e: RangeError) -> Self {
        Error::InvalidInput(e.to_string())
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
