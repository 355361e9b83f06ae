//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries all
//! sub-configs for the server, storage layout, retention policy, ffmpeg,
//! encoding, and the media fetcher. Every section defaults sensibly so a
//! completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub retention: RetentionConfig,
    pub tools: ToolsConfig,
    pub encode: EncodeConfig,
    pub fetcher: FetcherConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::InvalidInput(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.retention.max_outputs == 0 {
            warnings.push(
                "retention.max_outputs is 0; every finished clip is deleted by the next job".into(),
            );
        }

        if self.retention.workspace_max_age_secs < self.tools.timeout_secs {
            warnings.push(format!(
                "retention.workspace_max_age_secs ({}) is shorter than tools.timeout_secs ({}); \
                 expiry may remove the workspace of a running job",
                self.retention.workspace_max_age_secs, self.tools.timeout_secs
            ));
        }

        if self.fetcher.endpoint.is_none() {
            warnings.push(
                "fetcher.endpoint is not set; http(s) sources cannot be fetched until it points at the download service".into(),
            );
        }

        if self.fetcher.max_attempts == 0 {
            warnings.push("fetcher.max_attempts is 0; it will be treated as 1".into());
        }

        if self.encode.container.is_empty()
            || !self.encode.container.chars().all(|c| c.is_ascii_alphanumeric())
        {
            warnings.push(format!(
                "encode.container '{}' is not a plain file extension",
                self.encode.container
            ));
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Optional directory holding a pre-built web UI.
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 10000,
            static_dir: None,
        }
    }
}

/// On-disk layout. Outputs and scratch space both live under `data_dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    /// Durable store for finished clips.
    pub fn output_dir(&self) -> PathBuf {
        self.data_dir.join("outputs")
    }

    /// Root under which per-job workspaces are created.
    pub fn scratch_dir(&self) -> PathBuf {
        self.data_dir.join("tmp")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
        }
    }
}

/// Disk-usage bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Finished clips kept in the output store.
    pub max_outputs: usize,
    /// Scratch directories older than this are assumed abandoned.
    pub workspace_max_age_secs: u64,
}

impl RetentionConfig {
    pub fn workspace_max_age(&self) -> Duration {
        Duration::from_secs(self.workspace_max_age_secs)
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_outputs: 5,
            workspace_max_age_secs: 3600,
        }
    }
}

/// Paths and limits for external CLI tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    /// Per-invocation ffmpeg timeout.
    pub timeout_secs: u64,
}

impl ToolsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            timeout_secs: 300,
        }
    }
}

/// Segment encoding parameters. Every segment is encoded identically so the
/// final join can be a stream copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    /// Container / file extension for segments and outputs.
    pub container: String,
    pub video_codec: String,
    pub audio_codec: String,
    pub preset: String,
    pub crf: u32,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            container: "mp4".into(),
            video_codec: "libx264".into(),
            audio_codec: "aac".into(),
            preset: "veryfast".into(),
            crf: 23,
        }
    }
}

/// Remote media download service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// `POST` endpoint accepting `{"url": .., "format": ..}` and answering with
    /// the media bytes.
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
    /// Total attempts for retryable failures (429, 5xx, connect errors).
    pub max_attempts: u32,
}

impl FetcherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: 600,
            max_attempts: 2,
        }
    }
}
