//! Configuration types for draft-sync

use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use url::Url;
use utoipa::ToSchema;

/// Main configuration for DraftSyncEngine
///
/// Fields are organized into logical sub-configs:
/// - [`persistence`](PersistenceConfig) - database location and store key
/// - [`compression`](CompressionConfig) - media directory and codec settings
/// - [`publish`](PublishConfig) - HTTP publish endpoint
/// - [`connectivity`](ConnectivityConfig) - reachability probe and auto-sync
/// - [`api`](ApiConfig) - REST API server
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Data storage settings
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Media compression settings
    #[serde(default)]
    pub compression: CompressionConfig,

    /// Publish service settings
    #[serde(default)]
    pub publish: PublishConfig,

    /// Connectivity observation and automatic sync
    #[serde(default)]
    pub connectivity: ConnectivityConfig,

    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PersistenceConfig {
    /// Database path (default: "./drafts.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Key under which the draft array is stored (default: "offline-drafts")
    #[serde(default = "default_store_key")]
    pub store_key: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            store_key: default_store_key(),
        }
    }
}

/// Media compression configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CompressionConfig {
    /// Directory where compressed payloads are written (default: "./media")
    #[serde(default = "default_media_dir")]
    pub media_dir: PathBuf,

    /// Longest edge of a re-encoded image in pixels (default: 1920)
    #[serde(default = "default_max_image_dimension")]
    pub max_image_dimension: u32,

    /// JPEG quality for re-encoded images, 1-100 (default: 80)
    #[serde(default = "default_image_quality")]
    pub image_quality: u8,

    /// Maximum height of transcoded video in pixels (default: 720)
    #[serde(default = "default_video_max_height")]
    pub video_max_height: u32,

    /// x264 constant rate factor for transcoded video (default: 28)
    #[serde(default = "default_video_crf")]
    pub video_crf: u8,

    /// Path to ffmpeg executable (auto-detected if None)
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Whether to search PATH for ffmpeg if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            media_dir: default_media_dir(),
            max_image_dimension: default_max_image_dimension(),
            image_quality: default_image_quality(),
            video_max_height: default_video_max_height(),
            video_crf: default_video_crf(),
            ffmpeg_path: None,
            search_path: true,
        }
    }
}

/// Publish service configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PublishConfig {
    /// Endpoint drafts are POSTed to (None = no HTTP publisher configured)
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub endpoint: Option<Url>,

    /// Request timeout (default: 60 seconds)
    #[serde(default = "default_publish_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub timeout: Duration,

    /// Value for the Authorization header
    #[serde(default)]
    pub auth_header: Option<String>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout: default_publish_timeout(),
            auth_header: None,
        }
    }
}

/// Connectivity observation configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ConnectivityConfig {
    /// URL probed to decide whether the network is reachable (None = host reports status)
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub probe_url: Option<Url>,

    /// Interval between probes (default: 15 seconds)
    #[serde(default = "default_probe_interval", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub probe_interval: Duration,

    /// Timeout for a single probe request (default: 5 seconds)
    #[serde(default = "default_probe_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub probe_timeout: Duration,

    /// Run a sync pass on every offline-to-online transition (default: true)
    #[serde(default = "default_true")]
    pub auto_sync: bool,

    /// Run a sync pass at startup when already online (default: true)
    #[serde(default = "default_true")]
    pub sync_on_start: bool,

    /// Assume the network is reachable until told otherwise (default: false)
    #[serde(default)]
    pub assume_online: bool,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            probe_url: None,
            probe_interval: default_probe_interval(),
            probe_timeout: default_probe_timeout(),
            auto_sync: true,
            sync_on_start: true,
            assume_online: false,
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:6790)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
        }
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./drafts.db")
}

fn default_store_key() -> String {
    "offline-drafts".to_string()
}

fn default_media_dir() -> PathBuf {
    PathBuf::from("./media")
}

fn default_max_image_dimension() -> u32 {
    1920
}

fn default_image_quality() -> u8 {
    80
}

fn default_video_max_height() -> u32 {
    720
}

fn default_video_crf() -> u8 {
    28
}

fn default_true() -> bool {
    true
}

fn default_publish_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_probe_interval() -> Duration {
    Duration::from_secs(15)
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 6790))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let config: Config = serde_json::from_str("{}").expect("deserialize failed");

        assert_eq!(config.persistence.store_key, "offline-drafts");
        assert_eq!(config.compression.max_image_dimension, 1920);
        assert_eq!(config.compression.image_quality, 80);
        assert!(config.compression.search_path);
        assert!(config.publish.endpoint.is_none());
        assert_eq!(config.publish.timeout, Duration::from_secs(60));
        assert!(config.connectivity.auto_sync);
        assert!(!config.connectivity.assume_online);
        assert_eq!(config.api.bind_address.port(), 6790);
    }

    #[test]
    fn durations_serialize_as_seconds() {
        let config = ConnectivityConfig {
            probe_interval: Duration::from_secs(42),
            ..Default::default()
        };

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["probe_interval"], 42);

        let back: ConnectivityConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back.probe_interval, Duration::from_secs(42));
    }

    #[test]
    fn publish_endpoint_parses_as_url() {
        let config: PublishConfig =
            serde_json::from_str(r#"{"endpoint":"https://api.example.com/v1/posts"}"#).unwrap();
        assert_eq!(
            config.endpoint.unwrap().as_str(),
            "https://api.example.com/v1/posts"
        );

        let bad = serde_json::from_str::<PublishConfig>(r#"{"endpoint":"not a url"}"#);
        assert!(bad.is_err(), "invalid endpoint URL should be rejected");
    }
}
