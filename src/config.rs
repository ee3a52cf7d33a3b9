use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

fn default_api_port() -> u16 {
    3000
}

/// Service configuration file structure
#[derive(Debug, Clone, Deserialize)]
pub struct ServeConfig {
    /// Port for the HTTP API server (default: 3000)
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Path to the SQLite meetings database
    pub db_path: PathBuf,
    /// Real-time transport settings
    pub rtc: RtcConfig,
    /// Cloud recording settings
    pub recording: RecordingConfig,
    /// Object storage settings for uploads (uploads are rejected when absent)
    pub storage: Option<StorageConfig>,
}

/// Real-time transport settings (maps to [rtc] section in TOML)
#[derive(Debug, Clone, Deserialize)]
pub struct RtcConfig {
    /// Vendor application id for the transport SDK
    /// NEXTALK_RTC_APP_ID overrides the file value
    pub app_id: String,
    /// Base URL of the external token service (e.g. http://localhost:5000)
    pub token_url: String,
}

/// Cloud recording settings (maps to [recording] section in TOML)
#[derive(Debug, Clone, Deserialize)]
pub struct RecordingConfig {
    /// Base URL of the vendor cloud recording REST API
    pub base_url: String,
    /// S3 bucket recordings are written to, used to synthesize playback URLs
    /// NEXTALK_S3_BUCKET overrides the file value
    pub s3_bucket: String,
}

/// Object storage settings (maps to [storage] section in TOML)
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Base URL of the storage service (e.g. https://files.example.co)
    pub base_url: String,
    /// Bucket uploads are written into
    pub bucket: String,
}

/// Environment variable overriding the transport application id
pub const RTC_APP_ID_ENV: &str = "NEXTALK_RTC_APP_ID";

impl ServeConfig {
    /// Load a config file, apply environment overrides, and validate
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;
        let mut config: ServeConfig = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(app_id) = std::env::var(RTC_APP_ID_ENV) {
            if !app_id.is_empty() {
                self.rtc.app_id = app_id;
            }
        }
    }

    /// Validate field contents that serde cannot check
    pub fn validate(&self) -> Result<(), String> {
        if self.rtc.app_id.trim().is_empty() {
            return Err("rtc.app_id must not be empty".to_string());
        }
        Url::parse(&self.rtc.token_url)
            .map_err(|e| format!("rtc.token_url '{}' is not a valid URL: {}", self.rtc.token_url, e))?;
        Url::parse(&self.recording.base_url).map_err(|e| {
            format!(
                "recording.base_url '{}' is not a valid URL: {}",
                self.recording.base_url, e
            )
        })?;
        if let Some(storage) = &self.storage {
            Url::parse(&storage.base_url).map_err(|e| {
                format!(
                    "storage.base_url '{}' is not a valid URL: {}",
                    storage.base_url, e
                )
            })?;
            if storage.bucket.trim().is_empty() {
                return Err("storage.bucket must not be empty".to_string());
            }
        }
        Ok(())
    }
}
