//! # Configuration Management
//!
//! Loads application configuration from multiple sources:
//! - TOML configuration files (config.toml)
//! - Environment variables (with APP_ prefix, plus a few well-known names)
//! - Default values (built into the code)
//!
//! ## Configuration Priority (highest to lowest):
//! 1. Well-known environment variables (HOST, PORT, GEMINI_API_KEY, YTDLP_COOKIE_FILE)
//! 2. Environment variables with APP_ prefix (APP_SERVER_HOST, ...)
//! 3. Configuration file (config.toml)
//! 4. Default values (defined in the Default impl)
//!
//! The loaded configuration is **immutable** for the process lifetime: it is
//! validated once at startup and then shared read-only through `AppState`.
//! There is deliberately no runtime-update path — components that need a
//! setting take it from the shared `Arc<AppConfig>`.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Main application configuration that contains all settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub gemini: GeminiConfig,
    pub storage: StorageConfig,
}

/// Server-specific configuration settings.
///
/// - `host = "127.0.0.1"`: only accept connections from localhost (development)
/// - `host = "0.0.0.0"`: accept connections from any address (production)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// External generative-model service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key for the Gemini service. Empty means "not configured": content
    /// endpoints will reject requests with a client-actionable message rather
    /// than fail mid-call.
    pub api_key: String,

    /// Model name used for all generation calls (e.g. "gemini-1.5-flash").
    pub model: String,

    /// Seconds to wait between transcription job state polls.
    pub poll_interval_secs: u64,

    /// Maximum number of polls before a job is declared timed out.
    /// The defaults give roughly a five-minute budget per video.
    pub poll_max_attempts: u32,
}

/// Transient video storage and remote download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for video artifacts. Created on first acquisition; contents
    /// carry no durability guarantee across restarts.
    pub transient_dir: String,

    /// Cap on remote downloads, in MiB.
    pub max_download_mib: u64,

    /// Optional cookie file handed to the downloader for sites that need
    /// sign-in. Missing file is tolerated (with a warning), never fatal.
    pub cookie_file: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            gemini: GeminiConfig {
                api_key: String::new(),
                model: "gemini-1.5-flash".to_string(),
                poll_interval_secs: 2,
                poll_max_attempts: 150,
            },
            storage: StorageConfig {
                transient_dir: "/tmp/studybridge_videos".to_string(),
                max_download_mib: 100,
                cookie_file: None,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, config.toml, and the environment.
    pub fn load() -> Result<Self> {
        let mut settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("_"));

        // Well-known environment variables that don't follow the APP_ prefix
        // convention: deployment platforms set HOST/PORT, and the API key and
        // cookie file keep the names the service has always used.
        if let Ok(host) = env::var("HOST") {
            settings = settings.set_override("server.host", host)?;
        }
        if let Ok(port) = env::var("PORT") {
            settings = settings.set_override("server.port", port)?;
        }
        if let Ok(key) = env::var("GEMINI_API_KEY") {
            settings = settings.set_override("gemini.api_key", key)?;
        }
        if let Ok(cookies) = env::var("YTDLP_COOKIE_FILE") {
            settings = settings.set_override("storage.cookie_file", cookies)?;
        }

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate that the configuration values make sense.
    ///
    /// Catching bad values here gives one clear startup error instead of a
    /// confusing runtime failure later.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        if self.storage.transient_dir.trim().is_empty() {
            return Err(anyhow::anyhow!("Transient storage directory cannot be empty"));
        }

        if self.storage.max_download_mib == 0 {
            return Err(anyhow::anyhow!("Max download size must be greater than 0"));
        }

        if self.gemini.poll_interval_secs == 0 {
            return Err(anyhow::anyhow!("Poll interval must be at least 1 second"));
        }

        if self.gemini.poll_max_attempts == 0 {
            return Err(anyhow::anyhow!("Poll attempts must be greater than 0"));
        }

        Ok(())
    }
}
