use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use super::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Where the remote's own web server listens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// The music player's local API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_host")]
    pub host: String,
    #[serde(default = "default_backend_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_song_interval_ms")]
    pub song_interval_ms: u64,
    #[serde(default = "default_queue_interval_ms")]
    pub queue_interval_ms: u64,
    #[serde(default = "default_volume_interval_ms")]
    pub volume_interval_ms: u64,
    /// Delay between a queue-changing command and the follow-up poll, giving
    /// the player time to apply it.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory served as the browser UI.
    #[serde(default = "default_web_root")]
    pub web_root: PathBuf,
    /// Directory for cached thumbnails.
    #[serde(default = "default_image_cache_dir")]
    pub image_cache_dir: PathBuf,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: default_backend_host(),
            port: default_backend_port(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            song_interval_ms: default_song_interval_ms(),
            queue_interval_ms: default_queue_interval_ms(),
            volume_interval_ms: default_volume_interval_ms(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            web_root: default_web_root(),
            image_cache_dir: default_image_cache_dir(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_backend_host() -> String {
    "localhost".to_string()
}

fn default_backend_port() -> u16 {
    26538
}

fn default_song_interval_ms() -> u64 {
    2000
}

fn default_queue_interval_ms() -> u64 {
    3000
}

fn default_volume_interval_ms() -> u64 {
    5000
}

fn default_settle_delay_ms() -> u64 {
    500
}

fn default_max_results() -> usize {
    20
}

fn default_web_root() -> PathBuf {
    // Prefer a public/ directory beside the executable (packaged installs),
    // then the working directory (cargo run from the repo root).
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let beside = exe_dir.join("public");
            if beside.exists() {
                return beside;
            }
        }
    }
    PathBuf::from("public")
}

fn default_image_cache_dir() -> PathBuf {
    platform::cache_dir().join("images")
}

impl BackendConfig {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl PollingConfig {
    pub fn song_interval(&self) -> Duration {
        Duration::from_millis(self.song_interval_ms.max(100))
    }

    pub fn queue_interval(&self) -> Duration {
        Duration::from_millis(self.queue_interval_ms.max(100))
    }

    pub fn volume_interval(&self) -> Duration {
        Duration::from_millis(self.volume_interval_ms.max(100))
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Config {
    /// Load from disk (writing defaults on first run), then apply the
    /// `PORT`, `YTM_HOST` and `YTM_PORT` environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        let mut config = if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            config
        } else {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }

    /// Apply environment overrides from `lookup`. Unparseable ports are
    /// ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").and_then(|v| parse_port("PORT", &v)) {
            self.http.port = port;
        }
        if let Some(host) = lookup("YTM_HOST").filter(|h| !h.trim().is_empty()) {
            self.backend.host = host.trim().to_string();
        }
        if let Some(port) = lookup("YTM_PORT").and_then(|v| parse_port("YTM_PORT", &v)) {
            self.backend.port = port;
        }
    }
}

fn parse_port(key: &str, value: &str) -> Option<u16> {
    match value.trim().parse::<u16>() {
        Ok(port) => Some(port),
        Err(e) => {
            warn!("ignoring {}={:?}: {}", key, value, e);
            None
        }
    }
}
