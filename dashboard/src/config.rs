use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::api::ApiClient;
use crate::errors::DashboardError;
use crate::video::MediaCapabilities;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Host the API base URL is derived from
    #[serde(default = "default_page_host")]
    pub page_host: String,
    /// Overrides the derived `http://<page_host>:8000` when not empty
    #[serde(default)]
    pub api_base_url: String,
    #[serde(default = "default_true")]
    pub auto_load_cctv: bool,
    #[serde(default = "default_true")]
    pub auto_play_cctv: bool,
    #[serde(default = "default_cctv_slots")]
    pub cctv_slots: usize,
    #[serde(default)]
    pub playback: PlaybackConfig,
}

/// What the playback environment supports.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PlaybackConfig {
    #[serde(default = "default_true")]
    pub hls_client: bool,
    #[serde(default)]
    pub native_hls: bool,
    #[serde(default = "default_true")]
    pub autoplay_allowed: bool,
}

fn default_page_host() -> String {
    "localhost".to_string()
}

fn default_true() -> bool {
    true
}

fn default_cctv_slots() -> usize {
    4
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            hls_client: true,
            native_hls: false,
            autoplay_allowed: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_host: default_page_host(),
            api_base_url: String::new(),
            auto_load_cctv: true,
            auto_play_cctv: true,
            cctv_slots: default_cctv_slots(),
            playback: PlaybackConfig::default(),
        }
    }
}

impl Config {
    /// Read a TOML config. A missing or unreadable file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, DashboardError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) => {
                log::warn!(
                    "Config file {} not readable ({}), using defaults",
                    path.display(),
                    e
                );
                Ok(Config::default())
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), DashboardError> {
        let content = toml::to_string(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn api_client(&self) -> Result<ApiClient, DashboardError> {
        if self.api_base_url.is_empty() {
            ApiClient::from_page_host(&self.page_host)
        } else {
            Ok(ApiClient::new(Url::parse(&self.api_base_url)?))
        }
    }

    pub fn media_capabilities(&self) -> MediaCapabilities {
        MediaCapabilities {
            native_hls: self.playback.native_hls,
            autoplay_allowed: self.playback.autoplay_allowed,
        }
    }
}
