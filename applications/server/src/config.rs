/// Server configuration
use crate::error::{Result, ServerError};
use cadence_playback::{PlaybackConfig, SeekMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Smallest volume step the session can represent
const MIN_VOLUME_STEP: f32 = 0.01;

/// Longest nominal seek step, one hour
const MAX_SEEK_STEP_SECONDS: u64 = 3600;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_server")]
    pub server: ServerSettings,

    #[serde(default = "default_storage")]
    pub storage: StorageSettings,

    #[serde(default = "default_playback")]
    pub playback: PlaybackSettings,

    #[serde(default = "default_upload")]
    pub upload: UploadSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Root of file storage; audio files live in its `MusicFiles` directory
    #[serde(default = "default_music_storage_path")]
    pub music_storage_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackSettings {
    #[serde(default = "default_volume")]
    pub default_volume: f32,

    #[serde(default = "default_volume_step")]
    pub volume_step: f32,

    #[serde(default = "default_seek_step_seconds")]
    pub seek_step_seconds: u64,

    #[serde(default = "default_seek_mode")]
    pub seek_mode: SeekMode,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadSettings {
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl PlaybackSettings {
    pub fn to_playback_config(&self) -> PlaybackConfig {
        PlaybackConfig {
            default_volume: self.default_volume,
            volume_step: self.volume_step,
            seek_step_seconds: self.seek_step_seconds,
            seek_mode: self.seek_mode,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `config.toml` (or `path`) and environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let config_path = PathBuf::from("config.toml");
                if config_path.exists() {
                    settings = settings.add_source(config::File::from(config_path));
                }
            }
        }

        // Override with environment variables, e.g. CADENCE_SERVER__PORT=9000
        settings = settings.add_source(
            config::Environment::with_prefix("CADENCE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage.database_url.trim().is_empty() {
            return Err(ServerError::Config(
                "database URL is required (set CADENCE_STORAGE__DATABASE_URL)".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.playback.default_volume) {
            return Err(ServerError::Config(format!(
                "playback.default_volume must be within 0.0..=1.0, got {}",
                self.playback.default_volume
            )));
        }

        // Volume moves in hundredths; smaller steps would round to nothing
        if !(MIN_VOLUME_STEP..=1.0).contains(&self.playback.volume_step) {
            return Err(ServerError::Config(format!(
                "playback.volume_step must be within {}..=1.0, got {}",
                MIN_VOLUME_STEP, self.playback.volume_step
            )));
        }

        if !(1..=MAX_SEEK_STEP_SECONDS).contains(&self.playback.seek_step_seconds) {
            return Err(ServerError::Config(format!(
                "playback.seek_step_seconds must be within 1..={}, got {}",
                MAX_SEEK_STEP_SECONDS, self.playback.seek_step_seconds
            )));
        }

        if self.upload.max_upload_bytes == 0 {
            return Err(ServerError::Config(
                "upload.max_upload_bytes must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

// Default values
fn default_server() -> ServerSettings {
    ServerSettings {
        host: default_host(),
        port: default_port(),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_storage() -> StorageSettings {
    StorageSettings {
        database_url: default_database_url(),
        music_storage_path: default_music_storage_path(),
    }
}

fn default_database_url() -> String {
    "sqlite://./data/cadence.db".to_string()
}

fn default_music_storage_path() -> PathBuf {
    PathBuf::from("./FileStorage")
}

fn default_playback() -> PlaybackSettings {
    PlaybackSettings {
        default_volume: default_volume(),
        volume_step: default_volume_step(),
        seek_step_seconds: default_seek_step_seconds(),
        seek_mode: default_seek_mode(),
    }
}

fn default_volume() -> f32 {
    0.5
}

fn default_volume_step() -> f32 {
    0.1
}

fn default_seek_step_seconds() -> u64 {
    10
}

fn default_seek_mode() -> SeekMode {
    SeekMode::Legacy
}

fn default_upload() -> UploadSettings {
    UploadSettings {
        max_upload_bytes: default_max_upload_bytes(),
    }
}

fn default_max_upload_bytes() -> usize {
    3 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            storage: default_storage(),
            playback: default_playback(),
            upload: default_upload(),
        }
    }
}
