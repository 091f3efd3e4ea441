//! XDG config store adapter

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;
use crate::domain::recording::{Duration, Quality};

/// Config file at `$XDG_CONFIG_HOME/vorbis-recorder/config.toml`
pub struct XdgConfigStore {
    path: PathBuf,
}

impl XdgConfigStore {
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("vorbis-recorder");

        Self {
            path: config_dir.join("config.toml"),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parse_toml(content: &str) -> Result<AppConfig, ConfigError> {
        let config: AppConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        Self::validate(&config)?;
        Ok(config)
    }

    fn to_toml(config: &AppConfig) -> Result<String, ConfigError> {
        toml::to_string_pretty(config).map_err(|e| ConfigError::WriteError(e.to_string()))
    }

    /// Reject values the recorder could never use
    fn validate(config: &AppConfig) -> Result<(), ConfigError> {
        if let Some(duration) = &config.duration {
            duration
                .parse::<Duration>()
                .map_err(|e| ConfigError::ValidationError {
                    key: "duration".into(),
                    message: e.to_string(),
                })?;
        }
        if let Some(quality) = config.quality {
            Quality::new(quality).map_err(|e| ConfigError::ValidationError {
                key: "quality".into(),
                message: e.to_string(),
            })?;
        }
        if config.frames_per_buffer == Some(0) {
            return Err(ConfigError::ValidationError {
                key: "frames_per_buffer".into(),
                message: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

impl Default for XdgConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigStore for XdgConfigStore {
    async fn load(&self) -> Result<AppConfig, ConfigError> {
        if !self.exists() {
            debug!(path = %self.path.display(), "no config file");
            return Ok(AppConfig::empty());
        }

        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        Self::parse_toml(&content)
    }

    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let content = Self::to_toml(config)?;

        fs::write(&self.path, content)
            .await
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        debug!(path = %self.path.display(), "config saved");
        Ok(())
    }

    fn path(&self) -> PathBuf {
        self.path.clone()
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }

    async fn init(&self) -> Result<(), ConfigError> {
        if self.exists() {
            return Err(ConfigError::AlreadyExists(
                self.path.to_string_lossy().to_string(),
            ));
        }

        self.save(&AppConfig::defaults()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_is_xdg() {
        let path = XdgConfigStore::new().path();
        assert!(path.to_string_lossy().contains("vorbis-recorder"));
        assert!(path.ends_with("config.toml"));
    }

    #[test]
    fn parse_toml_reads_all_keys() {
        let content = r#"
duration = "30s"
quality = 0.4
output_dir = "/tmp/rec"
device = "USB Mic"
frames_per_buffer = 1024
"#;

        let config = XdgConfigStore::parse_toml(content).unwrap();
        assert_eq!(config.duration, Some("30s".to_string()));
        assert_eq!(config.quality, Some(0.4));
        assert_eq!(config.output_dir, Some("/tmp/rec".to_string()));
        assert_eq!(config.device, Some("USB Mic".to_string()));
        assert_eq!(config.frames_per_buffer, Some(1024));
    }

    #[test]
    fn parse_toml_rejects_bad_quality() {
        let err = XdgConfigStore::parse_toml("quality = 4.0").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref key, .. } if key == "quality"));
    }

    #[test]
    fn parse_toml_rejects_bad_duration() {
        let err = XdgConfigStore::parse_toml(r#"duration = "later""#).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref key, .. } if key == "duration"));
    }

    #[tokio::test]
    async fn init_then_load_round_trips_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = XdgConfigStore::with_path(dir.path().join("nested/config.toml"));

        store.init().await.unwrap();
        assert!(store.exists());
        assert_eq!(store.load().await.unwrap(), AppConfig::defaults());

        assert!(matches!(
            store.init().await,
            Err(ConfigError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = XdgConfigStore::with_path(dir.path().join("config.toml"));
        assert_eq!(store.load().await.unwrap(), AppConfig::empty());
    }
}
