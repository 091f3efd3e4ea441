//! Configuration port interface

use async_trait::async_trait;
use std::path::PathBuf;

use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

/// Where recorder settings persist between runs
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Read the stored settings. A missing file yields an empty config.
    async fn load(&self) -> Result<AppConfig, ConfigError>;

    /// Replace the stored settings with `config`
    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError>;

    fn path(&self) -> PathBuf;

    fn exists(&self) -> bool;

    /// Write [`AppConfig::defaults`]; fails with `AlreadyExists` if a file is present
    async fn init(&self) -> Result<(), ConfigError>;
}
