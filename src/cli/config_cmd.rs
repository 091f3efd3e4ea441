//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;
use crate::domain::recording::{Duration, Quality};

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    ensure_known_key(key)?;

    let mut config = store.load().await?;
    apply_value(&mut config, key, value)?;

    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));

    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    ensure_known_key(key)?;

    let config = store.load().await?;
    let value = read_value(&config, key).unwrap_or_else(|| NOT_SET.to_string());
    presenter.output(&value);

    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    for key in VALID_CONFIG_KEYS {
        let value = read_value(&config, key).unwrap_or_else(|| NOT_SET.to_string());
        presenter.key_value(key, &value);
    }

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn ensure_known_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        return Ok(());
    }
    Err(ConfigError::ValidationError {
        key: key.to_string(),
        message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
    })
}

/// Validate `value` for `key` and store it
fn apply_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::ValidationError {
        key: key.to_string(),
        message,
    };

    match key {
        "duration" => {
            value
                .parse::<Duration>()
                .map_err(|e| invalid(e.to_string()))?;
            config.duration = Some(value.to_string());
        }
        "quality" => {
            let quality = value
                .parse::<Quality>()
                .map_err(|e| invalid(e.to_string()))?;
            config.quality = Some(quality.value());
        }
        "output_dir" => config.output_dir = Some(value.to_string()),
        "device" => config.device = Some(value.to_string()),
        "frames_per_buffer" => {
            let frames = value
                .parse::<u32>()
                .ok()
                .filter(|&frames| frames > 0)
                .ok_or_else(|| invalid("Value must be a positive integer".to_string()))?;
            config.frames_per_buffer = Some(frames);
        }
        _ => return Err(invalid("Unknown key".to_string())),
    }
    Ok(())
}

fn read_value(config: &AppConfig, key: &str) -> Option<String> {
    match key {
        "duration" => config.duration.clone(),
        "quality" => config.quality.map(|q| q.to_string()),
        "output_dir" => config.output_dir.clone(),
        "device" => config.device.clone(),
        "frames_per_buffer" => config.frames_per_buffer.map(|f| f.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_duration_valid() {
        let mut config = AppConfig::empty();
        apply_value(&mut config, "duration", "2m30s").unwrap();
        assert_eq!(config.duration, Some("2m30s".to_string()));
    }

    #[test]
    fn apply_duration_invalid() {
        let mut config = AppConfig::empty();
        assert!(apply_value(&mut config, "duration", "invalid").is_err());
        assert!(config.duration.is_none());
    }

    #[test]
    fn apply_quality_range() {
        let mut config = AppConfig::empty();
        apply_value(&mut config, "quality", "0.4").unwrap();
        assert_eq!(config.quality, Some(0.4));
        assert!(apply_value(&mut config, "quality", "1.5").is_err());
        assert!(apply_value(&mut config, "quality", "loud").is_err());
    }

    #[test]
    fn apply_frames_per_buffer_rejects_zero() {
        let mut config = AppConfig::empty();
        assert!(apply_value(&mut config, "frames_per_buffer", "0").is_err());
        apply_value(&mut config, "frames_per_buffer", "2048").unwrap();
        assert_eq!(read_value(&config, "frames_per_buffer"), Some("2048".to_string()));
    }

    #[test]
    fn read_unset_value() {
        assert_eq!(read_value(&AppConfig::empty(), "device"), None);
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(ensure_known_key("api_key").is_err());
        assert!(ensure_known_key("device").is_ok());
    }
}
