//! Application configuration value object

use serde::{Deserialize, Serialize};

use crate::domain::recording::{Duration, Quality};

/// Frames handed to the encoder per capture block unless configured otherwise
pub const DEFAULT_FRAMES_PER_BUFFER: u32 = 4096;

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub duration: Option<String>,
    pub quality: Option<f32>,
    pub output_dir: Option<String>,
    pub device: Option<String>,
    pub frames_per_buffer: Option<u32>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            duration: Some("10s".to_string()),
            quality: Some(Quality::MAX.value()),
            output_dir: None,
            device: None,
            frames_per_buffer: Some(DEFAULT_FRAMES_PER_BUFFER),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            duration: other.duration.or(self.duration),
            quality: other.quality.or(self.quality),
            output_dir: other.output_dir.or(self.output_dir),
            device: other.device.or(self.device),
            frames_per_buffer: other.frames_per_buffer.or(self.frames_per_buffer),
        }
    }

    /// Get duration as parsed Duration, or default if not set/invalid
    pub fn duration_or_default(&self) -> Duration {
        self.duration
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_duration)
    }

    /// Get quality, or the maximum if not set/out of range
    pub fn quality_or_default(&self) -> Quality {
        self.quality
            .and_then(|q| Quality::new(q).ok())
            .unwrap_or_default()
    }

    /// Get the capture block size, or 4096 if not set/zero
    pub fn frames_per_buffer_or_default(&self) -> usize {
        self.frames_per_buffer
            .filter(|&frames| frames > 0)
            .unwrap_or(DEFAULT_FRAMES_PER_BUFFER) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_expected_values() {
        let config = AppConfig::defaults();
        assert_eq!(config.duration, Some("10s".to_string()));
        assert_eq!(config.quality, Some(1.0));
        assert_eq!(config.frames_per_buffer, Some(4096));
        assert!(config.output_dir.is_none());
        assert!(config.device.is_none());
    }

    #[test]
    fn empty_has_all_none() {
        assert_eq!(AppConfig::empty(), AppConfig::default());
        assert!(AppConfig::empty().quality.is_none());
    }

    #[test]
    fn merge_other_takes_precedence() {
        let base = AppConfig {
            duration: Some("10s".to_string()),
            quality: Some(1.0),
            device: Some("hw:0".to_string()),
            ..Default::default()
        };
        let other = AppConfig {
            duration: None,
            quality: Some(0.4),
            output_dir: Some("/tmp/rec".to_string()),
            ..Default::default()
        };

        let merged = base.merge(other);

        assert_eq!(merged.duration, Some("10s".to_string()));
        assert_eq!(merged.quality, Some(0.4));
        assert_eq!(merged.output_dir, Some("/tmp/rec".to_string()));
        assert_eq!(merged.device, Some("hw:0".to_string()));
    }

    #[test]
    fn duration_or_default_falls_back_on_invalid() {
        let config = AppConfig {
            duration: Some("soon".to_string()),
            ..Default::default()
        };
        assert_eq!(config.duration_or_default().as_secs(), 10);

        let config = AppConfig {
            duration: Some("1m".to_string()),
            ..Default::default()
        };
        assert_eq!(config.duration_or_default().as_secs(), 60);
    }

    #[test]
    fn quality_or_default_rejects_out_of_range() {
        let config = AppConfig {
            quality: Some(3.0),
            ..Default::default()
        };
        assert_eq!(config.quality_or_default(), Quality::MAX);

        let config = AppConfig {
            quality: Some(0.25),
            ..Default::default()
        };
        assert_eq!(config.quality_or_default().value(), 0.25);
    }

    #[test]
    fn frames_per_buffer_ignores_zero() {
        let config = AppConfig {
            frames_per_buffer: Some(0),
            ..Default::default()
        };
        assert_eq!(config.frames_per_buffer_or_default(), 4096);
        assert_eq!(AppConfig::empty().frames_per_buffer_or_default(), 4096);
    }
}
