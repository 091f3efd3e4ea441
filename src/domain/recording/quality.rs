//! Encoder quality value object

use std::fmt;
use std::str::FromStr;

use crate::domain::error::QualityError;

/// Variable-bitrate quality in `[0.0, 1.0]`, passed to the engine's VBR knob.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Quality(f32);

impl Quality {
    /// Highest quality; what the recorder asks for unless configured otherwise
    pub const MAX: Quality = Quality(1.0);

    pub fn new(value: f32) -> Result<Self, QualityError> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(QualityError {
                input: value.to_string(),
            })
        }
    }

    pub const fn value(&self) -> f32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::MAX
    }
}

impl FromStr for Quality {
    type Err = QualityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f32 = s.trim().parse().map_err(|_| QualityError {
            input: s.to_string(),
        })?;
        Self::new(value).map_err(|_| QualityError {
            input: s.to_string(),
        })
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
