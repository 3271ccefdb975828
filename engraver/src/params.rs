//! Parameters of the engraver executable.

use std::fs::read_to_string;
use std::path::Path;

use gantry::{Edge, MotionConfig};
use log::LevelFilter;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

/// An error that occurs while loading a parameter file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Cannot load the parameter file: {0}")]
    FileLoadError(std::io::Error),

    #[error("Cannot read the parameter file: {0}")]
    DeserialiseError(toml::de::Error),
}

/// Load a parameter file.
pub fn load<P, Q>(path: Q) -> Result<P, LoadError>
where
    P: DeserializeOwned,
    Q: AsRef<Path>,
{
    let params_str = read_to_string(path).map_err(LoadError::FileLoadError)?;
    toml::from_str(&params_str).map_err(LoadError::DeserialiseError)
}

/// Contents of `engraver.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngraverParams {
    pub x_motor: MotorPins,
    pub y_motor: MotorPins,
    pub limits: LimitPins,
    pub laser: LaserPins,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub logging: LoggingParams,
}

/// BCM numbers of the lines of one A4988 driver.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MotorPins {
    pub step: u8,
    pub direction: u8,
    pub ms1: u8,
    pub ms2: u8,
    pub ms3: u8,
}

/// BCM numbers of the four limit switches.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LimitPins {
    pub x_min: u8,
    pub x_max: u8,
    pub y_min: u8,
    pub y_max: u8,
    #[serde(default)]
    pub edge: Edge,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LaserPins {
    pub enable: u8,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingParams {
    /// One of `error`, `warn`, `info`, `debug` or `trace`.
    pub level: String,
    /// Optional file receiving a copy of the log.
    pub file: Option<String>,
}

impl Default for LoggingParams {
    fn default() -> Self {
        Self {
            level: "info".into(),
            file: None,
        }
    }
}

impl LoggingParams {
    /// Returns the configured level, or `None` if it is not a level name.
    pub fn level_filter(&self) -> Option<LevelFilter> {
        self.level.parse().ok()
    }
}
