//! Binding configuration, read from TOML.
//!
//! ```toml
//! [codec]
//! max_encoded_len = 1048576
//!
//! [model]
//! max_expansion_len = 65536
//!
//! [log]
//! level = "debug"
//! ```
//!
//! Every section and key is optional.

use std::path::Path;

use serde::{Deserialize, Serialize};
use smtnum::CodecLimits;

use crate::error::{ModelError, ModelResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BindingConfig {
    pub codec: CodecConfig,
    pub model: ModelConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodecConfig {
    /// Largest canonical byte array produced or accepted.
    pub max_encoded_len: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_encoded_len: CodecLimits::DEFAULT_MAX_ENCODED_LEN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    /// Largest number of child handles a single expansion may allocate.
    pub max_expansion_len: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            max_expansion_len: i32::MAX as usize,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    pub level: LogLevel,
}

impl BindingConfig {
    pub fn from_toml_str(source: &str) -> ModelResult<Self> {
        toml::from_str(source).map_err(|source| ModelError::ConfigParse {
            source,
            file: "<inline>".to_string(),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> ModelResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|source| ModelError::ConfigParse {
            source,
            file: path.display().to_string(),
        })
    }

    pub fn codec_limits(&self) -> CodecLimits {
        CodecLimits {
            max_encoded_len: self.codec.max_encoded_len,
        }
    }
}
