//! Tool configuration loaded from TOML.
//!
//! ```toml
//! log_level = "info"
//!
//! [extract]
//! precision = 6
//!
//! [convert]
//! encoding = "binary"
//! byte_order = "big"
//! header = "converted surface"
//! ```

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::io::{Encoding, Endianness, WriteOptions};
use crate::points::PointFormat;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Configuration shared by the command-line tools.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Log verbosity.
    pub log_level: Option<LogLevel>,
    /// Point dump block.
    pub extract: ExtractConfig,
    /// Conversion block.
    pub convert: ConvertConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractConfig {
    /// Fixed decimals for coordinates; shortest round-trip text when unset.
    pub precision: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertConfig {
    pub encoding: Encoding,
    /// Byte order of binary PLY output.
    pub byte_order: Endianness,
    /// VTK title line.
    pub header: String,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        let defaults = WriteOptions::default();
        Self {
            encoding: defaults.encoding,
            byte_order: defaults.byte_order,
            header: defaults.header,
        }
    }
}

impl ToolConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn point_format(&self) -> PointFormat {
        PointFormat {
            precision: self.extract.precision,
        }
    }

    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            encoding: self.convert.encoding,
            byte_order: self.convert.byte_order,
            header: self.convert.header.clone(),
        }
    }
}
