//! Command-line entrypoints shared by the `mesh2txt`, `meshconv` and
//! `meshinfo` binaries.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Args;
use log::{debug, error};
use thiserror::Error;

use crate::config::{LogLevel, ToolConfig};
use crate::error::MeshError;

pub mod mesh2txt;
pub mod meshconv;
pub mod meshinfo;

/// Flags accepted by every tool.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Path to TOML configuration file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("failed to read config file {path}: {source}")]
    ConfigRead { path: PathBuf, source: io::Error },
    #[error("failed to parse config file {path}: {source}")]
    ConfigParse { path: PathBuf, source: toml::de::Error },
    #[error("input file not found: {0}")]
    InputMissing(PathBuf),
    #[error("failed to write to stdout: {0}")]
    Stdout(#[source] io::Error),
    #[error("failed to encode report: {0}")]
    Report(#[from] serde_json::Error),
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

impl CliError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::ConfigRead { .. }
            | CliError::ConfigParse { .. }
            | CliError::InputMissing(_) => ExitCode::from(1),
            CliError::Stdout(_) | CliError::Report(_) | CliError::Mesh(_) => ExitCode::from(2),
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            CliError::ConfigRead { .. } | CliError::ConfigParse { .. } => "ConfigError",
            CliError::InputMissing(_) => "InputError",
            CliError::Stdout(_) | CliError::Report(_) => "OutputError",
            CliError::Mesh(err) => err.kind(),
        }
    }

    pub fn component(&self) -> &'static str {
        match self {
            CliError::ConfigRead { .. } | CliError::ConfigParse { .. } => "config",
            CliError::InputMissing(_) => "cli",
            CliError::Stdout(_) | CliError::Report(_) => "output",
            CliError::Mesh(MeshError::Io(_)) => "io",
            CliError::Mesh(_) => "codec",
        }
    }

    pub fn suggestion(&self) -> &'static str {
        match self {
            CliError::ConfigRead { .. } => "Verify the config path and file permissions.",
            CliError::ConfigParse { .. } => "Fix TOML syntax and ensure fields match the schema.",
            CliError::InputMissing(_) => "Verify the input path and ensure the file exists.",
            CliError::Stdout(_) | CliError::Report(_) => "Check that stdout is writable.",
            CliError::Mesh(MeshError::Io(_)) => "Check that the files are readable and the output directory is writable.",
            CliError::Mesh(MeshError::UnsupportedFormat(_)) => "Use a .vtk or .ply file.",
            CliError::Mesh(MeshError::UnsupportedType(_)) => "Convert the data to float or double coordinates first.",
            CliError::Mesh(_) => "Run with --log-level debug to see where decoding stopped.",
        }
    }
}

/// Load the TOML file named by `--config`, or the defaults.
pub fn load_config(common: &CommonArgs) -> Result<ToolConfig, CliError> {
    let Some(path) = &common.config else {
        return Ok(ToolConfig::default());
    };

    let content = fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
        path: path.clone(),
        source,
    })?;
    ToolConfig::from_toml_str(&content).map_err(|source| CliError::ConfigParse {
        path: path.clone(),
        source,
    })
}

/// `--log-level`, then `RUST_LOG`, then the config file, then `warn`.
pub fn resolve_log_level(common: &CommonArgs, config: &ToolConfig) -> String {
    if let Some(level) = common.log_level {
        return level.as_str().to_string();
    }

    if let Ok(level) = std::env::var("RUST_LOG") {
        if !level.trim().is_empty() {
            return level;
        }
    }

    if let Some(level) = config.log_level {
        return level.as_str().to_string();
    }

    "warn".to_string()
}

pub fn init_logger(level: &str) {
    let mut builder = env_logger::Builder::new();
    builder.target(env_logger::Target::Stderr);
    builder.filter_level(log::LevelFilter::Warn);
    builder.parse_filters(level);
    builder.format(|buf, record| {
        use std::io::Write;
        let module = record.module_path().unwrap_or(record.target());
        writeln!(
            buf,
            "{} [{}] {}: {}",
            buf.timestamp_millis(),
            record.level(),
            module,
            record.args()
        )
    });

    if let Err(err) = builder.try_init() {
        eprintln!("Failed to initialize logger: {}", err);
    }
}

/// Config loading and logger setup common to every tool. On failure the
/// error has already been reported and the exit code is returned.
pub(crate) fn setup(common: &CommonArgs) -> Result<ToolConfig, ExitCode> {
    let config = match load_config(common) {
        Ok(config) => config,
        Err(err) => {
            init_logger(&resolve_log_level(common, &ToolConfig::default()));
            return Err(handle_error(&err, None));
        }
    };
    init_logger(&resolve_log_level(common, &config));
    if let Some(path) = &common.config {
        debug!("Loaded config from {}", path.display());
    }
    Ok(config)
}

pub(crate) fn ensure_input(path: &Path) -> Result<(), CliError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(CliError::InputMissing(path.to_path_buf()))
    }
}

pub(crate) fn handle_error(err: &CliError, input: Option<&Path>) -> ExitCode {
    error!(
        "{}: {} (component: {})",
        err.error_type(),
        err,
        err.component()
    );

    eprintln!("Error: {}", err.error_type());
    eprintln!("Component: {}", err.component());
    eprintln!("Cause: {}", err);
    eprintln!("Suggestion: {}", err.suggestion());
    if let Some(input) = input {
        eprintln!("Diagnostics: input={}", input.display());
    }

    err.exit_code()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_without_flag() {
        let config = load_config(&CommonArgs::default()).unwrap();
        assert_eq!(config, ToolConfig::default());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "log_level = \"info\"\n[extract]\nprecision = 2").unwrap();
        let common = CommonArgs {
            config: Some(file.path().to_path_buf()),
            log_level: None,
        };
        let config = load_config(&common).unwrap();
        assert_eq!(config.log_level, Some(LogLevel::Info));
        assert_eq!(config.extract.precision, Some(2));
    }

    #[test]
    fn test_load_config_errors() {
        let common = CommonArgs {
            config: Some(PathBuf::from("/definitely/not/here.toml")),
            log_level: None,
        };
        let err = load_config(&common).unwrap_err();
        assert!(matches!(err, CliError::ConfigRead { .. }));
        assert_eq!(err.component(), "config");

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "log_level = 3").unwrap();
        let common = CommonArgs {
            config: Some(file.path().to_path_buf()),
            log_level: None,
        };
        let err = load_config(&common).unwrap_err();
        assert!(matches!(err, CliError::ConfigParse { .. }));
        assert_eq!(err.error_type(), "ConfigError");
    }

    #[test]
    fn test_cli_flag_wins_log_level() {
        let common = CommonArgs {
            config: None,
            log_level: Some(LogLevel::Trace),
        };
        let config = ToolConfig {
            log_level: Some(LogLevel::Error),
            ..ToolConfig::default()
        };
        assert_eq!(resolve_log_level(&common, &config), "trace");
    }

    #[test]
    fn test_mesh_errors_map_to_codec() {
        let err = CliError::from(MeshError::Format("bad".to_string()));
        assert_eq!(err.component(), "codec");
        assert_eq!(err.error_type(), "ParseError");
        assert_eq!(err.to_string(), "format error: bad");
    }
}
