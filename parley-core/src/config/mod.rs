//! Configuration module for Parley
//!
//! This module provides the configuration schema and validation for the
//! tool policy and session settings.

mod env;
mod error;
mod schema;
mod validator;

pub use error::{ConfigError, ConfigResult, ValidationError, ValidationErrorKind};
pub use schema::{ParleyConfig, SessionConfig, ToolConfig, SUPPORTED_VERSION};
pub use validator::ConfigValidator;

use std::fs;
use std::path::Path;
use tracing::debug;

/// Supported on-disk formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

/// Load a configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> ConfigResult<ParleyConfig> {
    load_file(path.as_ref(), ConfigFormat::Yaml)
}

/// Load a configuration from a JSON file
pub fn load_from_json<P: AsRef<Path>>(path: P) -> ConfigResult<ParleyConfig> {
    load_file(path.as_ref(), ConfigFormat::Json)
}

/// Load a configuration, picking the format from the file extension
pub fn load_from_path<P: AsRef<Path>>(path: P) -> ConfigResult<ParleyConfig> {
    let path = path.as_ref();
    let format = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => ConfigFormat::Yaml,
        Some("json") => ConfigFormat::Json,
        _ => {
            return Err(ConfigError::UnsupportedFormat {
                path: path.to_string_lossy().to_string(),
            })
        }
    };
    load_file(path, format)
}

/// Parse and validate configuration text
///
/// `origin` names the source in error messages.
pub fn load_from_str(content: &str, format: ConfigFormat, origin: &str) -> ConfigResult<ParleyConfig> {
    let vars = env::referenced_vars(content);
    if !vars.is_empty() {
        debug!(origin, ?vars, "interpolating environment variables");
    }

    // Interpolate environment variables before parsing
    let interpolated = env::interpolate_env_vars(content)?;

    let config: ParleyConfig = match format {
        ConfigFormat::Yaml => {
            serde_yaml::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
                path: origin.to_string(),
                line: e.location().map(|l| l.line()),
                column: e.location().map(|l| l.column()),
                message: e.to_string(),
            })?
        }
        ConfigFormat::Json => {
            serde_json::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
                path: origin.to_string(),
                line: Some(e.line()),
                column: Some(e.column()),
                message: e.to_string(),
            })?
        }
    };

    ConfigValidator::new().validate(&config)?;
    Ok(config)
}

fn load_file(path: &Path, format: ConfigFormat) -> ConfigResult<ParleyConfig> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;

    load_from_str(&content, format, &path.to_string_lossy())
}
