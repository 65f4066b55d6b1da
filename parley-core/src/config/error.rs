//! Errors raised while loading a tool policy configuration

use std::io;
use thiserror::Error;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Why a configuration could not be loaded
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Cannot parse '{path}'{}: {message}", location(.line, .column))]
    ParseError {
        path: String,
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },

    #[error("Invalid configuration: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("Environment variable '{var}' referenced by the configuration is not set")]
    EnvVarNotFound { var: String },

    #[error("Cannot tell the format of '{path}' (expected .yaml, .yml or .json)")]
    UnsupportedFormat { path: String },
}

fn location(line: &Option<usize>, column: &Option<usize>) -> String {
    match (line, column) {
        (Some(line), Some(column)) => format!(" at {line}:{column}"),
        (Some(line), None) => format!(" at line {line}"),
        _ => String::new(),
    }
}

/// A rule violation, located by the dotted path of the offending field
/// (`tools[2].candidates`, `session.max_steps`)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{field_path}' {kind}{}", hint(.context))]
pub struct ValidationError {
    pub field_path: String,
    pub kind: ValidationErrorKind,
    pub context: Option<String>,
}

fn hint(context: &Option<String>) -> String {
    context
        .as_deref()
        .map(|c| format!(" ({c})"))
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationErrorKind {
    #[error("is required")]
    RequiredFieldMissing,

    #[error("should be {expected}, found {actual}")]
    InvalidValue { expected: String, actual: String },

    #[error("is out of range: {message}")]
    OutOfRange { message: String },

    #[error("repeats {value}")]
    DuplicateValue { value: String },

    #[error("conflicts with other settings: {message}")]
    Incompatible { message: String },

    #[error("has unsupported version {actual} (this build reads {expected})")]
    InvalidVersion { expected: String, actual: String },

    #[error("is not a valid tool name: {message}")]
    InvalidToolName { message: String },
}

impl ValidationError {
    pub fn new(field_path: impl Into<String>, kind: ValidationErrorKind) -> Self {
        Self {
            field_path: field_path.into(),
            kind,
            context: None,
        }
    }

    /// Attach a hint shown after the message
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self {
            context: Some(context.into()),
            ..self
        }
    }

    pub fn required(field_path: impl Into<String>) -> Self {
        Self::new(field_path, ValidationErrorKind::RequiredFieldMissing)
    }

    pub fn invalid_value(
        field_path: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        let kind = ValidationErrorKind::InvalidValue {
            expected: expected.into(),
            actual: actual.into(),
        };
        Self::new(field_path, kind)
    }

    pub fn out_of_range(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(field_path, ValidationErrorKind::OutOfRange { message })
    }

    pub fn duplicate(field_path: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        Self::new(field_path, ValidationErrorKind::DuplicateValue { value })
    }

    pub fn incompatible(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(field_path, ValidationErrorKind::Incompatible { message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_includes_path_and_hint() {
        let err = ValidationError::required("tools[0].candidates")
            .with_context("Automatic tools choose their result from candidates");
        assert_eq!(
            err.to_string(),
            "'tools[0].candidates' is required (Automatic tools choose their result from candidates)"
        );
    }

    #[test]
    fn test_parse_error_location() {
        let err = ConfigError::ParseError {
            path: "policy.yaml".to_string(),
            line: Some(3),
            column: Some(7),
            message: "bad indent".to_string(),
        };
        assert_eq!(err.to_string(), "Cannot parse 'policy.yaml' at 3:7: bad indent");
    }
}
