//! Configuration validation utilities

use super::error::{ValidationError, ValidationErrorKind};
use super::schema::{ParleyConfig, ToolConfig};
use crate::dispatcher::HandlingMode;

/// Configuration validator with rules that span several fields
#[derive(Debug, Default)]
pub struct ConfigValidator;

impl ConfigValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self
    }

    /// Validate a configuration with extended rules
    pub fn validate(&self, config: &ParleyConfig) -> Result<(), ValidationError> {
        // First run the built-in validation
        config.validate()?;

        self.validate_timeouts(config)?;
        for (i, tool) in config.tools.iter().enumerate() {
            let path = format!("tools[{i}]");
            self.validate_parameters(tool, &path)?;
            self.validate_candidates(tool, &path)?;
        }

        Ok(())
    }

    /// The client must not give up on a call before the server does
    fn validate_timeouts(&self, config: &ParleyConfig) -> Result<(), ValidationError> {
        let session = &config.session;
        let has_remote = config
            .tools
            .iter()
            .any(|t| t.mode == HandlingMode::RemoteExecuted);

        if let Some(pending) = session.pending_timeout_ms {
            if has_remote && pending < session.executor_timeout_ms {
                return Err(ValidationError::incompatible(
                    "session.pending_timeout_ms",
                    "Must be >= executor_timeout_ms when remote-executed tools are configured",
                ));
            }
        }

        Ok(())
    }

    /// Parameter schemas must describe an object
    fn validate_parameters(&self, tool: &ToolConfig, path: &str) -> Result<(), ValidationError> {
        let Some(parameters) = &tool.parameters else {
            return Ok(());
        };

        let schema_type = parameters.get("type").and_then(|t| t.as_str());
        if !parameters.is_object() || schema_type != Some("object") {
            return Err(ValidationError::invalid_value(
                format!("{path}.parameters"),
                "JSON schema with \"type\": \"object\"",
                parameters.to_string(),
            ));
        }

        Ok(())
    }

    /// Candidates must be distinct so the choice is meaningful
    fn validate_candidates(&self, tool: &ToolConfig, path: &str) -> Result<(), ValidationError> {
        for (i, candidate) in tool.candidates.iter().enumerate() {
            if tool.candidates[..i].contains(candidate) {
                return Err(ValidationError::new(
                    format!("{path}.candidates[{i}]"),
                    ValidationErrorKind::DuplicateValue {
                        value: candidate.to_string(),
                    },
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(yaml: &str) -> ParleyConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_duplicate_candidates() {
        let config = config(
            r#"
version: "0.1"
tools:
  - name: getLocation
    mode: automatic-silent
    candidates: ["Chicago", "Chicago"]
"#,
        );
        let err = ConfigValidator::new().validate(&config).unwrap_err();
        assert_eq!(err.field_path, "tools[0].candidates[1]");
    }

    #[test]
    fn test_parameters_must_be_object_schema() {
        let config = config(
            r#"
version: "0.1"
tools:
  - name: getWeatherInformation
    mode: remote-executed
    parameters: { type: string }
"#,
        );
        let err = ConfigValidator::new().validate(&config).unwrap_err();
        assert!(matches!(err.kind, ValidationErrorKind::InvalidValue { .. }));
    }

    #[test]
    fn test_pending_timeout_shorter_than_executor() {
        let config = config(
            r#"
version: "0.1"
session:
  pending_timeout_ms: 1000
  executor_timeout_ms: 5000
tools:
  - name: getWeatherInformation
    mode: remote-executed
"#,
        );
        let err = ConfigValidator::new().validate(&config).unwrap_err();
        assert_eq!(err.field_path, "session.pending_timeout_ms");
    }
}
