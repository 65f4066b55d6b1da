//! Configuration schema structures with serde support

use super::error::{ValidationError, ValidationErrorKind};
use crate::dispatcher::{
    ConfirmationLiterals, HandlingMode, UnknownToolPolicy, DEFAULT_CANCEL_LITERAL,
    DEFAULT_CONFIRM_LITERAL, DEFAULT_DENY_LITERAL,
};
use crate::protocol::ToolSchema;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Only supported schema version
pub const SUPPORTED_VERSION: &str = "0.1";

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParleyConfig {
    /// Schema version (required - no default)
    pub version: String,

    /// Turn and timeout settings
    #[serde(default)]
    pub session: SessionConfig,

    /// What to do with tool names that have no entry
    #[serde(default)]
    pub unknown_tools: UnknownToolPolicy,

    /// Tool declarations and their handling modes
    #[serde(default)]
    pub tools: Vec<ToolConfig>,

    /// Custom metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Turn and timeout settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Maximum model steps per turn
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,

    /// Unresolved calls are reported overdue after this long (none = never)
    #[serde(default = "default_pending_timeout")]
    pub pending_timeout_ms: Option<u64>,

    /// How long the server waits for a remote executor
    #[serde(default = "default_executor_timeout")]
    pub executor_timeout_ms: u64,

    /// Result attached when a pending call is cancelled
    #[serde(default = "default_cancel_literal")]
    pub cancel_literal: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            pending_timeout_ms: default_pending_timeout(),
            executor_timeout_ms: default_executor_timeout(),
            cancel_literal: default_cancel_literal(),
        }
    }
}

impl SessionConfig {
    /// Pending timeout as a duration
    pub fn pending_timeout(&self) -> Option<Duration> {
        self.pending_timeout_ms.map(Duration::from_millis)
    }

    /// Executor timeout as a duration
    pub fn executor_timeout(&self) -> Duration {
        Duration::from_millis(self.executor_timeout_ms)
    }
}

/// One tool and how the client handles it
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ToolConfig {
    /// Tool name as the model sees it
    pub name: String,

    /// Handling mode
    pub mode: HandlingMode,

    /// Description sent to the model
    #[serde(default)]
    pub description: Option<String>,

    /// Input schema sent to the model
    #[serde(default)]
    pub parameters: Option<serde_json::Value>,

    /// Values an automatic tool chooses from
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<serde_json::Value>,

    /// Result for the confirm affordance
    #[serde(default)]
    pub confirm_literal: Option<String>,

    /// Result for the deny affordance
    #[serde(default)]
    pub deny_literal: Option<String>,
}

impl ToolConfig {
    /// Literals for an interactive tool, falling back to the defaults
    pub fn confirmation_literals(&self) -> ConfirmationLiterals {
        ConfirmationLiterals {
            confirm: self
                .confirm_literal
                .clone()
                .unwrap_or_else(|| DEFAULT_CONFIRM_LITERAL.to_string()),
            deny: self
                .deny_literal
                .clone()
                .unwrap_or_else(|| DEFAULT_DENY_LITERAL.to_string()),
        }
    }

    /// Declaration sent to the model
    pub fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameters.clone(),
        }
    }

    /// Validate tool configuration
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::required(format!("{}.name", path)));
        }

        if !self
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ValidationError::new(
                format!("{}.name", path),
                ValidationErrorKind::InvalidToolName {
                    message: format!(
                        "'{}' may only contain ASCII letters, digits, '_' and '-'",
                        self.name
                    ),
                },
            ));
        }

        let has_literals = self.confirm_literal.is_some() || self.deny_literal.is_some();

        match self.mode {
            HandlingMode::AutomaticSilent => {
                if self.candidates.is_empty() {
                    return Err(ValidationError::required(format!("{}.candidates", path))
                        .with_context("Automatic tools choose their result from candidates"));
                }
                if has_literals {
                    return Err(ValidationError::incompatible(
                        path,
                        "Confirmation literals only apply to interactive-confirmation tools",
                    ));
                }
            }
            HandlingMode::InteractiveConfirmation => {
                if !self.candidates.is_empty() {
                    return Err(ValidationError::incompatible(
                        format!("{}.candidates", path),
                        "Candidates only apply to automatic-silent tools",
                    ));
                }
                let literals = self.confirmation_literals();
                if literals.confirm.is_empty() {
                    return Err(ValidationError::required(format!("{}.confirm_literal", path)));
                }
                if literals.deny.is_empty() {
                    return Err(ValidationError::required(format!("{}.deny_literal", path)));
                }
                if literals.confirm == literals.deny {
                    return Err(ValidationError::duplicate(
                        format!("{}.deny_literal", path),
                        literals.deny,
                    )
                    .with_context("Confirm and deny must attach different results"));
                }
            }
            HandlingMode::RemoteExecuted => {
                if !self.candidates.is_empty() || has_literals {
                    return Err(ValidationError::incompatible(
                        path,
                        "Remote-executed tools take no client-side result settings",
                    ));
                }
            }
        }

        Ok(())
    }
}

// Default value functions for serde
fn default_max_steps() -> u32 { 5 }
fn default_pending_timeout() -> Option<u64> { Some(30_000) }
fn default_executor_timeout() -> u64 { 10_000 }
fn default_cancel_literal() -> String { DEFAULT_CANCEL_LITERAL.to_string() }

impl ParleyConfig {
    /// A configuration with no tools and default session settings
    pub fn new() -> Self {
        Self {
            version: SUPPORTED_VERSION.to_string(),
            session: SessionConfig::default(),
            unknown_tools: UnknownToolPolicy::default(),
            tools: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    /// Declarations for every configured tool
    pub fn tool_schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(ToolConfig::schema).collect()
    }

    /// Look up a tool by name
    pub fn tool(&self, name: &str) -> Option<&ToolConfig> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version.is_empty() {
            return Err(ValidationError::required("version"));
        }

        if self.version != SUPPORTED_VERSION {
            return Err(ValidationError::new(
                "version",
                ValidationErrorKind::InvalidVersion {
                    expected: SUPPORTED_VERSION.to_string(),
                    actual: self.version.clone(),
                },
            ));
        }

        self.session.validate("session")?;

        let mut seen_names = HashSet::new();
        for (i, tool) in self.tools.iter().enumerate() {
            if !seen_names.insert(&tool.name) {
                return Err(ValidationError::duplicate(
                    format!("tools[{}].name", i),
                    tool.name.clone(),
                ));
            }

            tool.validate(&format!("tools[{}]", i))?;
        }

        Ok(())
    }
}

impl Default for ParleyConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionConfig {
    /// Validate session settings
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if !(1..=100).contains(&self.max_steps) {
            return Err(ValidationError::out_of_range(
                format!("{}.max_steps", path),
                "Must be between 1 and 100",
            ));
        }

        if self.pending_timeout_ms == Some(0) {
            return Err(ValidationError::out_of_range(
                format!("{}.pending_timeout_ms", path),
                "Must be greater than 0 (omit it to disable the timeout)",
            ));
        }

        if self.executor_timeout_ms == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.executor_timeout_ms", path),
                "Must be greater than 0",
            ));
        }

        if self.cancel_literal.is_empty() {
            return Err(ValidationError::required(format!("{}.cancel_literal", path)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: ParleyConfig = serde_yaml::from_str("version: \"0.1\"").unwrap();
        assert_eq!(config.session.max_steps, 5);
        assert_eq!(config.session.pending_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.unknown_tools, UnknownToolPolicy::Ignore);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_wrong_version() {
        let mut config = ParleyConfig::new();
        config.version = "2.0".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err.kind, ValidationErrorKind::InvalidVersion { .. }));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<ParleyConfig, _> =
            serde_yaml::from_str("version: \"0.1\"\nsessions: {}\n");
        assert!(result.is_err());
    }
}
