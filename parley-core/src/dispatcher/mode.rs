//! Handling modes for tool calls

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the client reacts to a tool call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HandlingMode {
    /// Resolved synchronously by a client-side handler
    AutomaticSilent,
    /// Resolved when the user picks one of two affordances
    InteractiveConfirmation,
    /// Resolved by a remote executor; the client only observes the result
    RemoteExecuted,
}

impl HandlingMode {
    /// Whether the client attaches the result itself
    pub fn is_client_side(self) -> bool {
        match self {
            HandlingMode::AutomaticSilent | HandlingMode::InteractiveConfirmation => true,
            HandlingMode::RemoteExecuted => false,
        }
    }
}

impl fmt::Display for HandlingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandlingMode::AutomaticSilent => "automatic-silent",
            HandlingMode::InteractiveConfirmation => "interactive-confirmation",
            HandlingMode::RemoteExecuted => "remote-executed",
        };
        f.write_str(name)
    }
}

/// What to do with a tool name that has no policy entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownToolPolicy {
    /// Log and leave the call untouched
    #[default]
    Ignore,
    /// Report an error to the host so it can surface it
    Reject,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_wire_names() {
        let mode: HandlingMode = serde_json::from_str("\"interactive-confirmation\"").unwrap();
        assert_eq!(mode, HandlingMode::InteractiveConfirmation);
        assert_eq!(HandlingMode::RemoteExecuted.to_string(), "remote-executed");
        assert!(!HandlingMode::RemoteExecuted.is_client_side());
    }
}
