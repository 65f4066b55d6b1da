//! Two-affordance confirmation for interactive tools

use crate::protocol::ToolCall;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default result when the user confirms
pub const DEFAULT_CONFIRM_LITERAL: &str = "Yes, confirmed.";
/// Default result when the user denies
pub const DEFAULT_DENY_LITERAL: &str = "No, denied.";

/// Which affordance the user activated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationChoice {
    Confirm,
    Deny,
}

/// Result literal for each affordance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationLiterals {
    pub confirm: String,
    pub deny: String,
}

impl Default for ConfirmationLiterals {
    fn default() -> Self {
        Self {
            confirm: DEFAULT_CONFIRM_LITERAL.to_string(),
            deny: DEFAULT_DENY_LITERAL.to_string(),
        }
    }
}

impl ConfirmationLiterals {
    /// Literal attached for `choice`
    pub fn literal(&self, choice: ConfirmationChoice) -> &str {
        match choice {
            ConfirmationChoice::Confirm => &self.confirm,
            ConfirmationChoice::Deny => &self.deny,
        }
    }

    /// The two affordances to render, confirm first
    pub fn affordances(&self) -> [Affordance; 2] {
        [
            Affordance {
                choice: ConfirmationChoice::Confirm,
                label: "Yes".to_string(),
            },
            Affordance {
                choice: ConfirmationChoice::Deny,
                label: "No".to_string(),
            },
        ]
    }
}

/// A button the renderer shows for a pending confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affordance {
    pub choice: ConfirmationChoice,
    pub label: String,
}

/// Question text for a confirmation call
///
/// Taken from the `message` field of the call input when it is a string,
/// otherwise the whole input rendered as JSON.
pub fn prompt_text(call: &ToolCall) -> String {
    match call.input.get("message") {
        Some(Value::String(message)) => message.clone(),
        _ => call.input.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_literals() {
        let literals = ConfirmationLiterals::default();
        assert_eq!(literals.literal(ConfirmationChoice::Confirm), "Yes, confirmed.");
        assert_eq!(literals.literal(ConfirmationChoice::Deny), "No, denied.");
        assert_eq!(literals.affordances().len(), 2);
    }

    #[test]
    fn test_prompt_text() {
        let call = ToolCall::new("c", "askForConfirmation", json!({"message": "Go?"}));
        assert_eq!(prompt_text(&call), "Go?");

        let call = ToolCall::new("c", "askForConfirmation", json!({"other": 1}));
        assert_eq!(prompt_text(&call), "{\"other\":1}");
    }
}
