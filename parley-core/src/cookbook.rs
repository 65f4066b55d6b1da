//! The three example tools
//!
//! - `getWeatherInformation` runs on the server and picks a weather report
//! - `askForConfirmation` asks the user a yes/no question
//! - `getLocation` is answered on the client by picking a city

use crate::dispatcher::{
    ChoiceHandler, ConfirmationLiterals, HandlingMode, SelectionStrategy, ToolCallDispatcher,
    ToolPolicy,
};
use crate::protocol::{ToolCall, ToolSchema};
use crate::server::{ExecutorError, RemoteExecutor, ToolRegistry};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Cities `getLocation` chooses from
pub const CITIES: [&str; 4] = ["New York", "Los Angeles", "Chicago", "San Francisco"];

/// Reports `getWeatherInformation` chooses from
pub const WEATHER_OPTIONS: [&str; 5] = ["sunny", "cloudy", "rainy", "snowy", "windy"];

/// The example tool set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CookbookTool {
    GetWeatherInformation,
    AskForConfirmation,
    GetLocation,
}

impl CookbookTool {
    pub const ALL: [CookbookTool; 3] = [
        CookbookTool::GetWeatherInformation,
        CookbookTool::AskForConfirmation,
        CookbookTool::GetLocation,
    ];

    /// Name the model uses
    pub fn name(self) -> &'static str {
        match self {
            CookbookTool::GetWeatherInformation => "getWeatherInformation",
            CookbookTool::AskForConfirmation => "askForConfirmation",
            CookbookTool::GetLocation => "getLocation",
        }
    }

    /// How the client handles it
    pub fn mode(self) -> HandlingMode {
        match self {
            CookbookTool::GetWeatherInformation => HandlingMode::RemoteExecuted,
            CookbookTool::AskForConfirmation => HandlingMode::InteractiveConfirmation,
            CookbookTool::GetLocation => HandlingMode::AutomaticSilent,
        }
    }

    /// Declaration sent to the model
    pub fn schema(self) -> ToolSchema {
        match self {
            CookbookTool::GetWeatherInformation => {
                ToolSchema::new(self.name(), "show the weather in a given city to the user")
                    .with_parameters(json!({
                        "type": "object",
                        "properties": { "city": { "type": "string" } },
                        "required": ["city"]
                    }))
            }
            CookbookTool::AskForConfirmation => {
                ToolSchema::new(self.name(), "Ask the user for confirmation.").with_parameters(
                    json!({
                        "type": "object",
                        "properties": {
                            "message": {
                                "type": "string",
                                "description": "The message to ask for confirmation."
                            }
                        },
                        "required": ["message"]
                    }),
                )
            }
            CookbookTool::GetLocation => ToolSchema::new(
                self.name(),
                "Get the user location. Always ask for confirmation before using this tool.",
            )
            .with_parameters(json!({ "type": "object", "properties": {} })),
        }
    }
}

impl fmt::Display for CookbookTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CookbookTool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CookbookTool::ALL
            .into_iter()
            .find(|tool| tool.name() == s)
            .ok_or_else(|| format!("unknown cookbook tool '{s}'"))
    }
}

/// Client-side handling table for the example tools
pub fn policy(strategy: Arc<dyn SelectionStrategy>) -> ToolPolicy {
    CookbookTool::ALL
        .into_iter()
        .fold(ToolPolicy::new(), |policy, tool| match tool.mode() {
            HandlingMode::AutomaticSilent => policy.automatic(
                tool.name(),
                ChoiceHandler::new(
                    CITIES.iter().map(|c| json!(c)).collect(),
                    Arc::clone(&strategy),
                ),
            ),
            HandlingMode::InteractiveConfirmation => {
                policy.interactive(tool.name(), ConfirmationLiterals::default())
            }
            HandlingMode::RemoteExecuted => policy.remote(tool.name()),
        })
}

/// Dispatcher for the example tools
pub fn dispatcher(strategy: Arc<dyn SelectionStrategy>) -> ToolCallDispatcher {
    ToolCallDispatcher::new(policy(strategy))
}

/// Server-side registry: weather runs here, the rest are only declared
pub fn registry(strategy: Arc<dyn SelectionStrategy>) -> ToolRegistry {
    CookbookTool::ALL
        .into_iter()
        .fold(ToolRegistry::new(), |registry, tool| match tool.mode() {
            HandlingMode::RemoteExecuted => {
                registry.executed(tool.schema(), WeatherExecutor::new(Arc::clone(&strategy)))
            }
            HandlingMode::AutomaticSilent | HandlingMode::InteractiveConfirmation => {
                registry.declare(tool.schema())
            }
        })
}

/// Answers `getWeatherInformation` with a report for the requested city
pub struct WeatherExecutor {
    strategy: Arc<dyn SelectionStrategy>,
}

impl WeatherExecutor {
    pub fn new(strategy: Arc<dyn SelectionStrategy>) -> Self {
        Self { strategy }
    }
}

#[async_trait]
impl RemoteExecutor for WeatherExecutor {
    async fn execute(&self, call: &ToolCall) -> Result<Value, ExecutorError> {
        if call.input.get("city").and_then(Value::as_str).is_none() {
            return Err(ExecutorError::InvalidInput(
                "expected a string field 'city'".to_string(),
            ));
        }

        crate::dispatcher::pick(self.strategy.as_ref(), &WEATHER_OPTIONS)
            .map(|weather| json!(weather))
            .ok_or_else(|| ExecutorError::Failed("no weather options".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::FixedSelection;

    #[test]
    fn test_names_round_trip() {
        for tool in CookbookTool::ALL {
            assert_eq!(tool.name().parse::<CookbookTool>(), Ok(tool));
        }
        assert!("getTime".parse::<CookbookTool>().is_err());
    }

    #[test]
    fn test_policy_matches_modes() {
        let policy = policy(Arc::new(FixedSelection(0)));
        for tool in CookbookTool::ALL {
            assert_eq!(policy.mode(tool.name()), Some(tool.mode()));
        }
    }

    #[test]
    fn test_registry_declares_everything() {
        let registry = registry(Arc::new(FixedSelection(0)));
        assert_eq!(registry.schemas().len(), 3);
        assert!(registry.executor("getWeatherInformation").is_some());
        assert!(registry.executor("getLocation").is_none());
    }

    #[tokio::test]
    async fn test_weather_requires_city() {
        let executor = WeatherExecutor::new(Arc::new(FixedSelection(2)));
        let ok = executor
            .execute(&ToolCall::new("c", "getWeatherInformation", json!({"city": "Paris"})))
            .await;
        assert_eq!(ok, Ok(json!("rainy")));

        let bad = executor
            .execute(&ToolCall::new("c", "getWeatherInformation", json!({})))
            .await;
        assert!(matches!(bad, Err(ExecutorError::InvalidInput(_))));
    }
}
