//! Cookbook Demo - weather, confirmation and location tools
//!
//! A canned model drives the three example tools end to end:
//! - `getWeatherInformation` runs inside the route
//! - `askForConfirmation` waits for the user (answered here automatically)
//! - `getLocation` is answered silently on the client
//!
//! Run with: RUST_LOG=parley_core=debug cargo run --example cookbook

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use parley_core::config::load_from_yaml;
use parley_core::cookbook;
use parley_core::dispatcher::{ConfirmationChoice, RandomSelection, ToolView};
use parley_core::protocol::{Message, MessageDelta, Part, Role};
use parley_core::server::{ChatRoute, ModelClient, ModelRequest};
use parley_core::session::{ChatSession, DeltaStream, SessionResult, TurnOutcome, WireTransport};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Answers from the last message alone, the way the cookbook prompt would
struct CannedModel;

impl CannedModel {
    fn reply(&self, messages: &[Message]) -> Vec<MessageDelta> {
        let Some(last) = messages.last() else {
            return say("Hello!");
        };

        if last.role == Role::User {
            let text = last.text_content().to_lowercase();
            return if text.contains("weather") {
                call("getWeatherInformation", json!({ "city": "San Francisco" }))
            } else if text.contains("where") {
                call(
                    "askForConfirmation",
                    json!({ "message": "Can I use your location?" }),
                )
            } else {
                say("I can tell you the weather or find your location.")
            };
        }

        let Some(part) = last.tool_parts().last() else {
            return say("Anything else?");
        };
        let output = part.output.clone().unwrap_or(Value::Null);
        let output = output.as_str().unwrap_or_default();

        match part.tool_name.as_str() {
            "askForConfirmation" if output == "Yes, confirmed." => call("getLocation", json!({})),
            "askForConfirmation" => say("Okay, I will not use your location."),
            "getLocation" => say(&format!("You are in {output}.")),
            "getWeatherInformation" => say(&format!("It is {output} in San Francisco.")),
            other => say(&format!("I do not know the tool {other}.")),
        }
    }
}

#[async_trait]
impl ModelClient for CannedModel {
    async fn step(&self, request: ModelRequest) -> SessionResult<DeltaStream> {
        let deltas = self.reply(&request.messages);
        Ok(stream::iter(deltas.into_iter().map(Ok)).boxed())
    }
}

fn message_id() -> String {
    format!("msg-{}", uuid::Uuid::new_v4())
}

fn say(text: &str) -> Vec<MessageDelta> {
    vec![
        MessageDelta::Start {
            message_id: message_id(),
        },
        MessageDelta::TextDelta {
            delta: text.to_string(),
        },
        MessageDelta::Finish,
    ]
}

fn call(tool: &str, input: Value) -> Vec<MessageDelta> {
    vec![
        MessageDelta::Start {
            message_id: message_id(),
        },
        MessageDelta::ToolInputAvailable {
            tool_call_id: format!("call-{}", uuid::Uuid::new_v4()),
            tool_name: tool.to_string(),
            input,
        },
        MessageDelta::Finish,
    ]
}

fn print_transcript(messages: &[Message]) {
    for message in messages {
        let who = match message.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        for part in &message.parts {
            match part {
                Part::Text { text } => println!("  {who}: {text}"),
                Part::Tool(tool) => println!(
                    "  {who}: [{} {}] input={} output={}",
                    tool.tool_name,
                    serde_json::to_string(&tool.state).unwrap_or_default(),
                    tool.input,
                    tool.output.as_ref().map(Value::to_string).unwrap_or_default()
                ),
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/cookbook.yaml");
    let config = load_from_yaml(&path).with_context(|| format!("loading {}", path.display()))?;

    let route = ChatRoute::from_config(
        CannedModel,
        cookbook::registry(Arc::new(RandomSelection)),
        &config,
    );
    let mut session =
        ChatSession::from_config(WireTransport::new(route), &config, Arc::new(RandomSelection));

    println!("\nParley Cookbook Demo\n====================\n");

    for prompt in ["What is the weather like?", "Where am I?"] {
        println!("> {prompt}");
        let mut outcome = session.send_text(prompt).await?;

        loop {
            let call_id = match &outcome {
                TurnOutcome::AwaitingTools(calls) if !calls.is_empty() => calls[0].call_id.clone(),
                _ => break,
            };
            match session.view(&call_id) {
                Some(ToolView::AwaitingConfirmation { prompt: question, affordances, .. }) => {
                    println!("  [{question}] clicking '{}'", affordances[0].label);
                    outcome = session.confirm(&call_id, ConfirmationChoice::Confirm).await?;
                }
                other => bail!("call {call_id} cannot be answered here: {other:?}"),
            }
        }

        if let TurnOutcome::StepLimitReached { pending } = &outcome {
            println!("  step limit reached with {} pending call(s)", pending.len());
        }
    }

    println!("\nTranscript:");
    print_transcript(session.conversation().messages());

    for err in session.take_dispatch_errors() {
        println!("dispatch error: {err}");
    }
    Ok(())
}
