//! Static per-tool handling table

use super::confirmation::ConfirmationLiterals;
use super::handler::{AutomaticHandler, ChoiceHandler};
use super::mode::{HandlingMode, UnknownToolPolicy};
use super::selection::SelectionStrategy;
use crate::config::{ParleyConfig, ToolConfig};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// How one tool is handled, with what it needs to do so
#[derive(Clone)]
pub enum ToolEntry {
    AutomaticSilent(Arc<dyn AutomaticHandler>),
    InteractiveConfirmation(ConfirmationLiterals),
    RemoteExecuted,
}

impl ToolEntry {
    /// The handling mode of this entry
    pub fn mode(&self) -> HandlingMode {
        match self {
            ToolEntry::AutomaticSilent(_) => HandlingMode::AutomaticSilent,
            ToolEntry::InteractiveConfirmation(_) => HandlingMode::InteractiveConfirmation,
            ToolEntry::RemoteExecuted => HandlingMode::RemoteExecuted,
        }
    }
}

impl fmt::Debug for ToolEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolEntry::AutomaticSilent(_) => f.write_str("AutomaticSilent(..)"),
            ToolEntry::InteractiveConfirmation(literals) => f
                .debug_tuple("InteractiveConfirmation")
                .field(literals)
                .finish(),
            ToolEntry::RemoteExecuted => f.write_str("RemoteExecuted"),
        }
    }
}

/// Tool name -> handling entry
#[derive(Debug, Clone, Default)]
pub struct ToolPolicy {
    entries: HashMap<String, ToolEntry>,
    unknown: UnknownToolPolicy,
}

impl ToolPolicy {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool resolved by a synchronous handler
    pub fn automatic(
        mut self,
        name: impl Into<String>,
        handler: impl AutomaticHandler + 'static,
    ) -> Self {
        self.entries
            .insert(name.into(), ToolEntry::AutomaticSilent(Arc::new(handler)));
        self
    }

    /// Register a tool resolved by user confirmation
    pub fn interactive(mut self, name: impl Into<String>, literals: ConfirmationLiterals) -> Self {
        self.entries
            .insert(name.into(), ToolEntry::InteractiveConfirmation(literals));
        self
    }

    /// Register a tool resolved by a remote executor
    pub fn remote(mut self, name: impl Into<String>) -> Self {
        self.entries.insert(name.into(), ToolEntry::RemoteExecuted);
        self
    }

    /// Set the policy for unregistered names
    pub fn with_unknown_tools(mut self, unknown: UnknownToolPolicy) -> Self {
        self.unknown = unknown;
        self
    }

    /// Build the table from configuration
    ///
    /// Automatic tools answer with one of their configured candidates, chosen
    /// by `strategy`.
    pub fn from_config(config: &ParleyConfig, strategy: Arc<dyn SelectionStrategy>) -> Self {
        let entries = config
            .tools
            .iter()
            .map(|tool| (tool.name.clone(), entry_from_config(tool, &strategy)))
            .collect();

        Self {
            entries,
            unknown: config.unknown_tools,
        }
    }

    /// Entry for `name`
    pub fn get(&self, name: &str) -> Option<&ToolEntry> {
        self.entries.get(name)
    }

    /// Handling mode for `name`
    pub fn mode(&self, name: &str) -> Option<HandlingMode> {
        self.get(name).map(ToolEntry::mode)
    }

    /// Policy for unregistered names
    pub fn unknown_tools(&self) -> UnknownToolPolicy {
        self.unknown
    }

    /// Registered tool names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

fn entry_from_config(tool: &ToolConfig, strategy: &Arc<dyn SelectionStrategy>) -> ToolEntry {
    match tool.mode {
        HandlingMode::AutomaticSilent => ToolEntry::AutomaticSilent(Arc::new(ChoiceHandler::new(
            tool.candidates.clone(),
            Arc::clone(strategy),
        ))),
        HandlingMode::InteractiveConfirmation => {
            ToolEntry::InteractiveConfirmation(tool.confirmation_literals())
        }
        HandlingMode::RemoteExecuted => ToolEntry::RemoteExecuted,
    }
}
