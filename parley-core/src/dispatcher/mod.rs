//! Tool-call dispatch
//!
//! This module decides what happens to each tool call the model requests:
//! - `automatic-silent` tools are answered by a synchronous handler
//! - `interactive-confirmation` tools wait for one of two user affordances
//! - `remote-executed` tools wait for a remote executor's result
//!
//! Which tool gets which mode is looked up in a `ToolPolicy`.

mod confirmation;
mod dispatch;
mod handler;
mod mode;
mod policy;
mod selection;

pub use confirmation::{
    prompt_text, Affordance, ConfirmationChoice, ConfirmationLiterals, DEFAULT_CONFIRM_LITERAL,
    DEFAULT_DENY_LITERAL,
};
pub use dispatch::{
    ConfirmOutcome, DispatchError, DispatchOutcome, OverdueCall, ToolCallDispatcher, ToolView,
    DEFAULT_CANCEL_LITERAL,
};
pub use handler::{AutomaticHandler, ChoiceHandler, HandlerError};
pub use mode::{HandlingMode, UnknownToolPolicy};
pub use policy::{ToolEntry, ToolPolicy};
pub use selection::{pick, FixedSelection, RandomSelection, SeededSelection, SelectionStrategy};
