//! Tests for the automatic-continuation predicate over whole turns

mod common;

use common::{finish, start, text, tool_call};
use parley_core::continuation::{should_continue, ContinuationTrigger};
use parley_core::conversation::Conversation;
use parley_core::cookbook;
use parley_core::dispatcher::{ConfirmationChoice, FixedSelection};
use parley_core::protocol::{Message, MessageDelta};
use serde_json::json;
use std::sync::Arc;

fn stream_into(conversation: &mut Conversation, deltas: Vec<MessageDelta>) {
    for delta in deltas {
        conversation.apply_delta(delta).unwrap();
    }
}

#[test]
fn test_mixed_batch_continues_only_after_both_resolve() {
    let mut conversation = Conversation::new();
    let mut dispatcher = cookbook::dispatcher(Arc::new(FixedSelection(0)));
    conversation.append(Message::user("Where am I?")).unwrap();

    stream_into(
        &mut conversation,
        vec![
            start("a1"),
            text("One moment."),
            tool_call("loc", "getLocation", json!({})),
            tool_call("ask", "askForConfirmation", json!({"message": "Share it?"})),
        ],
    );
    // Still streaming
    assert!(!should_continue(conversation.messages()));

    stream_into(&mut conversation, vec![finish()]);
    dispatcher.dispatch_new(&mut conversation);

    // The automatic call resolved alone
    assert!(conversation.tool_part("loc").unwrap().is_resolved());
    assert!(!should_continue(conversation.messages()));

    dispatcher
        .confirm(&mut conversation, "ask", ConfirmationChoice::Confirm)
        .unwrap();
    assert_eq!(
        conversation.tool_part("ask").unwrap().output,
        Some(json!("Yes, confirmed."))
    );
    assert!(should_continue(conversation.messages()));
}

#[test]
fn test_unanswered_remote_call_never_continues() {
    let mut conversation = Conversation::new();
    let mut dispatcher = cookbook::dispatcher(Arc::new(FixedSelection(0)));
    let mut trigger = ContinuationTrigger::new();
    conversation.append(Message::user("Weather in Paris?")).unwrap();

    stream_into(
        &mut conversation,
        vec![
            start("a1"),
            tool_call("w1", "getWeatherInformation", json!({"city": "Paris"})),
            finish(),
        ],
    );
    dispatcher.dispatch_new(&mut conversation);

    for _ in 0..10 {
        assert!(!trigger.poll(conversation.messages()));
    }
    assert!(!conversation.tool_part("w1").unwrap().is_resolved());

    // Once the remote result lands, the batch is complete
    stream_into(
        &mut conversation,
        vec![MessageDelta::ToolOutputAvailable {
            tool_call_id: "w1".to_string(),
            output: json!("sunny"),
        }],
    );
    assert!(trigger.poll(conversation.messages()));
    assert!(!trigger.poll(conversation.messages()));
}
