//! Property-based tests for turn transitions
//!
//! Random event sequences must never break the transcript or busy invariants.

use crate::state::{AgentReply, ChatState, Role};
use crate::turn::{transition, Effect, Event, Outcome};
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        (
            "[a-zA-Z0-9 ]{0,30}",
            proptest::option::of("SELECT [a-z*]{1,10} FROM [a-z]{1,10}"),
            proptest::option::of("[0-9]{1,5}"),
        )
            .prop_map(|(answer, sql, result)| Outcome::Answered(AgentReply {
                answer,
                sql,
                result
            })),
        "[a-z ]{1,20}".prop_map(Outcome::Rejected),
        "[a-z ]{1,20}".prop_map(Outcome::TransportFailed),
    ]
}

fn arb_blank() -> impl Strategy<Value = String> {
    "[ \t\n]{0,6}"
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        "[ a-zA-Z?]{0,20}".prop_map(Event::InputChanged),
        Just(Event::Submit),
        arb_outcome().prop_map(Event::Resolved),
    ]
}

// ============================================================================
// Invariants
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // The transcript only ever grows, and earlier entries never change.
    #[test]
    fn prop_transcript_is_append_only(events in proptest::collection::vec(arb_event(), 0..30)) {
        let mut state = ChatState::new();
        for event in events {
            let next = transition(&state, event).new_state;
            prop_assert!(next.transcript.len() >= state.transcript.len());
            prop_assert_eq!(
                &next.transcript.messages()[..state.transcript.len()],
                state.transcript.messages()
            );
            state = next;
        }
    }

    // A request is only issued from idle, and at most one per transition.
    #[test]
    fn prop_at_most_one_turn_in_flight(events in proptest::collection::vec(arb_event(), 0..30)) {
        let mut state = ChatState::new();
        let mut in_flight = 0usize;
        for event in events {
            let was_busy = state.busy;
            let result = transition(&state, event.clone());

            if !result.effects.is_empty() {
                prop_assert!(!was_busy, "request issued while busy");
                prop_assert_eq!(result.effects.len(), 1);
                in_flight += 1;
            }
            if was_busy && matches!(event, Event::Resolved(_)) {
                in_flight -= 1;
            }
            prop_assert!(in_flight <= 1);
            prop_assert_eq!(result.new_state.busy, in_flight == 1);
            state = result.new_state;
        }
    }

    // Busy means the last message is the user's unanswered question.
    #[test]
    fn prop_busy_iff_awaiting_reply(events in proptest::collection::vec(arb_event(), 0..30)) {
        let mut state = ChatState::new();
        for event in events {
            state = transition(&state, event).new_state;
            let last_role = state.transcript.last().map(|m| m.role);
            if state.busy {
                prop_assert_eq!(last_role, Some(Role::User));
            } else {
                prop_assert_eq!(last_role, Some(Role::Assistant));
            }
        }
    }

    #[test]
    fn prop_blank_submit_is_noop(blank in arb_blank(), busy in any::<bool>()) {
        let state = ChatState {
            pending_input: blank,
            busy,
            ..ChatState::new()
        };
        let result = transition(&state, Event::Submit);
        prop_assert!(result.is_noop(&state));
    }

    #[test]
    fn prop_busy_submit_is_noop(text in "[a-zA-Z ?]{1,40}") {
        let typed = transition(&ChatState::new(), Event::InputChanged("first".into())).new_state;
        let busy = transition(&typed, Event::Submit).new_state;
        let retyped = transition(&busy, Event::InputChanged(text)).new_state;

        let result = transition(&retyped, Event::Submit);
        prop_assert!(result.is_noop(&retyped));
        prop_assert_eq!(result.new_state.transcript.len(), 2);
    }

    // A full turn appends exactly user-then-assistant and sends the trimmed text.
    #[test]
    fn prop_turn_appends_user_then_assistant(
        lead in arb_blank(),
        question in "[a-zA-Z0-9?][a-zA-Z0-9 ?]{0,30}[a-zA-Z0-9?]",
        trail in arb_blank(),
        outcome in arb_outcome(),
    ) {
        let raw = format!("{lead}{question}{trail}");
        let start = ChatState::new();
        let typed = transition(&start, Event::InputChanged(raw)).new_state;

        let sent = transition(&typed, Event::Submit);
        prop_assert_eq!(&sent.effects, &vec![Effect::SendMessage(question.clone())]);

        let expected = outcome.clone().into_message();
        let done = transition(&sent.new_state, Event::Resolved(outcome)).new_state;

        prop_assert!(!done.busy);
        prop_assert_eq!(done.transcript.len(), start.transcript.len() + 2);
        let appended = &done.transcript.messages()[start.transcript.len()..];
        prop_assert_eq!(appended[0].role, Role::User);
        prop_assert_eq!(&appended[0].content, &question);
        prop_assert_eq!(&appended[1], &expected);
    }

    #[test]
    fn prop_error_outcomes_are_flagged(outcome in arb_outcome()) {
        let is_error = !matches!(outcome, Outcome::Answered(_));
        let message = outcome.into_message();
        prop_assert_eq!(message.is_error, is_error);
        prop_assert_eq!(message.role, Role::Assistant);
    }
}
