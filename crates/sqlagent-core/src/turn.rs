//! Pure turn transitions
//!
//! Every change to [`ChatState`] goes through [`transition`]. It performs no
//! I/O; the remote call it asks for comes back as an [`Effect`] for the caller
//! to run, and the caller feeds the result back in as [`Event::Resolved`].

use crate::state::{AgentReply, ChatState, Message};

/// How a remote call ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The agent answered.
    Answered(AgentReply),
    /// The agent understood the request but reported an error.
    Rejected(String),
    /// The request could not be completed or its body could not be read.
    TransportFailed(String),
}

impl Outcome {
    /// The single assistant message this outcome adds to the transcript.
    pub fn into_message(self) -> Message {
        match self {
            Outcome::Answered(reply) => Message::answer(reply),
            Outcome::Rejected(error) => Message::app_error(&error),
            Outcome::TransportFailed(description) => Message::network_error(&description),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Answered(_) => "answered",
            Outcome::Rejected(_) => "rejected",
            Outcome::TransportFailed(_) => "transport_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The input buffer now holds this text.
    InputChanged(String),
    /// The user pressed send.
    Submit,
    /// The in-flight remote call finished.
    Resolved(Outcome),
}

/// Work the caller must perform after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send this (already trimmed) question to the agent, exactly once.
    SendMessage(String),
}

#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ChatState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ChatState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// True when the transition left the state untouched and asked for nothing.
    pub fn is_noop(&self, previous: &ChatState) -> bool {
        self.effects.is_empty() && self.new_state == *previous
    }
}

pub fn transition(state: &ChatState, event: Event) -> TransitionResult {
    match event {
        Event::InputChanged(text) => TransitionResult::new(ChatState {
            pending_input: text,
            ..state.clone()
        }),

        // Only one turn may be outstanding; a busy submit is silently dropped.
        Event::Submit if state.busy => TransitionResult::new(state.clone()),

        Event::Submit => {
            let question = state.pending_input.trim();
            if question.is_empty() {
                return TransitionResult::new(state.clone());
            }
            let question = question.to_string();

            TransitionResult::new(ChatState {
                transcript: state
                    .transcript
                    .clone()
                    .append(Message::user(question.clone())),
                busy: true,
                pending_input: String::new(),
            })
            .with_effect(Effect::SendMessage(question))
        }

        Event::Resolved(outcome) if state.busy => TransitionResult::new(ChatState {
            transcript: state.transcript.clone().append(outcome.into_message()),
            busy: false,
            pending_input: state.pending_input.clone(),
        }),

        // Nothing is in flight, so there is no turn to finish.
        Event::Resolved(_) => TransitionResult::new(state.clone()),
    }
}
