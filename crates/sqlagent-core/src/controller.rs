//! Turn controller
//!
//! Drives one request/response cycle at a time against a [`SqlAgent`],
//! applying every step through [`transition`] and publishing the resulting
//! [`ChatState`] to subscribers.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::state::{ChatState, Transcript};
use crate::turn::{transition, Effect, Event, Outcome};

/// Anything that can answer a question. Implementations never fail: every
/// failure is folded into an [`Outcome`] variant.
#[async_trait]
pub trait SqlAgent: Send + Sync {
    async fn ask(&self, message: &str) -> Outcome;
}

pub struct TurnController<A> {
    agent: A,
    state: ChatState,
    updates: watch::Sender<ChatState>,
}

impl<A: SqlAgent> TurnController<A> {
    pub fn new(agent: A) -> Self {
        let state = ChatState::new();
        let (updates, _) = watch::channel(state.clone());
        Self {
            agent,
            state,
            updates,
        }
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.state.transcript
    }

    pub fn is_busy(&self) -> bool {
        self.state.busy
    }

    /// Receives a snapshot after every observable transition.
    pub fn subscribe(&self) -> watch::Receiver<ChatState> {
        self.updates.subscribe()
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.apply(Event::InputChanged(text.into()));
    }

    /// Runs a full turn for `raw`. Returns how many messages were appended:
    /// zero for blank input, otherwise two.
    pub async fn submit(&mut self, raw: &str) -> usize {
        self.set_input(raw);
        self.submit_pending().await
    }

    /// Runs a full turn for whatever is in the input buffer.
    pub async fn submit_pending(&mut self) -> usize {
        let before = self.state.transcript.len();

        for effect in self.apply(Event::Submit) {
            match effect {
                Effect::SendMessage(question) => {
                    tracing::debug!(question = %question, "turn started");
                    let outcome = self.agent.ask(&question).await;
                    tracing::info!(outcome = outcome.kind(), "turn finished");
                    self.apply(Event::Resolved(outcome));
                }
            }
        }

        self.state.transcript.len() - before
    }

    fn apply(&mut self, event: Event) -> Vec<Effect> {
        let result = transition(&self.state, event);
        if result.new_state != self.state {
            self.state = result.new_state;
            self.updates.send_replace(self.state.clone());
        }
        result.effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AgentReply, Role};
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;

    /// Replays scripted outcomes and records every question it was asked.
    #[derive(Default)]
    struct ScriptedAgent {
        outcomes: Mutex<Vec<Outcome>>,
        asked: Mutex<Vec<String>>,
    }

    impl ScriptedAgent {
        fn new(outcomes: Vec<Outcome>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into_iter().rev().collect()),
                asked: Mutex::new(vec![]),
            }
        }

        fn asked(&self) -> Vec<String> {
            self.asked.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SqlAgent for ScriptedAgent {
        async fn ask(&self, message: &str) -> Outcome {
            self.asked.lock().unwrap().push(message.to_string());
            self.outcomes
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Outcome::TransportFailed("no scripted outcome".into()))
        }
    }

    /// Holds every request until released, so tests can look at the mid-turn state.
    struct GatedAgent {
        release: Arc<Notify>,
    }

    #[async_trait]
    impl SqlAgent for GatedAgent {
        async fn ask(&self, _message: &str) -> Outcome {
            self.release.notified().await;
            Outcome::Answered(AgentReply {
                answer: "done".into(),
                ..Default::default()
            })
        }
    }

    fn four_tracks() -> Outcome {
        Outcome::Answered(AgentReply {
            answer: "4 tracks".into(),
            sql: Some("SELECT COUNT(*) FROM tracks".into()),
            result: Some("4".into()),
        })
    }

    #[test]
    fn starts_with_welcome_only() {
        let controller = TurnController::new(ScriptedAgent::default());
        assert_eq!(controller.transcript().len(), 1);
        assert_eq!(controller.transcript().messages()[0].role, Role::Assistant);
        assert!(!controller.is_busy());
    }

    #[tokio::test]
    async fn successful_turn_appends_user_then_answer() {
        let mut controller = TurnController::new(ScriptedAgent::new(vec![four_tracks()]));

        let appended = controller.submit("  How many tracks are there?\n").await;

        assert_eq!(appended, 2);
        assert!(!controller.is_busy());
        assert!(controller.state().pending_input.is_empty());
        assert_eq!(controller.agent().asked(), vec!["How many tracks are there?"]);

        let messages = controller.transcript().messages();
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "How many tracks are there?");
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[2].content, "4 tracks");
        assert_eq!(messages[2].sql.as_deref(), Some("SELECT COUNT(*) FROM tracks"));
        assert_eq!(messages[2].result.as_deref(), Some("4"));
    }

    #[tokio::test]
    async fn blank_input_sends_nothing() {
        let mut controller = TurnController::new(ScriptedAgent::new(vec![four_tracks()]));

        assert_eq!(controller.submit("   ").await, 0);
        assert_eq!(controller.submit("").await, 0);

        assert_eq!(controller.transcript().len(), 1);
        assert!(controller.agent().asked().is_empty());
        assert!(!controller.is_busy());
    }

    #[tokio::test]
    async fn failed_turn_does_not_block_next_one() {
        let mut controller = TurnController::new(ScriptedAgent::new(vec![
            Outcome::TransportFailed("connection refused".into()),
            Outcome::Rejected("table not found".into()),
            four_tracks(),
        ]));

        controller.submit("one").await;
        controller.submit("two").await;
        controller.submit("three").await;

        let contents: Vec<&str> = controller
            .transcript()
            .iter()
            .skip(1)
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(
            contents,
            vec![
                "one",
                "Network Error: connection refused",
                "two",
                "Error: table not found",
                "three",
                "4 tracks",
            ]
        );
        assert!(!controller.is_busy());
    }

    #[tokio::test]
    async fn subscribers_see_busy_only_while_waiting() {
        let release = Arc::new(Notify::new());
        let mut controller = TurnController::new(GatedAgent {
            release: release.clone(),
        });
        let mut updates = controller.subscribe();

        let turn = tokio::spawn(async move {
            controller.submit("How many albums?").await;
            controller
        });

        let waiting = updates.wait_for(|s| s.busy).await.unwrap().clone();
        assert_eq!(waiting.transcript.len(), 2);
        assert_eq!(waiting.transcript.last().unwrap().role, Role::User);
        assert!(waiting.pending_input.is_empty());

        release.notify_one();
        let controller = turn.await.unwrap();

        let done = updates.borrow().clone();
        assert!(!done.busy);
        assert_eq!(done.transcript.len(), 3);
        assert_eq!(done, *controller.state());
    }
}
