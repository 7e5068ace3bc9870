//! UI-agnostic conversation state
//!
//! The transcript and turn state shared by every front end (full-screen TUI,
//! one-shot `ask`, line-mode `repl`). Nothing here depends on a UI framework.

use serde::{Deserialize, Serialize};

/// Greeting every new session starts with.
pub const WELCOME_MESSAGE: &str =
    "Hello! I am your AI SQL Agent. Ask me anything about your data.";

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A successful reply from the SQL agent
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AgentReply {
    pub answer: String,
    pub sql: Option<String>,
    pub result: Option<String>,
}

/// One entry in the conversation. Never modified after it is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default)]
    pub is_error: bool,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            sql: None,
            result: None,
            is_error: false,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            ..Self::user(content)
        }
    }

    pub fn answer(reply: AgentReply) -> Self {
        Self {
            sql: reply.sql,
            result: reply.result,
            ..Self::assistant(reply.answer)
        }
    }

    /// The backend understood the question but could not answer it.
    pub fn app_error(message: &str) -> Self {
        Self {
            is_error: true,
            ..Self::assistant(format!("Error: {}", message))
        }
    }

    /// The exchange itself failed.
    pub fn network_error(description: &str) -> Self {
        Self {
            is_error: true,
            ..Self::assistant(format!("Network Error: {}", description))
        }
    }
}

/// Ordered conversation history. Grows by [`Transcript::append`] only.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// A fresh transcript holding only the welcome message.
    pub fn seeded() -> Self {
        Self {
            messages: vec![Message::assistant(WELCOME_MESSAGE)],
        }
    }

    /// Returns the transcript with `message` added at the end.
    #[must_use]
    pub fn append(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

/// Everything a front end needs to draw the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatState {
    pub transcript: Transcript,
    /// True while a turn is waiting on the agent.
    pub busy: bool,
    pub pending_input: String,
}

impl ChatState {
    pub fn new() -> Self {
        Self {
            transcript: Transcript::seeded(),
            busy: false,
            pending_input: String::new(),
        }
    }
}

impl Default for ChatState {
    fn default() -> Self {
        Self::new()
    }
}
