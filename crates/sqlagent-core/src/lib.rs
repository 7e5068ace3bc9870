pub mod client;
pub mod config;
pub mod controller;
pub mod logging;
pub mod state;
pub mod turn;

#[cfg(test)]
mod proptests;

// Re-export main types for convenience
pub use client::{AgentClient, ChatResponse, ClientError, HealthStatus, DEFAULT_ENDPOINT};
pub use config::{Config, ConfigError};
pub use controller::{SqlAgent, TurnController};
pub use state::{AgentReply, ChatState, Message, Role, Transcript, WELCOME_MESSAGE};
pub use turn::{transition, Effect, Event, Outcome, TransitionResult};
