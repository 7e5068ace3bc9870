use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::error::Error as _;
use thiserror::Error;

use crate::controller::SqlAgent;
use crate::state::AgentReply;
use crate::turn::Outcome;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/api/chat";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{}", describe_http(.0))]
    Http(#[from] reqwest::Error),
    #[error("could not parse response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("response contained neither an answer nor an error")]
    MissingAnswer,
    #[error("invalid endpoint '{0}'")]
    InvalidEndpoint(String),
}

/// reqwest's own message omits the cause ("connection refused" and friends),
/// so walk the source chain.
fn describe_http(err: &reqwest::Error) -> String {
    let mut description = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !description.contains(&text) {
            description.push_str(": ");
            description.push_str(&text);
        }
        source = cause.source();
    }
    description
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// Body returned by `POST /api/chat`, for both success and failure.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ChatResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub sql: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ChatResponse {
    pub fn into_outcome(self) -> Result<Outcome, ClientError> {
        if let Some(error) = self.error.filter(|e| !e.is_empty()) {
            return Ok(Outcome::Rejected(error));
        }

        let answer = self.answer.ok_or(ClientError::MissingAnswer)?;
        Ok(Outcome::Answered(AgentReply {
            answer,
            sql: self.sql.filter(|s| !s.is_empty()),
            result: self.result.filter(|r| !r.is_empty()),
        }))
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub agent_provider: Option<String>,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

#[derive(Clone, Debug)]
pub struct AgentClient {
    client: Client,
    endpoint: Url,
}

impl AgentClient {
    pub fn new(endpoint: &str) -> Result<Self, ClientError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|_| ClientError::InvalidEndpoint(endpoint.to_string()))?;
        if endpoint.cannot_be_a_base() {
            return Err(ClientError::InvalidEndpoint(endpoint.to_string()));
        }

        Ok(Self {
            client: Client::new(),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// Sends one question. The HTTP status is not inspected: the backend
    /// reports failures as a JSON `error` body alongside a 4xx/5xx status.
    pub async fn chat(&self, message: &str) -> Result<ChatResponse, ClientError> {
        tracing::debug!(endpoint = %self.endpoint, "sending question");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&ChatRequest { message })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(%status, bytes = body.len(), "agent responded");

        let chat_response: ChatResponse = serde_json::from_str(&body)?;
        Ok(chat_response)
    }

    /// URL of the backend's health probe, on the same origin as the chat endpoint.
    pub fn health_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        url.set_path("/health");
        url.set_query(None);
        url.set_fragment(None);
        url
    }

    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let response = self.client.get(self.health_url()).send().await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl SqlAgent for AgentClient {
    async fn ask(&self, message: &str) -> Outcome {
        match self.chat(message).await.and_then(ChatResponse::into_outcome) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, "agent request failed");
                Outcome::TransportFailed(e.to_string())
            }
        }
    }
}
