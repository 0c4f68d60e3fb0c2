//! HTTP client for the SmartPick recommendation agent.
//!
//! The agent service exposes `POST /agent/chat`:
//!
//! ```json
//! // request
//! { "message": "I want travel perks", "thread_id": null }
//! // response
//! { "thread_id": "9f…", "reply": "Try …", "cards": [{ "card_name": "현대카드 Summit", … }] }
//! ```
//!
//! [`HttpAgent`] maps that exchange onto the core [`Agent`] trait; the card
//! names become the reply's candidate list, in the order the agent ranked them.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use smartpick_config::AgentConfig;
use smartpick_core::agent::{Agent, AgentReply};
use smartpick_core::error::AgentError;

/// Agent reached over HTTP.
pub struct HttpAgent {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpAgent {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AgentError::NotConfigured(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            client,
        })
    }

    pub fn from_config(config: &AgentConfig) -> Result<Self, AgentError> {
        let agent = Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))?;
        Ok(match &config.api_key {
            Some(key) => agent.with_api_key(key),
            None => agent,
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn chat_url(&self) -> String {
        format!("{}/agent/chat", self.base_url)
    }
}

#[async_trait]
impl Agent for HttpAgent {
    fn name(&self) -> &str {
        "http"
    }

    async fn send_message(
        &self,
        text: &str,
        thread_id: Option<&str>,
    ) -> Result<AgentReply, AgentError> {
        let url = self.chat_url();
        let body = ChatRequest {
            message: text,
            thread_id,
        };

        debug!(url = %url, thread_id = ?thread_id, "Sending agent chat request");

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AgentError::Timeout(e.to_string())
            } else {
                AgentError::Request(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %error_body, "Agent returned error");
            return Err(AgentError::Status {
                status_code: status.as_u16(),
                message: error_body,
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Decode(e.to_string()))?;

        Ok(chat.into())
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    thread_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    thread_id: String,
    #[serde(default)]
    reply: String,
    #[serde(default)]
    cards: Vec<AgentCard>,
}

/// One card the agent considered. Only the name is used for matching.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct AgentCard {
    card_name: Option<String>,
    card_company: Option<String>,
    annual_fee: Option<i64>,
    min_performance: Option<i64>,
    benefits_summary: Option<String>,
}

impl From<ChatResponse> for AgentReply {
    fn from(chat: ChatResponse) -> Self {
        AgentReply {
            reply: chat.reply,
            thread_id: chat.thread_id,
            candidate_entity_names: chat.cards.into_iter().filter_map(|c| c.card_name).collect(),
        }
    }
}
