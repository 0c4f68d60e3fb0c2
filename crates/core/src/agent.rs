//! Agent trait: the abstraction over the remote recommendation agent.
//!
//! The agent takes the user's message (and the thread it belongs to, if any)
//! and answers with reply text plus the names of cards it considered, best
//! first. Implementations: the HTTP client in `smartpick-agent`, scripted
//! mocks in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AgentError;

/// A successful agent answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentReply {
    /// Assistant reply text.
    pub reply: String,

    /// Thread id the agent recorded the exchange under (may be empty).
    pub thread_id: String,

    /// Free-text card names, in the agent's order.
    #[serde(default)]
    pub candidate_entity_names: Vec<String>,
}

/// The core Agent trait.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Agent name for logging.
    fn name(&self) -> &str;

    /// Send one user message. `thread_id` is `None` for a new conversation.
    async fn send_message(
        &self,
        text: &str,
        thread_id: Option<&str>,
    ) -> Result<AgentReply, AgentError>;
}
