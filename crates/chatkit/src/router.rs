//! Operation router.
//!
//! Classifies each widget operation and answers it either with a single JSON
//! body (thread CRUD over the [`ThreadStore`]) or with a [`TurnStream`]
//! (one conversational turn through the agent). The router never returns an
//! error: malformed or unknown operations get `{}`, unknown threads get a 404
//! body, and a failed agent call becomes a fallback turn.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use smartpick_config::{RepliesConfig, StreamConfig};
use smartpick_core::agent::Agent;
use smartpick_core::catalog::Catalog;
use smartpick_core::event::SignalBus;
use smartpick_core::thread::{
    AssistantMessage, Page, ThreadItem, UserContent, UserMessage, generate_id, timestamp,
};

use crate::operation::{Operation, UserInput};
use crate::store::ThreadStore;
use crate::stream::{TurnStream, emulate};

/// What the transport should send back.
#[derive(Debug)]
pub enum RouterResponse {
    Json { status: u16, body: Value },
    Stream(TurnStream),
}

impl RouterResponse {
    fn ok(body: Value) -> Self {
        Self::Json { status: 200, body }
    }

    fn empty() -> Self {
        Self::ok(json!({}))
    }

    fn not_found() -> Self {
        Self::Json {
            status: 404,
            body: json!({ "detail": "Thread not found" }),
        }
    }

    fn serialized<T: Serialize>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(body) => Self::ok(body),
            Err(e) => {
                error!(error = %e, "Failed to serialize response");
                Self::Json {
                    status: 500,
                    body: json!({ "detail": "Internal error" }),
                }
            }
        }
    }
}

/// Dispatches widget operations to the store or the streaming path.
pub struct OperationRouter {
    store: Arc<ThreadStore>,
    agent: Arc<dyn Agent>,
    catalog: Arc<Catalog>,
    signals: Arc<SignalBus>,
    replies: RepliesConfig,
    stream_interval: Duration,
}

impl OperationRouter {
    /// A router with a fresh store and signal bus and default replies/pacing.
    pub fn new(agent: Arc<dyn Agent>, catalog: Arc<Catalog>) -> Self {
        Self {
            store: Arc::new(ThreadStore::new()),
            agent,
            catalog,
            signals: Arc::new(SignalBus::default()),
            replies: RepliesConfig::default(),
            stream_interval: Duration::from_millis(StreamConfig::default().interval_ms),
        }
    }

    pub fn with_store(mut self, store: Arc<ThreadStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_signals(mut self, signals: Arc<SignalBus>) -> Self {
        self.signals = signals;
        self
    }

    pub fn with_replies(mut self, replies: RepliesConfig) -> Self {
        self.replies = replies;
        self
    }

    pub fn with_stream_interval(mut self, interval: Duration) -> Self {
        self.stream_interval = interval;
        self
    }

    pub fn store(&self) -> &Arc<ThreadStore> {
        &self.store
    }

    pub fn signals(&self) -> &Arc<SignalBus> {
        &self.signals
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Handle a raw request body.
    pub async fn handle(&self, body: &[u8]) -> RouterResponse {
        self.handle_operation(Operation::parse(body)).await
    }

    pub async fn handle_operation(&self, operation: Operation) -> RouterResponse {
        debug!(operation = operation.kind(), "Handling operation");

        match operation {
            Operation::CreateThread { input } => {
                RouterResponse::Stream(self.run_turn(true, None, input).await)
            }
            Operation::AddUserMessage { thread_id, input } => {
                RouterResponse::Stream(self.run_turn(false, thread_id, input).await)
            }
            Operation::ListThreads => {
                RouterResponse::serialized(&Page::complete(self.store.list().await))
            }
            Operation::GetThread { thread_id } => {
                let Some(id) = thread_id else {
                    return RouterResponse::not_found();
                };
                match self.store.get(&id).await {
                    Some(thread) => RouterResponse::serialized(&thread.detail()),
                    None => RouterResponse::not_found(),
                }
            }
            Operation::ListItems { thread_id } => {
                let items = match thread_id {
                    Some(id) => self.store.items(&id).await,
                    None => Vec::new(),
                };
                RouterResponse::serialized(&Page::complete(items))
            }
            Operation::UpdateThread { thread_id, title } => {
                let Some(id) = thread_id else {
                    return RouterResponse::not_found();
                };
                let title = title.filter(|t| !t.is_empty());
                match self.store.set_title(&id, title).await {
                    Some(thread) => RouterResponse::serialized(&thread.detail()),
                    None => RouterResponse::not_found(),
                }
            }
            Operation::DeleteThread { thread_id } => {
                if let Some(id) = thread_id {
                    self.store.delete(&id).await;
                }
                RouterResponse::empty()
            }
            Operation::Unrecognized { kind } => {
                debug!(kind = ?kind, "Unrecognized operation");
                RouterResponse::empty()
            }
        }
    }

    /// Resolve one turn completely, store it, then build its event stream.
    async fn run_turn(
        &self,
        create: bool,
        requested_thread: Option<String>,
        input: UserInput,
    ) -> TurnStream {
        let text = input.message_text();
        info!(
            create,
            thread_id = ?requested_thread,
            agent = self.agent.name(),
            "Streaming turn started"
        );
        self.signals.turn_started(requested_thread.clone());

        let (reply, agent_thread) = match self
            .agent
            .send_message(&text, requested_thread.as_deref())
            .await
        {
            Ok(reply) => {
                let highlighted = self
                    .catalog
                    .resolve_first(&reply.candidate_entity_names)
                    .map(str::to_string);
                debug!(
                    candidates = reply.candidate_entity_names.len(),
                    entity_id = ?highlighted,
                    "Resolved highlighted card"
                );
                self.signals.entity_highlighted(highlighted);
                (reply.reply, Some(reply.thread_id))
            }
            Err(e) => {
                warn!(error = %e, "Agent call failed, sending fallback reply");
                self.signals.entity_highlighted(None);
                (self.replies.failure.clone(), None)
            }
        };

        let reply = if reply.trim().is_empty() {
            self.replies.empty.clone()
        } else {
            reply
        };

        let thread_id = agent_thread
            .filter(|id| !id.is_empty())
            .or(requested_thread)
            .unwrap_or_else(|| generate_id("thread"));

        let now = timestamp();
        let user = UserMessage {
            id: generate_id("item_user"),
            thread_id: thread_id.clone(),
            created_at: now.clone(),
            content: input
                .content
                .into_iter()
                .filter(|block| !matches!(block, UserContent::Unsupported))
                .collect(),
            attachments: input.attachments,
            quoted_text: input.quoted_text,
            inference_options: input.inference_options.unwrap_or_default(),
        };
        let assistant =
            AssistantMessage::with_text(generate_id("item_assistant"), &thread_id, &now, reply);

        let thread = self
            .store
            .upsert_append(
                &thread_id,
                &now,
                None,
                vec![
                    ThreadItem::UserMessage(user.clone()),
                    ThreadItem::AssistantMessage(assistant.clone()),
                ],
            )
            .await;

        let created = create.then(|| thread.summary());
        let events = emulate(created, &user, &assistant);
        debug!(thread_id = %thread_id, events = events.len(), "Turn recorded");

        TurnStream::new(thread_id, events, self.stream_interval)
    }
}
