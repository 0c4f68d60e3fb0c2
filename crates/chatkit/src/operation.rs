//! Operation envelopes sent by the chat widget.
//!
//! Every request body is `{ "type": "...", "params": { ... } }`. Parsing never
//! fails: a body that is not JSON, has no string `type`, names an unknown
//! type, or lacks what a streaming type needs becomes
//! [`Operation::Unrecognized`], which the router answers with `{}`.

use serde::Deserialize;
use serde_json::Value;

use smartpick_core::thread::UserContent;

/// A classified widget operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// `threads.create`: start a conversation with a first message.
    CreateThread { input: UserInput },
    /// `threads.add_user_message`: continue a conversation.
    AddUserMessage {
        thread_id: Option<String>,
        input: UserInput,
    },
    /// `threads.list`
    ListThreads,
    /// `threads.get_by_id`
    GetThread { thread_id: Option<String> },
    /// `items.list`
    ListItems { thread_id: Option<String> },
    /// `threads.update`
    UpdateThread {
        thread_id: Option<String>,
        title: Option<String>,
    },
    /// `threads.delete`
    DeleteThread { thread_id: Option<String> },
    /// Anything else, including unparsable bodies.
    Unrecognized { kind: Option<String> },
}

/// The user's input for a streaming operation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UserInput {
    #[serde(default)]
    pub content: Vec<UserContent>,
    #[serde(default)]
    pub attachments: Vec<Value>,
    #[serde(default)]
    pub quoted_text: Option<String>,
    #[serde(default)]
    pub inference_options: Option<serde_json::Map<String, Value>>,
}

impl UserInput {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            content: vec![UserContent::text(text)],
            ..Self::default()
        }
    }

    /// Plain-text blocks joined by newline and trimmed. Tags are not included.
    pub fn message_text(&self) -> String {
        let parts: Vec<&str> = self
            .content
            .iter()
            .filter_map(|block| match block {
                UserContent::InputText { text } if !text.is_empty() => Some(text.as_str()),
                _ => None,
            })
            .collect();
        parts.join("\n").trim().to_string()
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    params: Value,
}

#[derive(Deserialize)]
struct InputParams {
    #[serde(default)]
    thread_id: Option<String>,
    input: UserInput,
}

impl Operation {
    /// Parse a raw request body.
    pub fn parse(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => Self::from_value(value),
            Err(e) => {
                tracing::debug!(error = %e, "Operation body is not JSON");
                Self::Unrecognized { kind: None }
            }
        }
    }

    pub fn from_value(value: Value) -> Self {
        let Ok(envelope) = serde_json::from_value::<Envelope>(value) else {
            return Self::Unrecognized { kind: None };
        };
        let params = envelope.params;

        match envelope.kind.as_str() {
            "threads.create" => match serde_json::from_value::<InputParams>(params) {
                Ok(p) => Self::CreateThread { input: p.input },
                Err(_) => Self::Unrecognized {
                    kind: Some(envelope.kind),
                },
            },
            "threads.add_user_message" => match serde_json::from_value::<InputParams>(params) {
                Ok(p) => Self::AddUserMessage {
                    thread_id: p.thread_id.filter(|id| !id.is_empty()),
                    input: p.input,
                },
                Err(_) => Self::Unrecognized {
                    kind: Some(envelope.kind),
                },
            },
            "threads.list" => Self::ListThreads,
            "threads.get_by_id" => Self::GetThread {
                thread_id: string_param(&params, "thread_id"),
            },
            "items.list" => Self::ListItems {
                thread_id: string_param(&params, "thread_id"),
            },
            "threads.update" => Self::UpdateThread {
                thread_id: string_param(&params, "thread_id"),
                title: string_param(&params, "title"),
            },
            "threads.delete" => Self::DeleteThread {
                thread_id: string_param(&params, "thread_id"),
            },
            _ => Self::Unrecognized {
                kind: Some(envelope.kind),
            },
        }
    }

    /// Streaming-class operations answer with an event stream.
    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::CreateThread { .. } | Self::AddUserMessage { .. })
    }

    /// Wire name, for logging.
    pub fn kind(&self) -> &str {
        match self {
            Self::CreateThread { .. } => "threads.create",
            Self::AddUserMessage { .. } => "threads.add_user_message",
            Self::ListThreads => "threads.list",
            Self::GetThread { .. } => "threads.get_by_id",
            Self::ListItems { .. } => "items.list",
            Self::UpdateThread { .. } => "threads.update",
            Self::DeleteThread { .. } => "threads.delete",
            Self::Unrecognized { kind } => kind.as_deref().unwrap_or("unknown"),
        }
    }
}

/// A string-valued param; other JSON types count as absent.
fn string_param(params: &Value, key: &str) -> Option<String> {
    params.get(key).and_then(Value::as_str).map(str::to_string)
}
