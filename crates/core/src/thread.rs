//! Thread and item domain types.
//!
//! A thread is one conversation: an ordered, append-only list of user and
//! assistant messages. Items are immutable once appended, and every item's
//! `thread_id` equals its owning thread's `id`.
//!
//! Field names and tags follow the chat widget's wire format, so these types
//! serialize directly into responses and stream events.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generate a prefixed unique id, e.g. `thread_5f0c…`.
pub fn generate_id(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}

/// Current time as an RFC 3339 UTC string with millisecond precision.
///
/// Strings of this shape sort lexicographically in time order.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ThreadStatus {
    #[default]
    Active,
}

/// A content block of user input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserContent {
    InputText {
        text: String,
    },
    InputTag {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<serde_json::Value>,
    },
    /// Any block kind this backend does not understand.
    #[serde(other)]
    Unsupported,
}

impl UserContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::InputText { text: text.into() }
    }

    pub fn tag(text: impl Into<String>) -> Self {
        Self::InputTag {
            text: text.into(),
            id: None,
            data: None,
        }
    }
}

/// A content block of assistant output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantContent {
    OutputText {
        text: String,
        #[serde(default)]
        annotations: Vec<serde_json::Value>,
    },
}

impl AssistantContent {
    pub fn output_text(text: impl Into<String>) -> Self {
        Self::OutputText {
            text: text.into(),
            annotations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMessage {
    pub id: String,
    pub thread_id: String,
    pub created_at: String,
    pub content: Vec<UserContent>,
    #[serde(default)]
    pub attachments: Vec<serde_json::Value>,
    #[serde(default)]
    pub quoted_text: Option<String>,
    #[serde(default)]
    pub inference_options: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub id: String,
    pub thread_id: String,
    pub created_at: String,
    pub content: Vec<AssistantContent>,
}

impl AssistantMessage {
    /// A finished assistant message carrying one output text block.
    pub fn with_text(
        id: impl Into<String>,
        thread_id: impl Into<String>,
        created_at: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            thread_id: thread_id.into(),
            created_at: created_at.into(),
            content: vec![AssistantContent::output_text(text)],
        }
    }

    /// The same message before any content has been streamed.
    pub fn empty_shell(&self) -> Self {
        Self {
            content: Vec::new(),
            ..self.clone()
        }
    }

    /// Concatenated output text.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|c| match c {
                AssistantContent::OutputText { text, .. } => text.as_str(),
            })
            .collect()
    }
}

/// One message in a thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ThreadItem {
    UserMessage(UserMessage),
    AssistantMessage(AssistantMessage),
}

impl ThreadItem {
    pub fn id(&self) -> &str {
        match self {
            Self::UserMessage(m) => &m.id,
            Self::AssistantMessage(m) => &m.id,
        }
    }

    pub fn thread_id(&self) -> &str {
        match self {
            Self::UserMessage(m) => &m.thread_id,
            Self::AssistantMessage(m) => &m.thread_id,
        }
    }
}

/// A list page. This backend never paginates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub has_more: bool,
    pub after: Option<String>,
}

impl<T> Page<T> {
    pub fn complete(data: Vec<T>) -> Self {
        Self {
            data,
            has_more: false,
            after: None,
        }
    }

    pub fn empty() -> Self {
        Self::complete(Vec::new())
    }
}

/// A conversation, owned by the thread store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub created_at: String,
    pub title: Option<String>,
    pub status: ThreadStatus,
    pub items: Vec<ThreadItem>,
}

impl Thread {
    pub fn new(id: impl Into<String>, created_at: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: created_at.into(),
            title: None,
            status: ThreadStatus::Active,
            items: Vec::new(),
        }
    }

    /// Wire view without items (list entries and `thread.created`).
    pub fn summary(&self) -> ThreadView {
        self.view(Page::empty())
    }

    /// Wire view embedding every item.
    pub fn detail(&self) -> ThreadView {
        self.view(Page::complete(self.items.clone()))
    }

    fn view(&self, items: Page<ThreadItem>) -> ThreadView {
        ThreadView {
            id: self.id.clone(),
            title: self.title.clone(),
            created_at: self.created_at.clone(),
            status: self.status,
            items,
        }
    }
}

/// Thread as sent over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadView {
    pub id: String,
    pub title: Option<String>,
    pub created_at: String,
    pub status: ThreadStatus,
    pub items: Page<ThreadItem>,
}
