//! Streaming emulator.
//!
//! A turn is fully resolved before anything is emitted: the agent has already
//! answered and both items are stored. Emulation is pure sequencing over that
//! final text:
//!
//! ```text
//! [thread.created] → thread.item.done (user) → stream_options
//!   → thread.item.added (assistant, empty) → content_part.added
//!   → text_delta × words → content_part.done → thread.item.done (assistant)
//! ```
//!
//! [`TurnStream`] then hands the events out one at a time, optionally paced.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use smartpick_core::thread::{
    AssistantContent, AssistantMessage, ThreadItem, ThreadView, UserMessage,
};

/// One increment of the emulated protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StreamEvent {
    #[serde(rename = "thread.created")]
    ThreadCreated { thread: ThreadView },

    #[serde(rename = "thread.item.done")]
    ItemDone { item: ThreadItem },

    #[serde(rename = "stream_options")]
    StreamOptions { stream_options: StreamOptions },

    #[serde(rename = "thread.item.added")]
    ItemAdded { item: ThreadItem },

    #[serde(rename = "thread.item.updated")]
    ItemUpdated { item_id: String, update: ItemUpdate },
}

/// Incremental change to an assistant item's content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ItemUpdate {
    #[serde(rename = "assistant_message.content_part.added")]
    ContentPartAdded {
        content_index: usize,
        content: AssistantContent,
    },

    #[serde(rename = "assistant_message.content_part.text_delta")]
    TextDelta { content_index: usize, delta: String },

    #[serde(rename = "assistant_message.content_part.done")]
    ContentPartDone {
        content_index: usize,
        content: AssistantContent,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamOptions {
    pub allow_cancel: bool,
}

impl StreamEvent {
    /// Short name for logs.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ThreadCreated { .. } => "thread.created",
            Self::ItemDone { .. } => "thread.item.done",
            Self::StreamOptions { .. } => "stream_options",
            Self::ItemAdded { .. } => "thread.item.added",
            Self::ItemUpdated { .. } => "thread.item.updated",
        }
    }

    /// The text carried by a delta event, if this is one.
    pub fn delta(&self) -> Option<&str> {
        match self {
            Self::ItemUpdated {
                update: ItemUpdate::TextDelta { delta, .. },
                ..
            } => Some(delta),
            _ => None,
        }
    }
}

/// Split text into word chunks. Every chunk but the last keeps one trailing space.
///
/// Runs of whitespace collapse, so concatenating the chunks yields the words
/// joined by single spaces. Blank text has no chunks.
pub fn word_chunks(text: &str) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let last = words.len().saturating_sub(1);
    words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            if i < last {
                format!("{word} ")
            } else {
                (*word).to_string()
            }
        })
        .collect()
}

/// Build the ordered event sequence for one turn.
///
/// `created` is the new thread's summary when the turn created it.
pub fn emulate(
    created: Option<ThreadView>,
    user: &UserMessage,
    assistant: &AssistantMessage,
) -> Vec<StreamEvent> {
    let text = assistant.text();
    let chunks = word_chunks(&text);
    let item_id = assistant.id.clone();

    let mut events = Vec::with_capacity(chunks.len() + 7);

    if let Some(thread) = created {
        events.push(StreamEvent::ThreadCreated { thread });
    }

    events.push(StreamEvent::ItemDone {
        item: ThreadItem::UserMessage(user.clone()),
    });
    events.push(StreamEvent::StreamOptions {
        stream_options: StreamOptions { allow_cancel: true },
    });
    events.push(StreamEvent::ItemAdded {
        item: ThreadItem::AssistantMessage(assistant.empty_shell()),
    });
    events.push(StreamEvent::ItemUpdated {
        item_id: item_id.clone(),
        update: ItemUpdate::ContentPartAdded {
            content_index: 0,
            content: AssistantContent::output_text(""),
        },
    });

    for delta in chunks {
        events.push(StreamEvent::ItemUpdated {
            item_id: item_id.clone(),
            update: ItemUpdate::TextDelta {
                content_index: 0,
                delta,
            },
        });
    }

    events.push(StreamEvent::ItemUpdated {
        item_id,
        update: ItemUpdate::ContentPartDone {
            content_index: 0,
            content: AssistantContent::output_text(text),
        },
    });
    events.push(StreamEvent::ItemDone {
        item: ThreadItem::AssistantMessage(assistant.clone()),
    });

    events
}

/// Encode one event as a `text/event-stream` frame.
pub fn frame(event: &StreamEvent) -> Result<String, serde_json::Error> {
    Ok(format!("data: {}\n\n", serde_json::to_string(event)?))
}

/// A finished turn's events, ready to be delivered once.
#[derive(Debug, Clone)]
pub struct TurnStream {
    thread_id: String,
    events: Vec<StreamEvent>,
    interval: Duration,
}

impl TurnStream {
    pub fn new(thread_id: impl Into<String>, events: Vec<StreamEvent>, interval: Duration) -> Self {
        Self {
            thread_id: thread_id.into(),
            events,
            interval,
        }
    }

    /// Thread the turn was recorded under.
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn events(&self) -> &[StreamEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<StreamEvent> {
        self.events
    }

    /// Deliver the events in order over a channel, one per interval.
    ///
    /// The channel closes after the last event. Delivery stops early if the
    /// consumer goes away. Must be called within a Tokio runtime.
    pub fn into_stream(self) -> ReceiverStream<StreamEvent> {
        let (tx, rx) = mpsc::channel(16);
        let Self {
            thread_id,
            events,
            interval,
        } = self;

        tokio::spawn(async move {
            for event in events {
                if !interval.is_zero() {
                    tokio::time::sleep(interval).await;
                }
                if tx.send(event).await.is_err() {
                    tracing::debug!(thread_id = %thread_id, "Stream consumer went away");
                    return;
                }
            }
            tracing::debug!(thread_id = %thread_id, "Turn stream complete");
        });

        ReceiverStream::new(rx)
    }
}
