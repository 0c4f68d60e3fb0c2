//! `smartpick chat` — Run one turn through the chat backend.
//!
//! Prints each event frame exactly as the gateway would stream it, then the
//! card the carousel would highlight.

use std::sync::Arc;
use std::time::Duration;

use smartpick_agent::HttpAgent;
use smartpick_chatkit::{Operation, OperationRouter, RouterResponse, UserInput, frame};
use smartpick_config::AppConfig;
use smartpick_core::agent::Agent;
use smartpick_core::event::UiSignal;

pub async fn run(message: String, thread_id: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let catalog = Arc::new(smartpick_gateway::load_catalog(&config.catalog)?);
    let agent: Arc<dyn Agent> = Arc::new(HttpAgent::from_config(&config.agent)?);
    let router = OperationRouter::new(agent, catalog)
        .with_replies(config.replies.clone())
        .with_stream_interval(Duration::from_millis(config.stream.interval_ms));

    let turn = run_turn(&router, message, thread_id).await?;
    for line in &turn.frames {
        print!("{line}");
    }

    match turn.highlighted {
        Some(id) => {
            let name = router
                .catalog()
                .get(&id)
                .map(|entry| entry.name.as_str())
                .unwrap_or_default();
            eprintln!("🎯 Highlighted: {id} {name}");
        }
        None => eprintln!("🎯 Highlighted: none"),
    }
    eprintln!("🧵 Thread: {}", turn.thread_id);

    Ok(())
}

/// Frames and side effects of one chat turn.
pub struct ChatTurn {
    pub thread_id: String,
    pub frames: Vec<String>,
    pub highlighted: Option<String>,
}

pub async fn run_turn(
    router: &OperationRouter,
    message: String,
    thread_id: Option<String>,
) -> Result<ChatTurn, Box<dyn std::error::Error>> {
    let input = UserInput::from_text(message);
    let operation = match thread_id.filter(|id| !id.is_empty()) {
        Some(id) => Operation::AddUserMessage {
            thread_id: Some(id),
            input,
        },
        None => Operation::CreateThread { input },
    };

    let mut signals = router.signals().subscribe();

    let RouterResponse::Stream(turn) = router.handle_operation(operation).await else {
        return Err("chat operation did not produce a stream".into());
    };

    let mut highlighted = None;
    while let Ok(signal) = signals.try_recv() {
        if let UiSignal::EntityHighlighted { entity_id } = signal.as_ref() {
            highlighted = entity_id.clone();
        }
    }

    let thread_id = turn.thread_id().to_string();
    let frames = turn
        .events()
        .iter()
        .map(frame)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ChatTurn {
        thread_id,
        frames,
        highlighted,
    })
}
