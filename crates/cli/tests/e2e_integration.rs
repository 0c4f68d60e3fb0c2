//! End-to-end integration tests for the SmartPick backend.
//!
//! These tests exercise the full pipeline from a widget operation to the
//! streamed frames, including the agent exchange, card matching, UI signals
//! and the thread store.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::{Json, Router, routing};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use smartpick_agent::HttpAgent;
use smartpick_chatkit::{OperationRouter, RouterResponse, StreamEvent};
use smartpick_config::AppConfig;
use smartpick_core::agent::{Agent, AgentReply};
use smartpick_core::catalog::{Catalog, CatalogEntry};
use smartpick_core::error::AgentError;
use smartpick_core::event::UiSignal;
use smartpick_core::rotation::{Carousel, RotationCommand};
use smartpick_gateway::{GatewayState, build_router};

// ── Mock Agent ───────────────────────────────────────────────────────────

/// An agent that returns scripted outcomes in sequence.
struct ScriptedAgent {
    outcomes: Mutex<Vec<Result<AgentReply, AgentError>>>,
    call_count: Mutex<usize>,
}

impl ScriptedAgent {
    fn new(outcomes: Vec<Result<AgentReply, AgentError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes),
            call_count: Mutex::new(0),
        }
    }

    fn reply(text: &str, thread_id: &str, candidates: &[&str]) -> Self {
        Self::new(vec![Ok(agent_reply(text, thread_id, candidates))])
    }

    fn calls(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl Agent for ScriptedAgent {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn send_message(
        &self,
        _text: &str,
        _thread_id: Option<&str>,
    ) -> Result<AgentReply, AgentError> {
        let mut count = self.call_count.lock().unwrap();
        let mut outcomes = self.outcomes.lock().unwrap();
        if outcomes.is_empty() {
            panic!("ScriptedAgent exhausted: call #{}", *count);
        }
        *count += 1;
        outcomes.remove(0)
    }
}

fn agent_reply(text: &str, thread_id: &str, candidates: &[&str]) -> AgentReply {
    AgentReply {
        reply: text.into(),
        thread_id: thread_id.into(),
        candidate_entity_names: candidates.iter().map(|c| c.to_string()).collect(),
    }
}

fn travel_catalog() -> Arc<Catalog> {
    Arc::new(
        Catalog::new(vec![
            CatalogEntry::new("s-02", "Deep Dream").with_company("Shinhan"),
            CatalogEntry::new("h-10", "Travel Card").with_company("Hyundai"),
        ])
        .unwrap(),
    )
}

fn create_op(text: &str) -> Value {
    json!({
        "type": "threads.create",
        "params": {"input": {"content": [{"type": "input_text", "text": text}]}}
    })
}

fn signals(rx: &mut tokio::sync::broadcast::Receiver<Arc<UiSignal>>) -> Vec<UiSignal> {
    let mut out = Vec::new();
    while let Ok(signal) = rx.try_recv() {
        out.push(signal.as_ref().clone());
    }
    out
}

fn sse_frames(body: &str) -> Vec<Value> {
    body.split("\n\n")
        .filter(|frame| !frame.is_empty())
        .map(|frame| {
            let data = frame.strip_prefix("data: ").expect("frame is a data line");
            serde_json::from_str(data).unwrap()
        })
        .collect()
}

async fn post(app: Router, body: Value) -> (StatusCode, String) {
    let req = Request::builder()
        .method("POST")
        .uri("/chatkit")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.stream.interval_ms = 0;
    config
}

// ── E2E: Router turn ─────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_travel_perks_turn() {
    let agent = Arc::new(ScriptedAgent::reply(
        "Try the Travel Card",
        "t1",
        &["Travel Card"],
    ));
    let router = OperationRouter::new(agent.clone(), travel_catalog())
        .with_stream_interval(Duration::ZERO);
    let mut rx = router.signals().subscribe();

    let body = serde_json::to_vec(&create_op("I want travel perks")).unwrap();
    let RouterResponse::Stream(turn) = router.handle(&body).await else {
        panic!("Expected a stream for threads.create");
    };
    let events = turn.into_events();

    let created = events
        .iter()
        .filter(|e| matches!(e, StreamEvent::ThreadCreated { .. }))
        .count();
    let user_done = events
        .iter()
        .filter(|e| e.event_type() == "thread.item.done")
        .count();
    let deltas: Vec<&str> = events.iter().filter_map(StreamEvent::delta).collect();

    assert_eq!(created, 1);
    assert_eq!(user_done, 2); // user item, then final assistant item
    assert_eq!(deltas, vec!["Try ", "the ", "Travel ", "Card"]);
    assert_eq!(
        signals(&mut rx).last(),
        Some(&UiSignal::EntityHighlighted {
            entity_id: Some("h-10".into())
        })
    );
    assert_eq!(agent.calls(), 1);
}

#[tokio::test]
async fn e2e_agent_failure_turn() {
    let agent = Arc::new(ScriptedAgent::new(vec![Err(AgentError::Status {
        status_code: 502,
        message: "bad gateway".into(),
    })]));
    let router =
        OperationRouter::new(agent, travel_catalog()).with_stream_interval(Duration::ZERO);
    let mut rx = router.signals().subscribe();

    let body = serde_json::to_vec(&create_op("hello")).unwrap();
    let RouterResponse::Stream(turn) = router.handle(&body).await else {
        panic!("Expected a stream for threads.create");
    };

    let thread = router.store().get(turn.thread_id()).await.unwrap();
    match &thread.items[1] {
        smartpick_core::thread::ThreadItem::AssistantMessage(m) => {
            assert_eq!(m.text(), AppConfig::default().replies.failure);
        }
        other => panic!("Expected assistant message, got {other:?}"),
    }
    assert_eq!(
        signals(&mut rx),
        vec![
            UiSignal::TurnStarted { thread_id: None },
            UiSignal::EntityHighlighted { entity_id: None },
        ]
    );
}

// ── E2E: Gateway over a real agent HTTP exchange ─────────────────────────

/// Serve a stand-in for the recommendation agent on an ephemeral port.
async fn spawn_agent_service() -> String {
    let app = Router::new().route(
        "/agent/chat",
        routing::post(|Json(body): Json<Value>| async move {
            let thread_id = body["thread_id"].as_str().unwrap_or("agent-t1").to_string();
            Json(json!({
                "thread_id": thread_id,
                "reply": "현대카드 Summit 카드를 추천드려요",
                "cards": [
                    {"card_name": "존재하지 않는 카드"},
                    {"card_name": "현대카드 Summit", "card_company": "Hyundai", "annual_fee": 20000}
                ]
            }))
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn e2e_gateway_conversation_over_http_agent() {
    let base = spawn_agent_service().await;
    let agent: Arc<dyn Agent> = Arc::new(HttpAgent::new(base, Duration::from_secs(5)).unwrap());
    let state = GatewayState::new(&test_config(), agent, Arc::new(Catalog::builtin()));
    let mut rx = state.signals.subscribe();

    // First turn creates the thread the agent names.
    let (status, body) = post(build_router(state.clone()), create_op("해외여행 카드")).await;
    assert_eq!(status, StatusCode::OK);
    let frames = sse_frames(&body);
    assert_eq!(frames[0]["type"], "thread.created");
    assert_eq!(frames[0]["thread"]["id"], "agent-t1");
    assert_eq!(
        signals(&mut rx).last(),
        Some(&UiSignal::EntityHighlighted {
            entity_id: Some("h-10".into())
        })
    );

    // Second turn continues it.
    let (_, body) = post(
        build_router(state.clone()),
        json!({
            "type": "threads.add_user_message",
            "params": {
                "thread_id": "agent-t1",
                "input": {"content": [{"type": "input_text", "text": "연회비는?"}]}
            }
        }),
    )
    .await;
    let frames = sse_frames(&body);
    assert!(frames.iter().all(|f| f["type"] != "thread.created"));

    // The thread holds both complete turns.
    let (status, body) = post(
        build_router(state.clone()),
        json!({"type": "threads.get_by_id", "params": {"thread_id": "agent-t1"}}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let thread: Value = serde_json::from_str(&body).unwrap();
    let items = thread["items"]["data"].as_array().unwrap();
    let kinds: Vec<&str> = items.iter().map(|i| i["type"].as_str().unwrap()).collect();
    assert_eq!(
        kinds,
        vec!["user_message", "assistant_message", "user_message", "assistant_message"]
    );
    assert_eq!(items[3]["content"][0]["text"], "현대카드 Summit 카드를 추천드려요");

    // Listing shows exactly one thread.
    let (_, body) = post(build_router(state), json!({"type": "threads.list"})).await;
    let list: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(list["data"].as_array().unwrap().len(), 1);
    assert_eq!(list["data"][0]["items"]["data"], json!([]));
}

#[tokio::test]
async fn e2e_unreachable_agent_still_completes_turn() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let agent: Arc<dyn Agent> =
        Arc::new(HttpAgent::new(format!("http://{addr}"), Duration::from_secs(2)).unwrap());
    let config = test_config();
    let state = GatewayState::new(&config, agent, Arc::new(Catalog::builtin()));

    let (status, body) = post(build_router(state), create_op("hi")).await;
    assert_eq!(status, StatusCode::OK);

    let frames = sse_frames(&body);
    let done = frames.last().unwrap();
    assert_eq!(done["type"], "thread.item.done");
    assert_eq!(done["item"]["content"][0]["text"], config.replies.failure);
}

// ── E2E: Carousel follows a turn ─────────────────────────────────────────

#[tokio::test]
async fn e2e_carousel_spins_then_settles_on_highlight() {
    let catalog = travel_catalog();
    let agent = Arc::new(ScriptedAgent::reply("Deep Dream it is", "t9", &["deep dream"]));
    let router =
        OperationRouter::new(agent, catalog.clone()).with_stream_interval(Duration::ZERO);
    let mut rx = router.signals().subscribe();

    let body = serde_json::to_vec(&create_op("cashback")).unwrap();
    router.handle(&body).await;

    let mut carousel = Carousel::from_catalog(&catalog);
    carousel.observe(100.0);
    let commands: Vec<RotationCommand> = signals(&mut rx)
        .iter()
        .filter_map(|signal| carousel.apply(signal))
        .collect();

    // Two slots of 180°: s-02 is slot 0, so from 100° the nearest rest is 0°.
    assert_eq!(
        commands,
        vec![
            RotationCommand::Spin {
                from: 100.0,
                to: -260.0,
                period_secs: 2.0
            },
            RotationCommand::SeekTo { angle: 0.0 },
        ]
    );
}
