//! Gateway endpoints.
//!
//! - `POST /chatkit`          — Chat widget operation (JSON or SSE response)
//! - `GET  /signals`          — SSE feed of UI signals
//! - `GET  /catalog`          — Card catalog in carousel order
//! - `POST /carousel/target`  — Rotation command for a highlighted card

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::sse::{Event as SseEvent, KeepAlive, Sse},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

use smartpick_chatkit::RouterResponse;
use smartpick_core::catalog::{CatalogEntry, EntityId};
use smartpick_core::rotation::{CarouselMode, RotationCommand};

use crate::SharedState;

/// `POST /chatkit`: one widget operation.
///
/// Streaming operations answer with `text/event-stream` frames of the form
/// `data: <event json>`; everything else is a JSON body.
pub async fn chatkit_handler(State(state): State<SharedState>, body: Bytes) -> Response {
    match state.router.handle(&body).await {
        RouterResponse::Json { status, body } => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::OK);
            (status, Json(body)).into_response()
        }
        RouterResponse::Stream(turn) => {
            debug!(thread_id = %turn.thread_id(), events = turn.events().len(), "Streaming turn");
            let stream = turn
                .into_stream()
                .map(|event| SseEvent::default().json_data(&event));
            Sse::new(stream).into_response()
        }
    }
}

/// `GET /signals`: SSE stream of UI signals (`turn_started`, `entity_highlighted`).
pub async fn signals_handler(
    State(state): State<SharedState>,
) -> Sse<impl futures::Stream<Item = Result<SseEvent, axum::Error>>> {
    let rx = state.signals.subscribe();
    let stream = BroadcastStream::new(rx)
        .filter_map(|result| match result {
            Ok(signal) => Some(signal),
            Err(e) => {
                warn!(error = %e, "Signal subscriber lagged");
                None
            }
        })
        .map(|signal| {
            SseEvent::default()
                .event(signal.event_type())
                .json_data(signal.as_ref())
        });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[derive(Serialize)]
pub struct CatalogResponse<'a> {
    pub count: usize,
    pub angle_per_slot: f64,
    pub cards: &'a [CatalogEntry],
}

/// `GET /catalog`
pub async fn catalog_handler(State(state): State<SharedState>) -> Response {
    let angle_per_slot = state.carousel.lock().await.angle_per_slot();
    Json(CatalogResponse {
        count: state.catalog.len(),
        angle_per_slot,
        cards: state.catalog.entries(),
    })
    .into_response()
}

#[derive(Debug, Deserialize)]
pub struct TargetRequest {
    /// Angle the renderer last reported.
    pub current_angle: f64,
    /// Card to settle on; `null` stops the carousel.
    #[serde(default)]
    pub entity_id: Option<EntityId>,
}

#[derive(Debug, Serialize)]
pub struct TargetResponse {
    /// `null` when the card is not on the carousel.
    pub command: Option<RotationCommand>,
    #[serde(flatten)]
    pub mode: CarouselMode,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    error: String,
}

/// `POST /carousel/target`
pub async fn carousel_target_handler(
    State(state): State<SharedState>,
    Json(req): Json<TargetRequest>,
) -> Result<Json<TargetResponse>, (StatusCode, Json<ErrorResponse>)> {
    if !req.current_angle.is_finite() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "current_angle must be a finite number".into(),
            }),
        ));
    }

    let mut carousel = state.carousel.lock().await;
    carousel.observe(req.current_angle);
    let command = carousel.highlight(req.entity_id.as_deref());
    if command.is_none() {
        debug!(entity_id = ?req.entity_id, "Card not on carousel, holding");
    }

    Ok(Json(TargetResponse {
        command,
        mode: carousel.mode().clone(),
    }))
}
