//! HTTP endpoints: the exchange handler plus read-only state surfaces.
//!
//! - `POST /exchange`: signed registration, answered with our snapshot
//! - `GET /state`: current snapshot for polling clients
//! - `GET /events`: server-sent events, one per membership change
//!
//! The `/api/*` aliases keep older dashboards working.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::Stream;
use mesh_core::{
    Membership, PeerRecord, RegistrySnapshot, Signature, Subscription, EXCHANGE_PATH,
    SIGNATURE_HEADER,
};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Buffered snapshots per event-stream client before it starts lagging.
const EVENT_BUFFER: usize = 64;

/// Shared application state
pub struct AppState {
    pub membership: Arc<Membership>,
    events: broadcast::Sender<RegistrySnapshot>,
    _subscription: Subscription,
}

impl AppState {
    /// Subscribe once to the engine and fan snapshots out to stream clients.
    pub fn new(membership: Arc<Membership>) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let tx = events.clone();
        let subscription = membership.subscribe(move |snapshot| {
            // No receivers is fine
            let _ = tx.send(snapshot.clone());
        });
        Arc::new(Self {
            membership,
            events,
            _subscription: subscription,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(EXCHANGE_PATH, post(exchange))
        .route("/api/connect", post(exchange))
        .route("/state", get(current_state))
        .route("/api/state", get(current_state))
        .route("/events", get(events))
        .route("/api/sse", get(events))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn exchange(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(record): Json<PeerRecord>,
) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(Signature::from)
        .unwrap_or_else(|| Signature::from(""));

    match state.membership.register(&signature, record) {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn current_state(State(state): State<Arc<AppState>>) -> Json<RegistrySnapshot> {
    Json(state.membership.snapshot())
}

async fn events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let rx = state.events.subscribe();
    let stream = futures::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(snapshot) => return Some((Event::default().json_data(&snapshot), rx)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("Event stream lagged, skipped {} snapshot(s)", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}
