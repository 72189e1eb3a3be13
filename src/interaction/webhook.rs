//! HTTP surface for Slack Events API deliveries.

use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use tracing::{Instrument, debug, instrument, warn};

use crate::base::{config::Config, types::InboundEvent};

use super::{dispatcher::EventDispatcher, signature};

const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
const SIGNATURE_HEADER: &str = "x-slack-signature";

#[derive(Clone)]
struct WebhookState {
    dispatcher: EventDispatcher,
    signing_secret: Option<Arc<str>>,
}

/// Build the router: `POST <events_path>` for deliveries and `GET /health`.
pub fn router(config: &Config, dispatcher: EventDispatcher) -> Router {
    let state = WebhookState {
        dispatcher,
        signing_secret: config.slack_signing_secret.as_deref().map(Arc::from),
    };

    Router::new().route(&config.events_path, post(handle_events)).route("/health", get(health)).with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

#[instrument(skip_all)]
async fn handle_events(State(state): State<WebhookState>, headers: HeaderMap, body: Bytes) -> Response {
    if let Some(secret) = &state.signing_secret {
        let timestamp = header_str(&headers, TIMESTAMP_HEADER);
        let signature = header_str(&headers, SIGNATURE_HEADER);

        if let Err(err) = signature::verify(secret, timestamp, &body, signature, Utc::now().timestamp()) {
            warn!("Rejected event delivery: {}", err);
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    let event = match InboundEvent::parse(&body) {
        Ok(event) => event,
        Err(err) => {
            warn!("Rejected event delivery: {:#}", err);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    // Slack expects an acknowledgement within a few seconds, so callbacks are handled off the request.
    if let InboundEvent::EventCallback { .. } = event {
        handle_event_callback(state.dispatcher.clone(), event);
        return StatusCode::OK.into_response();
    }

    let outcome = state.dispatcher.dispatch(event).await;

    match outcome.response_body() {
        Some(body) => ([(CONTENT_TYPE, "text/plain")], body.to_string()).into_response(),
        None => StatusCode::OK.into_response(),
    }
}

/// Dispatch an event callback on a background task.
#[instrument(skip_all)]
pub fn handle_event_callback(dispatcher: EventDispatcher, event: InboundEvent) {
    tokio::spawn(
        async move {
            let outcome = dispatcher.dispatch(event).await;
            debug!("Dispatch finished: {:?}", outcome);
        }
        .in_current_span(),
    );
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or_default()
}

// Tests.
