use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, header},
    response::{Html, IntoResponse},
};

use crate::{
    bridge::{
        app::render_index,
        state::BridgeState,
        types::{BridgeApiResponse, BridgeRequest, BridgeResponse, ProviderStatus},
    },
    provider::ProviderEvent,
};

pub(crate) async fn serve_index(State(state): State<Arc<BridgeState>>) -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    (headers, Html(render_index(state.provider_global(), &state.session_token())))
}

pub(crate) async fn get_next_request(
    State(state): State<Arc<BridgeState>>,
) -> Json<BridgeApiResponse<BridgeRequest>> {
    match state.take_next_request() {
        Some(request) => {
            debug!(target: "bridge", id = %request.id, method = %request.method, "request taken");
            Json(BridgeApiResponse::Ok(request))
        }
        None => Json(BridgeApiResponse::error("No pending request")),
    }
}

pub(crate) async fn post_response(
    State(state): State<Arc<BridgeState>>,
    Json(response): Json<BridgeResponse>,
) -> Json<BridgeApiResponse<()>> {
    let id = response.id;
    if !state.has_request(&id) {
        return Json(BridgeApiResponse::error("Unknown request id"));
    }
    if !state.add_response(response) {
        debug!(target: "bridge", %id, "caller stopped waiting");
    }
    Json(BridgeApiResponse::Ok(()))
}

pub(crate) async fn post_event(
    State(state): State<Arc<BridgeState>>,
    Json(event): Json<ProviderEvent>,
) -> Json<BridgeApiResponse<()>> {
    debug!(target: "bridge", ?event, "provider event");
    state.publish_event(event);
    Json(BridgeApiResponse::Ok(()))
}

pub(crate) async fn post_provider_status(
    State(state): State<Arc<BridgeState>>,
    Json(status): Json<ProviderStatus>,
) -> Json<BridgeApiResponse<()>> {
    info!(target: "bridge", available = status.available, global = ?status.global, "page loaded");
    state.set_provider_status(status);
    Json(BridgeApiResponse::Ok(()))
}
