use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};

use crate::bridge::{handlers, state::BridgeState};

/// Header carrying the session token on API calls.
pub const SESSION_TOKEN_HEADER: &str = "X-Session-Token";

pub(crate) fn build_router(state: Arc<BridgeState>) -> Router {
    let api = Router::new()
        .route("/request", get(handlers::get_next_request))
        .route("/response", post(handlers::post_response))
        .route("/event", post(handlers::post_event))
        .route("/provider", post(handlers::post_provider_status))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session_token))
        .with_state(state.clone());

    Router::new().route("/", get(handlers::serve_index)).nest("/api", api).with_state(state)
}

async fn require_session_token(
    State(state): State<Arc<BridgeState>>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let expected = state.session_token();
    let ok = req
        .headers()
        .get(SESSION_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected.as_str());

    if !ok {
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(req).await)
}
