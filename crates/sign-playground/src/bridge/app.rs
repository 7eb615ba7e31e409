//! The page relaying requests to the injected provider.

use serde_json::Value;

const INDEX_HTML: &str = include_str!("assets/index.html");

const PROVIDER_GLOBAL_PLACEHOLDER: &str = "__PROVIDER_GLOBAL__";
const SESSION_TOKEN_PLACEHOLDER: &str = "__SESSION_TOKEN__";

/// Renders the page for the given provider global and session token.
///
/// Both values are inserted as JSON string literals.
pub(crate) fn render_index(provider_global: &str, session_token: &str) -> String {
    let literal = |value: &str| Value::String(value.to_string()).to_string();
    INDEX_HTML
        .replace(PROVIDER_GLOBAL_PLACEHOLDER, &literal(provider_global))
        .replace(SESSION_TOKEN_PLACEHOLDER, &literal(session_token))
}
