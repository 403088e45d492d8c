//! HTTP endpoint for the metrics exposition
//!
//! Serves `GET /metrics` (optionally behind basic auth) and a public
//! `GET /health`. Rendering reads the registry's committed state only, so
//! scrape requests never wait on an in-flight device query.

use axum::Router;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::error;

use crate::config::AuthConfig;
use crate::metrics::PeerMetrics;

/// Realm announced in the basic-auth challenge
const AUTH_REALM: &str = "WireGuard Exporter";

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    metrics: PeerMetrics,
    auth: AuthConfig,
}

/// Build the exporter's router
///
/// `/metrics` is wrapped in basic auth when credentials are configured;
/// `/health` is always public.
pub fn build_router(metrics: PeerMetrics, auth: AuthConfig) -> Router {
    let state = AppState { metrics, auth };

    let mut metrics_routes = Router::new().route("/metrics", get(serve_metrics));
    if state.auth.is_enabled() {
        metrics_routes = metrics_routes.layer(middleware::from_fn_with_state(
            state.clone(),
            require_basic_auth,
        ));
    }

    Router::new()
        .route("/health", get(serve_health))
        .merge(metrics_routes)
        .with_state(state)
}

async fn serve_health() -> &'static str {
    "ok"
}

async fn serve_metrics(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "failed to render metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to render metrics\n",
            )
                .into_response()
        }
    }
}

/// Reject requests whose `Authorization` header does not carry the
/// configured credentials
async fn require_basic_auth(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if let Some((username, password)) = state.auth.credentials() {
        if is_authorized(&request, username, password) {
            return next.run(request).await;
        }
    }
    unauthorized()
}

fn is_authorized(request: &Request<Body>, username: &str, password: &str) -> bool {
    let Some(header_value) = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    let Some(encoded) = header_value.strip_prefix("Basic ") else {
        return false;
    };
    let Ok(decoded) = BASE64.decode(encoded.trim()) else {
        return false;
    };
    let Ok(decoded) = String::from_utf8(decoded) else {
        return false;
    };
    let Some((user, pass)) = decoded.split_once(':') else {
        return false;
    };

    // Both halves are always compared so a wrong username costs the same
    // time as a wrong password.
    let user_ok = constant_time_eq(user.as_bytes(), username.as_bytes());
    let pass_ok = constant_time_eq(pass.as_bytes(), password.as_bytes());
    user_ok && pass_ok
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(
            header::WWW_AUTHENTICATE,
            format!("Basic realm=\"{}\"", AUTH_REALM),
        )],
        "Unauthorized\n",
    )
        .into_response()
}

/// Compare two byte strings without short-circuiting on the first mismatch
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
