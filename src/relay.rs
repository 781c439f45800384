use std::net::SocketAddr;
use std::path::PathBuf;

use axum::Json;
use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderName, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use eyre::{Result, WrapErr};
use log::{debug, error, info};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};

use crate::coze::CHAT_PATH;

/// Relay launch options
#[derive(Debug, Clone)]
pub struct RelayOptions {
    pub host: String,
    pub port: u16,
    pub api_base: String,
    pub api_key: String,
    pub static_dir: Option<PathBuf>,
}

/// Shared state for the proxy handler
#[derive(Clone)]
pub struct RelayState {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl RelayState {
    pub fn new(api_base: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base,
            api_key,
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

/// Run the relay until the process is stopped
pub async fn run_relay(options: RelayOptions) -> Result<()> {
    let state = RelayState::new(options.api_base.clone(), options.api_key.clone());
    let app = build_router(state, options.static_dir.clone());

    let addr: SocketAddr = format!("{}:{}", options.host, options.port)
        .parse()
        .wrap_err_with(|| format!("invalid bind address {}:{}", options.host, options.port))?;
    let listener = TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("failed to bind {addr}"))?;

    info!("Relay listening on http://{addr}");
    if let Some(dir) = &options.static_dir {
        info!("Serving frontend from {}", dir.display());
    }

    axum::serve(listener, app).await.wrap_err("relay server error")
}

/// Assemble routes, the permissive CORS policy and the optional static
/// frontend
pub fn build_router(state: RelayState, static_dir: Option<PathBuf>) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .route("/api/coze", post(proxy_chat))
        .with_state(state);

    if let Some(dir) = static_dir {
        // Unknown paths serve index.html (status 200, not 404) so the
        // frontend router can handle them
        let frontend = ServeDir::new(&dir).fallback(ServeFile::new(dir.join("index.html")));
        router = router.fallback_service(frontend);
    }

    router.layer(cors_layer())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "dcx-relay",
    })
}

/// Forward one chat request upstream with the credential injected,
/// streaming the reply back verbatim
async fn proxy_chat(State(state): State<RelayState>, body: Bytes) -> Response {
    // Validation happens on a parsed copy; the forwarded bytes stay untouched
    let parsed: Option<Value> = serde_json::from_slice(&body).ok();
    let bot_id = parsed
        .as_ref()
        .and_then(|value| value.get("bot_id"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    if bot_id.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "missing required parameter: bot_id", None);
    }

    let url = format!("{}{}", state.api_base.trim_end_matches('/'), CHAT_PATH);
    debug!("Proxying chat request for bot {bot_id} to {url}");

    let upstream = match state
        .client
        .post(&url)
        .header(header::AUTHORIZATION, format!("Bearer {}", state.api_key))
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await
    {
        Ok(resp) => resp,
        Err(e) => {
            error!("Proxy request failed: {e}");
            return error_response(
                StatusCode::BAD_GATEWAY,
                "proxy request failed",
                Some(e.to_string()),
            );
        }
    };

    let status = upstream.status();
    debug!("Upstream responded {status}");

    let mut response = Response::builder().status(status);
    for (name, value) in upstream.headers() {
        if !is_hop_by_hop(name) {
            response = response.header(name.clone(), value.clone());
        }
    }
    match response.body(Body::from_stream(upstream.bytes_stream())) {
        Ok(resp) => resp,
        Err(e) => {
            error!("Failed to assemble proxy response: {e}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to assemble proxy response",
                Some(e.to_string()),
            )
        }
    }
}

/// Headers that describe the hop rather than the payload; re-streaming the
/// body invalidates them
fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
            | "content-length"
    )
}

fn error_response(status: StatusCode, error: &str, message: Option<String>) -> Response {
    let mut body = json!({ "error": error });
    if let Some(message) = message {
        body["message"] = json!(message);
    }
    (status, Json(body)).into_response()
}

/// The permissive policy the web frontend expects
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::CONTENT_LENGTH,
            header::DATE,
            HeaderName::from_static("x-csrf-token"),
            HeaderName::from_static("x-requested-with"),
            HeaderName::from_static("x-api-version"),
            HeaderName::from_static("accept-version"),
            HeaderName::from_static("content-md5"),
        ])
}
