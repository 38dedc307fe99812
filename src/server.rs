use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    Json, Router,
    body::Body,
    extract::{DefaultBodyLimit, Path, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::chat::{ChatBackend, ChatError, Submission, WidgetSnapshot};
use crate::config::AppConfig;
use crate::contact::{ContactForm, ContactRelay};
use crate::content::Profile;
use crate::events::sse_event;
use crate::llm::ChatCompletionsDriver;
use crate::pages::render_index;
use crate::rate_limit::{SimpleRateLimiter, rate_limit_middleware};
use crate::session::{SessionStore, WidgetTemplate};

/// How often idle chat sessions are swept.
const REAPER_INTERVAL: Duration = Duration::from_secs(60);

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Build application state from configuration.
///
/// Without an API key the chat widget still renders, but every submission
/// is refused with a configuration error.
pub fn build_state(config: Arc<AppConfig>) -> anyhow::Result<AppState> {
    let http = reqwest::Client::new();
    let backend = match config.llm_settings() {
        Some(settings) => {
            info!(
                name: "llm.config.loaded",
                base_url = %settings.base_url,
                model = %settings.model,
                provider = ?settings.provider,
                "LLM configuration loaded"
            );
            ChatBackend::Configured(Arc::new(ChatCompletionsDriver::with_client(
                http.clone(),
                settings,
            )))
        }
        None => {
            tracing::error!(
                name: "llm.config.missing",
                "No completion API key configured; chat submissions will be refused"
            );
            ChatBackend::Unconfigured
        }
    };
    assemble_state(config, backend, http)
}

/// Build application state around an existing chat backend.
pub fn build_state_with_backend(
    config: Arc<AppConfig>,
    backend: ChatBackend,
) -> anyhow::Result<AppState> {
    assemble_state(config, backend, reqwest::Client::new())
}

/// Outbound calls share `http` and its connection pool.
fn assemble_state(
    config: Arc<AppConfig>,
    backend: ChatBackend,
    http: reqwest::Client,
) -> anyhow::Result<AppState> {
    let profile = Profile::load(config.profile_path().as_deref())
        .context("Failed to load portfolio profile")?;

    let sessions = SessionStore::new(WidgetTemplate {
        backend,
        system_prompt: Arc::from(profile.assistant.system_prompt.as_str()),
        greeting: Arc::from(profile.assistant.greeting.as_str()),
    });

    let contact = match config
        .contact
        .recipient
        .as_deref()
        .filter(|r| !r.trim().is_empty())
    {
        Some(recipient) => {
            let relay = ContactRelay::new(
                http,
                &config.contact.relay_base_url,
                recipient.trim(),
            )
            .context("Invalid contact relay configuration")?;
            info!(name: "contact.config.loaded", endpoint = %relay.endpoint(), "Contact relay configured");
            Some(Arc::new(relay))
        }
        None => {
            tracing::warn!(name: "contact.config.missing", "No contact recipient configured; contact form disabled");
            None
        }
    };

    let rate_limiter = Arc::new(SimpleRateLimiter::new(
        config.resilience.requests_per_second,
        config.resilience.burst_size,
    ));

    Ok(AppState {
        sessions,
        profile: Arc::new(profile),
        contact,
        rate_limiter,
        config,
    })
}

/// Build the router for `state`.
pub fn router(state: AppState) -> Router {
    let rate_limit = middleware::from_fn_with_state(state.clone(), rate_limit_middleware);
    let timeout = state.config.request_timeout();

    // Chat replies stream for as long as the upstream takes, so they sit
    // outside the request timeout.
    let streaming = Router::new()
        .route("/api/chat/sessions/{id}/messages", post(api_post_message))
        .route_layer(rate_limit.clone());

    let contact = Router::new()
        .route("/api/contact", post(api_contact))
        .route_layer(rate_limit);

    let timed = Router::new()
        .route("/", get(index_handler))
        .route("/healthz", get(healthz))
        .route("/api/portfolio", get(api_portfolio))
        .route("/api/chat/sessions", post(api_create_session))
        .route(
            "/api/chat/sessions/{id}",
            get(api_get_session).delete(api_delete_session),
        )
        .route("/api/chat/sessions/{id}/toggle", post(api_toggle_session))
        .merge(contact)
        .layer(middleware::from_fn(move |req: Request, next: Next| async move {
            match tokio::time::timeout(timeout, next.run(req)).await {
                Ok(res) => res,
                Err(_) => (StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response(),
            }
        }));

    Router::new()
        .merge(timed)
        .merge(streaming)
        .nest_service("/static", ServeDir::new(&state.config.server.static_dir))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let state = build_state(Arc::clone(&config))?;

    let reaper = state
        .sessions
        .spawn_reaper(REAPER_INTERVAL, config.session_idle_timeout());

    let app = router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!(name: "server.stopping", "Server shutting down");
        })
        .await?;

    reaper.abort();
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Pages
// ─────────────────────────────────────────────────────────────────────────────

/// GET / - The portfolio page.
async fn index_handler(State(state): State<AppState>) -> Html<String> {
    Html(render_index(&state.profile, state.contact.is_some()))
}

/// GET /healthz - Liveness probe.
async fn healthz() -> &'static str {
    "ok"
}

/// GET /api/portfolio - Profile data without the assistant instruction.
async fn api_portfolio(State(state): State<AppState>) -> Json<Profile> {
    Json(state.profile.as_ref().clone())
}

// ─────────────────────────────────────────────────────────────────────────────
// Chat API
// ─────────────────────────────────────────────────────────────────────────────

/// Response from session creation.
#[derive(Debug, Serialize)]
struct SessionCreated {
    session_id: String,
    snapshot: WidgetSnapshot,
}

/// Request body for a chat submission.
#[derive(Debug, Deserialize)]
struct MessageRequest {
    #[serde(default)]
    message: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

fn session_not_found(id: &str) -> Response {
    tracing::debug!(name: "chat.session.not_found", session_id = %id, "Session not found");
    error_response(StatusCode::NOT_FOUND, "Session not found")
}

/// POST /api/chat/sessions - Create a widget for a page load.
async fn api_create_session(State(state): State<AppState>) -> Response {
    let session = state.sessions.create();
    info!(
        name: "chat.session.created",
        session_id = %session.id(),
        active = state.sessions.len(),
        "Chat session created"
    );
    (
        StatusCode::CREATED,
        Json(SessionCreated {
            session_id: session.id().to_string(),
            snapshot: session.widget().snapshot(),
        }),
    )
        .into_response()
}

/// GET /api/chat/sessions/:id - Current widget snapshot.
async fn api_get_session(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.sessions.get(&id) {
        Some(session) => Json(session.widget().snapshot()).into_response(),
        None => session_not_found(&id),
    }
}

/// DELETE /api/chat/sessions/:id - Discard a widget.
async fn api_delete_session(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    match state.sessions.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

/// POST /api/chat/sessions/:id/toggle - Open or close the chat window.
async fn api_toggle_session(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(session) = state.sessions.get(&id) else {
        return session_not_found(&id);
    };
    let widget = session.widget();
    widget.toggle();
    Json(widget.snapshot()).into_response()
}

/// POST /api/chat/sessions/:id/messages - Submit text and stream the reply.
async fn api_post_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> Response {
    let Some(session) = state.sessions.get(&id) else {
        return session_not_found(&id);
    };

    match session.widget().submit(&req.message) {
        Ok(Submission::Ignored) => StatusCode::NO_CONTENT.into_response(),
        Ok(Submission::Started(events)) => {
            tracing::debug!(name: "chat.stream.opened", session_id = %id, "Streaming chat reply");
            let body = events.map(|evt| Ok::<_, Infallible>(sse_event(&evt)));
            build_sse_response(Body::from_stream(body))
        }
        Err(e @ ChatError::Busy) => error_response(StatusCode::CONFLICT, e.to_string()),
        Err(e @ ChatError::NotConfigured) => {
            error_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
    }
}

fn build_sse_response(body: Body) -> Response {
    let mut resp = Response::new(body);
    let h = resp.headers_mut();
    h.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    h.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    h.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    h.insert("X-Accel-Buffering", HeaderValue::from_static("no"));
    resp
}

// ─────────────────────────────────────────────────────────────────────────────
// Contact API
// ─────────────────────────────────────────────────────────────────────────────

/// POST /api/contact - Relay a contact form submission.
async fn api_contact(State(state): State<AppState>, Json(form): Json<ContactForm>) -> Response {
    let Some(relay) = &state.contact else {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Contact form is not configured.",
        );
    };

    match relay.send(form).await {
        Ok(()) => Json(serde_json::json!({ "message": "Message sent successfully" })).into_response(),
        Err(e) if e.is_validation() => error_response(StatusCode::BAD_REQUEST, e.to_string()),
        Err(e) => {
            tracing::error!(name: "contact.failed", error = ?e, "Contact relay failed");
            error_response(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}
