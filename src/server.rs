//! Single-page web UI and JSON API.
//!
//! Each browser tab works against its own [`Session`], identified by a UUID
//! handed out by `POST /api/sessions`. Every session sits behind its own
//! async mutex, so the actions of one session run strictly one after the
//! other while different sessions do not block each other.
//!
//! Sessions unused for `server.session_idle_secs` are dropped: a lookup of
//! an expired id answers `404`, and creating a session sweeps out all
//! expired ones.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/` | Chat page |
//! | `GET`    | `/health` | Health check (returns version) |
//! | `POST`   | `/api/sessions` | Create a session |
//! | `GET`    | `/api/sessions/{id}` | Session state and transcript |
//! | `DELETE` | `/api/sessions/{id}` | Drop a session |
//! | `PUT`    | `/api/sessions/{id}/document?name=<file.pdf>` | Upload a PDF (raw body) |
//! | `POST`   | `/api/sessions/{id}/ask` | Ask a question: `{"question": "..."}` |
//! | `POST`   | `/api/sessions/{id}/clear` | Reset the session |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "no_document", "message": "no document has been indexed yet" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `no_document` (409),
//! `extraction_failed` (422), `service_unavailable` (502),
//! `malformed_response` (502), `internal` (500).

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::Config;
use crate::error::RagError;
use crate::models::{ChatMessage, ScoredChunk, UploadedFile};
use crate::pipeline::{Backends, DocumentStats};
use crate::session::{Session, SessionState, UploadOutcome};

const INDEX_HTML: &str = include_str!("static/index.html");

/// A stored session plus the time it was last looked up.
struct SessionSlot {
    session: Mutex<Session>,
    last_used_ms: AtomicI64,
}

impl SessionSlot {
    fn new(session: Session, now: DateTime<Utc>) -> Self {
        Self {
            session: Mutex::new(session),
            last_used_ms: AtomicI64::new(now.timestamp_millis()),
        }
    }

    fn touch(&self, now: DateTime<Utc>) {
        self.last_used_ms
            .store(now.timestamp_millis(), Ordering::Relaxed);
    }

    fn is_expired(&self, now: DateTime<Utc>, idle_timeout: Option<Duration>) -> bool {
        let Some(limit) = idle_timeout else {
            return false;
        };
        let idle_ms = now.timestamp_millis() - self.last_used_ms.load(Ordering::Relaxed);
        idle_ms >= limit.num_milliseconds()
    }
}

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    backends: Backends,
    sessions: Arc<RwLock<HashMap<Uuid, Arc<SessionSlot>>>>,
    idle_timeout: Option<Duration>,
}

impl AppState {
    pub fn new(config: Config, backends: Backends) -> Self {
        let idle_timeout = match config.server.session_idle_secs {
            0 => None,
            secs => Some(Duration::seconds(secs as i64)),
        };
        Self {
            config: Arc::new(config),
            backends,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
        }
    }

    /// Look up a live session and mark it as used. Expired sessions are
    /// removed and reported as not found.
    async fn session(&self, id: Uuid) -> Result<Arc<SessionSlot>, AppError> {
        let now = Utc::now();
        let slot = self
            .sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(format!("no session with id: {}", id)))?;

        if slot.is_expired(now, self.idle_timeout) {
            self.sessions.write().await.remove(&id);
            tracing::info!(session = %id, "session expired");
            return Err(not_found(format!("no session with id: {}", id)));
        }
        slot.touch(now);
        Ok(slot)
    }

    async fn evict_idle(&self, now: DateTime<Utc>) {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, slot| !slot.is_expired(now, self.idle_timeout));
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, remaining = sessions.len(), "expired sessions dropped");
        }
    }
}

/// Build the router; exposed so tests can serve it on an ephemeral port.
pub fn router(state: AppState) -> Router {
    let max_body = state.config.server.max_upload_mb * 1024 * 1024;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route("/api/sessions", post(handle_create_session))
        .route(
            "/api/sessions/{id}",
            get(handle_get_session).delete(handle_delete_session),
        )
        .route("/api/sessions/{id}/document", put(handle_upload))
        .route("/api/sessions/{id}/ask", post(handle_ask))
        .route("/api/sessions/{id}/clear", post(handle_clear))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the server with Ollama-backed embedding and generation.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let backends = Backends::ollama(config)?;
    run_server_with_backends(config, backends).await
}

/// Start the server with caller-supplied backends.
pub async fn run_server_with_backends(config: &Config, backends: Backends) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(AppState::new(config.clone(), backends));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(
        addr = %bind_addr,
        ollama = %config.ollama.url,
        "server listening"
    );
    println!("pdfrag listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

impl From<RagError> for AppError {
    fn from(err: RagError) -> Self {
        let status = match &err {
            RagError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RagError::ServiceUnavailable { .. } | RagError::MalformedResponse { .. } => {
                StatusCode::BAD_GATEWAY
            }
            RagError::NoDocument => StatusCode::CONFLICT,
            RagError::EmptyQuestion => StatusCode::BAD_REQUEST,
            RagError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
        } else {
            tracing::warn!(error = %err, "request rejected");
        }
        AppError {
            status,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

// ============ GET / and /health ============

async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ Sessions ============

#[derive(Serialize)]
struct SessionView {
    id: Uuid,
    state: SessionState,
    file: Option<String>,
    document: Option<DocumentStats>,
    transcript: Vec<ChatMessage>,
}

impl SessionView {
    fn of(id: Uuid, session: &Session) -> Self {
        Self {
            id,
            state: session.state(),
            file: session.current_file().map(str::to_string),
            document: session.document().cloned(),
            transcript: session.transcript().to_vec(),
        }
    }
}

async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionView>) {
    let now = Utc::now();
    state.evict_idle(now).await;

    let id = Uuid::new_v4();
    let session = Session::new(state.config.clone(), state.backends.clone());
    let view = SessionView::of(id, &session);
    state
        .sessions
        .write()
        .await
        .insert(id, Arc::new(SessionSlot::new(session, now)));
    tracing::info!(session = %id, "session created");
    (StatusCode::CREATED, Json(view))
}

async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let slot = state.session(id).await?;
    let session = slot.session.lock().await;
    Ok(Json(SessionView::of(id, &session)))
}

async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .sessions
        .write()
        .await
        .remove(&id)
        .ok_or_else(|| not_found(format!("no session with id: {}", id)))?;
    tracing::info!(session = %id, "session dropped");
    Ok(StatusCode::NO_CONTENT)
}

// ============ PUT /api/sessions/{id}/document ============

#[derive(Deserialize)]
struct UploadParams {
    name: String,
}

async fn handle_upload(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<Json<UploadOutcome>, AppError> {
    let slot = state.session(id).await?;

    let name = params.name.trim();
    if name.is_empty() {
        return Err(bad_request("name must not be empty"));
    }
    if !name.to_ascii_lowercase().ends_with(".pdf") {
        return Err(bad_request(format!(
            "only PDF files are accepted, got: {}",
            name
        )));
    }
    if body.is_empty() {
        return Err(bad_request("uploaded file is empty"));
    }

    let mut session = slot.session.lock().await;
    let outcome = session
        .upload(UploadedFile::new(name, body.to_vec()))
        .await?;
    Ok(Json(outcome))
}

// ============ POST /api/sessions/{id}/ask ============

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
    sources: Vec<ScoredChunk>,
}

async fn handle_ask(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    let slot = state.session(id).await?;
    let mut session = slot.session.lock().await;
    let answer = session.ask(&req.question).await?;
    Ok(Json(AskResponse {
        answer: answer.text,
        sources: answer.sources,
    }))
}

// ============ POST /api/sessions/{id}/clear ============

async fn handle_clear(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let slot = state.session(id).await?;
    let mut session = slot.session.lock().await;
    session.clear();
    Ok(Json(SessionView::of(id, &session)))
}
