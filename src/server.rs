use axum::{
    Form, Json, Router,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::config::{ApiKey, AppConfig};
use crate::error::GameError;
use crate::generator::{CONFIRMATION, Mode};
use crate::llm::ClientCache;
use crate::session::{GameSession, SharedSession, Turn};
use crate::ui::PageView;

/// Request bodies carry a prompt and a session id; a generous cap.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Isolates generated games from the app's origin, even when opened directly.
const GAME_CSP: &str = "sandbox allow-scripts allow-modals";

/// Start the Axum server with the provided configuration.
///
/// Without an API key the server still starts, but only shows the
/// configuration error.
pub async fn start_server(config: AppConfig, api_key: Option<ApiKey>) -> anyhow::Result<()> {
    let clients = match api_key {
        Some(key) => {
            info!(
                name: "llm.config.loaded",
                base_url = %config.llm.base_url,
                model = %config.llm.model,
                models = config.llm.models.len(),
                "LLM configuration loaded"
            );
            Some(ClientCache::new(config.llm.base_url.clone(), key))
        }
        None => {
            tracing::warn!(
                name: "llm.config.api_key_missing",
                key_name = %config.secrets.api_key_name,
                secrets_file = %config.secrets.file,
                "API key not configured; game generation disabled"
            );
            None
        }
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, clients)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // HTML pages
        .route("/", get(index_page))
        .route("/generate", post(generate_form))
        .route("/sessions/{id}/game", get(game_view))
        .route("/sessions/{id}/game/download", get(game_download))
        // API routes
        .route("/api/generate", post(api_generate))
        .route("/api/sessions", post(api_create_session))
        .route("/api/sessions/{id}/messages", get(api_get_messages))
        .route("/api/models", get(api_get_models))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Page Handlers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PageQuery {
    #[serde(default)]
    session: Option<String>,
}

/// Form posted by the page.
#[derive(Debug, Deserialize)]
struct GenerateForm {
    /// Absent until the first submission creates the session.
    #[serde(default)]
    session_id: Option<String>,
    message: String,
    #[serde(default)]
    model: Option<String>,
}

/// GET / - Render the page. Never creates a session.
async fn index_page(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Response, GameError> {
    if state.generator.is_none() {
        return render_config_missing(&state, StatusCode::OK);
    }

    let Some(session) = query.session.as_deref().and_then(|id| state.sessions.get(id)) else {
        return render_without_session(&state, None, StatusCode::OK);
    };

    let guard = session.lock().await;
    render_page(&state, &guard, None, StatusCode::OK)
}

/// POST /generate - Submit from the page form.
///
/// The first submission creates the session. Success redirects to the
/// session's page; failures re-render it with the error.
async fn generate_form(
    State(state): State<AppState>,
    Form(form): Form<GenerateForm>,
) -> Result<Response, GameError> {
    let Some(generator) = &state.generator else {
        return render_config_missing(&state, StatusCode::SERVICE_UNAVAILABLE);
    };

    let existing = form
        .session_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .and_then(|id| state.sessions.get(id));
    let session = match existing {
        Some(session) => session,
        None => {
            if form.message.trim().is_empty() {
                let e = GameError::EmptyInput;
                return render_without_session(&state, Some(e.to_string()), e.status());
            }
            let model = state.config.llm.resolve_model(form.model.as_deref());
            let (id, session) = state.sessions.create(model);
            tracing::debug!(session_id = %id, "Created new session");
            session
        }
    };

    let mut guard = session.lock().await;
    select_model(&state.config, &mut guard, form.model.as_deref());

    match generator.submit(&mut guard, &form.message).await {
        Ok(_) => Ok(Redirect::to(&page_url(guard.id())).into_response()),
        Err(e) => {
            let status = e.status();
            render_page(&state, &guard, Some(e.to_string()), status)
        }
    }
}

/// GET /sessions/:id/game - The current game, as loaded by the viewer.
async fn game_view(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, GameError> {
    let session = find_session(&state, &id)?;
    let guard = session.lock().await;
    if !guard.artifact().is_valid() {
        return Err(GameError::NoGame(id));
    }
    Ok((
        [(header::CONTENT_SECURITY_POLICY, GAME_CSP)],
        Html(guard.artifact().as_str().to_string()),
    )
        .into_response())
}

/// GET /sessions/:id/game/download - The current game as a file.
async fn game_download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, GameError> {
    let session = find_session(&state, &id)?;
    let guard = session.lock().await;
    if !guard.artifact().is_valid() {
        return Err(GameError::NoGame(id));
    }

    let disposition = format!(
        "attachment; filename=\"{}\"",
        state.config.game.download_file_name
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        guard.artifact().as_str().to_string(),
    )
        .into_response())
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for the generate API.
#[derive(Debug, Deserialize)]
struct GenerateRequest {
    /// Game idea or improvement request.
    message: String,
    /// Session to continue (creates new if not provided).
    #[serde(default)]
    session_id: Option<String>,
    /// Model to use from now on in this session.
    #[serde(default)]
    model: Option<String>,
}

/// Response from the generate API.
#[derive(Debug, Serialize)]
struct GenerateResponse {
    session_id: String,
    mode: Mode,
    message: &'static str,
    game_url: String,
    download_url: String,
}

#[derive(Debug, Serialize)]
struct SessionCreated {
    session_id: String,
}

#[derive(Debug, Serialize)]
struct ModelsResponse {
    default: String,
    models: Vec<String>,
}

/// POST /api/generate - Submit a prompt and return where to find the game.
async fn api_generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, GameError> {
    let generator = state.generator.as_ref().ok_or_else(|| state.config_missing())?;

    tracing::info!(
        message_length = req.message.len(),
        session_id = ?req.session_id,
        "Received generate request"
    );

    let (session_id, session) = match req.session_id.filter(|id| !id.is_empty()) {
        Some(id) => {
            let session = find_session(&state, &id)?;
            (id, session)
        }
        None if req.message.trim().is_empty() => return Err(GameError::EmptyInput),
        None => state
            .sessions
            .create(state.config.llm.resolve_model(req.model.as_deref())),
    };

    let mut guard = session.lock().await;
    select_model(&state.config, &mut guard, req.model.as_deref());
    let outcome = generator.submit(&mut guard, &req.message).await?;

    Ok(Json(GenerateResponse {
        game_url: format!("/sessions/{session_id}/game"),
        download_url: format!("/sessions/{session_id}/game/download"),
        session_id,
        mode: outcome.mode,
        message: CONFIRMATION,
    }))
}

/// POST /api/sessions - Create an empty session.
async fn api_create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionCreated>), GameError> {
    if state.generator.is_none() {
        return Err(state.config_missing());
    }
    let (session_id, _) = state.sessions.create(&state.config.llm.model);
    Ok((StatusCode::CREATED, Json(SessionCreated { session_id })))
}

/// GET /api/sessions/:id/messages - Get the conversation.
async fn api_get_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Turn>>, GameError> {
    let session = find_session(&state, &id)?;
    let turns = session.lock().await.turns().to_vec();
    Ok(Json(turns))
}

/// GET /api/models - Models offered by the selector.
async fn api_get_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        default: state.config.llm.model.clone(),
        models: state.config.llm.models.clone(),
    })
}

async fn health() -> &'static str {
    "ok"
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn page_url(session_id: &str) -> String {
    format!("/?session={session_id}")
}

fn find_session(state: &AppState, id: &str) -> Result<SharedSession, GameError> {
    state
        .sessions
        .get(id)
        .ok_or_else(|| GameError::SessionNotFound(id.to_string()))
}

/// Switch the session to `requested` if it is an offered model.
fn select_model(config: &AppConfig, session: &mut GameSession, requested: Option<&str>) {
    let Some(requested) = requested else {
        return;
    };
    let model = config.llm.resolve_model(Some(requested));
    if model != session.model() {
        tracing::debug!(session_id = %session.id(), model = %model, "Session model changed");
        session.set_model(model);
    }
}

fn render_page(
    state: &AppState,
    session: &GameSession,
    error: Option<String>,
    status: StatusCode,
) -> Result<Response, GameError> {
    let view = PageView::for_session(&state.config, state.provider_name(), session, error);
    let html = state.pages.render(&view)?;
    Ok((status, Html(html)).into_response())
}

fn render_without_session(
    state: &AppState,
    error: Option<String>,
    status: StatusCode,
) -> Result<Response, GameError> {
    let view = PageView::without_session(&state.config, state.provider_name(), error);
    let html = state.pages.render(&view)?;
    Ok((status, Html(html)).into_response())
}

fn render_config_missing(state: &AppState, status: StatusCode) -> Result<Response, GameError> {
    let view = PageView::config_missing(
        &state.config,
        state.provider_name(),
        state.config_missing().to_string(),
    );
    let html = state.pages.render(&view)?;
    Ok((status, Html(html)).into_response())
}
