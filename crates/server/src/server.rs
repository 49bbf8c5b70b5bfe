//! HTTP API server implementation

use crate::state::StateManager;
use crate::stats;
use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use bugtrack_common::{Bug, BugFilter, BugPatch, BugSpec, BugState, Database, Priority, Severity};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// API server configuration
#[derive(Clone, Debug)]
pub struct ApiServerConfig {
    /// Path to the SQLite database file
    pub db_path: PathBuf,
    /// Authentication policy for the API
    pub auth: ApiAuth,
    /// Seed demo bugs into an empty store at startup
    pub seed_demo: bool,
}

#[derive(Clone, Debug)]
pub enum ApiAuth {
    /// Require a static bearer token
    Token(String),
    /// Generate a random ephemeral token at startup and print it once
    DevRandom,
    /// No auth (not recommended)
    None,
}

/// API server state
#[derive(Clone)]
pub struct ApiServer {
    state: Arc<ApiState>,
}

struct ApiState {
    manager: StateManager,
    /// Resolved bearer token; `None` disables auth
    bearer_token: Option<String>,
}

impl ApiServer {
    /// Create a new API server: opens the store, seeds the default users
    /// and resolves the auth policy.
    pub fn new(cfg: ApiServerConfig) -> bugtrack_common::Result<Self> {
        if let Some(parent) = cfg.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&cfg.db_path)?;
        let manager = StateManager::new(db);

        manager.seed_users()?;
        if cfg.seed_demo {
            manager.seed_demo_bugs()?;
        }

        let bearer_token = match cfg.auth {
            ApiAuth::Token(t) => Some(t),
            ApiAuth::DevRandom => {
                let token = hex::encode(rand::random::<[u8; 16]>());
                eprintln!("BUGTRACK_AUTH_TOKEN (dev): {}", token);
                Some(token)
            }
            ApiAuth::None => None,
        };

        Ok(Self {
            state: Arc::new(ApiState {
                manager,
                bearer_token,
            }),
        })
    }

    /// Create router
    pub fn router(&self) -> Router {
        let state = self.state.clone();
        let auth_layer = middleware::from_fn(move |req, next| {
            let state = state.clone();
            async move { auth_middleware_inner(state, req, next).await }
        });

        // Protected routes (require a bearer token unless auth is disabled)
        let protected_routes = Router::new()
            .route("/api/bugs", get(list_bugs_handler).post(create_bug_handler))
            .route(
                "/api/bugs/:bug_id",
                get(get_bug_handler)
                    .put(update_bug_handler)
                    .delete(delete_bug_handler),
            )
            .route("/api/stats", get(stats_handler))
            .route("/api/users", get(list_users_handler).post(create_user_handler))
            .layer(auth_layer)
            .with_state(self.state.clone());

        // Public routes (health checks for probes and the CLI)
        Router::new()
            .route("/api/health", get(health_handler))
            .merge(protected_routes)
            .fallback(not_found_handler)
            .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
            .layer(TraceLayer::new_for_http())
    }

    /// Start the API server
    pub async fn serve(self, addr: SocketAddr) -> anyhow::Result<()> {
        info!("BugTrack API starting on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        self.serve_with_listener(listener).await
    }

    /// Serve on an already-bound listener (used by tests to grab an
    /// ephemeral port before starting).
    pub async fn serve_with_listener(
        self,
        listener: tokio::net::TcpListener,
    ) -> anyhow::Result<()> {
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

// ============================================================================
// Auth middleware
// ============================================================================

// `/api/health` is mounted outside the protected router, so everything that
// reaches this middleware requires the token.
async fn auth_middleware_inner(
    state: Arc<ApiState>,
    req: Request,
    next: middleware::Next,
) -> Response {
    let expected = match &state.bearer_token {
        Some(token) => token,
        None => return next.run(req).await,
    };

    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let provided = auth_header.strip_prefix("Bearer ").unwrap_or("");

    if provided.is_empty() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "missing bearer token"})),
        )
            .into_response();
    }

    if provided != expected {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "invalid bearer token"})),
        )
            .into_response();
    }

    next.run(req).await
}

// ============================================================================
// Wire types
// ============================================================================

/// Flattened bug representation returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BugView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub severity: Severity,
    pub assignee: Option<String>,
    pub environment: Option<String>,
    pub steps: Option<String>,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub status: BugState,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<Bug> for BugView {
    fn from(bug: Bug) -> Self {
        Self {
            id: bug.meta.id,
            title: bug.spec.title,
            description: bug.spec.description,
            priority: bug.spec.priority,
            severity: bug.spec.severity,
            assignee: bug.spec.assignee,
            environment: bug.spec.environment,
            steps: bug.spec.steps,
            expected: bug.spec.expected,
            actual: bug.spec.actual,
            status: bug.status.state,
            created_at: bug.meta.created_at,
            updated_at: bug.meta.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ConfirmParams {
    /// The explicit confirmation gesture for destructive operations
    #[serde(default)]
    confirm: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct CreateUserRequest {
    handle: String,
    display_name: String,
}

fn error_response(err: bugtrack_common::Error) -> Response {
    use bugtrack_common::Error;

    let status = match &err {
        Error::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        Error::NotFound { .. } => StatusCode::NOT_FOUND,
        Error::AlreadyExists { .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("request failed: {}", err);
    }

    (status, Json(serde_json::json!({"error": err.to_string()}))).into_response()
}

// ============================================================================
// Handlers
// ============================================================================

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "bugtrack-server"
    }))
}

async fn list_bugs_handler(
    State(state): State<Arc<ApiState>>,
    Query(filter): Query<BugFilter>,
) -> impl IntoResponse {
    match state.manager.list_bugs(&filter) {
        Ok(bugs) => {
            let views: Vec<BugView> = bugs.into_iter().map(BugView::from).collect();
            Json(views).into_response()
        }
        Err(e) => error_response(e),
    }
}

async fn create_bug_handler(
    State(state): State<Arc<ApiState>>,
    Json(spec): Json<BugSpec>,
) -> impl IntoResponse {
    match state.manager.create_bug(spec) {
        Ok(bug) => (StatusCode::CREATED, Json(BugView::from(bug))).into_response(),
        Err(e) => error_response(e),
    }
}

async fn get_bug_handler(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.manager.get_bug(&id) {
        Ok(Some(bug)) => Json(BugView::from(bug)).into_response(),
        Ok(None) => error_response(bugtrack_common::Error::not_found("bug", &id)),
        Err(e) => error_response(e),
    }
}

async fn update_bug_handler(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    Json(patch): Json<BugPatch>,
) -> impl IntoResponse {
    match state.manager.update_bug(&id, &patch) {
        Ok(bug) => Json(BugView::from(bug)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn delete_bug_handler(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    Query(params): Query<ConfirmParams>,
) -> impl IntoResponse {
    // Declining (or omitting) the confirmation gesture performs no mutation.
    if !params.confirm {
        return (
            StatusCode::PRECONDITION_REQUIRED,
            Json(serde_json::json!({"error": "deletion requires confirm=true"})),
        )
            .into_response();
    }

    match state.manager.delete_bug(&id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

async fn stats_handler(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    match state.manager.list_bugs(&BugFilter::default()) {
        Ok(bugs) => Json(stats::compute(&bugs)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn list_users_handler(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    match state.manager.list_users() {
        Ok(users) => Json(users).into_response(),
        Err(e) => error_response(e),
    }
}

async fn create_user_handler(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<CreateUserRequest>,
) -> impl IntoResponse {
    match state.manager.create_user(req.handle, req.display_name) {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn not_found_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}
