//! Savor Web Server
//!
//! Axum-based REST API for the Savor restaurant analytics application.
//!
//! Authentication itself is delegated to an external identity provider
//! (Cloudflare Access or similar) that injects the authenticated user
//! email as a request header; this server only reads that header and can
//! optionally require its presence. Error responses are sanitized -
//! internal detail is logged server-side, never returned to the client.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use savor_core::ai::{AIBackend, AIClient};
use savor_core::db::Database;
use savor_core::store::LocalStore;

mod handlers;


/// Maximum size per uploaded file (10 MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Header injected by the external identity provider
const ACCESS_USER_HEADER: &str = "cf-access-authenticated-user-email";

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Whether the identity header is required (secure by default)
    pub require_auth: bool,
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            allowed_origins: vec![],
        }
    }
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
    /// Narrative backend; None degrades analyses to "analysis unavailable"
    pub ai: Option<AIClient>,
    /// Blob store for uploaded spreadsheet bytes
    pub store: LocalStore,
}

/// Authentication middleware - requires the identity provider header.
///
/// Validation of the identity itself happens upstream (e.g. behind a
/// Cloudflare Tunnel); this layer only refuses requests that arrive
/// without any authenticated identity when auth is required.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.require_auth {
        return next.run(request).await;
    }

    let user = request
        .headers()
        .get(ACCESS_USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    match user {
        Some(email) => {
            info!(user = %email, path = %request.uri().path(), "Authenticated request");
            next.run(request).await
        }
        None => {
            warn!(path = %request.uri().path(), "Unauthorized request - no identity header");
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({
                    "error": "Authentication required"
                })),
            )
                .into_response()
        }
    }
}

/// Resolve the request owner's email from the identity header
pub fn get_user_email(headers: &HeaderMap) -> String {
    headers
        .get(ACCESS_USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "local-dev".to_string())
}

/// Create the application router
pub fn create_router(db: Database, store: LocalStore, config: ServerConfig) -> Router {
    let ai = AIClient::from_env();
    match &ai {
        Some(client) => info!(
            "Narrative backend configured: {} (model: {})",
            client.host(),
            client.model()
        ),
        None => info!("Narrative backend not configured (set OLLAMA_HOST to enable)"),
    }

    create_router_with_ai(db, store, config, ai)
}

/// Create the router with an explicit AI client (for testing)
pub fn create_router_with_ai(
    db: Database,
    store: LocalStore,
    config: ServerConfig,
    ai: Option<AIClient>,
) -> Router {
    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        ai,
        store,
    });

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/analyses", post(handlers::create_analysis))
        .route("/reports", get(handlers::list_reports))
        .route("/reports/:id", get(handlers::get_report))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(axum::extract::DefaultBodyLimit::max(MAX_UPLOAD_SIZE * 4));

    // Restrictive CORS: only the configured origins; empty list means
    // same-origin only
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind a listener and serve the API until shutdown
pub async fn serve(
    db: Database,
    store: LocalStore,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    let app = create_router(db, store, config);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}
