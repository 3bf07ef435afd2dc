//! HTTP server.
//!
//! Exposes the capture and retrieval pipelines as a JSON HTTP API.
//!
//! # Endpoints
//!
//! | Method | Path | Auth | Description |
//! |--------|------|------|-------------|
//! | `POST` | `/capture` | bearer | Enrich and store a note for the caller |
//! | `POST` | `/search` | bearer | Semantic search over the caller's own notes |
//! | `GET`  | `/public/brain/{owner_id}` | none | Public projection of an owner's notes |
//! | `GET`  | `/health` | none | Health check (version, CORS origins) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "provider_unavailable", "message": "AI service unavailable or quota exceeded: ..." } }
//! ```
//!
//! Error codes: `unauthenticated` (401), `bad_request` (400),
//! `provider_unavailable` (503), `embedding_dimension_mismatch` (500),
//! `provider_error` (500), `store_error` (500).

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use second_brain_core::models::CapturedItem;
use second_brain_core::{BrainError, CaptureInput, OwnerId, PublicProjection, ScoredItem};

use crate::app::App;
use crate::config::{Config, ServerConfig};
use crate::identity::IdentityResolver;

/// Shared state passed to every route handler via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    /// Configuration, store, and pipelines; built once at startup.
    app: Arc<App>,
    /// Resolves the bearer token of each request to an owner.
    identity: Arc<IdentityResolver>,
}

/// Start the server on `[server].bind` with the configured providers and store.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let identity = IdentityResolver::from_config(&config.auth)?;
    let app = App::from_config(config).await?;

    let listener = TcpListener::bind(&config.server.bind).await?;
    println!("Second Brain listening on http://{}", listener.local_addr()?);

    serve(listener, Arc::new(app), identity).await
}

/// Serve on an already-bound listener.
pub async fn serve(
    listener: TcpListener,
    app: Arc<App>,
    identity: IdentityResolver,
) -> anyhow::Result<()> {
    let router = router(app, identity);
    axum::serve(listener, router).await?;
    Ok(())
}

pub fn router(app: Arc<App>, identity: IdentityResolver) -> Router {
    let server_config = app.config.server.clone();
    let state = AppState {
        app,
        identity: Arc::new(identity),
    };

    Router::new()
        .route("/capture", post(handle_capture))
        .route("/search", post(handle_search))
        .route("/public/brain/{owner_id}", get(handle_public_brain))
        .route("/health", get(handle_health))
        .layer(TimeoutLayer::new(Duration::from_secs(
            server_config.request_timeout_secs,
        )))
        .layer(cors_layer(&server_config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if config.allowed_origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(origins))
}

// ============ Error response ============

/// JSON error response body: `{"error": {"code", "message"}}`.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g. `"provider_unavailable"`).
    code: &'static str,
    message: String,
}

/// Error type returned by handlers; converts into a JSON error response.
///
/// Every [`BrainError`] maps to exactly one status and code here.
struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
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

impl From<BrainError> for ApiError {
    fn from(err: BrainError) -> Self {
        let (status, code) = match &err {
            BrainError::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            BrainError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            BrainError::ProviderUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "provider_unavailable")
            }
            BrainError::EmbeddingDimensionMismatch { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "embedding_dimension_mismatch",
            ),
            BrainError::MalformedProviderResponse(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "provider_error")
            }
            BrainError::StoreWrite(_) | BrainError::StoreRead(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "store_error")
            }
        };

        if err.is_retryable() {
            warn!(code, error = %err, "AI provider unavailable");
        } else if err.is_client_error() {
            debug!(code, error = %err, "request rejected");
        } else {
            error!(code, error = %err, "request failed");
        }

        ApiError {
            status,
            code,
            message: err.to_string(),
        }
    }
}

fn bad_request(message: impl Into<String>) -> ApiError {
    ApiError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

impl AppState {
    fn caller(&self, method: &Method, headers: &HeaderMap) -> Result<Option<OwnerId>, ApiError> {
        Ok(self.identity.resolve(method, headers)?)
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    cors_allowed_origins: Vec<String>,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        cors_allowed_origins: state.app.config.server.allowed_origins.clone(),
    })
}

// ============ POST /capture ============

async fn handle_capture(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Result<Json<CaptureInput>, JsonRejection>,
) -> Result<Json<CapturedItem>, ApiError> {
    let owner = state.caller(&method, &headers)?;
    let Json(input) = body.map_err(|e| bad_request(e.body_text()))?;

    let item = state.app.capture.capture(owner.as_ref(), input).await?;
    Ok(Json(CapturedItem::from(&item)))
}

// ============ POST /search ============

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
}

async fn handle_search(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<Vec<ScoredItem>>, ApiError> {
    let owner = state.caller(&method, &headers)?;
    let Json(req) = body.map_err(|e| bad_request(e.body_text()))?;

    let hits = state.app.retrieval.search(owner.as_ref(), &req.query).await?;
    Ok(Json(hits))
}

// ============ GET /public/brain/{owner_id} ============

async fn handle_public_brain(
    State(state): State<AppState>,
    Path(owner_id): Path<String>,
) -> Result<Json<Vec<PublicProjection>>, ApiError> {
    let owner = OwnerId::new(owner_id);
    let items = state.app.retrieval.public_brain(&owner).await?;
    info!(owner = %owner, items = items.len(), "public brain listing");
    Ok(Json(items))
}
