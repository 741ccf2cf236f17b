use crate::error::TrackingError;
use crate::models::{ChangeStatusRequest, CreatePackageRequest, Package, PackageStatus};
use crate::service::PackageService;
use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, Method, Request, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PackageService>,
    pub cors_allowed_origin: String,
}

pub async fn run_server(addr: SocketAddr, state: AppState) -> Result<()> {
    info!("binding http server addr={}", addr);
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("http server ready and accepting connections addr={}", addr);
    axum::serve(listener, app)
        .await
        .context("http server terminated unexpectedly")?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/packages", get(list_packages).post(create_package))
        .route("/api/packages/:id", get(get_package))
        .route("/api/packages/:id/status", post(change_status))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(axum::middleware::from_fn(logging_middleware))
        .layer(axum::middleware::from_fn_with_state(state.clone(), cors_middleware))
        .with_state(state)
}

impl IntoResponse for TrackingError {
    fn into_response(self) -> Response {
        let status = match &self {
            TrackingError::NotFound(_) => StatusCode::NOT_FOUND,
            TrackingError::InvalidTransition { .. } | TrackingError::UnknownState(_) | TrackingError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            TrackingError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub tracking_number: Option<String>,
    pub status: Option<PackageStatus>,
}

async fn list_packages(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Package>>, TrackingError> {
    let packages = state.service.list(query.tracking_number, query.status).await?;
    Ok(Json(packages))
}

async fn get_package(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Package>, TrackingError> {
    match state.service.get_by_id(id).await? {
        Some(package) => Ok(Json(package)),
        None => Err(TrackingError::NotFound(id)),
    }
}

async fn create_package(
    State(state): State<AppState>,
    Json(request): Json<CreatePackageRequest>,
) -> Result<(StatusCode, Json<Package>), TrackingError> {
    let package = state.service.create(request).await?;
    Ok((StatusCode::CREATED, Json(package)))
}

async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ChangeStatusRequest>,
) -> Result<StatusCode, TrackingError> {
    state.service.change_status(id, request.new_status).await?;
    Ok(StatusCode::OK)
}

async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
    }))
}

async fn logging_middleware(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let duration_ms = start.elapsed().as_millis();
    if status.is_server_error() {
        error!("request failed method={} path={} status={} duration_ms={}", method, path, status.as_u16(), duration_ms);
    } else if status.is_client_error() {
        warn!("request rejected method={} path={} status={} duration_ms={}", method, path, status.as_u16(), duration_ms);
    } else {
        debug!("request method={} path={} status={} duration_ms={}", method, path, status.as_u16(), duration_ms);
    }

    response
}

/// Browser access for the package browsing UI. The dev origin is configured,
/// not wildcarded; preflights are answered here without hitting a route.
async fn cors_middleware(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        apply_cors_headers(response.headers_mut(), &state.cors_allowed_origin);
        return response;
    }

    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut(), &state.cors_allowed_origin);
    response
}

fn apply_cors_headers(headers: &mut HeaderMap, origin: &str) {
    if let Ok(value) = HeaderValue::from_str(origin) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
    }
    headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET, POST, OPTIONS"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("content-type"));
}
