//! Public HTTP surface.
//!
//! Thin handlers over [`Gateway`]: extract, call, render. Every response,
//! errors and preflights included, carries permissive CORS headers.

use axum::Json;
use axum::Router;
use axum::body::Body;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, Request, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde_json::json;
use std::sync::Arc;
use vitrine_filter::PublicRelease;
use vitrine_gateway::error::{Error as GatewayError, ErrorKind as GatewayErrorKind};
use vitrine_gateway::{Gateway, HealthReport};

const SERVICE_NAME: &str = "Release Proxy";

type AppState = Arc<Gateway>;

pub fn router(gateway: AppState) -> Router {
    Router::new()
        .route("/", get(describe))
        .route("/releases", get(list_releases))
        .route("/releases/download/{tag}/{asset}", get(download))
        .route("/health", get(health))
        .fallback(not_found)
        .layer(middleware::from_fn(cors))
        .with_state(gateway)
}

/// Which public operation failed; picks the wording of 502 responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Listing,
    Download,
}

/// A gateway error rendered as `{"error": "..."}` with a matching status.
#[derive(Debug)]
pub struct ApiError {
    error: GatewayError,
    operation: Operation,
}

impl ApiError {
    fn message(&self) -> &'static str {
        match (&*self.error, self.operation) {
            (GatewayErrorKind::RateLimitExceeded(_), _) => "Rate limit exceeded",
            (GatewayErrorKind::Configuration, _) => "Service configuration error",
            (GatewayErrorKind::UpstreamUnavailable, Operation::Listing) => "Failed to fetch releases from GitHub",
            (GatewayErrorKind::UpstreamUnavailable, Operation::Download) => "Failed to fetch asset from GitHub",
            (GatewayErrorKind::ReleaseNotFound(_), _) => "Release not found",
            (GatewayErrorKind::AssetNotFound(_), _) => "Asset not found",
            (GatewayErrorKind::InvalidAssetRequest(_), _) => "Only .exe files can be downloaded",
            (GatewayErrorKind::MalformedUpstreamData, _) => "Internal server error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = ?self.error, operation = ?self.operation, "Request failed");
        } else {
            let kind: &GatewayErrorKind = &self.error;
            tracing::info!(error = %kind, operation = ?self.operation, "Request rejected");
        }
        error_response(status, self.message())
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn describe(State(gateway): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "status": "operational",
        "repository": gateway.repository(),
        "endpoints": {
            "/releases": "Get available releases",
            "/releases/download/{tag}/{asset}": "Download an installer",
            "/health": "Health check",
        },
    }))
}

async fn list_releases(State(gateway): State<AppState>) -> Result<Json<Arc<Vec<PublicRelease>>>, ApiError> {
    gateway.releases().await.map(Json).map_err(|error| ApiError {
        error,
        operation: Operation::Listing,
    })
}

async fn download(
    State(gateway): State<AppState>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path((tag, asset)) = match path {
        Ok(path) => path,
        Err(rejection) => {
            tracing::info!(error = %rejection, "Rejected download path");
            return Ok(error_response(StatusCode::BAD_REQUEST, "Invalid download path"));
        },
    };
    let download = gateway.download(&tag, &asset).await.map_err(|error| ApiError {
        error,
        operation: Operation::Download,
    })?;
    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_DISPOSITION, download.content_disposition());
    if let Some(length) = download.content_length() {
        response = response.header(header::CONTENT_LENGTH, length);
    }
    Ok(response.body(Body::from_stream(download.into_body())).unwrap_or_else(|err| {
        tracing::error!(error = %err, %tag, %asset, "Could not build download response");
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }))
}

async fn health(State(gateway): State<AppState>) -> Json<HealthReport> {
    Json(gateway.health().await)
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Endpoint not found")
}

async fn cors(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET, OPTIONS"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static("Content-Disposition, Content-Length"),
    );
    response
}
