//! HTTP surface of the classification service.
//!
//! | Method | Path        | Body                           |
//! |--------|-------------|--------------------------------|
//! | POST   | `/classify` | raw document text (UTF-8)      |
//! | GET    | `/health`   | none                           |
//!
//! `POST /classify` answers `200` with `[{"label": "...", "score": 0.87}, ...]`
//! in descending score order, or `500` with
//! `{"error": {"code": "...", "message": "..."}}`.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{debug, error, info, warn};
use serde::Serialize;
use tokio::net::TcpListener;

use crate::classifier::{ClassificationResult, ClassificationService, RequestError};

type SharedService = Arc<ClassificationService>;

/// Builds the router with `service` as shared state.
pub fn router(service: SharedService) -> Router {
    Router::new()
        .route("/classify", post(handle_classify))
        .route("/health", get(handle_health))
        .with_state(service)
}

/// Serves on an already bound listener until the process ends.
pub async fn serve(listener: TcpListener, service: SharedService) -> std::io::Result<()> {
    axum::serve(listener, router(service)).await
}

/// Binds `bind` and serves.
pub async fn run_server(service: SharedService, bind: &str) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind).await?;
    info!("Classification server listening on http://{}", listener.local_addr()?);
    serve(listener, service).await?;
    Ok(())
}

async fn handle_classify(
    State(service): State<SharedService>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ClassificationResult>, AppError> {
    let body = match body {
        Ok(bytes) => bytes,
        Err(rejection) => {
            warn!("Unreadable request body, classifying empty text: {}", rejection);
            Bytes::new()
        }
    };
    debug!("Classifying {} bytes", body.len());

    let result = tokio::task::spawn_blocking(move || {
        service.classify(&String::from_utf8_lossy(&body))
    })
    .await
    .map_err(|e| RequestError::Scoring(format!("classification task failed: {}", e)))??;
    Ok(Json(result))
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
    labels: usize,
}

async fn handle_health(State(service): State<SharedService>) -> Json<Health> {
    let labels = service.info().map(|info| info.num_labels).unwrap_or(0);
    Json(Health {
        status: if service.is_ready() { "ok" } else { "not_ready" },
        version: env!("CARGO_PKG_VERSION"),
        labels,
    })
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

/// A failed classification, rendered as a 500 response.
struct AppError(RequestError);

impl From<RequestError> for AppError {
    fn from(err: RequestError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("Classification request failed: {}", self.0);
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.0.code(),
                message: self.0.to_string(),
            },
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
