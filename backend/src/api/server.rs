//! HTTP server for the cleaning API.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                          |
//! |--------|-------------------|--------------------------------------|
//! | GET    | `/health`         | Health check                         |
//! | POST   | `/api/clean`      | Upload a CSV, get cleaned rows       |
//! | GET    | `/api/logs`       | SSE stream for real-time logs        |
//!
//! `/api/clean` takes a multipart body with a `file` part and optional
//! `config` (cleaning configuration JSON) and `topN` parts.

use axum::{
    extract::Multipart,
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, LOG_BROADCASTER};
use super::types::{error_response, CleanResponse};
use crate::clean::clean_bytes;
use crate::config::CleaningConfig;
use crate::error::{PipelineError, ServerError, ServerResult};
use crate::report::DEFAULT_TOP_N;

type Rejection = (StatusCode, Json<Value>);

/// Build the application router.
pub fn router() -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/clean", post(clean_upload))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
}

/// Start the HTTP server
pub async fn start_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    eprintln!("🚀 Layoffs cleaning server running on http://localhost:{}", port);
    eprintln!("   POST /api/clean  - Upload CSV file");
    eprintln!("   GET  /api/logs   - SSE log stream");
    eprintln!("   GET  /health     - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router()).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "layoffs",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "clean": "POST /api/clean",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        // Lagged receivers skip what they missed
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Parts of a `/api/clean` upload
struct Upload {
    file_name: Option<String>,
    bytes: Vec<u8>,
    config: CleaningConfig,
    top_n: usize,
}

async fn read_upload(mut multipart: Multipart) -> ServerResult<Upload> {
    let mut file: Option<(Option<String>, Vec<u8>)> = None;
    let mut config = None;
    let mut top_n = DEFAULT_TOP_N;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                file = Some((file_name, bytes.to_vec()));
            }
            "config" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                let parsed = CleaningConfig::from_json(&text).map_err(PipelineError::from)?;
                config = Some(parsed);
            }
            "topN" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                top_n = text
                    .trim()
                    .parse()
                    .map_err(|_| ServerError::BadRequest(format!("Invalid topN: {}", text)))?;
            }
            _ => {}
        }
    }

    let (file_name, bytes) =
        file.ok_or_else(|| ServerError::BadRequest("No file provided".to_string()))?;

    Ok(Upload {
        file_name,
        bytes,
        config: config.unwrap_or_default(),
        top_n,
    })
}

async fn clean_upload(multipart: Multipart) -> Result<Json<CleanResponse>, Rejection> {
    let upload = read_upload(multipart).await.map_err(reject)?;

    log_info(format!(
        "📄 NEW UPLOAD: {} ({} bytes)",
        upload.file_name.as_deref().unwrap_or("unknown"),
        upload.bytes.len()
    ));

    let Upload { file_name, bytes, config, top_n } = upload;
    let response = tokio::task::spawn_blocking(move || {
        clean_bytes(&bytes, file_name, &config).map(|result| CleanResponse::new(result, top_n))
    })
    .await
    .map_err(|e| reject(ServerError::Internal(e.to_string())))?
    .map_err(|e| reject(e.into()))?;

    Ok(Json(response))
}

fn status_for(err: &ServerError) -> StatusCode {
    match err {
        ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
        ServerError::Pipeline(PipelineError::Io(_) | PipelineError::Export(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        ServerError::Pipeline(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(err: ServerError) -> Rejection {
    log_error(err.to_string());
    (status_for(&err), Json(error_response(&err.to_string())))
}
