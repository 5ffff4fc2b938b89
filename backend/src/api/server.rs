//! HTTP Server for the qbank API.
//!
//! Lets a browser or desktop front end drive conversions: upload a question
//! bank, show the preview and log, then download the quiz template.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                          |
//! |--------|-------------------|--------------------------------------|
//! | GET    | `/health`         | Health check                         |
//! | POST   | `/api/preview`    | Upload CSV, get converted preview    |
//! | POST   | `/api/convert`    | Upload CSV, download quiz CSV        |
//! | GET    | `/api/logs`       | SSE stream for real-time logs        |

use axum::{
    extract::{DefaultBodyLimit, Multipart},
    http::{header, HeaderName, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, path::Path, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::LOG_BROADCASTER;
use super::types::{error_response, PreviewResponse};
use crate::config::{ConvertOptions, ServerConfig};
use crate::error::{ServerError, ServerResult};
use crate::transform::pipeline::{convert_bytes, default_output_path, render_csv, ConversionReport};

const FAILED_HEADER: HeaderName = HeaderName::from_static("x-qbank-failed-questions");

/// Start the HTTP server
pub async fn start_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION, FAILED_HEADER]);

    let app = router()
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    println!("🚀 qbank server running on http://localhost:{}", config.port);
    println!("   POST /api/preview - Upload CSV, get preview");
    println!("   POST /api/convert - Upload CSV, download quiz template");
    println!("   GET  /api/logs    - SSE log stream");
    println!("   GET  /health      - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router() -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/preview", post(preview_csv))
        .route("/api/convert", post(convert_csv))
        .route("/api/logs", get(sse_logs))
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Convert(e) if e.is_structural() => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Convert(_) | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        eprintln!("❌ {}", self);
        (status, Json(error_response(&self.to_string()))).into_response()
    }
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "qbank",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "preview": "POST /api/preview",
            "convert": "POST /api/convert",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx)
        .filter_map(|result| {
            match result {
                Ok(entry) => {
                    let json = serde_json::to_string(&entry).ok()?;
                    Some(Ok(Event::default().data(json)))
                }
                Err(_) => None,
            }
        });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive")
    )
}

/// Read the `file` field of a multipart upload.
async fn read_upload(mut multipart: Multipart) -> ServerResult<(Vec<u8>, Option<String>)> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(|s| s.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
            file_data = Some(bytes.to_vec());
        }
    }

    let bytes = file_data.ok_or_else(|| ServerError::BadRequest("No file provided".to_string()))?;
    Ok((bytes, file_name))
}

/// Run the conversion off the async runtime.
async fn run_conversion(bytes: Vec<u8>, file_name: Option<&str>) -> ServerResult<ConversionReport> {
    println!("\n{}", "=".repeat(70));
    println!("📄 NEW UPLOAD: {} ({} bytes)", file_name.unwrap_or("unknown"), bytes.len());
    println!("{}\n", "=".repeat(70));

    let options = ConvertOptions {
        echo_log: true,
        ..ConvertOptions::default()
    };

    let report = tokio::task::spawn_blocking(move || convert_bytes(&bytes, &options))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;

    Ok(report)
}

/// Preview endpoint
async fn preview_csv(multipart: Multipart) -> ServerResult<Json<PreviewResponse>> {
    let (bytes, file_name) = read_upload(multipart).await?;
    let report = run_conversion(bytes, file_name.as_deref()).await?;

    Ok(Json(PreviewResponse::from_report(report, file_name)))
}

/// Convert endpoint: responds with the quiz template as a CSV attachment.
///
/// When every question fails the body is the JSON preview (status `error`)
/// so the client still gets each row error.
async fn convert_csv(multipart: Multipart) -> ServerResult<Response> {
    let (bytes, file_name) = read_upload(multipart).await?;
    let report = run_conversion(bytes, file_name.as_deref()).await?;

    if report.nothing_converted() {
        let response = PreviewResponse::from_report(report, file_name);
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(response)).into_response());
    }

    let body = render_csv(&report.records)?;
    let disposition = format!("attachment; filename=\"{}\"", download_name(file_name.as_deref()));

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (FAILED_HEADER, report.stats.failed.to_string()),
        ],
        body,
    )
        .into_response())
}

/// `<stem>_converted.csv`, safe to put inside a quoted header value.
fn download_name(file_name: Option<&str>) -> String {
    let name = file_name.unwrap_or("questions.csv");
    default_output_path(Path::new(name))
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "questions_converted.csv".to_string())
        .chars()
        .map(|c| if c == '"' || c == '\\' || c.is_control() { '_' } else { c })
        .collect()
}
