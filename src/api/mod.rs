use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Path, Request},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;

use crate::{config::SETTINGS, crawler::QuoteExtractor, logging};

pub mod stocks;

/// Directory served under /static, also the snapshot job's output directory.
const STATIC_DIR: &str = "static";

/// 啟動 HTTP API 服務
pub async fn serve(extractor: Arc<QuoteExtractor>) -> Result<()> {
    let addr = SETTINGS.system.bind_addr();
    let listener = TcpListener::bind(&addr).await?;

    logging::info_file_async(format!("HTTP API listening on {}", addr));

    axum::serve(listener, router(extractor)).await?;

    Ok(())
}

pub(crate) fn router(extractor: Arc<QuoteExtractor>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/static/{file}", get(static_file))
        .route("/api/v1/stocks", get(stocks::stocks))
        .route("/api/v1/stocks/raw", get(stocks::stocks_raw))
        .route("/api/v1/stocks/mstr", get(stocks::stocks_mstr))
        .route("/api/v1/stocks/csv", get(stocks::stocks_csv))
        .route("/api/v1/stocks/csv/simple", get(stocks::stocks_csv_simple))
        .route("/api/v1/stocks/data", get(stocks::stocks_data))
        .layer(middleware::from_fn(cors))
        .with_state(extractor)
}

/// Uniform 500 for any extraction failure. The cause is logged server side,
/// the body never carries it.
pub(crate) struct ServiceFailure;

impl IntoResponse for ServiceFailure {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": "stock quote service unavailable" })),
        )
            .into_response()
    }
}

/// Wildcard CORS with a preflight short circuit, the policy the BI consumers
/// expect: any origin, GET/POST/OPTIONS/HEAD, results cacheable for an hour.
async fn cors(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        apply_cors_headers(&mut response);
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors_headers(&mut response);
    response
}

fn apply_cors_headers(response: &mut Response) {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS, HEAD"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static("Content-Type, Content-Disposition"),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static("3600"),
    );
}

async fn index() -> Response {
    match tokio::fs::read_to_string("index.html").await {
        Ok(page) => Html(page).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "index.html not found").into_response(),
    }
}

async fn static_file(Path(file): Path<String>) -> Response {
    // single path segment only, no traversal
    if file.contains("..") || file.contains('/') || file.contains('\\') {
        return StatusCode::NOT_FOUND.into_response();
    }

    let path = std::path::Path::new(STATIC_DIR).join(&file);
    match tokio::fs::read(&path).await {
        Ok(content) => {
            ([(header::CONTENT_TYPE, content_type_for(&file))], content).into_response()
        }
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

fn content_type_for(file_name: &str) -> &'static str {
    match file_name.rsplit('.').next() {
        Some("csv") => "text/csv",
        Some("html") => "text/html; charset=utf-8",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
