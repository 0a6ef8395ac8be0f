//! Static asset server for the front-end pages.

use crate::models::config::ServerConfig;
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{debug, error};

/// Clean URLs served from fixed pages.
const ROUTES: &[(&str, &str)] = &[
    ("/", "/pages/index.html"),
    ("/upload", "/pages/upload.html"),
    ("/stats", "/pages/stats.html"),
];

const MIME_TYPES: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("css", "text/css"),
    ("js", "text/javascript"),
    ("mjs", "text/javascript"),
    ("json", "application/json"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
];

const FALLBACK_MIME: &str = "application/octet-stream";

#[derive(Clone)]
pub struct AssetState {
    pub document_root: Arc<PathBuf>,
}

pub fn create_app(config: &ServerConfig) -> Router {
    let state = AssetState {
        document_root: Arc::new(config.document_root.clone()),
    };

    Router::new()
        .fallback(serve_asset)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type, Authorization"),
        ))
        .with_state(state)
}

pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    MIME_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or(FALLBACK_MIME)
}

/// Maps a request path onto the document root. Returns `None` for paths that
/// try to climb out of it.
fn resolve(root: &Path, request_path: &str) -> Option<PathBuf> {
    let path = ROUTES
        .iter()
        .find(|(route, _)| *route == request_path)
        .map(|(_, page)| *page)
        .unwrap_or(request_path);

    let mut resolved = root.to_path_buf();
    for component in Path::new(path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(resolved)
}

async fn serve_asset(State(state): State<AssetState>, method: Method, uri: Uri) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }

    let file_path = match resolve(&state.document_root, uri.path()) {
        Some(path) => path,
        None => return not_found(),
    };

    if tokio::fs::metadata(&file_path).await.is_err() {
        debug!("No asset at {}", file_path.display());
        return not_found();
    }

    match tokio::fs::read(&file_path).await {
        Ok(content) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, mime_for(&file_path))
            .header(header::CACHE_CONTROL, "no-cache")
            .body(Body::from(content))
            .unwrap_or_else(|_| internal_error()),
        Err(e) => {
            error!("Failed to read {}: {}", file_path.display(), e);
            internal_error()
        }
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "404 Not Found").into_response()
}

fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error").into_response()
}
