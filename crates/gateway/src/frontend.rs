//! Embedded web UI.
//!
//! The chat page and its two static files are compiled into the binary, so
//! `briefly serve` needs no asset directory at runtime. Anything the router
//! does not know falls through to [`fallback`]: unknown `/api/*` paths get a
//! JSON 404 like the other API errors, other page loads get the chat page.

use axum::{
    Json, Router,
    extract::Path,
    http::{Method, StatusCode, Uri, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};

use crate::api::ErrorResponse;

const INDEX_HTML: &str = include_str!("../../../frontend/index.html");

/// A file served under `/static/`.
struct StaticAsset {
    name: &'static str,
    content_type: &'static str,
    body: &'static str,
}

const STATIC_ASSETS: &[StaticAsset] = &[
    StaticAsset {
        name: "style.css",
        content_type: "text/css; charset=utf-8",
        body: include_str!("../../../frontend/style.css"),
    },
    StaticAsset {
        name: "app.js",
        content_type: "application/javascript; charset=utf-8",
        body: include_str!("../../../frontend/app.js"),
    },
];

/// Static files only change with the binary.
const STATIC_CACHE_CONTROL: &str = "public, max-age=3600";

/// Build a router that serves the embedded UI and the catch-all fallback.
pub fn frontend_router() -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/static/{name}", get(static_asset))
        .fallback(fallback)
}

async fn index_page() -> Response {
    ([(header::CACHE_CONTROL, "no-cache")], Html(INDEX_HTML)).into_response()
}

async fn static_asset(Path(name): Path<String>) -> Response {
    match STATIC_ASSETS.iter().find(|asset| asset.name == name) {
        Some(asset) => (
            [
                (header::CONTENT_TYPE, asset.content_type),
                (header::CACHE_CONTROL, STATIC_CACHE_CONTROL),
            ],
            asset.body,
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn fallback(method: Method, uri: Uri) -> Response {
    let path = uri.path();
    if path == "/api" || path.starts_with("/api/") {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("No API route for {path}"),
            }),
        )
            .into_response();
    }

    if method == Method::GET {
        index_page().await
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}
