//! Chat and speech endpoints.
//!
//! - `POST /api/chat` — run the completion loop, stream plain text chunks
//! - `POST /api/tts`  — synthesize speech for a finished reply

use axum::body::{Body, Bytes};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::io;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info, warn};

use briefly_core::message::Message;

use crate::SharedState;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn rejection_error(rejection: JsonRejection) -> ApiError {
    warn!(error = %rejection.body_text(), "Rejected request body");
    api_error(rejection.status(), rejection.body_text())
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
}

/// `POST /api/chat` — stream the assistant's reply as raw text chunks.
///
/// The first loop item is awaited before the response is committed, so a
/// failure of the first round still produces a JSON error. Later failures
/// abort the body, so the client sees a broken transfer rather than a short
/// reply that looks complete.
pub async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload.map_err(rejection_error)?;

    info!(messages = payload.messages.len(), "Chat request");

    let mut rx = state.chat.run(payload.messages).map_err(|e| {
        if e.is_client_error() {
            api_error(StatusCode::BAD_REQUEST, e.to_string())
        } else {
            error!(error = %e, "Failed to start completion loop");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    })?;

    let first: Option<Result<Bytes, io::Error>> = match rx.recv().await {
        Some(Ok(chunk)) => Some(Ok(Bytes::from(chunk))),
        Some(Err(e)) => {
            error!(error = %e, "Chat failed before streaming began");
            return Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
        None => None,
    };

    let rest = ReceiverStream::new(rx).map(|item| {
        item.map(Bytes::from).map_err(|e| {
            warn!(error = %e, "Chat stream failed mid-response, aborting body");
            io::Error::other(e.to_string())
        })
    });

    let body = tokio_stream::iter(first).chain(rest);

    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(body),
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    #[serde(default)]
    pub text: String,
}

/// `POST /api/tts` — return the synthesized audio in one piece.
pub async fn tts_handler(
    State(state): State<SharedState>,
    payload: Result<Json<TtsRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload.map_err(rejection_error)?;

    if payload.text.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Text is required"));
    }

    info!(chars = payload.text.chars().count(), "Speech request");

    let audio = state.speech.synthesize(&payload.text).await.map_err(|e| {
        error!(error = %e, "Speech synthesis failed");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, state.speech.content_type().to_string()),
            (header::CONTENT_LENGTH, audio.len().to_string()),
        ],
        audio,
    )
        .into_response())
}
