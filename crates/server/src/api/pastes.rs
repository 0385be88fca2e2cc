use std::time::Duration;

use axum::Json;
use axum::body::{Body, Bytes};
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::debug;

use super::AppState;
use super::schemas::{CreatePasteParams, CreatePasteResponse};
use crate::error::ServerError;

/// `POST /api/pastes` -- store the raw request body as a new paste.
pub async fn create_paste(
    State(state): State<AppState>,
    params: Result<Query<CreatePasteParams>, QueryRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, ServerError> {
    let Query(params) = params.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let body = body.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServerError::PayloadTooLarge
        } else {
            ServerError::BadRequest(e.body_text())
        }
    })?;

    let ttl = params.ttl_seconds.map(Duration::from_secs);
    if let Some(ttl) = ttl
        && ttl > state.limits.max_ttl
    {
        return Err(ServerError::BadRequest(format!(
            "ttl_seconds must not exceed {}",
            state.limits.max_ttl.as_secs()
        )));
    }

    let id = state
        .orchestrator
        .create(body, ttl, params.burn_after)
        .await?;
    debug!(paste_id = %id, "paste uploaded");

    Ok((StatusCode::CREATED, Json(CreatePasteResponse { id })))
}

/// `GET /api/pastes/{id}` and `GET /{id}` -- stream the paste body.
pub async fn read_paste(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServerError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ServerError::BadRequest("missing paste id".into()));
    }

    let stream = state.orchestrator.read(id).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(stream),
    )
        .into_response())
}
