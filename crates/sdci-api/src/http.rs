use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State, rejection::JsonRejection},
    http::header::CONTENT_TYPE,
    middleware,
    response::{IntoResponse, Response},
    routing::post,
};
use sdci_model::TriggerRequest;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::{auth::BearerToken, auth::require_bearer, error::ApiError, handler::ApiHandler};

/// Bytes buffered between the run and a slow client before the pump waits.
const STREAM_BUFFER: usize = 64 * 1024;

/// HTTP API service builder.
pub struct HttpApi<H> {
    handler: Arc<H>,
    token: BearerToken,
}

impl<H> HttpApi<H>
where
    H: ApiHandler,
{
    /// Create new HTTP API guarded by `token`.
    pub fn new(handler: Arc<H>, token: BearerToken) -> Self {
        Self { handler, token }
    }

    /// Build axum router with mounted endpoints.
    ///
    /// Routes (bearer token required, trailing slash optional):
    /// - POST /tasks/{name}/ - Run task, streaming its output as plain text
    /// - POST /tasks/{name}/status/ - Latest run record of the task
    pub fn router(self) -> Router {
        Router::new()
            .route("/tasks/{name}", post(trigger_task::<H>))
            .route("/tasks/{name}/", post(trigger_task::<H>))
            .route("/tasks/{name}/status", post(task_status::<H>))
            .route("/tasks/{name}/status/", post(task_status::<H>))
            .route_layer(middleware::from_fn_with_state(self.token, require_bearer))
            .with_state(self.handler)
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /tasks/{name}/
///
/// Once the run has started the response is committed; later failures show up as marker
/// lines in the body rather than as an HTTP status.
async fn trigger_task<H>(
    State(handler): State<Arc<H>>,
    Path(name): Path<String>,
    payload: Result<Json<TriggerRequest>, JsonRejection>,
) -> Result<Response, ApiError>
where
    H: ApiHandler,
{
    let Json(req) = payload.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    info!(target: "sdci.api.http", task = %name, "run command");
    let stream = handler.trigger(&name, req.args).await?;

    let (mut output, _completion) = stream.into_parts();
    let (mut writer, reader) = tokio::io::duplex(STREAM_BUFFER);

    tokio::spawn(async move {
        while let Some(chunk) = output.recv().await {
            let line = format!("{chunk}\n");
            if writer.write_all(line.as_bytes()).await.is_err() {
                debug!(target: "sdci.api.http", "client went away; run continues detached");
                break;
            }
        }
    });

    let body = Body::from_stream(ReaderStream::new(reader));
    Ok(([(CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response())
}

/// POST /tasks/{name}/status/
async fn task_status<H>(
    State(handler): State<Arc<H>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    debug!(target: "sdci.api.http", task = %name, "getting task status");
    let record = handler.status(&name).await?;
    Ok(Json(record))
}
