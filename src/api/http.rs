//! HTTP surface for [`TaskApi`].
//!
//! ## Endpoints
//!
//! - `GET /api/tasks`: list every task
//! - `POST /api/tasks`: create a task
//! - `PUT /api/tasks/{id}`: merge fields into a task
//! - `DELETE /api/tasks/{id}`: delete a task
//!
//! Failures respond with `{"error": "<message>"}`.

use super::{ApiError, TaskApi};
use crate::task::{
    domain::{TaskDraft, TaskPatch},
    ports::TaskStore,
};
use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, put};
use mockable::Clock;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

impl ApiError {
    /// HTTP status for this failure.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::ReadFailed(_)
            | Self::CreateFailed(_)
            | Self::UpdateFailed(_)
            | Self::DeleteFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = ?self, "task API request failed");
        }
        error_response(status, self.to_string())
    }
}

/// Builds the task API router.
pub fn router<S, C>(api: Arc<TaskApi<S, C>>) -> Router
where
    S: TaskStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/api/tasks",
            get(list_tasks::<S, C>).post(create_task::<S, C>),
        )
        .route(
            "/api/tasks/{id}",
            put(update_task::<S, C>).delete(delete_task::<S, C>),
        )
        .with_state(api)
}

/// Runs a blocking API call off the async executor.
async fn blocking<S, C, R>(
    api: Arc<TaskApi<S, C>>,
    call: impl FnOnce(&TaskApi<S, C>) -> Result<R, ApiError> + Send + 'static,
) -> Result<R, Response>
where
    S: TaskStore + 'static,
    C: Clock + Send + Sync + 'static,
    R: Send + 'static,
{
    match tokio::task::spawn_blocking(move || call(api.as_ref())).await {
        Ok(result) => result.map_err(IntoResponse::into_response),
        Err(err) => {
            error!(error = %err, "task API worker failed");
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            ))
        }
    }
}

async fn list_tasks<S, C>(State(api): State<Arc<TaskApi<S, C>>>) -> Response
where
    S: TaskStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    match blocking(api, TaskApi::list).await {
        Ok(tasks) => Json(tasks).into_response(),
        Err(response) => response,
    }
}

async fn create_task<S, C>(
    State(api): State<Arc<TaskApi<S, C>>>,
    body: Result<Json<TaskDraft>, JsonRejection>,
) -> Response
where
    S: TaskStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    let Json(draft) = match body {
        Ok(body) => body,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    match blocking(api, move |api| api.create(draft)).await {
        Ok(task) => (StatusCode::CREATED, Json(task)).into_response(),
        Err(response) => response,
    }
}

async fn update_task<S, C>(
    State(api): State<Arc<TaskApi<S, C>>>,
    Path(id): Path<String>,
    body: Result<Json<TaskPatch>, JsonRejection>,
) -> Response
where
    S: TaskStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    let Json(patch) = match body {
        Ok(body) => body,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    match blocking(api, move |api| api.update(&id, patch)).await {
        Ok(task) => Json(task).into_response(),
        Err(response) => response,
    }
}

async fn delete_task<S, C>(
    State(api): State<Arc<TaskApi<S, C>>>,
    Path(id): Path<String>,
) -> Response
where
    S: TaskStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    match blocking(api, move |api| api.delete(&id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(response) => response,
    }
}

/// Errors raised while starting the HTTP server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not bind.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The bound address could not be read back.
    #[error("failed to read the bound address: {0}")]
    LocalAddr(#[source] std::io::Error),
}

/// Task API HTTP server running in a background tokio task.
pub struct ApiServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ApiServer {
    /// Binds `{host}:{port}` (port `0` picks a free port) and starts
    /// serving.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the listener cannot bind.
    pub async fn start<S, C>(
        api: Arc<TaskApi<S, C>>,
        host: &str,
        port: u16,
    ) -> Result<Self, ServerError>
    where
        S: TaskStore + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let app = router(api);
        let bind_addr = format!("{host}:{port}");
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: bind_addr.clone(),
                source,
            })?;
        let addr = listener.local_addr().map_err(ServerError::LocalAddr)?;

        info!("task API listening on http://{addr}/api/tasks");

        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app).await {
                error!("task API server error: {err}");
            }
        });

        Ok(Self { addr, handle })
    }

    /// Returns the address the server is listening on.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the port the server is listening on.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Aborts the server task.
    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for ApiServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
