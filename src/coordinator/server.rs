//! HTTP front end of the coordinator.
//!
//! One `POST /invoke` route. The server runs on its own thread with a small
//! tokio runtime and lives until the process exits.

use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use binmock_protocol::{InvocationRequest, InvocationResponse, INVOKE_PATH};
use tracing::{debug, error};

use super::registry::{DispatchError, Registry};
use super::CoordinatorError;

const SERVER_THREAD_NAME: &str = "binmock-coordinator";
const WORKER_THREADS: usize = 2;

pub(crate) fn router(registry: Arc<Registry>) -> Router {
    Router::new()
        .route(INVOKE_PATH, post(handle_invoke))
        // Reports carry the stub's whole stdin, which has no size bound.
        .layer(DefaultBodyLimit::disable())
        .with_state(registry)
}

async fn handle_invoke(
    State(registry): State<Arc<Registry>>,
    Json(request): Json<InvocationRequest>,
) -> Result<Json<InvocationResponse>, (StatusCode, String)> {
    debug!(mock = %request.id, args = ?request.args, "invocation received");

    // Resolution calls the test's failure reporter, which may block.
    let result = tokio::task::spawn_blocking(move || registry.dispatch(&request))
        .await
        .map_err(|e| {
            error!("invocation handler panicked: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "invocation handler panicked".to_string())
        })?;

    match result {
        Ok(response) => Ok(Json(response)),
        Err(e @ DispatchError::UnknownMock(_)) => {
            error!("{}", e);
            Err((StatusCode::NOT_FOUND, e.to_string()))
        }
    }
}

/// Serve `registry` on `listener` from a background thread.
pub(crate) fn spawn(
    listener: TcpListener,
    registry: Arc<Registry>,
) -> Result<(), CoordinatorError> {
    listener.set_nonblocking(true)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(WORKER_THREADS)
        .thread_name("binmock-coordinator-worker")
        .enable_io()
        .build()?;

    thread::Builder::new()
        .name(SERVER_THREAD_NAME.to_string())
        .spawn(move || {
            runtime.block_on(async move {
                let listener = match tokio::net::TcpListener::from_std(listener) {
                    Ok(listener) => listener,
                    Err(e) => {
                        error!("coordinator listener unusable: {}", e);
                        return;
                    }
                };
                if let Err(e) = axum::serve(listener, router(registry)).await {
                    error!("coordinator stopped: {}", e);
                }
            });
        })?;
    Ok(())
}
