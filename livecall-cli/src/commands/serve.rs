//! Notebook server command implementation.
//!
//! Every request is its own session: it runs on a blocking worker thread
//! with a fresh [`SessionContext`] attached, and all sessions share the one
//! kernel behind the bridge.

use super::kernel_dispatcher;
use super::render::notebook_title;
use crate::notebook::{parse_notebook, render_cells};
use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use livecall_kernel::Kernel;
use livecall_render::{Displayable, Dispatcher, HtmlPage};
use livecall_runtime::{Config, SessionContext};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
struct AppState {
    dispatcher: Dispatcher<Kernel>,
    notebook: Arc<PathBuf>,
    title: Arc<str>,
}

#[derive(Debug, Deserialize)]
struct DisplayQuery {
    source: String,
    mime: Option<String>,
}

/// Serve a notebook, re-rendering it on every request
pub async fn serve_notebook(config: &Config, notebook: &Path, port: Option<u16>) -> Result<()> {
    if !notebook.exists() {
        anyhow::bail!("Notebook {:?} does not exist", notebook);
    }

    let dispatcher = kernel_dispatcher(config)?;
    let state = AppState {
        dispatcher,
        notebook: Arc::new(notebook.to_path_buf()),
        title: notebook_title(notebook).into(),
    };

    let app = Router::new()
        .route("/", get(serve_page))
        .route("/display", get(serve_display))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state);

    let port = port.unwrap_or(config.server.port);
    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Serving {:?} on http://localhost:{}", notebook, port);
    println!("\nServing at http://localhost:{}", port);
    println!("   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Render the whole notebook for one session
async fn serve_page(State(state): State<AppState>) -> Response {
    let markdown = match fs::read_to_string(state.notebook.as_ref()).await {
        Ok(markdown) => markdown,
        Err(e) => {
            tracing::error!("Failed to read notebook {:?}: {}", state.notebook, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read notebook").into_response();
        }
    };

    in_session("page", move || {
        let cells = parse_notebook(&markdown);
        render_cells(&state.dispatcher, &state.title, &cells)
    })
    .await
}

/// Render a single value, e.g. `/display?source=1%2B1&mime=text/html`
async fn serve_display(
    State(state): State<AppState>,
    Query(query): Query<DisplayQuery>,
) -> Response {
    in_session("display", move || {
        let mut page = HtmlPage::new(query.source.as_str());
        if let Err(e) = state.dispatcher.display(
            &mut page,
            Displayable::source(query.source.as_str()),
            query.mime.as_deref(),
        ) {
            page.push_error(&e.to_string());
        }
        page
    })
    .await
}

/// Build a page on a blocking worker with a new session attached
async fn in_session<F>(label: &'static str, build: F) -> Response
where
    F: FnOnce() -> HtmlPage + Send + 'static,
{
    let session = SessionContext::new(label);
    let result = tokio::task::spawn_blocking(move || {
        let _guard = session.attach();
        tracing::debug!(session = %session, "Session started");
        build().render()
    })
    .await;

    match result {
        Ok(Ok(html)) => Html(html).into_response(),
        Ok(Err(e)) => {
            tracing::error!("Failed to render page: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
        }
        Err(e) => {
            tracing::error!("Session task panicked: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Session failed").into_response()
        }
    }
}

/// Resolves on Ctrl-C, or on SIGTERM (what the re-armed interrupt sends)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutting down");
}
