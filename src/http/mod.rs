//! HTTP surface of the site.
//!
//! Pages are rendered from the live snapshot on every request, so edits show
//! up on the next reload without a restart.

mod error;
mod routes;
mod state;

use std::path::PathBuf;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::services::ServeDir;

pub use error::{AppError, TEMPLATE_FAILURE_MESSAGE};
pub use routes::MemberPayload;
pub use state::AppState;

/// Application routes, with `static_dirs` tried in order for anything else.
pub fn router(state: AppState, static_dirs: &[PathBuf]) -> Router {
    Router::new()
        .route("/", get(routes::index_handler))
        .route("/signup", post(routes::signup_handler))
        .route("/members", put(routes::update_member_handler))
        .route("/health", get(routes::health_handler))
        .with_state(state)
        .fallback_service(static_files(static_dirs))
}

/// Chain one [`ServeDir`] per directory; the first directory holding the
/// requested file wins.
fn static_files(dirs: &[PathBuf]) -> Router {
    dirs.iter().rev().fold(Router::new(), |next, dir| {
        Router::new().fallback_service(ServeDir::new(dir).fallback(next))
    })
}

/// Serve `router` on `bind` until ctrl-c or SIGTERM.
pub async fn serve(router: Router, bind: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    crate::log_event!("http", "listening", "{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    crate::log_event!("http", "stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("[http] cannot listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
        crate::log_event!("http", "shutdown", "ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                crate::log_event!("http", "shutdown", "SIGTERM");
            }
            Err(e) => {
                tracing::error!("[http] cannot listen for SIGTERM: {e}");
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
}
