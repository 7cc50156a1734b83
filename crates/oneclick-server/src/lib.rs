pub mod error;
pub mod guard;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::{middleware, Router};
use oneclick_core::InstallationService;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Wizard routes mounted under the configured prefix, behind the
/// installed-guard.
pub fn installer_routes(state: AppState) -> Router {
    let prefix = state.service.config().route_prefix().to_string();
    Router::new()
        .route(&format!("/{prefix}"), get(routes::installer::welcome))
        .route(
            &format!("/{prefix}/finish"),
            post(routes::installer::finish),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            guard::redirect_if_installed,
        ))
        .with_state(state)
}

/// Merge `host_app` with the installer routes and the status endpoint, and
/// gate the whole application behind the uninstalled-guard.
/// Used by `serve()` and available for integration testing.
pub fn build_router(service: Arc<InstallationService>, host_app: Router) -> Router {
    let state = AppState::new(service);

    let api = Router::new()
        .route("/api/installer/status", get(routes::status::get_status))
        .with_state(state.clone());

    host_app
        .merge(installer_routes(state.clone()))
        .merge(api)
        .layer(middleware::from_fn_with_state(
            state,
            guard::redirect_to_installer,
        ))
        .layer(TraceLayer::new_for_http())
}

/// Stand-in host application for `serve()`.
fn placeholder_app() -> Router {
    Router::new()
        .route("/", get(|| async { "Application home" }))
        .route("/admin/dashboard", get(|| async { "Dashboard" }))
}

/// Start the installer in front of a placeholder application.
pub async fn serve(root: PathBuf, port: u16, open_browser: bool) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    serve_on(root, listener, open_browser).await
}

/// Like `serve`, on a pre-bound listener. The logged URL carries the port
/// actually bound, so `port = 0` works.
pub async fn serve_on(
    root: PathBuf,
    listener: tokio::net::TcpListener,
    open_browser: bool,
) -> anyhow::Result<()> {
    let service = Arc::new(InstallationService::load(&root)?);
    let actual_port = listener.local_addr()?.port();
    let app = build_router(service.clone(), placeholder_app());

    tracing::info!(
        method = %service.method(),
        installer = %service.installer_url(),
        "one-click installer listening on http://localhost:{actual_port}"
    );

    if open_browser {
        let url = format!("http://localhost:{actual_port}");
        let _ = open::that(&url);
    }

    axum::serve(listener, app).await?;
    Ok(())
}
