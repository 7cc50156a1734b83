use axum::extract::State;
use axum::response::Response;
use axum::Json;
use oneclick_core::wizard;

use crate::error::AppError;
use crate::guard::found;
use crate::state::AppState;

/// GET /{prefix}: the wizard's step catalogue.
pub async fn welcome(State(app): State<AppState>) -> Json<serde_json::Value> {
    let config = app.service.config();
    Json(serde_json::json!({
        "version": config.version,
        "installer_url": app.service.installer_url(),
        "check_method": app.service.method(),
        "steps": wizard::catalogue(config.route_prefix()),
    }))
}

/// POST /{prefix}/finish: record the installation and leave the wizard.
pub async fn finish(State(app): State<AppState>) -> Result<Response, AppError> {
    let service = app.service.clone();
    let marked = tokio::task::spawn_blocking(move || service.mark_as_installed()).await?;
    if !marked {
        return Err(AppError::internal("failed to mark application as installed"));
    }
    let target = &app.service.config().post_installation.redirect_to;
    tracing::info!(redirect_to = %target, "installation finished");
    Ok(found(target, None))
}
