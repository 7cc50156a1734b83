use axum::extract::{Query, State};
use axum::Json;
use oneclick_core::InstallationInfo;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub path: Option<String>,
}

/// GET /api/installer/status?path=/x: installation snapshot for `path`.
pub async fn get_status(
    State(app): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<InstallationInfo>, AppError> {
    let service = app.service.clone();
    let path = query.path.unwrap_or_else(|| "/".to_string());
    let info = tokio::task::spawn_blocking(move || service.installation_info(&path)).await?;
    Ok(Json(info))
}
