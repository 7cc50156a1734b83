use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use oneclick_core::InstallerError;

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Construct a 500 error carrying `msg`.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self(anyhow::anyhow!(msg.into()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.0.downcast_ref::<InstallerError>() {
            Some(InstallerError::InvalidConfig(_)) => StatusCode::BAD_REQUEST,
            Some(InstallerError::DatabaseUnavailable { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            Some(
                InstallerError::EnvFileMissing(_)
                | InstallerError::Io(_)
                | InstallerError::Yaml(_)
                | InstallerError::Json(_)
                | InstallerError::Sqlite(_),
            )
            | None => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
