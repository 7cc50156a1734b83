use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use oneclick_core::guard::{self, GuardDecision, RequestInfo};

use crate::state::AppState;

/// Cookie carrying the "already installed" notice to the redirect target.
pub const NOTICE_COOKIE: &str = "installer_notice";

/// Middleware for the wizard routes: once installed, every wizard request is
/// sent to `post_installation.redirect_to`.
pub async fn redirect_if_installed(
    State(app): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let service = app.service.clone();
    let decision = tokio::task::spawn_blocking(move || guard::installed_guard(&service))
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "installed guard task failed");
            GuardDecision::Pass
        });
    apply(decision, req, next).await
}

/// Middleware for the host application: while not installed, page requests
/// are sent to the wizard.
///
/// Passes through (in order): JSON requests, `api/` paths, wizard routes,
/// static assets, and everything once the application is installed.
pub async fn redirect_to_installer(
    State(app): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let service = app.service.clone();
    let path = req.uri().path().to_string();
    let accept = req
        .headers()
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let decision = tokio::task::spawn_blocking(move || {
        let info = RequestInfo::new(&path).with_accept(accept.as_deref());
        guard::uninstalled_guard(&service, info)
    })
    .await
    .unwrap_or_else(|e| {
        tracing::warn!(error = %e, "installer guard task failed");
        GuardDecision::Pass
    });
    apply(decision, req, next).await
}

async fn apply(decision: GuardDecision, req: Request, next: Next) -> Response {
    match decision {
        GuardDecision::Pass => next.run(req).await,
        GuardDecision::RedirectToInstaller { location } => found(&location, None),
        GuardDecision::RedirectAway { location, notice } => found(&location, Some(&notice)),
    }
}

/// Build a 302 response to `location`, optionally flashing `notice` through a
/// short-lived cookie and the response body.
pub(crate) fn found(location: &str, notice: Option<&str>) -> Response {
    let mut builder = Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, location);
    let body = match notice {
        Some(notice) => {
            let cookie = format!(
                "{NOTICE_COOKIE}={}; Max-Age=60; Path=/; SameSite=Lax",
                encode_cookie_value(notice)
            );
            builder = builder
                .header(header::SET_COOKIE, cookie)
                .header(header::CONTENT_TYPE, "text/plain; charset=utf-8");
            Body::from(notice.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).unwrap_or_else(|e| {
        tracing::warn!(location, error = %e, "invalid redirect target");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    })
}

/// Percent-encode everything outside the cookie-octet set.
fn encode_cookie_value(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'-' | b'_' => (b as char).to_string(),
            _ => format!("%{b:02X}"),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
