//! Routing policy for the two redirect guards.
//!
//! The functions here are pure: they take a request summary plus the
//! installation service and return a [`GuardDecision`]. Turning a decision
//! into an HTTP response is the web layer's job.

use crate::paths;
use crate::service::InstallationService;

/// Notice shown when the wizard is reached after installation.
pub const ALREADY_INSTALLED_NOTICE: &str = "Application is already installed.";

/// Path fragments that mark static asset requests. Matched as prefix or suffix.
pub const ASSET_PATTERNS: &[&str] = &[
    "css/",
    "js/",
    "images/",
    "img/",
    "fonts/",
    "assets/",
    "vendor/",
    "storage/",
    "favicon.ico",
    "robots.txt",
    "sitemap.xml",
];

/// File extensions that mark static asset requests.
pub const ASSET_EXTENSIONS: &[&str] = &[
    ".css", ".js", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".woff", ".woff2", ".ttf", ".eot",
    ".ico", ".webp", ".pdf", ".zip", ".json", ".xml",
];

/// The parts of an incoming request the guards look at.
#[derive(Debug, Clone, Copy)]
pub struct RequestInfo<'a> {
    pub path: &'a str,
    pub accept: Option<&'a str>,
}

impl<'a> RequestInfo<'a> {
    pub fn new(path: &'a str) -> Self {
        Self { path, accept: None }
    }

    pub fn with_accept(mut self, accept: Option<&'a str>) -> Self {
        self.accept = accept;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Pass,
    /// Application not installed: send the visitor to the wizard.
    RedirectToInstaller { location: String },
    /// Application installed: keep the visitor out of the wizard.
    RedirectAway { location: String, notice: String },
}

pub fn is_asset_path(path: &str) -> bool {
    let path = paths::request_path(path);
    let by_pattern = ASSET_PATTERNS
        .iter()
        .any(|p| path.starts_with(p) || path.ends_with(p));
    by_pattern || ASSET_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

pub fn is_api_path(path: &str) -> bool {
    paths::request_path(path).starts_with("api/")
}

/// True if the most preferred type in the `Accept` header is JSON. Entries
/// are ranked by their `q` weight; the first entry wins a tie.
pub fn wants_json(accept: Option<&str>) -> bool {
    accept
        .and_then(preferred_media_type)
        .is_some_and(|media| {
            let media = media.to_ascii_lowercase();
            media.contains("/json") || media.contains("+json")
        })
}

fn preferred_media_type(accept: &str) -> Option<&str> {
    let mut best: Option<(&str, f32)> = None;
    for entry in accept.split(',') {
        let mut parts = entry.split(';');
        let media = parts.next().unwrap_or_default().trim();
        if media.is_empty() {
            continue;
        }
        let quality = parts
            .filter_map(|p| p.trim().strip_prefix("q="))
            .find_map(|q| q.trim().parse::<f32>().ok())
            .unwrap_or(1.0);
        if best.map_or(true, |(_, q)| quality > q) {
            best = Some((media, quality));
        }
    }
    best.map(|(media, _)| media)
}

/// Guard for the wizard's own routes.
pub fn installed_guard(service: &InstallationService) -> GuardDecision {
    if service.is_installed() {
        return GuardDecision::RedirectAway {
            location: service.config().post_installation.redirect_to.clone(),
            notice: ALREADY_INSTALLED_NOTICE.to_string(),
        };
    }
    GuardDecision::Pass
}

/// Guard for the host application.
pub fn uninstalled_guard(service: &InstallationService, req: RequestInfo<'_>) -> GuardDecision {
    if wants_json(req.accept) || is_api_path(req.path) {
        return GuardDecision::Pass;
    }
    if service.is_installer_route(req.path) || is_asset_path(req.path) {
        return GuardDecision::Pass;
    }
    if service.should_redirect_to_installer(req.path) {
        tracing::debug!(path = req.path, "application not installed, redirecting to installer");
        return GuardDecision::RedirectToInstaller {
            location: service.installer_url(),
        };
    }
    GuardDecision::Pass
}
