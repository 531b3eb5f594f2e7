use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "Carelink";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable naming the backend base URL.
pub const API_BASE_ENV: &str = "CARELINK_API_BASE";

/// Default backend base URL (local development server).
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";

/// Per-request timeout for ordinary GET/POST/PUT/DELETE calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Ceiling for a single multipart upload. An upload hitting this
/// deadline fails with `Timeout`, distinct from a network failure.
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Maximum accepted size for a single upload candidate (20 MB).
pub const MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// Content types the upload pipeline accepts.
pub const ALLOWED_UPLOAD_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "application/pdf",
    "video/mp4",
    "video/mov",
    "video/quicktime",
];

/// How long a user-visible notice stays before auto-expiry.
pub const NOTICE_TTL: Duration = Duration::from_secs(5);

/// Path segment separating a full blob URL from its storage reference.
pub const BLOB_PATH_PREFIX: &str = "patient-uploads/";

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    "carelink=info".to_string()
}

/// Explicit backend configuration.
///
/// The base URL is supplied by the host application at startup — never
/// inferred from the runtime host name.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    base_url: String,
}

impl PortalConfig {
    /// Build a config for the given backend base URL.
    /// A trailing slash is stripped so route joining stays uniform.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Read the base URL from `CARELINK_API_BASE`, falling back to the
    /// local development default.
    pub fn from_env() -> Self {
        let base = std::env::var(API_BASE_ENV).unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        Self::new(base)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_stripped() {
        let cfg = PortalConfig::new("https://portal.example.org/");
        assert_eq!(cfg.base_url(), "https://portal.example.org");
    }

    #[test]
    fn default_points_at_local_dev() {
        assert_eq!(PortalConfig::default().base_url(), DEFAULT_API_BASE);
    }

    #[test]
    fn upload_ceiling_is_twenty_megabytes() {
        assert_eq!(MAX_UPLOAD_BYTES, 20 * 1024 * 1024);
    }

    #[test]
    fn allowed_types_cover_images_pdf_and_video() {
        assert!(ALLOWED_UPLOAD_TYPES.contains(&"image/png"));
        assert!(ALLOWED_UPLOAD_TYPES.contains(&"application/pdf"));
        assert!(ALLOWED_UPLOAD_TYPES.contains(&"video/quicktime"));
        assert!(!ALLOWED_UPLOAD_TYPES.contains(&"image/svg+xml"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
