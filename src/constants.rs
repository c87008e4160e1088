//! Application constants
//!
//! Centralized location for magic strings and configuration defaults.

/// Default URL for new request tabs (an echo endpoint)
pub const DEFAULT_HTTP_URL: &str = "https://httpbin.org/get";

/// Name given to fresh tabs
pub const DEFAULT_TAB_NAME: &str = "New Request";

/// Content type applied when the draft does not set one
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Interval of the passive history refresh loop
pub const HISTORY_POLL_SECS: u64 = 30;

/// How long inline notices stay on screen
pub const NOTICE_TTL_SECS: u64 = 4;

/// Directory under $HOME holding config, logs and local state
pub const DATA_DIR_NAME: &str = ".tabpost";

/// Application name
pub const APP_NAME: &str = "tabpost";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Value of the pinned User-Agent header row on new tabs
pub fn default_user_agent() -> String {
    format!("{}/{}", APP_NAME, APP_VERSION)
}
