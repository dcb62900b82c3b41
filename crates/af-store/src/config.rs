//! Backend connection settings.

use serde::Deserialize;

/// Env var overriding [`BackendConfig::base_url`].
pub const API_URL_VAR: &str = "AUTOFLOW_API_URL";
/// Env var overriding [`BackendConfig::user_email`].
pub const USER_EMAIL_VAR: &str = "AUTOFLOW_USER_EMAIL";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Root of the automation API, without a trailing slash.
    /// Default: **`http://localhost:8000`**.
    pub base_url: String,
    /// Account that owns the automations. Default: empty.
    pub user_email: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            user_email: String::new(),
        }
    }
}

impl BackendConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Defaults overridden by `AUTOFLOW_API_URL` / `AUTOFLOW_USER_EMAIL`.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(API_URL_VAR) {
            self.base_url = url;
        }
        if let Some(email) = lookup(USER_EMAIL_VAR) {
            self.user_email = email;
        }
        self.base_url.truncate(self.base_url.trim_end_matches('/').len());
        self
    }
}
