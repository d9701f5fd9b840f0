use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Basic client behavior settings. They are optional and uneditable once the client is
/// initialized.
///
/// Defaults to
///
/// ```
/// # use storefront_core::ClientSettings;
/// let settings = ClientSettings {
///     api_url: "http://localhost:8000/api".to_string(),
///     user_agent: "Storefront Rust-SDK".to_string(),
///     request_timeout_secs: 30,
///     unload_sync_timeout_ms: 1500,
/// };
/// let default = ClientSettings::default();
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ClientSettings {
    /// Base url of the storefront API. Defaults to `http://localhost:8000/api`
    pub api_url: String,
    /// The user agent sent with every request. Defaults to `Storefront Rust-SDK`
    pub user_agent: String,
    /// Upper bound for a single request, including the body. Defaults to 30 seconds.
    pub request_timeout_secs: u64,
    /// Upper bound for the best-effort favorites sync sent on shutdown. Defaults to 1500ms.
    pub unload_sync_timeout_ms: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000/api".into(),
            user_agent: "Storefront Rust-SDK".into(),
            request_timeout_secs: 30,
            unload_sync_timeout_ms: 1500,
        }
    }
}

impl ClientSettings {
    #[allow(missing_docs)]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[allow(missing_docs)]
    pub fn unload_sync_timeout(&self) -> Duration {
        Duration::from_millis(self.unload_sync_timeout_ms)
    }
}
