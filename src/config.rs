//! Client configuration resolution.
//!
//! The backend/frontend URL pair resolves from CLI flags or environment
//! variables with a localhost fallback, and can be overridden at startup
//! by a fetched remote configuration document. The resolved value is a
//! plain struct handed to [`crate::create_client`]; nothing here is
//! process-global.

use std::time::Duration;

use serde::Deserialize;
use tracing::warn;
use url::Url;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";

/// Default per-request deadline in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Deadline for the remote-config fetch itself.
const REMOTE_CONFIG_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the wishlist REST backend.
    pub backend_url: Url,
    /// Base URL of the web frontend, embedded in password-reset emails.
    pub frontend_url: Url,
    /// Deadline applied to every request so a hung call cannot block forever.
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(backend_url: Url, frontend_url: Url) -> Self {
        Self {
            backend_url,
            frontend_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the URL pair with values from a remote config document.
    /// A malformed URL in the document keeps the already-resolved value.
    pub fn apply_remote(&mut self, remote: &RemoteConfig) {
        match Url::parse(&remote.backend_url) {
            Ok(url) => self.backend_url = url,
            Err(e) => warn!(url = %remote.backend_url, error = %e, "Ignoring invalid remote backend URL"),
        }
        match Url::parse(&remote.frontend_url) {
            Ok(url) => self.frontend_url = url,
            Err(e) => warn!(url = %remote.frontend_url, error = %e, "Ignoring invalid remote frontend URL"),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        let backend = Url::parse(DEFAULT_BACKEND_URL).expect("default backend URL is valid");
        let frontend = Url::parse(DEFAULT_FRONTEND_URL).expect("default frontend URL is valid");
        Self::new(backend, frontend)
    }
}

/// Remote configuration document: a backend/frontend URL pair served from
/// a well-known location, letting a deployment repoint clients without
/// shipping new binaries.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    #[serde(rename = "backendUrl")]
    pub backend_url: String,
    #[serde(rename = "frontendUrl")]
    pub frontend_url: String,
}

/// Fetch the remote config document. Any failure (transport, non-2xx,
/// malformed body) logs a warning and returns `None`; the caller keeps
/// its locally-resolved configuration.
pub async fn fetch_remote_config(config_url: &Url) -> Option<RemoteConfig> {
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(REMOTE_CONFIG_TIMEOUT_SECS))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "Failed to build remote-config client");
            return None;
        }
    };

    let response = match client.get(config_url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            warn!(url = %config_url, error = %e, "Failed to fetch remote config");
            return None;
        }
    };

    if !response.status().is_success() {
        warn!(url = %config_url, status = %response.status(), "Remote config fetch rejected");
        return None;
    }

    match response.json::<RemoteConfig>().await {
        Ok(remote) => Some(remote),
        Err(e) => {
            warn!(url = %config_url, error = %e, "Malformed remote config document");
            None
        }
    }
}
