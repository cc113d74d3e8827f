//! Relying-party connection settings.

use std::time::Duration;

use url::Url;
use zeroize::Zeroizing;

use crate::error::{PasskeyError, Result};

/// Default Passkeyme backend; the app id is appended as a path segment.
pub const DEFAULT_BASE_URL: &str = "https://passkeyme.com/webauthn";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Configuration passed to [`RelyingPartyClient::new`](super::RelyingPartyClient::new).
#[derive(Clone)]
pub struct RelyingPartyConfig {
    /// Backend base URL (endpoints live under `<base_url>/<app_id>/`).
    pub base_url: Url,
    /// Application id issued by the backend.
    pub app_id: String,
    /// Static API key sent as `x-api-key`.
    pub api_key: Zeroizing<String>,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retry attempts for transient errors on `start_*` calls.
    pub max_retries: u32,
    /// Refuse plain HTTP (disable only for local development and tests).
    pub https_only: bool,
}

impl std::fmt::Debug for RelyingPartyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelyingPartyConfig")
            .field("base_url", &self.base_url.as_str())
            .field("app_id", &self.app_id)
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("https_only", &self.https_only)
            .finish()
    }
}

impl RelyingPartyConfig {
    pub fn new(
        base_url: &str,
        app_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| PasskeyError::Config(format!("Invalid base URL `{base_url}`: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(PasskeyError::Config(format!(
                "Base URL `{base_url}` cannot have path segments"
            )));
        }

        let app_id = app_id.into();
        if app_id.is_empty() {
            return Err(PasskeyError::Config("App id must not be empty".into()));
        }

        Ok(Self {
            base_url,
            app_id,
            api_key: Zeroizing::new(api_key.into()),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            https_only: true,
        })
    }

    /// Create configuration from environment variables.
    ///
    /// Required: `PASSKEYME_APP_ID`, `PASSKEYME_API_KEY`
    /// Optional: `PASSKEYME_BASE_URL`, `PASSKEYME_TIMEOUT_SECS`,
    /// `PASSKEYME_ALLOW_HTTP` (`true` to permit plain HTTP)
    pub fn from_env() -> Result<Self> {
        let app_id = std::env::var("PASSKEYME_APP_ID").map_err(|_| {
            PasskeyError::Config("PASSKEYME_APP_ID environment variable not set".into())
        })?;
        let api_key = std::env::var("PASSKEYME_API_KEY").map_err(|_| {
            PasskeyError::Config("PASSKEYME_API_KEY environment variable not set".into())
        })?;
        let base_url =
            std::env::var("PASSKEYME_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let mut config = Self::new(&base_url, app_id, api_key)?;

        if let Some(secs) = std::env::var("PASSKEYME_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }
        config.https_only = std::env::var("PASSKEYME_ALLOW_HTTP")
            .map(|v| v.to_lowercase() != "true")
            .unwrap_or(true);

        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Permit plain HTTP, e.g. for a backend on localhost.
    pub fn allow_http(mut self) -> Self {
        self.https_only = false;
        self
    }

    /// URL of a backend endpoint such as `start_registration`.
    pub fn endpoint(&self, name: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&self.app_id).push(name);
        }
        url
    }
}
