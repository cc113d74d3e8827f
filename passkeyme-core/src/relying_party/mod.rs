//! HTTP client for the relying-party backend.
//!
//! The backend exposes four POST endpoints under `<base_url>/<app_id>/`:
//!
//! - `start_registration` `{"username","displayName"}` → `{"challenge": <envelope>}`
//! - `complete_registration` `{"username","credential"}`
//! - `start_authentication` `{"username"}` → `{"challenge": <envelope>}`
//! - `complete_authentication` `{"credential"}`
//!
//! `credential` is the credential envelope serialized to a JSON string.
//! Requests authenticate with a static `x-api-key` header.
//!
//! Only `start_*` calls are retried on transient errors; a `complete_*` call
//! consumes the server-side challenge and is never replayed.

mod config;
mod flow;

pub use config::{RelyingPartyConfig, DEFAULT_BASE_URL};
pub use flow::{CompletedCeremony, RelyingPartyFlow};

use std::time::{Duration, Instant};

use backoff::{future::retry_notify, ExponentialBackoff};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::challenge::{
    decode_authentication_challenge, decode_registration_challenge, AuthenticationChallenge,
    RegistrationChallenge,
};
use crate::credential::EncodedCredentialEnvelope;
use crate::error::{PasskeyError, Result};

/// Header carrying the static API key.
pub const API_KEY_HEADER: &str = "x-api-key";

const INITIAL_INTERVAL: Duration = Duration::from_millis(100);
const MAX_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StartRegistrationBody<'a> {
    username: &'a str,
    display_name: &'a str,
}

#[derive(Serialize)]
struct CompleteRegistrationBody<'a> {
    username: &'a str,
    credential: String,
}

#[derive(Serialize)]
struct StartAuthenticationBody<'a> {
    username: &'a str,
}

#[derive(Serialize)]
struct CompleteAuthenticationBody {
    credential: String,
}

/// Client for the relying-party backend.
pub struct RelyingPartyClient {
    client: Client,
    config: RelyingPartyConfig,
}

impl RelyingPartyClient {
    #[instrument(level = "debug", skip_all, fields(
        base_url = %config.base_url,
        app_id = %config.app_id,
        timeout_ms = config.timeout.as_millis() as u64
    ))]
    pub fn new(config: RelyingPartyConfig) -> Result<Self> {
        if config.https_only && config.base_url.scheme() != "https" {
            return Err(PasskeyError::Config(format!(
                "Refusing non-HTTPS relying party URL `{}`",
                config.base_url
            )));
        }

        let mut builder = Client::builder().timeout(config.timeout);
        if config.https_only {
            builder = builder
                .https_only(true)
                .min_tls_version(reqwest::tls::Version::TLS_1_2);
        }

        let client = builder.build().map_err(|e| {
            warn!(error = %e, "Failed to create HTTP client");
            PasskeyError::Config(format!("Failed to create HTTP client: {e}"))
        })?;

        debug!("Relying party client created");
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RelyingPartyConfig {
        &self.config
    }

    /// Ask the backend for a registration challenge.
    #[instrument(level = "info", skip(self), fields(endpoint = "start_registration"))]
    pub async fn start_registration(
        &self,
        username: &str,
        display_name: &str,
    ) -> Result<RegistrationChallenge> {
        let body = StartRegistrationBody {
            username,
            display_name,
        };
        let text = self
            .post(self.config.endpoint("start_registration"), &body, true)
            .await?;
        decode_registration_challenge(&text)
    }

    /// Submit an attestation envelope.
    #[instrument(level = "info", skip(self, credential), fields(endpoint = "complete_registration"))]
    pub async fn complete_registration(
        &self,
        username: &str,
        credential: &EncodedCredentialEnvelope,
    ) -> Result<Value> {
        let body = CompleteRegistrationBody {
            username,
            credential: credential.to_json()?,
        };
        let text = self
            .post(self.config.endpoint("complete_registration"), &body, false)
            .await?;
        Ok(parse_reply(text))
    }

    /// Ask the backend for an authentication challenge.
    #[instrument(level = "info", skip(self), fields(endpoint = "start_authentication"))]
    pub async fn start_authentication(&self, username: &str) -> Result<AuthenticationChallenge> {
        let body = StartAuthenticationBody { username };
        let text = self
            .post(self.config.endpoint("start_authentication"), &body, true)
            .await?;
        decode_authentication_challenge(&text)
    }

    /// Submit an assertion envelope.
    #[instrument(level = "info", skip_all, fields(endpoint = "complete_authentication"))]
    pub async fn complete_authentication(
        &self,
        credential: &EncodedCredentialEnvelope,
    ) -> Result<Value> {
        let body = CompleteAuthenticationBody {
            credential: credential.to_json()?,
        };
        let text = self
            .post(self.config.endpoint("complete_authentication"), &body, false)
            .await?;
        Ok(parse_reply(text))
    }

    async fn post<B: Serialize + Sync>(&self, url: Url, body: &B, retry: bool) -> Result<String> {
        let start = Instant::now();

        let result = if retry {
            retry_notify(
                self.build_backoff(),
                || async { self.post_once(&url, body).await },
                |err: PasskeyError, duration: Duration| {
                    warn!(
                        error = %err,
                        retry_after_ms = duration.as_millis() as u64,
                        "Retry scheduled"
                    );
                },
            )
            .await
        } else {
            self.post_once(&url, body).await.map_err(|e| match e {
                backoff::Error::Permanent(err) => err,
                backoff::Error::Transient { err, .. } => err,
            })
        };

        let total_latency_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => info!(total_latency_ms, "Relying party request succeeded"),
            Err(e) => warn!(error = %e, total_latency_ms, "Relying party request failed"),
        }
        result
    }

    async fn post_once<B: Serialize>(
        &self,
        url: &Url,
        body: &B,
    ) -> std::result::Result<String, backoff::Error<PasskeyError>> {
        let start = Instant::now();

        let response = self
            .client
            .post(url.clone())
            .header(API_KEY_HEADER, self.config.api_key.as_str())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                let latency_ms = start.elapsed().as_millis() as u64;
                if is_transient_error(&e) {
                    warn!(error = %e, latency_ms, "Transient error, will retry");
                    backoff::Error::transient(PasskeyError::HttpError(e))
                } else {
                    warn!(error = %e, latency_ms, "Permanent error, aborting");
                    backoff::Error::permanent(PasskeyError::HttpError(e))
                }
            })?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        let text = response.text().await.map_err(|e| {
            warn!(error = %e, "Failed to read response body");
            backoff::Error::permanent(PasskeyError::HttpError(e))
        })?;

        if !status.is_success() {
            let err = PasskeyError::RelyingParty {
                status: status.as_u16(),
                message: text,
            };
            return if is_transient_status(status) {
                warn!(status = %status, "Transient HTTP status, will retry");
                Err(backoff::Error::transient(err))
            } else {
                warn!(status = %status, "Permanent HTTP error");
                Err(backoff::Error::permanent(err))
            };
        }

        debug!(
            latency_ms = start.elapsed().as_millis() as u64,
            bytes = text.len(),
            "Request completed successfully"
        );
        Ok(text)
    }

    fn build_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: INITIAL_INTERVAL,
            max_interval: MAX_INTERVAL,
            max_elapsed_time: Some(self.config.timeout * self.config.max_retries),
            ..Default::default()
        }
    }
}

/// Backend replies are usually JSON but some deployments answer in plain text.
fn parse_reply(text: String) -> Value {
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

/// Check if a reqwest error is transient and should be retried.
pub fn is_transient_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}

/// Check if an HTTP status code indicates a transient error.
pub fn is_transient_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
            | StatusCode::BAD_GATEWAY
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_status_codes() {
        assert!(is_transient_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_transient_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_transient_status(StatusCode::GATEWAY_TIMEOUT));
        assert!(is_transient_status(StatusCode::BAD_GATEWAY));
        assert!(!is_transient_status(StatusCode::UNAUTHORIZED));
        assert!(!is_transient_status(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn test_parse_reply() {
        assert_eq!(
            parse_reply(r#"{"verified":true}"#.to_string()),
            serde_json::json!({ "verified": true })
        );
        assert_eq!(
            parse_reply("Registration successful".to_string()),
            Value::String("Registration successful".into())
        );
    }

    #[test]
    fn test_refuses_plain_http_by_default() {
        let config = RelyingPartyConfig::new("http://127.0.0.1:9", "app", "key").unwrap();
        assert!(matches!(
            RelyingPartyClient::new(config),
            Err(PasskeyError::Config(_))
        ));
    }

    #[test]
    fn test_create_client() {
        let config = RelyingPartyConfig::new(DEFAULT_BASE_URL, "app", "key").unwrap();
        assert!(RelyingPartyClient::new(config).is_ok());
    }

    #[test]
    fn test_request_bodies_use_backend_field_names() {
        let body = serde_json::to_value(StartRegistrationBody {
            username: "testuser",
            display_name: "Test User",
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "username": "testuser", "displayName": "Test User" })
        );
    }
}
