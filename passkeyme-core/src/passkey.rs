//! Decode → ceremony → encode pipeline.

use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use crate::ceremony::{AuthenticationRequest, CeremonyProvider, RegistrationRequest};
use crate::challenge::{
    decode_authentication_challenge, decode_registration_challenge, AuthenticationChallenge,
    RegistrationChallenge,
};
use crate::credential::{
    encode_authentication_outcome, encode_registration_outcome, EncodedCredentialEnvelope,
};
use crate::error::Result;

/// Runs passkey ceremonies through a [`CeremonyProvider`].
///
/// Holds no per-ceremony state, so one client can serve concurrent
/// ceremonies.
pub struct PasskeyClient<P> {
    provider: P,
}

impl<P: CeremonyProvider> PasskeyClient<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Create a passkey for a registration envelope issued by the relying party.
    pub async fn register(&self, challenge_json: &str) -> Result<EncodedCredentialEnvelope> {
        let challenge = decode_registration_challenge(challenge_json)?;
        self.register_challenge(&challenge).await
    }

    /// Assert a passkey for an authentication envelope issued by the relying party.
    pub async fn authenticate(&self, challenge_json: &str) -> Result<EncodedCredentialEnvelope> {
        let challenge = decode_authentication_challenge(challenge_json)?;
        self.authenticate_challenge(&challenge).await
    }

    #[instrument(level = "info", skip_all, fields(
        provider = self.provider.name(),
        rp_id = %challenge.relying_party.id,
        user = %challenge.user.name
    ))]
    pub async fn register_challenge(
        &self,
        challenge: &RegistrationChallenge,
    ) -> Result<EncodedCredentialEnvelope> {
        let start = Instant::now();
        let request = RegistrationRequest::from_challenge(challenge);

        debug!("Starting registration ceremony");
        let outcome = self.provider.begin_registration(&request).await;

        let result = encode_registration_outcome(&outcome);
        log_result("registration", &result, start);
        result
    }

    #[instrument(level = "info", skip_all, fields(
        provider = self.provider.name(),
        rp_id = %challenge.rp_id
    ))]
    pub async fn authenticate_challenge(
        &self,
        challenge: &AuthenticationChallenge,
    ) -> Result<EncodedCredentialEnvelope> {
        let start = Instant::now();
        let request = AuthenticationRequest::from_challenge(challenge)?;

        debug!(
            allowed = request.allowed_credential_ids.len(),
            "Starting authentication ceremony"
        );
        let outcome = self.provider.begin_authentication(&request).await;

        let result = encode_authentication_outcome(&outcome);
        log_result("authentication", &result, start);
        result
    }
}

fn log_result(ceremony: &str, result: &Result<EncodedCredentialEnvelope>, start: Instant) {
    let latency_ms = start.elapsed().as_millis() as u64;
    match result {
        Ok(envelope) => info!(
            ceremony,
            credential_id = %envelope.id(),
            latency_ms,
            "Ceremony completed"
        ),
        Err(e) => warn!(ceremony, error = %e, latency_ms, "Ceremony failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ceremony::{MockAuthenticator, MockAuthenticatorConfig};
    use crate::codec::base64url_encode;
    use crate::error::{CeremonyFailure, PasskeyError};
    use serde_json::json;

    fn registration_json() -> String {
        json!({
            "publicKey": {
                "rp": { "name": "Passkeyme", "id": "example.com" },
                "user": { "id": "user-1", "name": "alice", "displayName": "Alice" },
                "challenge": "server-challenge-1",
                "pubKeyCredParams": [{ "type": "public-key", "alg": -7 }]
            }
        })
        .to_string()
    }

    fn authentication_json(allow: &[String]) -> String {
        let allow: Vec<_> = allow
            .iter()
            .map(|id| json!({ "type": "public-key", "id": id }))
            .collect();
        json!({
            "publicKey": {
                "challenge": "server-challenge-2",
                "rpId": "example.com",
                "allowCredentials": allow
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_register_restores_plaintext_challenge() {
        let client = PasskeyClient::new(MockAuthenticator::default());
        let envelope = client.register(&registration_json()).await.unwrap();

        let client_data = envelope.client_data().unwrap();
        assert_eq!(client_data.challenge, "server-challenge-1");
        assert!(!client_data.cross_origin);
        assert_eq!(
            envelope.id(),
            base64url_encode(client.provider().credential_id("example.com", b"user-1"))
        );
    }

    #[tokio::test]
    async fn test_authenticate_with_allowed_credential() {
        let client = PasskeyClient::new(MockAuthenticator::for_user(1, b"user-1".to_vec()));
        let id = base64url_encode([5, 6, 7]);
        let envelope = client
            .authenticate(&authentication_json(&[id.clone()]))
            .await
            .unwrap();

        let EncodedCredentialEnvelope::Assertion(assertion) = envelope else {
            panic!("expected assertion envelope");
        };
        assert_eq!(assertion.id, id);
        assert_eq!(assertion.response.user_handle, base64url_encode("user-1"));
        // Assertion clientDataJSON keeps the platform's Base64URL challenge
        assert_eq!(
            assertion.client_data().unwrap().challenge,
            base64url_encode("server-challenge-2")
        );
    }

    #[tokio::test]
    async fn test_cancelled_ceremony_is_surfaced() {
        let client = PasskeyClient::new(MockAuthenticator::with_config(MockAuthenticatorConfig {
            fail_with: Some(CeremonyFailure::Cancelled),
            ..Default::default()
        }));

        let err = client.register(&registration_json()).await.unwrap_err();
        assert!(matches!(
            err,
            PasskeyError::CeremonyFailed(CeremonyFailure::Cancelled)
        ));
    }

    #[tokio::test]
    async fn test_missing_user_handle_is_missing_field() {
        let client = PasskeyClient::new(MockAuthenticator::default());
        let err = client
            .authenticate(&authentication_json(&[]))
            .await
            .unwrap_err();
        assert!(matches!(err, PasskeyError::MissingField("userHandle")));
    }

    #[tokio::test]
    async fn test_malformed_challenge_never_reaches_provider() {
        let client = PasskeyClient::new(MockAuthenticator::default());
        let err = client.register("{\"publicKey\":{}}").await.unwrap_err();
        assert!(matches!(err, PasskeyError::MalformedChallenge(_)));
    }

    #[tokio::test]
    async fn test_concurrent_ceremonies_are_independent() {
        let client = std::sync::Arc::new(PasskeyClient::new(MockAuthenticator::for_user(
            3,
            b"user-1".to_vec(),
        )));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let client = client.clone();
                tokio::spawn(async move {
                    let json = json!({
                        "publicKey": {
                            "challenge": format!("challenge-{i}"),
                            "rpId": "example.com"
                        }
                    })
                    .to_string();
                    let envelope = client.authenticate(&json).await.unwrap();
                    (i, envelope.client_data().unwrap().challenge)
                })
            })
            .collect();

        for handle in handles {
            let (i, challenge) = handle.await.unwrap();
            assert_eq!(challenge, base64url_encode(format!("challenge-{i}")));
        }
    }
}
