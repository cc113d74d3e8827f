//! Deterministic software authenticator for tests and offline demos.
//!
//! Produces structurally valid WebAuthn artifacts (clientDataJSON, CBOR
//! attestation object, authenticator data) but NOT verifiable signatures.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use ciborium::value::Value;
use sha2::Sha256;
use sha3::{Digest, Sha3_256};
use tracing::{debug, instrument, warn};

use super::{AuthenticationRequest, CeremonyProvider, Completion, RegistrationRequest};
use crate::client_data::ClientData;
use crate::codec::base64url_encode;
use crate::credential::{AssertionResult, AttestationResult, CeremonyOutcome};
use crate::error::CeremonyFailure;

const FLAG_USER_PRESENT: u8 = 0x01;
const FLAG_USER_VERIFIED: u8 = 0x04;
const FLAG_ATTESTED_CREDENTIAL_DATA: u8 = 0x40;

const CREDENTIAL_ID_LEN: usize = 16;

/// Configuration for [`MockAuthenticator`].
#[derive(Debug, Clone)]
pub struct MockAuthenticatorConfig {
    /// Seed for credential ids and key material.
    pub seed: u64,
    /// Origin written into clientDataJSON (defaults to `https://<rp id>`).
    pub origin: Option<String>,
    /// Value written into clientDataJSON's `crossOrigin`.
    pub cross_origin: bool,
    /// User handle returned by assertions; empty means none is returned.
    pub user_id: Vec<u8>,
    /// Fail every ceremony with this reason.
    pub fail_with: Option<CeremonyFailure>,
}

impl Default for MockAuthenticatorConfig {
    fn default() -> Self {
        Self {
            seed: 0xDEADBEEF_CAFEBABE,
            origin: None,
            cross_origin: true,
            user_id: Vec::new(),
            fail_with: None,
        }
    }
}

/// Mock platform authenticator.
/// WARNING: Do not use in production - signatures are placeholders!
pub struct MockAuthenticator {
    config: MockAuthenticatorConfig,
    sign_count: AtomicU32,
}

impl MockAuthenticator {
    pub fn new(seed: u64) -> Self {
        Self::with_config(MockAuthenticatorConfig {
            seed,
            ..Default::default()
        })
    }

    pub fn with_config(config: MockAuthenticatorConfig) -> Self {
        Self {
            config,
            sign_count: AtomicU32::new(0),
        }
    }

    /// Mock returning `user_id` as the user handle on assertions.
    pub fn for_user(seed: u64, user_id: impl Into<Vec<u8>>) -> Self {
        Self::with_config(MockAuthenticatorConfig {
            seed,
            user_id: user_id.into(),
            ..Default::default()
        })
    }

    /// Credential id this mock creates for a relying party and user.
    pub fn credential_id(&self, relying_party_id: &str, user_id: &[u8]) -> Vec<u8> {
        let mut hasher = Sha3_256::new();
        hasher.update(self.config.seed.to_le_bytes());
        hasher.update(relying_party_id.as_bytes());
        hasher.update(user_id);
        hasher.finalize()[..CREDENTIAL_ID_LEN].to_vec()
    }

    fn client_data_json(
        &self,
        kind: &str,
        challenge: &[u8],
        relying_party_id: &str,
    ) -> Result<Vec<u8>, CeremonyFailure> {
        ClientData {
            kind: kind.to_string(),
            challenge: base64url_encode(challenge),
            origin: self
                .config
                .origin
                .clone()
                .unwrap_or_else(|| format!("https://{relying_party_id}")),
            cross_origin: self.config.cross_origin,
        }
        .to_json()
        .map_err(|e| CeremonyFailure::Platform(e.to_string()))
    }

    /// Layout: rpIdHash (32) | flags (1) | signCount (4) | attested credential data
    fn authenticator_data(
        &self,
        relying_party_id: &str,
        sign_count: u32,
        attested: Option<&[u8]>,
    ) -> Result<Vec<u8>, CeremonyFailure> {
        let mut flags = FLAG_USER_PRESENT | FLAG_USER_VERIFIED;
        if attested.is_some() {
            flags |= FLAG_ATTESTED_CREDENTIAL_DATA;
        }

        let mut data = Vec::with_capacity(37);
        data.extend_from_slice(&Sha256::digest(relying_party_id.as_bytes()));
        data.push(flags);
        data.extend_from_slice(&sign_count.to_be_bytes());

        if let Some(credential_id) = attested {
            data.extend_from_slice(&[0u8; 16]); // AAGUID
            data.extend_from_slice(&(credential_id.len() as u16).to_be_bytes());
            data.extend_from_slice(credential_id);
            data.extend_from_slice(&self.public_key_cose(credential_id)?);
        }
        Ok(data)
    }

    /// COSE EC2 key map whose coordinates are derived from the seed.
    /// The point is not on P-256; it only has the right shape.
    fn public_key_cose(&self, credential_id: &[u8]) -> Result<Vec<u8>, CeremonyFailure> {
        let coordinate = |label: &[u8]| {
            let mut hasher = Sha3_256::new();
            hasher.update(self.config.seed.to_le_bytes());
            hasher.update(label);
            hasher.update(credential_id);
            Value::Bytes(hasher.finalize().to_vec())
        };

        let key = Value::Map(vec![
            (Value::Integer(1.into()), Value::Integer(2.into())), // kty: EC2
            (Value::Integer(3.into()), Value::Integer((-7).into())), // alg: ES256
            (Value::Integer((-1).into()), Value::Integer(1.into())), // crv: P-256
            (Value::Integer((-2).into()), coordinate(b"x")),
            (Value::Integer((-3).into()), coordinate(b"y")),
        ]);
        to_cbor(&key)
    }

    fn attestation_object(&self, auth_data: Vec<u8>) -> Result<Vec<u8>, CeremonyFailure> {
        let object = Value::Map(vec![
            (Value::Text("fmt".into()), Value::Text("none".into())),
            (Value::Text("attStmt".into()), Value::Map(Vec::new())),
            (Value::Text("authData".into()), Value::Bytes(auth_data)),
        ]);
        to_cbor(&object)
    }

    /// Placeholder over the same bytes a real authenticator signs.
    fn signature(&self, auth_data: &[u8], client_data_json: &[u8]) -> Vec<u8> {
        let mut hasher = Sha3_256::new();
        hasher.update(self.config.seed.to_le_bytes());
        hasher.update(auth_data);
        hasher.update(Sha256::digest(client_data_json));
        hasher.finalize().to_vec()
    }

    fn attest(&self, request: &RegistrationRequest) -> Result<AttestationResult, CeremonyFailure> {
        let credential_id = self.credential_id(&request.relying_party_id, &request.user_id);
        let client_data_json =
            self.client_data_json("webauthn.create", &request.challenge, &request.relying_party_id)?;
        let auth_data =
            self.authenticator_data(&request.relying_party_id, 0, Some(&credential_id))?;

        Ok(AttestationResult {
            attestation_object: Some(self.attestation_object(auth_data)?),
            credential_id,
            client_data_json,
        })
    }

    fn sign_assertion(
        &self,
        request: &AuthenticationRequest,
    ) -> Result<AssertionResult, CeremonyFailure> {
        let credential_id = match request.allowed_credential_ids.first() {
            Some(id) => id.clone(),
            None => self.credential_id(&request.relying_party_id, &self.config.user_id),
        };
        let client_data_json =
            self.client_data_json("webauthn.get", &request.challenge, &request.relying_party_id)?;
        let sign_count = self.sign_count.fetch_add(1, Ordering::SeqCst) + 1;
        let auth_data = self.authenticator_data(&request.relying_party_id, sign_count, None)?;
        let signature = self.signature(&auth_data, &client_data_json);

        Ok(AssertionResult {
            credential_id,
            signature: Some(signature),
            authenticator_data: Some(auth_data),
            user_handle: (!self.config.user_id.is_empty()).then(|| self.config.user_id.clone()),
            client_data_json,
        })
    }

    /// Deliver through a [`Completion`] from another task, the way a
    /// platform callback would.
    async fn deliver(outcome: CeremonyOutcome) -> CeremonyOutcome {
        let (completion, receiver) = Completion::channel();
        tokio::spawn(async move { completion.complete(outcome) });
        receiver.await
    }
}

impl Default for MockAuthenticator {
    fn default() -> Self {
        Self::with_config(MockAuthenticatorConfig::default())
    }
}

fn to_cbor(value: &Value) -> Result<Vec<u8>, CeremonyFailure> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes)
        .map_err(|e| CeremonyFailure::Platform(format!("CBOR encoding failed: {e}")))?;
    Ok(bytes)
}

#[async_trait]
impl CeremonyProvider for MockAuthenticator {
    #[instrument(level = "debug", skip_all, fields(provider = "mock", rp_id = %request.relying_party_id))]
    async fn begin_registration(&self, request: &RegistrationRequest) -> CeremonyOutcome {
        if let Some(failure) = &self.config.fail_with {
            warn!(reason = %failure, "Mock registration scripted to fail");
            return Self::deliver(CeremonyOutcome::Failure(failure.clone())).await;
        }

        let outcome = match self.attest(request) {
            Ok(result) => {
                debug!(
                    credential_id_len = result.credential_id.len(),
                    "Mock attestation created"
                );
                CeremonyOutcome::Attestation(result)
            }
            Err(failure) => CeremonyOutcome::Failure(failure),
        };
        Self::deliver(outcome).await
    }

    #[instrument(level = "debug", skip_all, fields(provider = "mock", rp_id = %request.relying_party_id))]
    async fn begin_authentication(&self, request: &AuthenticationRequest) -> CeremonyOutcome {
        if let Some(failure) = &self.config.fail_with {
            warn!(reason = %failure, "Mock authentication scripted to fail");
            return Self::deliver(CeremonyOutcome::Failure(failure.clone())).await;
        }

        let outcome = match self.sign_assertion(request) {
            Ok(result) => {
                debug!(
                    credential_id_len = result.credential_id.len(),
                    "Mock assertion created"
                );
                CeremonyOutcome::Assertion(result)
            }
            Err(failure) => CeremonyOutcome::Failure(failure),
        };
        Self::deliver(outcome).await
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
