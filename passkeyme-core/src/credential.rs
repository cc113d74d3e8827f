//! Ceremony outcomes and the credential envelopes sent to the relying party.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client_data::{canonicalize_client_data, ClientData};
use crate::codec::{base64url_decode, base64url_encode};
use crate::error::{CeremonyFailure, PasskeyError, Result};

/// Value of the `type` member of every envelope.
pub const PUBLIC_KEY_CREDENTIAL_TYPE: &str = "public-key";

/// Value of `authenticatorAttachment` on assertion envelopes.
pub const PLATFORM_ATTACHMENT: &str = "platform";

/// Raw output of a registration ceremony.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationResult {
    pub credential_id: Vec<u8>,
    /// Platforms may omit the attestation object; encoding then fails.
    pub attestation_object: Option<Vec<u8>>,
    pub client_data_json: Vec<u8>,
}

/// Raw output of an authentication ceremony.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionResult {
    pub credential_id: Vec<u8>,
    pub authenticator_data: Option<Vec<u8>>,
    pub signature: Option<Vec<u8>>,
    pub user_handle: Option<Vec<u8>>,
    pub client_data_json: Vec<u8>,
}

/// What a credential ceremony delivered to its completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CeremonyOutcome {
    Attestation(AttestationResult),
    Assertion(AssertionResult),
    Failure(CeremonyFailure),
}

impl CeremonyOutcome {
    fn shape(&self) -> &'static str {
        match self {
            Self::Attestation(_) => "attestation",
            Self::Assertion(_) => "assertion",
            Self::Failure(_) => "failure",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationResponse {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    #[serde(rename = "attestationObject")]
    pub attestation_object: String,
}

/// Registration credential in the shape the backend verifier expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationEnvelope {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "rawId")]
    pub raw_id: String,
    pub response: AttestationResponse,
}

impl AttestationEnvelope {
    /// Decode the embedded clientDataJSON.
    pub fn client_data(&self) -> Result<ClientData> {
        ClientData::from_json(&base64url_decode(&self.response.client_data_json)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionResponse {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    #[serde(rename = "authenticatorData")]
    pub authenticator_data: String,
    pub signature: String,
    #[serde(rename = "userHandle")]
    pub user_handle: String,
}

/// Authentication credential in the shape the backend verifier expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionEnvelope {
    #[serde(rename = "authenticatorAttachment")]
    pub authenticator_attachment: String,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "rawId")]
    pub raw_id: String,
    pub response: AssertionResponse,
}

impl AssertionEnvelope {
    /// Decode the embedded clientDataJSON.
    pub fn client_data(&self) -> Result<ClientData> {
        ClientData::from_json(&base64url_decode(&self.response.client_data_json)?)
    }
}

/// Wire artifact handed to the relying party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EncodedCredentialEnvelope {
    Attestation(AttestationEnvelope),
    Assertion(AssertionEnvelope),
}

impl EncodedCredentialEnvelope {
    /// Compact JSON with the fixed member order.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| PasskeyError::EncodingError(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| PasskeyError::EncodingError(e.to_string()))
    }

    /// Base64URL credential id.
    pub fn id(&self) -> &str {
        match self {
            Self::Attestation(envelope) => &envelope.id,
            Self::Assertion(envelope) => &envelope.id,
        }
    }

    pub fn client_data(&self) -> Result<ClientData> {
        match self {
            Self::Attestation(envelope) => envelope.client_data(),
            Self::Assertion(envelope) => envelope.client_data(),
        }
    }
}

/// Encode a registration result.
///
/// The clientDataJSON is canonicalized before encoding (see
/// [`canonicalize_client_data`]).
pub fn encode_attestation_response(result: &AttestationResult) -> Result<EncodedCredentialEnvelope> {
    let attestation_object = result
        .attestation_object
        .as_deref()
        .ok_or(PasskeyError::MissingField("attestationObject"))?;

    let id = base64url_encode(&result.credential_id);
    let client_data = canonicalize_client_data(&result.client_data_json)?;

    debug!(
        credential_id_len = result.credential_id.len(),
        attestation_object_len = attestation_object.len(),
        "Encoded attestation response"
    );

    Ok(EncodedCredentialEnvelope::Attestation(AttestationEnvelope {
        raw_id: id.clone(),
        id,
        kind: PUBLIC_KEY_CREDENTIAL_TYPE.to_string(),
        response: AttestationResponse {
            client_data_json: base64url_encode(client_data),
            attestation_object: base64url_encode(attestation_object),
        },
    }))
}

/// Encode an authentication result.
///
/// The clientDataJSON is passed through as the platform produced it. Only the
/// registration path rewrites the challenge; the backend currently verifies
/// assertions against the platform's own encoding.
pub fn encode_assertion_response(result: &AssertionResult) -> Result<EncodedCredentialEnvelope> {
    let authenticator_data = result
        .authenticator_data
        .as_deref()
        .ok_or(PasskeyError::MissingField("authenticatorData"))?;
    let signature = result
        .signature
        .as_deref()
        .ok_or(PasskeyError::MissingField("signature"))?;
    let user_handle = result
        .user_handle
        .as_deref()
        .ok_or(PasskeyError::MissingField("userHandle"))?;

    let id = base64url_encode(&result.credential_id);

    debug!(
        credential_id_len = result.credential_id.len(),
        authenticator_data_len = authenticator_data.len(),
        "Encoded assertion response"
    );

    Ok(EncodedCredentialEnvelope::Assertion(AssertionEnvelope {
        authenticator_attachment: PLATFORM_ATTACHMENT.to_string(),
        raw_id: id.clone(),
        id,
        kind: PUBLIC_KEY_CREDENTIAL_TYPE.to_string(),
        response: AssertionResponse {
            client_data_json: base64url_encode(&result.client_data_json),
            authenticator_data: base64url_encode(authenticator_data),
            signature: base64url_encode(signature),
            user_handle: base64url_encode(user_handle),
        },
    }))
}

/// Encode the outcome of a registration ceremony.
pub fn encode_registration_outcome(outcome: &CeremonyOutcome) -> Result<EncodedCredentialEnvelope> {
    match outcome {
        CeremonyOutcome::Attestation(result) => encode_attestation_response(result),
        CeremonyOutcome::Failure(failure) => Err(PasskeyError::CeremonyFailed(failure.clone())),
        other => Err(PasskeyError::UnknownCredentialKind {
            expected: "attestation",
            found: other.shape(),
        }),
    }
}

/// Encode the outcome of an authentication ceremony.
pub fn encode_authentication_outcome(
    outcome: &CeremonyOutcome,
) -> Result<EncodedCredentialEnvelope> {
    match outcome {
        CeremonyOutcome::Assertion(result) => encode_assertion_response(result),
        CeremonyOutcome::Failure(failure) => Err(PasskeyError::CeremonyFailed(failure.clone())),
        other => Err(PasskeyError::UnknownCredentialKind {
            expected: "assertion",
            found: other.shape(),
        }),
    }
}
