//! Relying-party challenge envelopes.
//!
//! The backend issues a `{"publicKey": {...}}` document for each ceremony.
//! Its `challenge` member is handed to the platform as the UTF-8 bytes of the
//! literal string; it is never Base64URL-decoded on the way in.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{PasskeyError, Result};

fn default_attestation() -> String {
    "none".to_string()
}

fn default_user_verification() -> String {
    "preferred".to_string()
}

/// Relying party as named in a registration envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelyingPartyEntity {
    pub id: String,
    pub name: String,
}

/// Account the new credential is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntity {
    pub id: String,
    pub name: String,
    pub display_name: String,
}

/// One acceptable credential algorithm (COSE identifier, e.g. -7 for ES256).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialParameter {
    #[serde(rename = "type")]
    pub kind: String,
    pub alg: i64,
}

/// Reference to an existing credential (excluded or allowed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    /// Base64URL credential id, as issued by the relying party.
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorSelection {
    #[serde(default)]
    pub require_resident_key: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resident_key: Option<String>,
    #[serde(default = "default_user_verification")]
    pub user_verification: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator_attachment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extensions {
    #[serde(default)]
    pub uvm: bool,
    #[serde(default)]
    pub cred_props: bool,
}

/// Normalized registration request descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationChallenge {
    #[serde(rename = "rp")]
    pub relying_party: RelyingPartyEntity,
    pub user: UserEntity,
    pub challenge: String,
    pub pub_key_cred_params: Vec<CredentialParameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default = "default_attestation")]
    pub attestation: String,
    #[serde(default)]
    pub exclude_credentials: Vec<CredentialDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator_selection: Option<AuthenticatorSelection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Extensions>,
}

impl RegistrationChallenge {
    /// Challenge bytes passed to the platform: the literal string, UTF-8 encoded.
    pub fn challenge_bytes(&self) -> Vec<u8> {
        self.challenge.as_bytes().to_vec()
    }

    /// User handle passed to the platform: the literal user id, UTF-8 encoded.
    pub fn user_id_bytes(&self) -> Vec<u8> {
        self.user.id.as_bytes().to_vec()
    }

    /// Effective user-verification policy (`"preferred"` when unspecified).
    pub fn user_verification(&self) -> &str {
        self.authenticator_selection
            .as_ref()
            .map(|s| s.user_verification.as_str())
            .unwrap_or("preferred")
    }
}

/// Normalized authentication request descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationChallenge {
    pub challenge: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    pub rp_id: String,
    #[serde(default)]
    pub allow_credentials: Vec<CredentialDescriptor>,
    #[serde(default = "default_user_verification")]
    pub user_verification: String,
}

impl AuthenticationChallenge {
    /// Challenge bytes passed to the platform: the literal string, UTF-8 encoded.
    pub fn challenge_bytes(&self) -> Vec<u8> {
        self.challenge.as_bytes().to_vec()
    }
}

/// Either kind of challenge, for callers that do not know which ceremony
/// the backend started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Challenge {
    Registration(RegistrationChallenge),
    Authentication(AuthenticationChallenge),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T> {
    public_key: T,
}

/// Parse a registration envelope.
pub fn decode_registration_challenge(json: &str) -> Result<RegistrationChallenge> {
    let public_key = unwrap_envelope(json)?;
    let challenge: RegistrationChallenge = parse_public_key(public_key)?;
    if challenge.challenge.is_empty() {
        return Err(PasskeyError::MalformedChallenge("empty challenge".into()));
    }

    debug!(
        rp_id = %challenge.relying_party.id,
        user = %challenge.user.name,
        algorithms = challenge.pub_key_cred_params.len(),
        "Decoded registration challenge"
    );
    Ok(challenge)
}

/// Parse an authentication envelope.
pub fn decode_authentication_challenge(json: &str) -> Result<AuthenticationChallenge> {
    let public_key = unwrap_envelope(json)?;
    let challenge: AuthenticationChallenge = parse_public_key(public_key)?;
    if challenge.challenge.is_empty() {
        return Err(PasskeyError::MalformedChallenge("empty challenge".into()));
    }

    debug!(
        rp_id = %challenge.rp_id,
        allowed = challenge.allow_credentials.len(),
        "Decoded authentication challenge"
    );
    Ok(challenge)
}

/// Parse an envelope of either kind, telling them apart by the presence of `rp`.
pub fn decode_challenge(json: &str) -> Result<Challenge> {
    let public_key = unwrap_envelope(json)?;
    let challenge = if public_key.get("rp").is_some() {
        Challenge::Registration(parse_public_key(public_key)?)
    } else {
        Challenge::Authentication(parse_public_key(public_key)?)
    };

    let nonce = match &challenge {
        Challenge::Registration(c) => &c.challenge,
        Challenge::Authentication(c) => &c.challenge,
    };
    if nonce.is_empty() {
        return Err(PasskeyError::MalformedChallenge("empty challenge".into()));
    }
    Ok(challenge)
}

/// Locate the `{"publicKey": ...}` document.
///
/// The backend's `start_*` endpoints wrap it as `{"challenge": <envelope>}`,
/// where the envelope is either an object or a JSON-encoded string.
fn unwrap_envelope(json: &str) -> Result<Value> {
    let mut value: Value = serde_json::from_str(json)
        .map_err(|e| PasskeyError::MalformedChallenge(format!("invalid JSON: {e}")))?;

    if value.get("publicKey").is_none() {
        match value.get("challenge") {
            Some(Value::String(inner)) => {
                value = serde_json::from_str(inner).map_err(|e| {
                    PasskeyError::MalformedChallenge(format!("invalid embedded challenge: {e}"))
                })?;
            }
            Some(inner @ Value::Object(_)) => value = inner.clone(),
            _ => {}
        }
    }

    let envelope: Envelope<Value> = serde_json::from_value(value)
        .map_err(|e| PasskeyError::MalformedChallenge(e.to_string()))?;
    Ok(envelope.public_key)
}

fn parse_public_key<T: serde::de::DeserializeOwned>(public_key: Value) -> Result<T> {
    serde_json::from_value(public_key).map_err(|e| PasskeyError::MalformedChallenge(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registration_envelope() -> Value {
        json!({
            "publicKey": {
                "rp": { "name": "Passkeyme", "id": "example.com" },
                "user": { "id": "dXNlci0x", "name": "testuser", "displayName": "Test User" },
                "challenge": "qyaYu-kx5cTIAQX8T2k9HjlfhxocEmS5oPUHbrTsXPc",
                "pubKeyCredParams": [
                    { "type": "public-key", "alg": -7 },
                    { "type": "public-key", "alg": -257 }
                ],
                "timeout": 60000,
                "attestation": "direct",
                "excludeCredentials": [
                    { "type": "public-key", "id": "7abVULSdJ1rIERMykLNPOOP9cSA" }
                ],
                "authenticatorSelection": {
                    "requireResidentKey": true,
                    "userVerification": "required"
                },
                "extensions": { "uvm": true, "credProps": true }
            }
        })
    }

    fn authentication_envelope() -> Value {
        json!({
            "publicKey": {
                "challenge": "qyaYu-kx5cTIAQX8T2k9HjlfhxocEmS5oPUHbrTsXPc",
                "timeout": 60000,
                "rpId": "a3b0-58-104-243-37.ngrok-free.app",
                "allowCredentials": [
                    { "type": "public-key", "id": "7abVULSdJ1rIERMykLNPOOP9cSA" },
                    { "type": "public-key", "id": "yhkV34nJFgwinlGe9mXw6McaFKI" }
                ],
                "userVerification": "preferred"
            }
        })
    }

    #[test]
    fn test_registration_fields_extracted_unchanged() {
        let challenge = decode_registration_challenge(&registration_envelope().to_string()).unwrap();

        assert_eq!(challenge.relying_party.id, "example.com");
        assert_eq!(challenge.relying_party.name, "Passkeyme");
        assert_eq!(challenge.user.name, "testuser");
        assert_eq!(challenge.user.id, "dXNlci0x");
        assert_eq!(challenge.user.display_name, "Test User");
        assert_eq!(
            challenge.challenge,
            "qyaYu-kx5cTIAQX8T2k9HjlfhxocEmS5oPUHbrTsXPc"
        );
        assert_eq!(challenge.pub_key_cred_params[0].alg, -7);
        assert_eq!(challenge.timeout, Some(60000));
        assert_eq!(challenge.attestation, "direct");
        assert_eq!(challenge.exclude_credentials.len(), 1);
        assert_eq!(challenge.user_verification(), "required");
        assert_eq!(
            challenge.extensions,
            Some(Extensions {
                uvm: true,
                cred_props: true
            })
        );
    }

    #[test]
    fn test_challenge_bytes_are_literal_utf8() {
        let challenge = decode_registration_challenge(&registration_envelope().to_string()).unwrap();
        assert_eq!(
            challenge.challenge_bytes(),
            b"qyaYu-kx5cTIAQX8T2k9HjlfhxocEmS5oPUHbrTsXPc".to_vec()
        );
        assert_eq!(challenge.user_id_bytes(), b"dXNlci0x".to_vec());
    }

    #[test]
    fn test_registration_missing_user_is_malformed() {
        let mut envelope = registration_envelope();
        envelope["publicKey"]
            .as_object_mut()
            .unwrap()
            .remove("user");

        let result = decode_registration_challenge(&envelope.to_string());
        assert!(matches!(result, Err(PasskeyError::MalformedChallenge(_))));
    }

    #[test]
    fn test_registration_mistyped_field_is_malformed() {
        let mut envelope = registration_envelope();
        envelope["publicKey"]["timeout"] = json!("sixty seconds");

        let result = decode_registration_challenge(&envelope.to_string());
        assert!(matches!(result, Err(PasskeyError::MalformedChallenge(_))));
    }

    #[test]
    fn test_registration_optional_fields_default() {
        let envelope = json!({
            "publicKey": {
                "rp": { "name": "Passkeyme", "id": "example.com" },
                "user": { "id": "u1", "name": "alice", "displayName": "Alice" },
                "challenge": "abc123",
                "pubKeyCredParams": [{ "type": "public-key", "alg": -7 }]
            }
        });

        let challenge = decode_registration_challenge(&envelope.to_string()).unwrap();
        assert_eq!(challenge.attestation, "none");
        assert!(challenge.exclude_credentials.is_empty());
        assert_eq!(challenge.timeout, None);
        assert_eq!(challenge.user_verification(), "preferred");
    }

    #[test]
    fn test_empty_challenge_is_malformed() {
        let mut envelope = registration_envelope();
        envelope["publicKey"]["challenge"] = json!("");
        assert!(matches!(
            decode_registration_challenge(&envelope.to_string()),
            Err(PasskeyError::MalformedChallenge(_))
        ));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        assert!(matches!(
            decode_registration_challenge("{not json"),
            Err(PasskeyError::MalformedChallenge(_))
        ));
        assert!(matches!(
            decode_authentication_challenge("[]"),
            Err(PasskeyError::MalformedChallenge(_))
        ));
    }

    #[test]
    fn test_start_response_wrapper_with_string_envelope() {
        let wrapped = json!({ "challenge": registration_envelope().to_string() });
        let challenge = decode_registration_challenge(&wrapped.to_string()).unwrap();
        assert_eq!(challenge.relying_party.id, "example.com");
    }

    #[test]
    fn test_start_response_wrapper_with_object_envelope() {
        let wrapped = json!({ "challenge": authentication_envelope() });
        let challenge = decode_authentication_challenge(&wrapped.to_string()).unwrap();
        assert_eq!(challenge.rp_id, "a3b0-58-104-243-37.ngrok-free.app");
    }

    #[test]
    fn test_authentication_fields() {
        let challenge =
            decode_authentication_challenge(&authentication_envelope().to_string()).unwrap();

        assert_eq!(challenge.rp_id, "a3b0-58-104-243-37.ngrok-free.app");
        assert_eq!(challenge.timeout, Some(60000));
        assert_eq!(challenge.allow_credentials.len(), 2);
        assert_eq!(challenge.allow_credentials[1].id, "yhkV34nJFgwinlGe9mXw6McaFKI");
        assert_eq!(challenge.user_verification, "preferred");
        assert_eq!(
            challenge.challenge_bytes(),
            b"qyaYu-kx5cTIAQX8T2k9HjlfhxocEmS5oPUHbrTsXPc".to_vec()
        );
    }

    #[test]
    fn test_authentication_missing_rp_id_is_malformed() {
        let mut envelope = authentication_envelope();
        envelope["publicKey"].as_object_mut().unwrap().remove("rpId");
        assert!(matches!(
            decode_authentication_challenge(&envelope.to_string()),
            Err(PasskeyError::MalformedChallenge(_))
        ));
    }

    #[test]
    fn test_decode_challenge_detects_kind() {
        assert!(matches!(
            decode_challenge(&registration_envelope().to_string()).unwrap(),
            Challenge::Registration(_)
        ));
        assert!(matches!(
            decode_challenge(&authentication_envelope().to_string()).unwrap(),
            Challenge::Authentication(_)
        ));
    }
}
