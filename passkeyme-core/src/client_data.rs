//! clientDataJSON canonicalization.
//!
//! Platform authenticators embed the challenge in clientDataJSON as Base64URL
//! of the bytes they were given. The backend expects the plaintext challenge
//! string it issued, `crossOrigin` set to `false`, and the members in the
//! order `type`, `challenge`, `origin`, `crossOrigin`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::codec::base64url_decode_to_text;
use crate::error::{PasskeyError, Result};

/// The members of clientDataJSON this SDK reads or writes.
///
/// Field order here is the serialized order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientData {
    #[serde(rename = "type")]
    pub kind: String,
    pub challenge: String,
    pub origin: String,
    #[serde(rename = "crossOrigin", default)]
    pub cross_origin: bool,
}

impl ClientData {
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| {
            PasskeyError::ChallengeCanonicalizationFailed(format!("invalid clientDataJSON: {e}"))
        })
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| {
            PasskeyError::ChallengeCanonicalizationFailed(format!(
                "failed to serialize clientDataJSON: {e}"
            ))
        })
    }
}

/// Rewrite raw clientDataJSON into the form the backend verifies.
///
/// Members other than `type`, `challenge` and `origin` are dropped.
pub fn canonicalize_client_data(raw: &[u8]) -> Result<Vec<u8>> {
    let value: Value = serde_json::from_slice(raw).map_err(|e| {
        PasskeyError::ChallengeCanonicalizationFailed(format!("invalid clientDataJSON: {e}"))
    })?;

    let encoded_challenge = string_member(&value, "challenge")?;
    let challenge = base64url_decode_to_text(encoded_challenge).map_err(|e| {
        PasskeyError::ChallengeCanonicalizationFailed(format!("challenge is not Base64URL UTF-8: {e}"))
    })?;

    let canonical = ClientData {
        kind: string_member(&value, "type")?.to_string(),
        challenge,
        origin: string_member(&value, "origin")?.to_string(),
        cross_origin: false,
    };

    debug!(
        kind = %canonical.kind,
        origin = %canonical.origin,
        "Canonicalized clientDataJSON"
    );
    canonical.to_json()
}

fn string_member<'a>(value: &'a Value, name: &str) -> Result<&'a str> {
    match value.get(name) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(PasskeyError::ChallengeCanonicalizationFailed(format!(
            "`{name}` is not a string"
        ))),
        None => Err(PasskeyError::ChallengeCanonicalizationFailed(format!(
            "missing `{name}`"
        ))),
    }
}
