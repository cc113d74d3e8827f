//! WebAssembly bindings for the Passkeyme encoding layer.
//!
//! Lets a browser or hybrid app decode relying-party challenges and build
//! credential envelopes without a round trip through native code. The
//! platform ceremony itself stays in the host (`navigator.credentials`).
//!
//! Every export returns a JSON string, `{"ok":true,"value":...}` on success or
//! `{"ok":false,"error":"..."}` on failure.

use passkeyme_core::{
    base64url_decode, base64url_encode, canonicalize_client_data, decode_authentication_challenge,
    decode_registration_challenge, encode_assertion_response, encode_attestation_response,
    AssertionResult, AttestationResult, EncodedCredentialEnvelope, PasskeyError,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

#[derive(Serialize)]
#[serde(untagged)]
enum Response<T> {
    Ok { ok: bool, value: T },
    Err { ok: bool, error: String },
}

fn respond<T: Serialize>(result: Result<T, PasskeyError>) -> String {
    let response = match result {
        Ok(value) => Response::Ok { ok: true, value },
        Err(e) => Response::Err {
            ok: false,
            error: e.to_string(),
        },
    };
    serde_json::to_string(&response).unwrap_or_else(|e| {
        serde_json::json!({ "ok": false, "error": format!("Serialization error: {e}") })
            .to_string()
    })
}

/// Decode a registration envelope into its normalized descriptor.
#[wasm_bindgen]
pub fn decode_registration_challenge_wasm(json: &str) -> String {
    respond(decode_registration_challenge(json))
}

/// Decode an authentication envelope into its normalized descriptor.
#[wasm_bindgen]
pub fn decode_authentication_challenge_wasm(json: &str) -> String {
    respond(decode_authentication_challenge(json))
}

/// Build an attestation envelope from Base64URL ceremony output.
///
/// # Arguments
/// * `credential_id` - Raw credential id
/// * `attestation_object` - CBOR attestation object
/// * `client_data` - clientDataJSON exactly as the platform produced it
#[wasm_bindgen]
pub fn encode_attestation_wasm(
    credential_id: &str,
    attestation_object: &str,
    client_data: &str,
) -> String {
    respond(encode_attestation(credential_id, attestation_object, client_data))
}

fn encode_attestation(
    credential_id: &str,
    attestation_object: &str,
    client_data: &str,
) -> Result<EncodedCredentialEnvelope, PasskeyError> {
    let result = AttestationResult {
        credential_id: base64url_decode(credential_id)?,
        attestation_object: Some(base64url_decode(attestation_object)?),
        client_data_json: base64url_decode(client_data)?,
    };
    encode_attestation_response(&result)
}

/// Build an assertion envelope from Base64URL ceremony output.
///
/// An empty `user_handle` is treated as absent and fails the encoding.
#[wasm_bindgen]
pub fn encode_assertion_wasm(
    credential_id: &str,
    authenticator_data: &str,
    signature: &str,
    user_handle: &str,
    client_data: &str,
) -> String {
    respond(encode_assertion(
        credential_id,
        authenticator_data,
        signature,
        user_handle,
        client_data,
    ))
}

fn encode_assertion(
    credential_id: &str,
    authenticator_data: &str,
    signature: &str,
    user_handle: &str,
    client_data: &str,
) -> Result<EncodedCredentialEnvelope, PasskeyError> {
    let user_handle = match user_handle {
        "" => None,
        handle => Some(base64url_decode(handle)?),
    };
    let result = AssertionResult {
        credential_id: base64url_decode(credential_id)?,
        authenticator_data: Some(base64url_decode(authenticator_data)?),
        signature: Some(base64url_decode(signature)?),
        user_handle,
        client_data_json: base64url_decode(client_data)?,
    };
    encode_assertion_response(&result)
}

/// Canonicalize Base64URL clientDataJSON; the value is the canonical form, Base64URL.
#[wasm_bindgen]
pub fn canonicalize_client_data_wasm(client_data: &str) -> String {
    respond(
        base64url_decode(client_data)
            .and_then(|raw| canonicalize_client_data(&raw))
            .map(base64url_encode),
    )
}

/// Get the library version.
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn parse(response: String) -> Value {
        serde_json::from_str(&response).unwrap()
    }

    fn client_data(challenge: &str) -> String {
        base64url_encode(format!(
            r#"{{"type":"webauthn.create","challenge":"{}","origin":"https://example.com","crossOrigin":true}}"#,
            base64url_encode(challenge)
        ))
    }

    #[test]
    fn test_decode_registration_ok() {
        let json = r#"{"publicKey":{"rp":{"name":"RP","id":"example.com"},"user":{"id":"dQ","name":"u","displayName":"U"},"challenge":"c1","pubKeyCredParams":[{"type":"public-key","alg":-7}]}}"#;
        let value = parse(decode_registration_challenge_wasm(json));
        assert_eq!(value["ok"], true);
        assert_eq!(value["value"]["rp"]["id"], "example.com");
        assert_eq!(value["value"]["challenge"], "c1");
    }

    #[test]
    fn test_decode_error_is_reported() {
        let value = parse(decode_authentication_challenge_wasm("not json"));
        assert_eq!(value["ok"], false);
        assert!(value["error"]
            .as_str()
            .unwrap()
            .starts_with("Malformed challenge"));
        assert!(value.get("value").is_none());
    }

    #[test]
    fn test_canonicalize() {
        let value = parse(canonicalize_client_data_wasm(&client_data("abc123")));
        assert_eq!(value["ok"], true);
        let canonical = passkeyme_core::base64url_decode_to_text(value["value"].as_str().unwrap())
            .unwrap();
        assert_eq!(
            canonical,
            r#"{"type":"webauthn.create","challenge":"abc123","origin":"https://example.com","crossOrigin":false}"#
        );
    }

    #[test]
    fn test_encode_attestation() {
        let value = parse(encode_attestation_wasm(
            &base64url_encode([1, 2, 3]),
            &base64url_encode([4, 5, 6]),
            &client_data("X"),
        ));
        assert_eq!(value["ok"], true);
        assert_eq!(value["value"]["id"], base64url_encode([1, 2, 3]));
        assert_eq!(value["value"]["rawId"], base64url_encode([1, 2, 3]));
        assert_eq!(
            value["value"]["response"]["attestationObject"],
            base64url_encode([4, 5, 6])
        );
    }

    #[test]
    fn test_encode_assertion_requires_user_handle() {
        let value = parse(encode_assertion_wasm(
            &base64url_encode([1]),
            &base64url_encode([0; 37]),
            &base64url_encode([0x30]),
            "",
            &client_data("Y"),
        ));
        assert_eq!(value["ok"], false);
        assert!(value["error"].as_str().unwrap().contains("userHandle"));
    }

    #[test]
    fn test_bad_base64url_argument() {
        let value = parse(encode_attestation_wasm("a$b", "AQ", &client_data("X")));
        assert_eq!(value["ok"], false);
        assert!(value["error"].as_str().unwrap().contains("Base64URL"));
    }

    #[test]
    fn test_get_version() {
        assert_eq!(get_version(), env!("CARGO_PKG_VERSION"));
    }
}
