//! Passkeyme Core - WebAuthn ceremony encoding for the Passkeyme passkey SDK
//!
//! This crate sits between a relying-party backend and a platform
//! authenticator. It decodes the challenge envelopes the backend issues,
//! hands a request descriptor to the authenticator, and encodes the
//! authenticator's result into the JSON credential envelope the backend
//! verifies.
//!
//! # Features
//!
//! - Base64URL (no padding) codec used throughout the WebAuthn wire format
//! - Registration and authentication challenge decoding
//! - clientDataJSON canonicalization for registration credentials
//! - `ceremony`: async [`ceremony::CeremonyProvider`] capability with a
//!   deterministic mock authenticator
//! - `network` (default): HTTP client for the relying-party backend
//!
//! # Example
//!
//! ```no_run
//! use passkeyme_core::{MockAuthenticator, PasskeyClient};
//!
//! # async fn example(challenge_json: &str) -> passkeyme_core::Result<()> {
//! // Use the mock authenticator for testing (in production, wrap the platform API)
//! let client = PasskeyClient::new(MockAuthenticator::default());
//!
//! // Decode the backend's challenge, run the ceremony, encode the credential
//! let envelope = client.register(challenge_json).await?;
//!
//! // Submit this to the backend's complete_registration endpoint
//! println!("{}", envelope.to_json()?);
//! # Ok(())
//! # }
//! ```

pub mod challenge;
pub mod client_data;
pub mod codec;
pub mod credential;
pub mod error;

#[cfg(feature = "ceremony")]
pub mod ceremony;
#[cfg(feature = "ceremony")]
mod passkey;

#[cfg(feature = "network")]
pub mod relying_party;

// Re-export main types for convenience
pub use challenge::{
    decode_authentication_challenge, decode_challenge, decode_registration_challenge,
    AuthenticationChallenge, Challenge, RegistrationChallenge,
};
pub use client_data::{canonicalize_client_data, ClientData};
pub use codec::{base64url_decode, base64url_decode_to_text, base64url_encode};
pub use credential::{
    encode_assertion_response, encode_attestation_response, encode_authentication_outcome,
    encode_registration_outcome, AssertionEnvelope, AssertionResult, AttestationEnvelope,
    AttestationResult, CeremonyOutcome, EncodedCredentialEnvelope,
};
pub use error::{CeremonyFailure, PasskeyError, Result};

// Ceremony exports (not available in Wasm)
#[cfg(feature = "ceremony")]
pub use ceremony::{CeremonyProvider, MockAuthenticator};
#[cfg(feature = "ceremony")]
pub use passkey::PasskeyClient;

#[cfg(feature = "network")]
pub use relying_party::{RelyingPartyClient, RelyingPartyConfig, RelyingPartyFlow};
