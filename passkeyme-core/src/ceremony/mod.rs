//! Platform credential ceremonies.
//!
//! The platform authenticator is reached through [`CeremonyProvider`]: given a
//! request descriptor it eventually yields exactly one [`CeremonyOutcome`].
//! Providers wrapping a callback-driven platform API deliver that outcome
//! through a [`Completion`], which cannot fire twice and reports
//! [`CeremonyFailure::Abandoned`] if it is dropped unused.
//!
//! ## Example
//!
//! ```no_run
//! use passkeyme_core::ceremony::{CeremonyProvider, MockAuthenticator, RegistrationRequest};
//! use passkeyme_core::{decode_registration_challenge, encode_registration_outcome};
//!
//! # async fn example(json: &str) -> passkeyme_core::Result<()> {
//! let challenge = decode_registration_challenge(json)?;
//! let provider = MockAuthenticator::default();
//! let outcome = provider
//!     .begin_registration(&RegistrationRequest::from_challenge(&challenge))
//!     .await;
//! let envelope = encode_registration_outcome(&outcome)?;
//! println!("{}", envelope.to_json()?);
//! # Ok(())
//! # }
//! ```

mod completion;
mod mock;

pub use completion::{Completion, CompletionReceiver};
pub use mock::{MockAuthenticator, MockAuthenticatorConfig};

use std::sync::Arc;

use async_trait::async_trait;

use crate::challenge::{AuthenticationChallenge, RegistrationChallenge};
use crate::codec::base64url_decode;
use crate::credential::CeremonyOutcome;
use crate::error::Result;

/// Which result shape a ceremony is expected to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeremonyKind {
    Registration,
    Authentication,
}

impl std::fmt::Display for CeremonyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Registration => write!(f, "registration"),
            Self::Authentication => write!(f, "authentication"),
        }
    }
}

/// Arguments for creating a new platform credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    pub relying_party_id: String,
    pub user_id: Vec<u8>,
    pub user_name: String,
    pub challenge: Vec<u8>,
}

impl RegistrationRequest {
    pub fn from_challenge(challenge: &RegistrationChallenge) -> Self {
        Self {
            relying_party_id: challenge.relying_party.id.clone(),
            user_id: challenge.user_id_bytes(),
            user_name: challenge.user.name.clone(),
            challenge: challenge.challenge_bytes(),
        }
    }
}

/// Arguments for asserting an existing platform credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationRequest {
    pub relying_party_id: String,
    pub challenge: Vec<u8>,
    pub allowed_credential_ids: Vec<Vec<u8>>,
}

impl AuthenticationRequest {
    /// Fails with `DecodeError` if an allowed credential id is not Base64URL.
    pub fn from_challenge(challenge: &AuthenticationChallenge) -> Result<Self> {
        let allowed_credential_ids = challenge
            .allow_credentials
            .iter()
            .map(|descriptor| base64url_decode(&descriptor.id))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            relying_party_id: challenge.rp_id.clone(),
            challenge: challenge.challenge_bytes(),
            allowed_credential_ids,
        })
    }
}

/// Capability to run a platform credential ceremony.
///
/// Implementations must be thread-safe (`Send + Sync`) and must resolve every
/// call with exactly one outcome, using [`CeremonyOutcome::Failure`] for
/// cancellation and platform errors.
#[async_trait]
pub trait CeremonyProvider: Send + Sync {
    async fn begin_registration(&self, request: &RegistrationRequest) -> CeremonyOutcome;

    async fn begin_authentication(&self, request: &AuthenticationRequest) -> CeremonyOutcome;

    /// Short identifier used in logs.
    fn name(&self) -> &'static str;
}

#[async_trait]
impl<P: CeremonyProvider + ?Sized> CeremonyProvider for Arc<P> {
    async fn begin_registration(&self, request: &RegistrationRequest) -> CeremonyOutcome {
        (**self).begin_registration(request).await
    }

    async fn begin_authentication(&self, request: &AuthenticationRequest) -> CeremonyOutcome {
        (**self).begin_authentication(request).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::CredentialDescriptor;
    use crate::codec::base64url_encode;
    use crate::error::PasskeyError;

    fn authentication_challenge(ids: &[&str]) -> AuthenticationChallenge {
        AuthenticationChallenge {
            challenge: "abc123".into(),
            timeout: None,
            rp_id: "example.com".into(),
            allow_credentials: ids
                .iter()
                .map(|id| CredentialDescriptor {
                    kind: "public-key".into(),
                    id: id.to_string(),
                })
                .collect(),
            user_verification: "preferred".into(),
        }
    }

    #[test]
    fn test_authentication_request_decodes_allowed_ids() {
        let id = base64url_encode([1, 2, 3, 4]);
        let request =
            AuthenticationRequest::from_challenge(&authentication_challenge(&[&id])).unwrap();
        assert_eq!(request.allowed_credential_ids, vec![vec![1, 2, 3, 4]]);
        assert_eq!(request.challenge, b"abc123".to_vec());
        assert_eq!(request.relying_party_id, "example.com");
    }

    #[test]
    fn test_authentication_request_rejects_bad_id() {
        let result = AuthenticationRequest::from_challenge(&authentication_challenge(&["a$b"]));
        assert!(matches!(result, Err(PasskeyError::DecodeError(_))));
    }

    #[test]
    fn test_ceremony_kind_display() {
        assert_eq!(CeremonyKind::Registration.to_string(), "registration");
        assert_eq!(CeremonyKind::Authentication.to_string(), "authentication");
    }
}
