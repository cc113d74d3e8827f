//! End-to-end registration and authentication against the backend.

use serde_json::Value;
use tracing::{info, instrument};

use super::RelyingPartyClient;
use crate::ceremony::CeremonyProvider;
use crate::credential::EncodedCredentialEnvelope;
use crate::error::Result;
use crate::passkey::PasskeyClient;

/// Envelope submitted to the backend and the backend's verdict.
#[derive(Debug, Clone)]
pub struct CompletedCeremony {
    pub envelope: EncodedCredentialEnvelope,
    pub response: Value,
}

/// Fetch challenge, run the ceremony, submit the credential.
pub struct RelyingPartyFlow<P> {
    relying_party: RelyingPartyClient,
    passkeys: PasskeyClient<P>,
}

impl<P: CeremonyProvider> RelyingPartyFlow<P> {
    pub fn new(relying_party: RelyingPartyClient, provider: P) -> Self {
        Self {
            relying_party,
            passkeys: PasskeyClient::new(provider),
        }
    }

    pub fn relying_party(&self) -> &RelyingPartyClient {
        &self.relying_party
    }

    pub fn passkeys(&self) -> &PasskeyClient<P> {
        &self.passkeys
    }

    #[instrument(level = "info", skip(self))]
    pub async fn register_user(
        &self,
        username: &str,
        display_name: &str,
    ) -> Result<CompletedCeremony> {
        let challenge = self
            .relying_party
            .start_registration(username, display_name)
            .await?;
        let envelope = self.passkeys.register_challenge(&challenge).await?;
        let response = self
            .relying_party
            .complete_registration(username, &envelope)
            .await?;

        info!(credential_id = %envelope.id(), "User registered");
        Ok(CompletedCeremony { envelope, response })
    }

    #[instrument(level = "info", skip(self))]
    pub async fn authenticate_user(&self, username: &str) -> Result<CompletedCeremony> {
        let challenge = self.relying_party.start_authentication(username).await?;
        let envelope = self.passkeys.authenticate_challenge(&challenge).await?;
        let response = self.relying_party.complete_authentication(&envelope).await?;

        info!(credential_id = %envelope.id(), "User authenticated");
        Ok(CompletedCeremony { envelope, response })
    }
}
