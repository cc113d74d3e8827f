//! Simulate command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use passkeyme_core::ceremony::MockAuthenticatorConfig;
use passkeyme_core::{
    base64url_decode, decode_challenge, Challenge, EncodedCredentialEnvelope, MockAuthenticator,
    PasskeyClient,
};
use tracing::{debug, info};

use crate::utils::{read_input, render_json, short_hex, warn_mock_authenticator};

/// Execute the simulate command: decode, run the mock ceremony, encode.
pub async fn execute(
    input: &str,
    seed: u64,
    user_id: Option<String>,
    pretty: bool,
    quiet: bool,
) -> Result<()> {
    let json = read_input(input)?;
    let challenge = decode_challenge(&json).context("Failed to decode challenge")?;

    warn_mock_authenticator(quiet);
    let client = PasskeyClient::new(MockAuthenticator::with_config(MockAuthenticatorConfig {
        seed,
        user_id: user_id.map(String::into_bytes).unwrap_or_default(),
        ..Default::default()
    }));
    debug!(seed, "Created mock authenticator");

    let envelope = match &challenge {
        Challenge::Registration(c) => client.register_challenge(c).await,
        Challenge::Authentication(c) => client.authenticate_challenge(c).await,
    }
    .context("Simulated ceremony failed")?;

    info!(credential_id = %envelope.id(), "Simulated ceremony completed");

    if !quiet {
        print_summary(&envelope)?;
    }

    let value = serde_json::to_value(&envelope).context("Failed to serialize envelope")?;
    println!("{}", render_json(&value, pretty)?);
    Ok(())
}

fn print_summary(envelope: &EncodedCredentialEnvelope) -> Result<()> {
    let (label, kind) = match envelope {
        EncodedCredentialEnvelope::Attestation(_) => ("Attestation envelope", "webauthn.create"),
        EncodedCredentialEnvelope::Assertion(_) => ("Assertion envelope", "webauthn.get"),
    };
    let credential_id = base64url_decode(envelope.id()).context("Invalid credential id")?;
    let client_data = envelope
        .client_data()
        .context("Failed to read clientDataJSON")?;

    eprintln!("{}", label.green().bold());
    eprintln!(
        "   {} {}...",
        "Credential id:".dimmed(),
        short_hex(&credential_id)
    );
    eprintln!("   {} {}", "Ceremony:".dimmed(), kind);
    eprintln!("   {} {}", "Origin:".dimmed(), client_data.origin);
    eprintln!("   {} {}", "Challenge:".dimmed(), client_data.challenge);
    Ok(())
}
