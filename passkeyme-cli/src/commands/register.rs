//! Register command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use passkeyme_core::{MockAuthenticator, RelyingPartyFlow};
use tracing::info;

use super::relying_party_client;
use crate::utils::{render_json, warn_mock_authenticator};
use crate::BackendArgs;

/// Execute the register command against the relying party.
pub async fn execute(
    username: &str,
    display_name: &str,
    backend: BackendArgs,
    quiet: bool,
) -> Result<()> {
    let client = relying_party_client(&backend)?;
    warn_mock_authenticator(quiet);

    let flow = RelyingPartyFlow::new(client, MockAuthenticator::new(backend.seed));
    let completed = flow
        .register_user(username, display_name)
        .await
        .context("Registration failed")?;

    info!(credential_id = %completed.envelope.id(), "Registration completed");

    if !quiet {
        eprintln!("{}", "Passkey registered".green().bold());
        eprintln!("   {} {}", "User:".dimmed(), username);
        eprintln!("   {} {}", "Credential id:".dimmed(), completed.envelope.id());
    }
    println!("{}", render_json(&completed.response, true)?);
    Ok(())
}
