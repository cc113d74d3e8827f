//! Authenticate command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use passkeyme_core::{MockAuthenticator, RelyingPartyFlow};
use tracing::info;

use super::relying_party_client;
use crate::utils::{render_json, warn_mock_authenticator};
use crate::BackendArgs;

/// Execute the authenticate command against the relying party.
pub async fn execute(
    username: &str,
    user_id: Option<String>,
    backend: BackendArgs,
    quiet: bool,
) -> Result<()> {
    let client = relying_party_client(&backend)?;
    warn_mock_authenticator(quiet);

    let user_handle = user_id.unwrap_or_else(|| username.to_string());
    let flow = RelyingPartyFlow::new(
        client,
        MockAuthenticator::for_user(backend.seed, user_handle),
    );
    let completed = flow
        .authenticate_user(username)
        .await
        .context("Authentication failed")?;

    info!(credential_id = %completed.envelope.id(), "Authentication completed");

    if !quiet {
        eprintln!("{}", "Passkey assertion accepted".green().bold());
        eprintln!("   {} {}", "User:".dimmed(), username);
        eprintln!("   {} {}", "Credential id:".dimmed(), completed.envelope.id());
    }
    println!("{}", render_json(&completed.response, true)?);
    Ok(())
}
