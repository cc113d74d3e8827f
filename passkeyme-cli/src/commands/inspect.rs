//! Inspect command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use passkeyme_core::{
    decode_authentication_challenge, decode_challenge, decode_registration_challenge, Challenge,
};
use tracing::info;

use crate::utils::{read_input, render_json};
use crate::ChallengeKind;

/// Execute the inspect command.
///
/// The descriptor goes to stdout as JSON; the summary goes to stderr so the
/// output stays pipeable.
pub fn execute(input: &str, kind: ChallengeKind, quiet: bool) -> Result<()> {
    let json = read_input(input)?;

    let challenge = match kind {
        ChallengeKind::Registration => {
            decode_registration_challenge(&json).map(Challenge::Registration)
        }
        ChallengeKind::Authentication => {
            decode_authentication_challenge(&json).map(Challenge::Authentication)
        }
        ChallengeKind::Auto => decode_challenge(&json),
    }
    .context("Failed to decode challenge")?;

    if !quiet {
        print_summary(&challenge);
    }

    let value = serde_json::to_value(&challenge).context("Failed to serialize descriptor")?;
    println!("{}", render_json(&value, true)?);
    Ok(())
}

fn print_summary(challenge: &Challenge) {
    match challenge {
        Challenge::Registration(c) => {
            info!(rp_id = %c.relying_party.id, user = %c.user.name, "Registration challenge");
            eprintln!("{}", "Registration challenge".green().bold());
            eprintln!(
                "   {} {} ({})",
                "Relying party:".dimmed(),
                c.relying_party.name,
                c.relying_party.id
            );
            eprintln!(
                "   {} {} ({})",
                "User:".dimmed(),
                c.user.name,
                c.user.display_name
            );
            eprintln!("   {} {}", "Challenge:".dimmed(), c.challenge);
            let algorithms: Vec<String> = c
                .pub_key_cred_params
                .iter()
                .map(|p| p.alg.to_string())
                .collect();
            eprintln!("   {} {}", "Algorithms:".dimmed(), algorithms.join(", "));
            eprintln!(
                "   {} {}",
                "User verification:".dimmed(),
                c.user_verification()
            );
        }
        Challenge::Authentication(c) => {
            info!(rp_id = %c.rp_id, allowed = c.allow_credentials.len(), "Authentication challenge");
            eprintln!("{}", "Authentication challenge".green().bold());
            eprintln!("   {} {}", "Relying party:".dimmed(), c.rp_id);
            eprintln!("   {} {}", "Challenge:".dimmed(), c.challenge);
            eprintln!(
                "   {} {}",
                "Allowed credentials:".dimmed(),
                c.allow_credentials.len()
            );
            eprintln!(
                "   {} {}",
                "User verification:".dimmed(),
                c.user_verification
            );
        }
    }
    if let Some(timeout) = match challenge {
        Challenge::Registration(c) => c.timeout,
        Challenge::Authentication(c) => c.timeout,
    } {
        eprintln!("   {} {} ms", "Timeout:".dimmed(), timeout);
    }
}
