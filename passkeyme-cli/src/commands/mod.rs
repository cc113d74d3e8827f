pub mod authenticate;
pub mod inspect;
pub mod register;
pub mod simulate;

use std::time::Duration;

use anyhow::{Context, Result};
use passkeyme_core::{RelyingPartyClient, RelyingPartyConfig};

use crate::BackendArgs;

/// Build the relying-party client from command-line and environment settings.
fn relying_party_client(args: &BackendArgs) -> Result<RelyingPartyClient> {
    let mut config =
        RelyingPartyConfig::new(&args.base_url, args.app_id.as_str(), args.api_key.as_str())
            .context("Invalid relying party configuration")?
            .with_timeout(Duration::from_secs(args.timeout_secs));
    if args.allow_http {
        config = config.allow_http();
    }
    RelyingPartyClient::new(config).context("Failed to create relying party client")
}
