//! Passkeyme CLI - inspect and exercise passkey ceremonies.

use std::io::IsTerminal;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_codes;
mod utils;

use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  64  Usage or configuration error
  65  Malformed challenge or unencodable credential
  66  Input file not readable
  69  Relying party unavailable
  75  Ceremony cancelled or refused";

#[derive(Parser)]
#[command(name = "passkeyme")]
#[command(author, version, about = "Inspect and exercise passkey ceremonies", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Only print command output (no summaries or warnings)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, value_enum, default_value_t = ColorMode::Auto, global = true)]
    color: ColorMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ChallengeKind {
    Registration,
    Authentication,
    Auto,
}

/// Relying-party connection settings.
#[derive(Args)]
pub struct BackendArgs {
    /// Backend base URL; the app id is appended as a path segment
    #[arg(long, env = "PASSKEYME_BASE_URL", default_value = passkeyme_core::relying_party::DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Application id issued by the backend
    #[arg(long, env = "PASSKEYME_APP_ID")]
    pub app_id: String,

    /// API key sent as `x-api-key`
    #[arg(long, env = "PASSKEYME_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Request timeout in seconds
    #[arg(long, env = "PASSKEYME_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    /// Permit a plain-HTTP base URL (local development only)
    #[arg(long, env = "PASSKEYME_ALLOW_HTTP")]
    pub allow_http: bool,

    /// Seed for the mock authenticator
    #[arg(long, default_value_t = 0xDEADBEEF_CAFEBABE)]
    pub seed: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a challenge envelope and print the normalized descriptor
    Inspect {
        /// Challenge JSON file, or `-` for stdin
        #[arg(value_name = "FILE")]
        input: String,

        /// Which envelope shape to expect
        #[arg(short, long, value_enum, default_value_t = ChallengeKind::Auto)]
        kind: ChallengeKind,
    },

    /// Run a challenge through the mock authenticator and print the credential envelope
    Simulate {
        /// Challenge JSON file, or `-` for stdin
        #[arg(value_name = "FILE")]
        input: String,

        /// Seed for the mock authenticator
        #[arg(long, default_value_t = 0xDEADBEEF_CAFEBABE)]
        seed: u64,

        /// User handle returned on authentication
        #[arg(long)]
        user_id: Option<String>,

        /// Pretty-print the envelope
        #[arg(long)]
        pretty: bool,
    },

    /// Register a user against the relying party (mock authenticator)
    Register {
        #[arg(long)]
        username: String,

        #[arg(long)]
        display_name: String,

        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Authenticate a user against the relying party (mock authenticator)
    Authenticate {
        #[arg(long)]
        username: String,

        /// User handle the mock returns (defaults to the username)
        #[arg(long)]
        user_id: Option<String>,

        #[command(flatten)]
        backend: BackendArgs,
    },
}

fn init_tracing(quiet: bool, verbose: bool, ansi: bool) {
    let default_level = if verbose {
        "warn,passkeyme_core=debug,passkeyme=debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(ansi)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let quiet = cli.quiet;
    match cli.command {
        Commands::Inspect { input, kind } => commands::inspect::execute(&input, kind, quiet),
        Commands::Simulate {
            input,
            seed,
            user_id,
            pretty,
        } => commands::simulate::execute(&input, seed, user_id, pretty, quiet).await,
        Commands::Register {
            username,
            display_name,
            backend,
        } => commands::register::execute(&username, &display_name, backend, quiet).await,
        Commands::Authenticate {
            username,
            user_id,
            backend,
        } => commands::authenticate::execute(&username, user_id, backend, quiet).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            let code = if err.use_stderr() {
                exit_codes::USAGE_ERROR
            } else {
                exit_codes::SUCCESS
            };
            std::process::exit(code);
        }
    };

    let ansi = match cli.color {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => std::io::stderr().is_terminal(),
    };
    if !matches!(cli.color, ColorMode::Auto) {
        colored::control::set_override(ansi);
    }
    init_tracing(cli.quiet, cli.verbose, ansi);

    if let Err(err) = run(cli).await {
        let exit = ExitCode::from_anyhow(&err);
        if let Some(message) = &exit.message {
            eprintln!("{} {}", "Error:".red().bold(), message);
        }
        std::process::exit(exit.code);
    }
}
