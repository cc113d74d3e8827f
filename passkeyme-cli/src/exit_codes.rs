//! Exit codes following sysexits.h conventions.
//!
//! These codes provide semantic meaning for different failure modes,
//! enabling scripts and CI systems to handle errors appropriately.

use passkeyme_core::PasskeyError;

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Command line usage error (invalid arguments, missing configuration).
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// Data format error (malformed challenge, unencodable ceremony result).
/// Maps to EX_DATAERR from sysexits.h.
pub const DATA_ERROR: i32 = 65;

/// Cannot open input file.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// Relying party unreachable or overloaded.
/// Maps to EX_UNAVAILABLE from sysexits.h.
pub const UNAVAILABLE: i32 = 69;

/// Ceremony cancelled or refused; trying again may succeed.
/// Maps to EX_TEMPFAIL from sysexits.h.
pub const CEREMONY_FAILED: i32 = 75;

/// Represents an exit code with optional error context.
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");

        let code = match err.chain().find_map(|e| e.downcast_ref::<PasskeyError>()) {
            Some(passkey_error) => Self::classify(passkey_error),
            None if message.contains("Failed to read input") => INPUT_ERROR,
            None => GENERAL_ERROR,
        };

        Self {
            code,
            message: Some(message),
        }
    }

    fn classify(err: &PasskeyError) -> i32 {
        match err {
            PasskeyError::MalformedChallenge(_)
            | PasskeyError::DecodeError(_)
            | PasskeyError::EncodingError(_)
            | PasskeyError::ChallengeCanonicalizationFailed(_)
            | PasskeyError::UnknownCredentialKind { .. }
            | PasskeyError::MissingField(_) => DATA_ERROR,
            PasskeyError::CeremonyFailed(_) => CEREMONY_FAILED,
            PasskeyError::Config(_) => USAGE_ERROR,
            PasskeyError::RelyingParty { .. } if err.is_user_recoverable() => UNAVAILABLE,
            PasskeyError::RelyingParty { .. } => GENERAL_ERROR,
            PasskeyError::HttpError(_) => UNAVAILABLE,
        }
    }
}
