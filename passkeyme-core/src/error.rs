use thiserror::Error;

/// Reason a platform credential ceremony did not produce a credential.
///
/// Carried verbatim inside [`PasskeyError::CeremonyFailed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CeremonyFailure {
    /// The user dismissed the platform sheet.
    Cancelled,
    /// The platform refused the request (no matching credential, policy, etc.).
    NotAllowed(String),
    /// Any other authenticator or platform error.
    Platform(String),
    /// The provider dropped its completion handle without delivering a result.
    Abandoned,
}

impl std::fmt::Display for CeremonyFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled => write!(f, "cancelled by user"),
            Self::NotAllowed(reason) => write!(f, "not allowed: {reason}"),
            Self::Platform(reason) => write!(f, "platform error: {reason}"),
            Self::Abandoned => write!(f, "ceremony abandoned without a result"),
        }
    }
}

#[derive(Error, Debug)]
pub enum PasskeyError {
    #[error("Malformed challenge: {0}")]
    MalformedChallenge(String),

    #[error("Base64URL decode error: {0}")]
    DecodeError(String),

    #[error("UTF-8 encoding error: {0}")]
    EncodingError(String),

    #[error("clientDataJSON canonicalization failed: {0}")]
    ChallengeCanonicalizationFailed(String),

    #[error("Credential ceremony failed: {0}")]
    CeremonyFailed(CeremonyFailure),

    #[error("Unknown credential kind: expected {expected}, got {found}")]
    UnknownCredentialKind {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Missing field in ceremony result: {0}")]
    MissingField(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Relying party returned status {status}: {message}")]
    RelyingParty { status: u16, message: String },

    #[cfg(feature = "network")]
    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl PasskeyError {
    /// Whether retrying the whole ceremony could succeed.
    ///
    /// Encoding and contract errors are deterministic; only a failed or
    /// cancelled ceremony and transient relying-party errors are worth
    /// offering the user again.
    pub fn is_user_recoverable(&self) -> bool {
        match self {
            Self::CeremonyFailed(_) => true,
            Self::RelyingParty { status, .. } => matches!(status, 429 | 502 | 503 | 504),
            #[cfg(feature = "network")]
            Self::HttpError(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, PasskeyError>;
