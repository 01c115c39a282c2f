use std::fmt;

use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("failed to parse public key: {0}")]
    KeyFormat(String),
    #[error("malformed token: {0}")]
    MalformedToken(String),
    #[error("token algorithm '{found}' does not match configured '{expected}'")]
    AlgorithmMismatch { expected: &'static str, found: String },
    #[error("token signature verification failed")]
    InvalidSignature,
    #[error("invalid claim '{0}': {1}")]
    ClaimFormat(&'static str, String),
    #[error("token expired at {expired_at}")]
    TokenExpired { expired_at: i64 },
}

/// Payload-free classification of an [`AuthError`], safe to log or export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorKind {
    KeyFormat,
    MalformedToken,
    AlgorithmMismatch,
    InvalidSignature,
    ClaimFormat,
    TokenExpired,
}

impl AuthErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthErrorKind::KeyFormat => "key_format",
            AuthErrorKind::MalformedToken => "malformed_token",
            AuthErrorKind::AlgorithmMismatch => "algorithm_mismatch",
            AuthErrorKind::InvalidSignature => "invalid_signature",
            AuthErrorKind::ClaimFormat => "claim_format",
            AuthErrorKind::TokenExpired => "token_expired",
        }
    }
}

impl fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AuthError {
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            AuthError::KeyFormat(_) => AuthErrorKind::KeyFormat,
            AuthError::MalformedToken(_) => AuthErrorKind::MalformedToken,
            AuthError::AlgorithmMismatch { .. } => AuthErrorKind::AlgorithmMismatch,
            AuthError::InvalidSignature => AuthErrorKind::InvalidSignature,
            AuthError::ClaimFormat(_, _) => AuthErrorKind::ClaimFormat,
            AuthError::TokenExpired { .. } => AuthErrorKind::TokenExpired,
        }
    }

    /// Transport-neutral error code. Middleware maps these onto its own
    /// response types; only `AUTH_KEY` indicates a server-side fault.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::KeyFormat(_) => "AUTH_KEY",
            AuthError::MalformedToken(_)
            | AuthError::AlgorithmMismatch { .. }
            | AuthError::InvalidSignature => "AUTH_TOKEN",
            AuthError::ClaimFormat(_, _) => "AUTH_CLAIMS",
            AuthError::TokenExpired { .. } => "AUTH_EXPIRED",
        }
    }
}
