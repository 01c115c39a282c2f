use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Asymmetric signing algorithms the authenticator can be configured with.
///
/// Only the RSA family is representable, so a symmetric or EC algorithm can
/// never end up as the verification algorithm for an RSA key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SigningAlgorithm {
    #[default]
    RS256,
    RS384,
    RS512,
    PS256,
    PS384,
    PS512,
}

impl SigningAlgorithm {
    /// The `alg` header value that identifies this algorithm in a JWT.
    pub fn as_str(&self) -> &'static str {
        match self {
            SigningAlgorithm::RS256 => "RS256",
            SigningAlgorithm::RS384 => "RS384",
            SigningAlgorithm::RS512 => "RS512",
            SigningAlgorithm::PS256 => "PS256",
            SigningAlgorithm::PS384 => "PS384",
            SigningAlgorithm::PS512 => "PS512",
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SigningAlgorithm {
    type Err = ParseConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "RS256" => Ok(SigningAlgorithm::RS256),
            "RS384" => Ok(SigningAlgorithm::RS384),
            "RS512" => Ok(SigningAlgorithm::RS512),
            "PS256" => Ok(SigningAlgorithm::PS256),
            "PS384" => Ok(SigningAlgorithm::PS384),
            "PS512" => Ok(SigningAlgorithm::PS512),
            _ => Err(ParseConfigError::new("signing algorithm", value)),
        }
    }
}

/// Whether a token without an `exp` claim is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpiryPolicy {
    /// Missing `exp` means the token does not expire.
    #[default]
    Optional,
    /// Missing `exp` is rejected as a claim format error.
    Required,
}

/// Identity field reported as the username of an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UsernameClaim {
    #[default]
    Subject,
    Email,
    Name,
}

impl UsernameClaim {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsernameClaim::Subject => "sub",
            UsernameClaim::Email => "email",
            UsernameClaim::Name => "name",
        }
    }
}

impl FromStr for UsernameClaim {
    type Err = ParseConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sub" | "subject" => Ok(UsernameClaim::Subject),
            "email" => Ok(UsernameClaim::Email),
            "name" => Ok(UsernameClaim::Name),
            _ => Err(ParseConfigError::new("username claim", value)),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseConfigError {
    kind: &'static str,
    value: String,
}

impl ParseConfigError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Immutable configuration for a self-signed token authenticator.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// PEM-encoded RSA public key used to verify every token.
    pub public_key_pem: Vec<u8>,
    /// Algorithm a token must declare in its `alg` header.
    pub algorithm: SigningAlgorithm,
    /// Treatment of tokens that carry no `exp` claim.
    pub expiry_policy: ExpiryPolicy,
    /// Allowable clock skew in seconds when evaluating `exp`.
    pub leeway_seconds: u32,
    /// Smallest accepted modulus length, in bits.
    pub min_key_bits: usize,
    /// Tokens longer than this are rejected before decoding.
    pub max_token_bytes: usize,
    pub username_claim: UsernameClaim,
}

impl AuthConfig {
    pub const DEFAULT_MIN_KEY_BITS: usize = 1024;
    pub const DEFAULT_MAX_TOKEN_BYTES: usize = 8192;

    /// Construct config for RS256 with no expiry requirement and no leeway.
    pub fn new(public_key_pem: impl Into<Vec<u8>>) -> Self {
        Self {
            public_key_pem: public_key_pem.into(),
            algorithm: SigningAlgorithm::default(),
            expiry_policy: ExpiryPolicy::default(),
            leeway_seconds: 0,
            min_key_bits: Self::DEFAULT_MIN_KEY_BITS,
            max_token_bytes: Self::DEFAULT_MAX_TOKEN_BYTES,
            username_claim: UsernameClaim::default(),
        }
    }

    pub fn with_algorithm(mut self, algorithm: SigningAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_expiry_policy(mut self, policy: ExpiryPolicy) -> Self {
        self.expiry_policy = policy;
        self
    }

    /// Shorthand for `with_expiry_policy(ExpiryPolicy::Required)`.
    pub fn require_expiry(self) -> Self {
        self.with_expiry_policy(ExpiryPolicy::Required)
    }

    /// Adjust the allowed leeway.
    pub fn with_leeway(mut self, seconds: u32) -> Self {
        self.leeway_seconds = seconds;
        self
    }

    pub fn with_min_key_bits(mut self, bits: usize) -> Self {
        self.min_key_bits = bits;
        self
    }

    pub fn with_max_token_bytes(mut self, bytes: usize) -> Self {
        self.max_token_bytes = bytes;
        self
    }

    pub fn with_username_claim(mut self, claim: UsernameClaim) -> Self {
        self.username_claim = claim;
        self
    }
}
