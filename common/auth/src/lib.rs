//! Self-signed JWT authentication.
//!
//! An [`Authenticator`] verifies compact RS256-family tokens against one
//! pre-provisioned RSA public key and turns the verified claims into an
//! [`Identity`]. Time claims (`exp`, `iat`) may arrive as JSON numbers or
//! as decimal strings; anything else in those claims rejects the token.

pub mod claims;
pub mod config;
pub mod error;
pub mod keys;
pub mod token;
pub mod verifier;

#[cfg(test)]
mod test_support;

pub use claims::{FlexibleInt, Identity, NormalizedClaims, RawClaims};
pub use config::{AuthConfig, ExpiryPolicy, ParseConfigError, SigningAlgorithm, UsernameClaim};
pub use error::{AuthError, AuthErrorKind, AuthResult};
pub use keys::{parse_public_key, VerificationKey};
pub use token::{CompactToken, TokenHeader};
pub use verifier::{Authenticator, SharedAuthenticator};
