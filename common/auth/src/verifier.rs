use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use tracing::{debug, info};

use crate::claims::{parse_raw_claims, Identity, NormalizedClaims};
use crate::config::{AuthConfig, ExpiryPolicy};
use crate::error::{AuthError, AuthResult};
use crate::keys::VerificationKey;
use crate::token::CompactToken;

/// Verifies self-signed tokens against one pre-provisioned RSA key.
///
/// Holds only immutable state, so a single instance can serve concurrent
/// callers by shared reference.
#[derive(Debug)]
pub struct Authenticator {
    config: AuthConfig,
    key: VerificationKey,
}

impl Authenticator {
    /// Parse the configured key once; fails with `KeyFormat` on bad PEM.
    pub fn new(config: AuthConfig) -> AuthResult<Self> {
        let key = VerificationKey::from_pem(
            &config.public_key_pem,
            config.algorithm,
            config.min_key_bits,
        )?;
        info!(
            algorithm = %config.algorithm,
            key_bits = key.bits(),
            expiry_policy = ?config.expiry_policy,
            "self-signed authenticator initialised"
        );
        Ok(Self { config, key })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn key(&self) -> &VerificationKey {
        &self.key
    }

    /// Authenticate `token` against the current wall clock.
    pub fn authenticate(&self, token: &str) -> AuthResult<Identity> {
        self.authenticate_at(token, Utc::now().timestamp())
    }

    /// Authenticate `token` as of `now` (seconds since the Unix epoch).
    pub fn authenticate_at(&self, token: &str, now: i64) -> AuthResult<Identity> {
        let result = self.run(token, now);
        match &result {
            Ok(identity) => debug!(subject = ?identity.subject, "authenticated token"),
            Err(err) => debug!(kind = %err.kind(), "rejected token"),
        }
        result
    }

    /// Username of `identity` according to the configured claim.
    pub fn username<'a>(&self, identity: &'a Identity) -> Option<&'a str> {
        identity.username(self.config.username_claim)
    }

    fn run(&self, token: &str, now: i64) -> AuthResult<Identity> {
        let token = CompactToken::parse(token, self.config.max_token_bytes)?;

        let header = token.header()?;
        let expected = self.key.algorithm().as_str();
        if header.alg != expected {
            return Err(AuthError::AlgorithmMismatch {
                expected,
                found: header.alg,
            });
        }

        self.key
            .verify(token.signing_input().as_bytes(), token.signature())?;

        let raw = parse_raw_claims(token.payload_bytes())?;
        let claims = NormalizedClaims::try_from(&raw)?;
        self.check_expiry(&claims, now)?;

        Ok(Identity::from(claims))
    }

    fn check_expiry(&self, claims: &NormalizedClaims, now: i64) -> AuthResult<()> {
        match claims.expires_at {
            Some(expires_at) => {
                let deadline = expires_at.saturating_add(i64::from(self.config.leeway_seconds));
                if now >= deadline {
                    Err(AuthError::TokenExpired { expired_at: expires_at })
                } else {
                    Ok(())
                }
            }
            None => match self.config.expiry_policy {
                ExpiryPolicy::Optional => Ok(()),
                ExpiryPolicy::Required => {
                    Err(AuthError::ClaimFormat("exp", "claim is required".into()))
                }
            },
        }
    }
}

/// Cloneable handle whose authenticator can be replaced at runtime.
///
/// Replacement swaps the whole instance; calls already running keep the
/// `Arc<Authenticator>` they started with.
#[derive(Debug, Clone)]
pub struct SharedAuthenticator {
    inner: Arc<RwLock<Arc<Authenticator>>>,
}

impl SharedAuthenticator {
    pub fn new(authenticator: Authenticator) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(authenticator))),
        }
    }

    pub fn from_config(config: AuthConfig) -> AuthResult<Self> {
        Authenticator::new(config).map(Self::new)
    }

    pub fn current(&self) -> Arc<Authenticator> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Install `authenticator`, returning the one it replaced.
    pub fn replace(&self, authenticator: Authenticator) -> Arc<Authenticator> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(authenticator))
    }

    /// Build a new authenticator from `config` and install it. On failure
    /// the current authenticator stays in place.
    pub fn reconfigure(&self, config: AuthConfig) -> AuthResult<()> {
        let authenticator = Authenticator::new(config)?;
        self.replace(authenticator);
        info!("self-signed authenticator replaced");
        Ok(())
    }

    pub fn authenticate(&self, token: &str) -> AuthResult<Identity> {
        self.current().authenticate(token)
    }

    pub fn authenticate_at(&self, token: &str, now: i64) -> AuthResult<Identity> {
        self.current().authenticate_at(token, now)
    }
}
