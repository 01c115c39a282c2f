use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use selfsigned_auth::{AuthConfig, ExpiryPolicy, SigningAlgorithm, UsernameClaim};

/// Verify a self-signed JWT against a pre-provisioned RSA public key.
#[derive(Debug, Parser)]
#[command(name = "token-verifier", version)]
pub struct Args {
    /// Path to a PEM-encoded RSA public key.
    #[arg(long, env = "AUTH_PUBLIC_KEY_FILE", conflicts_with = "public_key_pem")]
    pub public_key_file: Option<PathBuf>,

    /// PEM-encoded RSA public key text.
    #[arg(long, env = "AUTH_PUBLIC_KEY_PEM", hide_env_values = true)]
    pub public_key_pem: Option<String>,

    #[arg(long, env = "AUTH_SIGNING_ALGORITHM", default_value = "RS256")]
    pub algorithm: SigningAlgorithm,

    /// Reject tokens that carry no `exp` claim.
    #[arg(long, env = "AUTH_REQUIRE_EXP")]
    pub require_exp: bool,

    #[arg(long, env = "AUTH_LEEWAY_SECONDS", default_value_t = 0)]
    pub leeway_seconds: u32,

    /// Claim reported as the username: sub, email or name.
    #[arg(long, env = "AUTH_USERNAME_CLAIM", default_value = "sub")]
    pub username_claim: UsernameClaim,

    /// Token to verify. Read from stdin when omitted.
    pub token: Option<String>,
}

impl Args {
    pub fn auth_config(&self) -> Result<AuthConfig> {
        let pem = self.public_key()?;
        let expiry_policy = if self.require_exp {
            ExpiryPolicy::Required
        } else {
            ExpiryPolicy::Optional
        };

        Ok(AuthConfig::new(pem)
            .with_algorithm(self.algorithm)
            .with_expiry_policy(expiry_policy)
            .with_leeway(self.leeway_seconds)
            .with_username_claim(self.username_claim))
    }

    fn public_key(&self) -> Result<Vec<u8>> {
        match (&self.public_key_file, &self.public_key_pem) {
            (Some(path), _) => fs::read(path)
                .with_context(|| format!("failed to read public key from {}", path.display())),
            (None, Some(pem)) => Ok(pem.clone().into_bytes()),
            (None, None) => {
                bail!("a public key is required: set AUTH_PUBLIC_KEY_FILE or AUTH_PUBLIC_KEY_PEM")
            }
        }
    }
}
