use std::io::{self, Read};

use anyhow::{Context, Result};
use clap::Parser;
use selfsigned_auth::{Authenticator, Identity};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::Args;

#[derive(Serialize)]
struct Verified<'a> {
    username: Option<&'a str>,
    identity: &'a Identity,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let authenticator = Authenticator::new(args.auth_config()?)
        .context("failed to initialise authenticator")?;

    let token = match args.token {
        Some(token) => token,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read token from stdin")?;
            buffer
        }
    };

    let identity = match authenticator.authenticate(token.trim()) {
        Ok(identity) => identity,
        Err(err) => {
            warn!(kind = %err.kind(), code = err.code(), "token rejected");
            return Err(err).context("token rejected");
        }
    };

    let username = authenticator.username(&identity);
    info!(username = ?username, "token verified");
    let output = Verified {
        username,
        identity: &identity,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
