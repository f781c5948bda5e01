//! Aloha Nova CLI - operator tooling for credentials.
//!
//! This is the entry point for the `aloha` binary.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};

/// Aloha Nova CLI - issue and inspect credentials offline.
#[derive(Parser, Debug)]
#[command(name = "aloha")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging.
    #[arg(long, default_value = "false", global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Issue an enterprise bundle for the owner account and save it.
    InitTokens {
        /// Account to issue for.
        #[arg(long, env = "ALOHA_ADMIN_EMAIL")]
        email: String,

        /// Session token signing secret.
        #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
        secret: Option<String>,

        /// Where to write the bundle.
        #[arg(long, default_value = ".admin-tokens.json")]
        output: PathBuf,
    },

    /// Check an API key's digest and print its claims.
    InspectKey {
        /// The `aloha_...` key.
        key: String,
    },

    /// Verify a session token and print its claims.
    VerifyToken {
        /// The session token.
        token: String,

        /// Signing secret.
        #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
        secret: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.debug {
        "aloha=debug,warn"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::InitTokens {
            email,
            secret,
            output,
        } => {
            let record = commands::init_tokens(&email, secret, &output)?;

            println!("Email:         {}", record.email);
            println!("Tier:          {}", record.tier);
            println!("API Key:       {}", commands::preview(&record.api_key));
            println!("JWT Token:     {}", commands::preview(&record.session_token));
            println!("Refresh Token: {}", commands::preview(&record.refresh_token));
            if let Some(expires) = Utc.timestamp_millis_opt(record.expires_at).single() {
                println!("Expires:       {}", expires.to_rfc3339());
            }
            println!("Saved to {} (mode 600)", output.display());
        }
        Command::InspectKey { key } => {
            let report = commands::inspect_key(&key, Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::VerifyToken { token, secret } => {
            let report = commands::verify_token(&token, &secret)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
