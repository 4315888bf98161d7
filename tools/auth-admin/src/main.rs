//! Auth-Admin: credential file administration for broker-auth
//!
//! Adds and removes applications in a credentials file, inspects it, and can
//! watch it with SIGHUP-driven reloads.

mod commands;
mod logging;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use broker_auth::AuthConfig;

/// Credentials file used when nothing else names one
const DEFAULT_AUTH_FILE: &str = "./auth.json";

/// Auth-Admin: manage broker credentials
#[derive(Parser, Debug)]
#[command(name = "auth-admin")]
#[command(version, about = "Manage the application credentials of a broker")]
struct Args {
    /// The file containing the credentials
    #[arg(long, value_name = "FILE", global = true)]
    auth: Option<PathBuf>,

    /// JSON configuration file (generator lengths, reload behaviour)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log at INFO level
    #[arg(short, long, global = true)]
    info: bool,

    /// Log at DEBUG level
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add an application to the credentials file
    Addapp {
        name: String,
        key: Option<String>,
        secret: Option<String>,
    },
    /// Remove an application from the credentials file
    Rmapp { key: String },
    /// List applications (secrets are not shown)
    List,
    /// Validate the credentials file
    Check,
    /// Load the credentials and reload them on SIGHUP until Ctrl-C
    Watch,
}

fn load_config(config_file: Option<&Path>, auth: Option<PathBuf>) -> Result<AuthConfig> {
    let mut config = match config_file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("malformed config {}", path.display()))?
        }
        None => AuthConfig::default(),
    };

    config.apply_overrides(|name| std::env::var(name).ok());

    if let Some(auth) = auth {
        config.credentials_path = Some(auth);
    }
    if config.credentials_path.is_none() {
        config.credentials_path = Some(PathBuf::from(DEFAULT_AUTH_FILE));
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(logging::Verbosity::from_flags(args.info, args.debug))?;

    let config = load_config(args.config.as_deref(), args.auth)?;
    let mut out = io::stdout().lock();

    match args.command {
        Command::Addapp { name, key, secret } => {
            commands::add_app(&mut out, &config, name, key, secret)?;
        }
        Command::Rmapp { key } => {
            commands::remove_app(&mut out, &config, &key)?;
        }
        Command::List => {
            commands::list_apps(&mut out, &config)?;
        }
        Command::Check => {
            let problems = commands::check(&mut out, &config)?;
            if problems > 0 {
                anyhow::bail!("{} problem(s) found", problems);
            }
        }
        Command::Watch => {
            drop(out);
            commands::run_watch(&config).await?;
        }
    }

    Ok(())
}
