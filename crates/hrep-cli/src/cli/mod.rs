//! CLI for the HREP replicator.

use anyhow::Result;
use clap::Parser;
use hrep_core::config;
use hrep_core::{Outcome, Replicator, TransferRequest};
use std::path::PathBuf;

/// Stream one HTTP resource (or a byte range of it) into another with a PUT.
#[derive(Debug, Parser)]
#[command(name = "hrep")]
#[command(about = "HREP: streaming HTTP resource replicator", long_about = None)]
pub struct Cli {
    /// Source resource URL.
    #[arg(long)]
    pub source: String,

    /// Token sent in the auth header on source requests.
    #[arg(long, value_name = "TOKEN")]
    pub source_auth_token: Option<String>,

    /// Destination resource URL.
    #[arg(long)]
    pub destination: String,

    /// Token sent in the auth header on destination requests.
    #[arg(long, value_name = "TOKEN")]
    pub destination_auth_token: Option<String>,

    /// First byte to copy (inclusive). Needs --to-byte.
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub from_byte: Option<i64>,

    /// Last byte to copy (inclusive). Needs --from-byte.
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub to_byte: Option<i64>,

    /// Config file (default: ~/.config/hrep/config.toml).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Validate the flags into a request. No network activity.
    pub fn request(&self) -> hrep_core::Result<TransferRequest> {
        TransferRequest::from_args(
            &self.source,
            self.source_auth_token.as_deref(),
            &self.destination,
            self.destination_auth_token.as_deref(),
            self.from_byte,
            self.to_byte,
        )
    }

    pub fn run_from_args() -> Result<Outcome> {
        let cli = Cli::parse();
        let request = cli.request()?;

        let cfg = match &cli.config {
            Some(path) => config::load_from(path)?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);

        let replicator = Replicator::from_config(&cfg);
        Ok(replicator.run(&request)?)
    }
}
