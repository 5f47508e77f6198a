//! GIF Portal
//!
//! Local web front-end for a shared link account on a Solana cluster.
//! Connects a keypair-backed wallet, creates the link account on request and
//! appends submitted GIF links to it.

use anyhow::Result;
use clap::Parser;
use portal_core::PortalSession;
use program_client::RpcProgramClient;
use std::{path::PathBuf, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wallet_adapter::{KeypairWallet, WalletAdapter};

mod config;
mod page;
mod web;

use config::{Commitment, PortalConfig};
use web::WebServer;

/// GIF Portal
#[derive(Parser, Debug)]
#[command(name = "gif-portal")]
#[command(about = "Share GIF links on a Solana link account", long_about = None)]
struct Args {
    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// HTTP bind address
    #[arg(long)]
    http_addr: Option<String>,

    /// Cluster JSON-RPC URL
    #[arg(long)]
    rpc_url: Option<String>,

    /// Portal program ID
    #[arg(long)]
    program_id: Option<String>,

    /// Link account keypair (created if missing)
    #[arg(long)]
    account_keypair: Option<PathBuf>,

    /// Wallet keypair
    #[arg(long)]
    wallet_keypair: Option<PathBuf>,

    /// Trusted identities file
    #[arg(long)]
    trust_file: Option<PathBuf>,

    /// Commitment level for reads and confirmations
    #[arg(long, value_enum)]
    commitment: Option<Commitment>,

    /// Reject interactive wallet connections
    #[arg(long)]
    deny_connections: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    /// Resolve the final config: defaults, then file, then flags
    fn into_config(self) -> Result<PortalConfig> {
        let mut config = match &self.config {
            Some(path) => PortalConfig::load(path)?,
            None => PortalConfig::default(),
        };

        if let Some(addr) = self.http_addr {
            config.http_addr = addr;
        }
        if let Some(url) = self.rpc_url {
            config.rpc_url = url;
        }
        if let Some(id) = self.program_id {
            config.program_id = Some(id);
        }
        if let Some(path) = self.account_keypair {
            config.account_keypair = path;
        }
        if let Some(path) = self.wallet_keypair {
            config.wallet_keypair = path;
        }
        if let Some(path) = self.trust_file {
            config.trust_file = path;
        }
        if let Some(level) = self.commitment {
            config.commitment = level;
        }
        if self.deny_connections {
            config.approve_connections = false;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = args.into_config()?;
    let program_config = Arc::new(config.program_config()?);

    tracing::info!("Starting GIF Portal");
    tracing::info!("  HTTP: {}", config.http_addr);
    tracing::info!("  RPC: {} ({:?})", config.rpc_url, config.commitment);
    tracing::info!("  Program: {}", program_config.program_id);
    tracing::info!("  Link account: {}", program_config.account_address());

    let wallet = Arc::new(
        KeypairWallet::new(config.wallet_keypair.clone(), config.trust_file.clone())
            .with_approval(config.approve_connections),
    );
    if !wallet.detect() {
        tracing::warn!("No wallet keypair at {:?}", wallet.keypair_path());
    }
    tracing::info!("  Trust file: {:?}", config.trust_file);
    let program = Arc::new(RpcProgramClient::new(program_config, wallet.clone()));

    let session = PortalSession::new(wallet, program);
    let handle = session.handle();

    // Spawn session loop
    let session_task = tokio::spawn(session.run());

    // Start web front-end
    let http_addr = config.http_addr.clone();
    let web_server = tokio::spawn(async move {
        let server = WebServer::new(handle);
        if let Err(e) = server.run(&http_addr).await {
            tracing::error!("Web server error: {}", e);
        }
    });

    tracing::info!("GIF Portal running. Press Ctrl+C to stop.");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down...");
    web_server.abort();
    session_task.abort();

    tracing::info!("Shutdown complete");
    Ok(())
}
