//! Portal Configuration

use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use program_client::ProgramConfig;
use serde::{Deserialize, Serialize};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    pubkey::Pubkey,
    signature::{read_keypair_file, write_keypair_file, Keypair},
    signer::Signer,
};
use std::{
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

/// Commitment level for reads and write confirmation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn config(self) -> CommitmentConfig {
        match self {
            Commitment::Processed => CommitmentConfig::processed(),
            Commitment::Confirmed => CommitmentConfig::confirmed(),
            Commitment::Finalized => CommitmentConfig::finalized(),
        }
    }
}

/// Portal configuration, read once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// HTTP bind address for the front-end
    pub http_addr: String,
    /// Cluster JSON-RPC URL
    pub rpc_url: String,
    /// Portal program ID (defaults to the built-in ID)
    pub program_id: Option<String>,
    /// Keypair of the shared link account; generated on first run
    pub account_keypair: PathBuf,
    /// Keypair acting as the user's wallet
    pub wallet_keypair: PathBuf,
    /// Identities that have approved this portal
    pub trust_file: PathBuf,
    /// Approve interactive wallet connections
    pub approve_connections: bool,
    /// Commitment for reads and confirmations
    pub commitment: Commitment,
    /// Write confirmation timeout in milliseconds
    pub confirm_timeout_ms: u64,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            http_addr: "127.0.0.1:3000".to_string(),
            rpc_url: "https://api.devnet.solana.com".to_string(),
            program_id: None,
            account_keypair: PathBuf::from("./keypair.json"),
            wallet_keypair: default_wallet_path(),
            trust_file: PathBuf::from("./data/trusted_wallets.json"),
            approve_connections: true,
            commitment: Commitment::Confirmed,
            confirm_timeout_ms: 60_000,
        }
    }
}

/// Solana CLI default keypair location
fn default_wallet_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".config/solana/id.json"))
        .unwrap_or_else(|| PathBuf::from("id.json"))
}

impl PortalConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&contents).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Configured program ID or the built-in one
    pub fn program_id(&self) -> Result<Pubkey> {
        match &self.program_id {
            Some(id) => Pubkey::from_str(id).map_err(|e| anyhow!("invalid program id {id}: {e}")),
            None => Ok(portal_interface::id()),
        }
    }

    /// Load the link account keypair, creating it on first run
    pub fn load_or_create_account(&self) -> Result<Keypair> {
        let path = &self.account_keypair;
        if path.exists() {
            return read_keypair_file(path)
                .map_err(|e| anyhow!("reading link account keypair {}: {e}", path.display()));
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let keypair = Keypair::new();
        write_keypair_file(&keypair, path)
            .map_err(|e| anyhow!("writing link account keypair {}: {e}", path.display()))?;
        tracing::info!("Generated link account {} at {:?}", keypair.pubkey(), path);
        Ok(keypair)
    }

    /// Build the immutable program client settings
    pub fn program_config(&self) -> Result<ProgramConfig> {
        Ok(ProgramConfig::new(&self.rpc_url, self.load_or_create_account()?)
            .with_program_id(self.program_id()?)
            .with_commitment(self.commitment.config())
            .with_confirm_timeout(Duration::from_millis(self.confirm_timeout_ms)))
    }
}
