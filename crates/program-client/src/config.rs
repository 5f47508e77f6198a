//! Program client configuration

use solana_sdk::{
    commitment_config::CommitmentConfig, pubkey::Pubkey, signature::Keypair, signer::Signer,
};
use std::time::Duration;

/// Immutable settings for the link account client, built once at startup
#[derive(Debug)]
pub struct ProgramConfig {
    /// Cluster JSON-RPC URL
    pub rpc_url: String,
    /// Portal program ID
    pub program_id: Pubkey,
    /// Keypair of the shared link account
    pub account: Keypair,
    /// Commitment for reads and confirmations
    pub commitment: CommitmentConfig,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
    /// Upper bound on send plus confirmation of one write
    pub confirm_timeout: Duration,
}

impl ProgramConfig {
    /// Create a config for the default program ID
    pub fn new(rpc_url: &str, account: Keypair) -> Self {
        Self {
            rpc_url: rpc_url.to_string(),
            program_id: portal_interface::id(),
            account,
            commitment: CommitmentConfig::confirmed(),
            request_timeout: Duration::from_secs(30),
            confirm_timeout: Duration::from_secs(60),
        }
    }

    /// Set the program ID
    pub fn with_program_id(mut self, program_id: Pubkey) -> Self {
        self.program_id = program_id;
        self
    }

    /// Set the commitment level
    pub fn with_commitment(mut self, commitment: CommitmentConfig) -> Self {
        self.commitment = commitment;
        self
    }

    /// Set how long a write may take to confirm
    pub fn with_confirm_timeout(mut self, timeout: Duration) -> Self {
        self.confirm_timeout = timeout;
        self
    }

    /// Address of the shared link account
    pub fn account_address(&self) -> Pubkey {
        self.account.pubkey()
    }
}
