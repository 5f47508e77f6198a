//! Keypair Wallet - a local keypair file acting as the injected wallet
//!
//! The keypair file plays the role of the wallet extension. A small trust file
//! records which identities have approved this portal before, which is what a
//! silent connect checks.

use async_trait::async_trait;
use parking_lot::RwLock;
use solana_sdk::{
    signature::{read_keypair_file, Keypair},
    signer::Signer,
    transaction::Transaction,
};
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    adapter::{ConnectError, SignError, WalletAdapter},
    identity::Identity,
};

/// Wallet backed by a Solana CLI keypair file
pub struct KeypairWallet {
    /// Keypair file (Solana CLI JSON format)
    keypair_path: PathBuf,
    /// JSON array of previously authorized identities
    trust_path: PathBuf,
    /// Approval policy for interactive connects
    approve_connections: bool,
    /// Keypair of the connected session
    session: RwLock<Option<Arc<Keypair>>>,
}

impl KeypairWallet {
    /// Create a wallet that approves interactive connects
    pub fn new(keypair_path: impl Into<PathBuf>, trust_path: impl Into<PathBuf>) -> Self {
        Self {
            keypair_path: keypair_path.into(),
            trust_path: trust_path.into(),
            approve_connections: true,
            session: RwLock::new(None),
        }
    }

    /// Set the approval policy for interactive connects
    pub fn with_approval(mut self, approve: bool) -> Self {
        self.approve_connections = approve;
        self
    }

    /// Get the keypair path
    pub fn keypair_path(&self) -> &Path {
        &self.keypair_path
    }

    /// Identity of the connected session, if any
    #[cfg(test)]
    fn connected_identity(&self) -> Option<Identity> {
        self.session
            .read()
            .as_ref()
            .map(|keypair| Identity::new(keypair.pubkey()))
    }

    fn load_keypair(&self) -> Result<Keypair, ConnectError> {
        read_keypair_file(&self.keypair_path).map_err(|e| {
            tracing::warn!("Failed to read wallet keypair {:?}: {}", self.keypair_path, e);
            ConnectError::WalletUnavailable
        })
    }

    /// Read the trust list. A missing or unreadable file trusts nobody.
    async fn trusted_identities(&self) -> Vec<Identity> {
        let contents = match tokio::fs::read_to_string(&self.trust_path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read trust file {:?}: {}", self.trust_path, e);
                return Vec::new();
            }
        };

        let entries: Vec<String> = match serde_json::from_str(&contents) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Ignoring malformed trust file {:?}: {}", self.trust_path, e);
                return Vec::new();
            }
        };

        entries.iter().filter_map(|entry| entry.parse().ok()).collect()
    }

    async fn remember(&self, identity: Identity) -> std::io::Result<()> {
        let mut trusted = self.trusted_identities().await;
        if trusted.contains(&identity) {
            return Ok(());
        }
        trusted.push(identity);

        if let Some(parent) = self.trust_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let entries: Vec<String> = trusted.iter().map(ToString::to_string).collect();
        let json = serde_json::to_string_pretty(&entries)?;
        tokio::fs::write(&self.trust_path, json).await
    }

    fn open_session(&self, keypair: Keypair) -> Identity {
        let identity = Identity::new(keypair.pubkey());
        *self.session.write() = Some(Arc::new(keypair));
        identity
    }
}

#[async_trait]
impl WalletAdapter for KeypairWallet {
    fn detect(&self) -> bool {
        self.keypair_path.is_file()
    }

    async fn connect_trusted(&self) -> Result<Identity, ConnectError> {
        if !self.detect() {
            return Err(ConnectError::WalletUnavailable);
        }

        let keypair = self.load_keypair()?;
        let identity = Identity::new(keypair.pubkey());

        if !self.trusted_identities().await.contains(&identity) {
            tracing::debug!("Silent connect refused: {} has not authorized this site", identity);
            return Err(ConnectError::NotAuthorized);
        }

        tracing::info!("Reconnected trusted wallet {}", identity);
        Ok(self.open_session(keypair))
    }

    async fn connect_interactive(&self) -> Result<Identity, ConnectError> {
        if !self.detect() {
            return Err(ConnectError::WalletUnavailable);
        }
        if !self.approve_connections {
            tracing::info!("Connection request declined by wallet policy");
            return Err(ConnectError::UserRejected);
        }

        let keypair = self.load_keypair()?;
        let identity = self.open_session(keypair);

        if let Err(e) = self.remember(identity).await {
            tracing::warn!("Connected {} but could not persist trust: {}", identity, e);
        }

        tracing::info!("Connected wallet {}", identity);
        Ok(identity)
    }

    async fn sign_transaction(
        &self,
        identity: &Identity,
        transaction: &mut Transaction,
    ) -> Result<(), SignError> {
        let keypair = self.session.read().clone().ok_or(SignError::NotConnected)?;
        if keypair.pubkey() != identity.pubkey() {
            return Err(SignError::IdentityMismatch(*identity));
        }

        let blockhash = transaction.message.recent_blockhash;
        transaction
            .try_partial_sign(&[keypair.as_ref()], blockhash)
            .map_err(|e| SignError::Signer(e.to_string()))
    }
}
