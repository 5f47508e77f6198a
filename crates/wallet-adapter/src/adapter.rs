//! Wallet adapter contract

use async_trait::async_trait;
use solana_sdk::transaction::Transaction;
use thiserror::Error;

use crate::identity::Identity;

/// Connection failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectError {
    /// No wallet capability present
    #[error("no wallet found")]
    WalletUnavailable,

    /// Silent connect without a prior authorization
    #[error("wallet has not authorized this site")]
    NotAuthorized,

    /// The user or the wallet policy declined the request
    #[error("connection request rejected")]
    UserRejected,
}

/// Signing failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignError {
    #[error("wallet is not connected")]
    NotConnected,

    #[error("{0} is not the connected wallet")]
    IdentityMismatch(Identity),

    #[error("signing failed: {0}")]
    Signer(String),
}

/// Wallet capability consumed by the portal.
///
/// Connect calls may suspend on user interaction; callers treat each one as a
/// single in-flight operation.
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    /// Is a wallet present in this environment
    fn detect(&self) -> bool;

    /// Reconnect to a previously authorized wallet without prompting
    async fn connect_trusted(&self) -> Result<Identity, ConnectError>;

    /// Ask the user to connect
    async fn connect_interactive(&self) -> Result<Identity, ConnectError>;

    /// Add the wallet's signature to a transaction paid for by `identity`
    async fn sign_transaction(
        &self,
        identity: &Identity,
        transaction: &mut Transaction,
    ) -> Result<(), SignError>;
}
