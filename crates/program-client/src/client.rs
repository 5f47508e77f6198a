//! Program client contract

use async_trait::async_trait;
use portal_interface::LinkItem;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;
use wallet_adapter::Identity;

/// Decoded state of the link account
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountSnapshot {
    /// Link account address
    pub address: Pubkey,
    /// Slot the snapshot was read at
    pub slot: u64,
    /// Links in append order
    pub items: Vec<LinkItem>,
}

/// Read failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("account {0} does not exist")]
    NotFound(Pubkey),

    #[error("account is not a link account: {0}")]
    InvalidAccount(String),

    #[error("rpc transport failure: {0}")]
    Transport(String),
}

/// Write failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WriteError {
    /// The wallet, the cluster or the program refused the transaction
    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error("rpc transport failure: {0}")]
    Transport(String),
}

/// Operations against the fixed link account.
///
/// Ordering among writers is decided by the cluster; callers re-fetch after
/// a write to see the authoritative list.
#[async_trait]
pub trait ProgramClient: Send + Sync {
    /// Address of the link account this client targets
    fn account_address(&self) -> Pubkey;

    /// Read the link account
    async fn fetch_account(&self) -> Result<AccountSnapshot, FetchError>;

    /// Create and initialize the link account, paid for by `identity`.
    ///
    /// Not idempotent on the remote side.
    async fn initialize_account(&self, identity: &Identity) -> Result<(), WriteError>;

    /// Append `link` to the shared list
    async fn append_item(&self, identity: &Identity, link: &str) -> Result<(), WriteError>;
}
