//! Link account decoding errors

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("account is owned by {actual}, expected {expected}")]
    InvalidAccountOwner { expected: Pubkey, actual: Pubkey },

    #[error("invalid account data: {0}")]
    InvalidAccountData(String),

    #[error("item count {declared} does not match {actual} stored items")]
    ItemCountMismatch { declared: u64, actual: usize },
}
