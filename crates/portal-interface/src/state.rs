//! Portal program state
//!
//! The link account is allocated with a fixed size and holds the Borsh
//! encoding of [`LinkAccount`] at its start. Unused space is zero padding.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::pubkey::Pubkey;

use crate::error::InterfaceError;

/// One submitted link
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct LinkItem {
    /// Link text as submitted
    pub link: String,
    /// Wallet that appended the link
    pub submitter: Pubkey,
}

/// Shared link list - singleton per deployment
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkAccount {
    /// Number of links appended so far
    pub total_items: u64,
    /// Links in append order
    pub items: Vec<LinkItem>,
}

impl LinkAccount {
    /// Decode account data owned by `program_id`.
    ///
    /// Trailing padding after the encoded value is ignored.
    pub fn unpack(owner: &Pubkey, program_id: &Pubkey, data: &[u8]) -> Result<Self, InterfaceError> {
        if owner != program_id {
            return Err(InterfaceError::InvalidAccountOwner {
                expected: *program_id,
                actual: *owner,
            });
        }

        let mut cursor = data;
        let account = Self::deserialize(&mut cursor)
            .map_err(|e| InterfaceError::InvalidAccountData(e.to_string()))?;

        if account.total_items != account.items.len() as u64 {
            return Err(InterfaceError::ItemCountMismatch {
                declared: account.total_items,
                actual: account.items.len(),
            });
        }

        Ok(account)
    }
}
