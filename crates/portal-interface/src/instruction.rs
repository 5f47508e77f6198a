//! Portal program instructions

use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program,
};

/// Portal program instructions
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum PortalInstruction {
    /// Initialize the link account with an empty item list
    ///
    /// The account must already be allocated and owned by the program.
    ///
    /// Accounts:
    /// 0. `[writable, signer]` Link account
    /// 1. `[signer, writable]` User (payer)
    /// 2. `[]` System program
    InitializeAccount,

    /// Append a link to the shared list
    ///
    /// Accounts:
    /// 0. `[writable]` Link account
    /// 1. `[signer]` User
    AppendItem {
        /// Link text as submitted
        link: String,
    },
}

/// Build an `InitializeAccount` instruction
pub fn initialize_account(program_id: &Pubkey, account: &Pubkey, user: &Pubkey) -> Instruction {
    Instruction::new_with_borsh(
        *program_id,
        &PortalInstruction::InitializeAccount,
        vec![
            AccountMeta::new(*account, true),
            AccountMeta::new(*user, true),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
    )
}

/// Build an `AppendItem` instruction
pub fn append_item(program_id: &Pubkey, account: &Pubkey, user: &Pubkey, link: &str) -> Instruction {
    Instruction::new_with_borsh(
        *program_id,
        &PortalInstruction::AppendItem {
            link: link.to_string(),
        },
        vec![
            AccountMeta::new(*account, false),
            AccountMeta::new_readonly(*user, true),
        ],
    )
}
