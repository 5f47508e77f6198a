//! Shared types for the GIF portal program
//!
//! Mirrors the on-chain program's instruction and account encoding so the
//! off-chain client can build transactions and decode the link account.
//!
//! Account Structure:
//! - LinkAccount: the single shared record holding every submitted link

pub mod error;
pub mod instruction;
pub mod state;

pub use error::InterfaceError;
pub use instruction::PortalInstruction;
pub use state::{LinkAccount, LinkItem};

// Default program ID for local deployments; real deployments pass their own.
// Note: base58 excludes: 0, I, O, l (lowercase L)
solana_sdk::declare_id!("GifPortaProgram1111111111111111111111111111");

/// Constants
pub mod constants {
    /// Bytes allocated for the link account when it is created
    pub const LINK_ACCOUNT_SPACE: usize = 9000;
}
