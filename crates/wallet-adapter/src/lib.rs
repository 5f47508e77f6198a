//! Wallet Adapter - connection and signing boundary
//!
//! The portal talks to a wallet only through [`WalletAdapter`]:
//! - detecting whether a wallet is available at all
//! - silent (trusted) and interactive connection
//! - signing transactions on behalf of the connected identity

pub mod adapter;
pub mod identity;
pub mod keypair_wallet;

pub use adapter::{ConnectError, SignError, WalletAdapter};
pub use identity::Identity;
pub use keypair_wallet::KeypairWallet;
