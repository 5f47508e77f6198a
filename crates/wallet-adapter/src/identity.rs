//! Connected wallet identity

use solana_sdk::pubkey::Pubkey;
use std::{fmt, str::FromStr};

/// Public identifier of a connected wallet session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Identity(Pubkey);

impl Identity {
    pub fn new(pubkey: Pubkey) -> Self {
        Self(pubkey)
    }

    /// Underlying public key
    pub fn pubkey(&self) -> Pubkey {
        self.0
    }
}

impl FromStr for Identity {
    type Err = solana_sdk::pubkey::ParsePubkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pubkey::from_str(s).map(Self)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
