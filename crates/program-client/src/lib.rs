//! Program Client - link account reads and writes
//!
//! Handles communication with the cluster on behalf of the portal:
//! - Fetching and decoding the shared link account
//! - Creating and initializing the link account
//! - Appending links, signed by the connected wallet

pub mod client;
pub mod config;
pub mod rpc;

pub use client::{AccountSnapshot, FetchError, ProgramClient, WriteError};
pub use config::ProgramConfig;
pub use rpc::RpcProgramClient;

pub use portal_interface::LinkItem;
