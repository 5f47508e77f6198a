//! Portal Core - wallet and account connection state machine
//!
//! This crate decides, on every event, what the portal shows and which remote
//! calls are legal:
//! - `machine`: pure transition table (events in, effects out)
//! - `view`: mapping from machine state to one of the UI panels
//! - `session`: event loop that runs effects and feeds completions back

pub mod machine;
pub mod session;
pub mod view;

pub use machine::{
    ConnectMode, ConnectionState, Effect, Event, Intent, Notice, NoticeLevel, PortalMachine,
    RemoteAccountState, WriteKind,
};
pub use session::{PortalSession, SessionClosed, SessionHandle};
pub use view::{render, ItemView, Panel, View};
