//! Connection State Machine
//!
//! Owns the portal lifecycle:
//! `Disconnected -> Connecting -> Connected { Unknown -> Missing | Present }`.
//!
//! The machine is a pure transition table. Every [`Event`] is handled to
//! completion and yields at most one [`Effect`] for the session to run; the
//! effect's outcome comes back as another event. Remote failures never escape
//! the machine: they become a transition or a no-op plus a [`Notice`].

use program_client::{AccountSnapshot, FetchError, LinkItem, WriteError};
use serde::Serialize;
use wallet_adapter::{ConnectError, Identity};

/// How a connect attempt was started
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectMode {
    /// Silent reconnect at startup
    Trusted,
    /// User clicked connect
    Interactive,
}

/// What the portal knows about the link account
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemoteAccountState {
    /// Not fetched yet, or a fetch is in flight
    Unknown,
    /// Fetched and absent (or the fetch failed)
    Missing,
    /// Fetched, links in append order
    Present(Vec<LinkItem>),
}

/// Connection lifecycle
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting { mode: ConnectMode },
    Connected {
        identity: Identity,
        account: RemoteAccountState,
    },
}

impl ConnectionState {
    fn name(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting { .. } => "connecting",
            ConnectionState::Connected {
                account: RemoteAccountState::Unknown,
                ..
            } => "loading",
            ConnectionState::Connected {
                account: RemoteAccountState::Missing,
                ..
            } => "uninitialized",
            ConnectionState::Connected {
                account: RemoteAccountState::Present(_),
                ..
            } => "ready",
        }
    }
}

/// Remote write categories; at most one is in flight
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteKind {
    Initialize,
    Append,
}

/// User intents forwarded by the front-end
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    Connect,
    Initialize,
    Submit(String),
    DismissNotice,
}

/// Everything the machine reacts to
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Process start; triggers the one silent connect attempt
    Startup,
    Intent(Intent),
    ConnectFinished {
        mode: ConnectMode,
        result: Result<Identity, ConnectError>,
    },
    FetchFinished {
        request: u64,
        result: Result<AccountSnapshot, FetchError>,
    },
    WriteFinished {
        kind: WriteKind,
        result: Result<(), WriteError>,
    },
}

/// Remote calls the session must run on the machine's behalf
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    ConnectTrusted,
    ConnectInteractive,
    FetchAccount { request: u64 },
    InitializeAccount { identity: Identity },
    AppendItem { identity: Identity, link: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient, dismissible message for the user
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// The portal state machine
#[derive(Clone, Debug)]
pub struct PortalMachine {
    state: ConnectionState,
    /// Write currently in flight
    pending_write: Option<WriteKind>,
    /// Id of the most recently issued fetch; older responses are stale
    latest_fetch: u64,
    /// Initialize already issued for the current `Missing` observation
    initialize_spent: bool,
    startup_done: bool,
    notice: Option<Notice>,
    /// Text of the last submission, kept until it is appended
    draft: String,
}

impl PortalMachine {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            pending_write: None,
            latest_fetch: 0,
            initialize_spent: false,
            startup_done: false,
            notice: None,
            draft: String::new(),
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn pending_write(&self) -> Option<WriteKind> {
        self.pending_write
    }

    /// Connected identity, if any
    pub fn identity(&self) -> Option<Identity> {
        match &self.state {
            ConnectionState::Connected { identity, .. } => Some(*identity),
            _ => None,
        }
    }

    /// Apply one event
    pub fn handle(&mut self, event: Event) -> Option<Effect> {
        match event {
            Event::Startup => self.on_startup(),
            Event::Intent(intent) => self.on_intent(intent),
            Event::ConnectFinished { mode, result } => self.on_connect_finished(mode, result),
            Event::FetchFinished { request, result } => self.on_fetch_finished(request, result),
            Event::WriteFinished { kind, result } => self.on_write_finished(kind, result),
        }
    }

    fn on_startup(&mut self) -> Option<Effect> {
        if self.startup_done || self.state != ConnectionState::Disconnected {
            tracing::debug!("Startup ignored while {}", self.state.name());
            return None;
        }
        self.startup_done = true;

        tracing::debug!("Attempting silent wallet reconnect");
        self.state = ConnectionState::Connecting {
            mode: ConnectMode::Trusted,
        };
        Some(Effect::ConnectTrusted)
    }

    fn on_intent(&mut self, intent: Intent) -> Option<Effect> {
        match intent {
            Intent::Connect => self.request_connect(),
            Intent::Initialize => self.request_initialize(),
            Intent::Submit(text) => self.request_submit(text),
            Intent::DismissNotice => {
                self.notice = None;
                None
            }
        }
    }

    fn request_connect(&mut self) -> Option<Effect> {
        if self.state != ConnectionState::Disconnected {
            tracing::debug!("Connect ignored while {}", self.state.name());
            return None;
        }

        self.notice = None;
        self.state = ConnectionState::Connecting {
            mode: ConnectMode::Interactive,
        };
        Some(Effect::ConnectInteractive)
    }

    fn on_connect_finished(
        &mut self,
        mode: ConnectMode,
        result: Result<Identity, ConnectError>,
    ) -> Option<Effect> {
        match self.state {
            ConnectionState::Connecting { mode: current } if current == mode => {}
            _ => {
                tracing::debug!("Discarding stale {:?} connect result", mode);
                return None;
            }
        }

        match result {
            Ok(identity) => {
                tracing::info!("Wallet connected: {}", identity);
                self.state = ConnectionState::Connected {
                    identity,
                    account: RemoteAccountState::Unknown,
                };
                self.latest_fetch += 1;
                Some(Effect::FetchAccount {
                    request: self.latest_fetch,
                })
            }
            Err(ConnectError::NotAuthorized) if mode == ConnectMode::Trusted => {
                tracing::debug!("No trusted wallet; waiting for an explicit connect");
                self.state = ConnectionState::Disconnected;
                None
            }
            Err(e) => {
                tracing::warn!("{:?} wallet connect failed: {}", mode, e);
                self.state = ConnectionState::Disconnected;
                self.notice = Some(Notice::error(connect_message(e)));
                None
            }
        }
    }

    fn on_fetch_finished(
        &mut self,
        request: u64,
        result: Result<AccountSnapshot, FetchError>,
    ) -> Option<Effect> {
        if request != self.latest_fetch {
            tracing::debug!(
                "Discarding stale fetch response #{} (latest #{})",
                request,
                self.latest_fetch
            );
            return None;
        }

        let ConnectionState::Connected { account, .. } = &mut self.state else {
            return None;
        };
        if *account != RemoteAccountState::Unknown {
            tracing::debug!("Fetch response #{} already applied", request);
            return None;
        }

        *account = match result {
            Ok(snapshot) => {
                tracing::info!(
                    "Loaded {} links from {} (slot {})",
                    snapshot.items.len(),
                    snapshot.address,
                    snapshot.slot
                );
                RemoteAccountState::Present(snapshot.items)
            }
            Err(FetchError::NotFound(address)) => {
                tracing::info!("Link account {} has not been initialized", address);
                self.initialize_spent = false;
                RemoteAccountState::Missing
            }
            Err(e) => {
                // Indistinguishable from a missing account for the user flow
                tracing::warn!("Fetch failed, treating link account as missing: {}", e);
                self.initialize_spent = false;
                self.notice = Some(Notice::error(format!("Could not load the link list: {e}")));
                RemoteAccountState::Missing
            }
        };
        None
    }

    fn request_initialize(&mut self) -> Option<Effect> {
        if self.pending_write.is_some() {
            tracing::debug!("Initialize ignored: a write is already pending");
            return None;
        }

        let ConnectionState::Connected { identity, account } = &mut self.state else {
            tracing::debug!("Initialize ignored while {}", self.state.name());
            return None;
        };
        if *account != RemoteAccountState::Missing {
            tracing::debug!("Initialize ignored: link account is not missing");
            return None;
        }

        if self.initialize_spent {
            tracing::info!("Re-checking link account before another initialize");
            *account = RemoteAccountState::Unknown;
            self.latest_fetch += 1;
            return Some(Effect::FetchAccount {
                request: self.latest_fetch,
            });
        }

        self.initialize_spent = true;
        self.pending_write = Some(WriteKind::Initialize);
        self.notice = None;
        Some(Effect::InitializeAccount {
            identity: *identity,
        })
    }

    fn request_submit(&mut self, text: String) -> Option<Effect> {
        let ConnectionState::Connected {
            identity,
            account: RemoteAccountState::Present(_),
        } = &self.state
        else {
            tracing::debug!("Submit ignored while {}", self.state.name());
            return None;
        };
        if self.pending_write.is_some() {
            tracing::debug!("Submit ignored: a write is already pending");
            return None;
        }

        let link = text.trim();
        if link.is_empty() {
            tracing::debug!("Empty input");
            return None;
        }

        tracing::info!("Submitting link: {}", link);
        let effect = Effect::AppendItem {
            identity: *identity,
            link: link.to_string(),
        };
        self.draft = text;
        self.pending_write = Some(WriteKind::Append);
        self.notice = None;
        Some(effect)
    }

    fn on_write_finished(&mut self, kind: WriteKind, result: Result<(), WriteError>) -> Option<Effect> {
        if self.pending_write != Some(kind) {
            tracing::debug!("Discarding unexpected {:?} completion", kind);
            return None;
        }
        self.pending_write = None;

        let ConnectionState::Connected { account, .. } = &mut self.state else {
            return None;
        };

        match result {
            Ok(()) => {
                match kind {
                    WriteKind::Initialize => {
                        self.notice = Some(Notice::info("Link account created"));
                    }
                    WriteKind::Append => self.draft.clear(),
                }
                *account = RemoteAccountState::Unknown;
                self.latest_fetch += 1;
                Some(Effect::FetchAccount {
                    request: self.latest_fetch,
                })
            }
            Err(e) => {
                tracing::warn!("{:?} failed: {}", kind, e);
                let message = match kind {
                    WriteKind::Initialize => format!("Could not create the link account: {e}"),
                    WriteKind::Append => format!("Could not submit link: {e}"),
                };
                self.notice = Some(Notice::error(message));
                None
            }
        }
    }
}

impl Default for PortalMachine {
    fn default() -> Self {
        Self::new()
    }
}

fn connect_message(error: ConnectError) -> &'static str {
    match error {
        ConnectError::WalletUnavailable => "No Solana wallet found. Set up a wallet to continue.",
        ConnectError::NotAuthorized => "The wallet has not authorized this site.",
        ConnectError::UserRejected => "The connection request was rejected.",
    }
}
