//! Portal Session - single-owner event loop
//!
//! The session owns the [`PortalMachine`] and processes events one at a time
//! from a queue. Effects run on spawned tasks against the wallet and program
//! client; their results are queued back as events. Front-ends talk to the
//! session through a clonable [`SessionHandle`].

use program_client::{FetchError, ProgramClient, WriteError};
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use wallet_adapter::{ConnectError, WalletAdapter};

use crate::{
    machine::{ConnectMode, Effect, Event, Intent, PortalMachine, WriteKind},
    view::{render, View},
};

/// The session loop is no longer running
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("portal session has stopped")]
pub struct SessionClosed;

/// Handle for sending intents and reading the current view
#[derive(Clone)]
pub struct SessionHandle {
    events: mpsc::UnboundedSender<Event>,
    view: watch::Receiver<View>,
}

impl SessionHandle {
    /// Queue a user intent
    pub fn send(&self, intent: Intent) -> Result<(), SessionClosed> {
        self.events
            .send(Event::Intent(intent))
            .map_err(|_| SessionClosed)
    }

    /// Latest rendered view
    pub fn view(&self) -> View {
        self.view.borrow().clone()
    }

    /// Queue an intent and wait up to `settle` for the view to react.
    ///
    /// Returns the view as it stands afterwards; an intent the machine
    /// ignores simply times out.
    pub async fn dispatch(&mut self, intent: Intent, settle: Duration) -> Result<View, SessionClosed> {
        self.view.borrow_and_update();
        self.send(intent)?;

        if let Ok(Err(_)) = tokio::time::timeout(settle, self.view.changed()).await {
            return Err(SessionClosed);
        }
        Ok(self.view())
    }

    /// Wait until the view satisfies `predicate`
    #[cfg(test)]
    pub async fn wait_for(
        &mut self,
        mut predicate: impl FnMut(&View) -> bool,
    ) -> Result<View, SessionClosed> {
        let view = self
            .view
            .wait_for(|view| predicate(view))
            .await
            .map_err(|_| SessionClosed)?;
        Ok(view.clone())
    }
}

/// Event loop owning the portal state
pub struct PortalSession {
    machine: PortalMachine,
    wallet: Arc<dyn WalletAdapter>,
    program: Arc<dyn ProgramClient>,
    event_sender: mpsc::UnboundedSender<Event>,
    event_receiver: mpsc::UnboundedReceiver<Event>,
    view_sender: watch::Sender<View>,
}

impl PortalSession {
    /// Create a new session
    pub fn new(wallet: Arc<dyn WalletAdapter>, program: Arc<dyn ProgramClient>) -> Self {
        let machine = PortalMachine::new();
        let (event_sender, event_receiver) = mpsc::unbounded_channel();
        let (view_sender, _) = watch::channel(render(&machine));

        Self {
            machine,
            wallet,
            program,
            event_sender,
            event_receiver,
            view_sender,
        }
    }

    /// Get a handle for the front-end
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            events: self.event_sender.clone(),
            view: self.view_sender.subscribe(),
        }
    }

    /// Run the session: one silent connect attempt, then events until aborted
    pub async fn run(mut self) {
        tracing::info!(
            "Portal session started (link account {})",
            self.program.account_address()
        );

        self.dispatch(Event::Startup);
        while let Some(event) = self.event_receiver.recv().await {
            self.dispatch(event);
        }
    }

    fn dispatch(&mut self, event: Event) {
        let effect = self.machine.handle(event);

        let view = render(&self.machine);
        self.view_sender.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });

        if let Some(effect) = effect {
            self.spawn_effect(effect);
        }
    }

    fn spawn_effect(&self, effect: Effect) {
        tracing::debug!("Running effect {:?}", effect);
        let wallet = self.wallet.clone();
        let program = self.program.clone();
        let events = self.event_sender.clone();

        tokio::spawn(async move {
            let pending = effect.clone();
            let task = tokio::spawn(async move { execute(effect, wallet.as_ref(), program.as_ref()).await });

            // A panicked effect still has to release the machine
            let event = match task.await {
                Ok(event) => event,
                Err(e) => {
                    tracing::error!("Effect {:?} did not complete: {}", pending, e);
                    aborted(pending, e.to_string())
                }
            };
            if events.send(event).is_err() {
                tracing::debug!("Session stopped before effect completed");
            }
        });
    }
}

/// Completion event for an effect whose task died
fn aborted(effect: Effect, reason: String) -> Event {
    match effect {
        Effect::ConnectTrusted => Event::ConnectFinished {
            mode: ConnectMode::Trusted,
            result: Err(ConnectError::WalletUnavailable),
        },
        Effect::ConnectInteractive => Event::ConnectFinished {
            mode: ConnectMode::Interactive,
            result: Err(ConnectError::WalletUnavailable),
        },
        Effect::FetchAccount { request } => Event::FetchFinished {
            request,
            result: Err(FetchError::Transport(reason)),
        },
        Effect::InitializeAccount { .. } => Event::WriteFinished {
            kind: WriteKind::Initialize,
            result: Err(WriteError::Transport(reason)),
        },
        Effect::AppendItem { .. } => Event::WriteFinished {
            kind: WriteKind::Append,
            result: Err(WriteError::Transport(reason)),
        },
    }
}

/// Run one effect and turn its outcome into the completion event
async fn execute(effect: Effect, wallet: &dyn WalletAdapter, program: &dyn ProgramClient) -> Event {
    match effect {
        Effect::ConnectTrusted => Event::ConnectFinished {
            mode: ConnectMode::Trusted,
            result: if wallet.detect() {
                wallet.connect_trusted().await
            } else {
                Err(ConnectError::WalletUnavailable)
            },
        },
        Effect::ConnectInteractive => Event::ConnectFinished {
            mode: ConnectMode::Interactive,
            result: if wallet.detect() {
                wallet.connect_interactive().await
            } else {
                Err(ConnectError::WalletUnavailable)
            },
        },
        Effect::FetchAccount { request } => Event::FetchFinished {
            request,
            result: program.fetch_account().await,
        },
        Effect::InitializeAccount { identity } => Event::WriteFinished {
            kind: WriteKind::Initialize,
            result: program.initialize_account(&identity).await,
        },
        Effect::AppendItem { identity, link } => Event::WriteFinished {
            kind: WriteKind::Append,
            result: program.append_item(&identity, &link).await,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::Panel;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use program_client::{AccountSnapshot, LinkItem};
    use solana_sdk::{pubkey::Pubkey, transaction::Transaction};
    use std::time::Duration;
    use tokio::sync::Notify;
    use wallet_adapter::{Identity, SignError};

    struct FakeWallet {
        identity: Identity,
        trusted: bool,
        trusted_attempted: Notify,
    }

    impl FakeWallet {
        fn new(trusted: bool) -> Self {
            Self {
                identity: Identity::new(Pubkey::new_unique()),
                trusted,
                trusted_attempted: Notify::new(),
            }
        }
    }

    #[async_trait]
    impl WalletAdapter for FakeWallet {
        fn detect(&self) -> bool {
            true
        }

        async fn connect_trusted(&self) -> Result<Identity, ConnectError> {
            self.trusted_attempted.notify_one();
            if self.trusted {
                Ok(self.identity)
            } else {
                Err(ConnectError::NotAuthorized)
            }
        }

        async fn connect_interactive(&self) -> Result<Identity, ConnectError> {
            Ok(self.identity)
        }

        async fn sign_transaction(
            &self,
            _identity: &Identity,
            _transaction: &mut Transaction,
        ) -> Result<(), SignError> {
            Ok(())
        }
    }

    /// In-memory stand-in for the link account
    struct FakeProgram {
        address: Pubkey,
        items: Mutex<Option<Vec<LinkItem>>>,
        calls: Mutex<Vec<&'static str>>,
        panic_on_append: bool,
    }

    impl FakeProgram {
        fn new(items: Option<Vec<LinkItem>>) -> Self {
            Self {
                address: Pubkey::new_unique(),
                items: Mutex::new(items),
                calls: Mutex::new(Vec::new()),
                panic_on_append: false,
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl ProgramClient for FakeProgram {
        fn account_address(&self) -> Pubkey {
            self.address
        }

        async fn fetch_account(&self) -> Result<AccountSnapshot, FetchError> {
            self.calls.lock().push("fetch");
            let items = self.items.lock().clone().ok_or(FetchError::NotFound(self.address))?;
            Ok(AccountSnapshot {
                address: self.address,
                slot: 1,
                items,
            })
        }

        async fn initialize_account(&self, _identity: &Identity) -> Result<(), WriteError> {
            self.calls.lock().push("initialize");
            let mut items = self.items.lock();
            if items.is_some() {
                return Err(WriteError::Rejected("account already in use".into()));
            }
            *items = Some(Vec::new());
            Ok(())
        }

        async fn append_item(&self, identity: &Identity, link: &str) -> Result<(), WriteError> {
            self.calls.lock().push("append");
            if self.panic_on_append {
                panic!("append handler crashed");
            }
            let mut items = self.items.lock();
            let items = items
                .as_mut()
                .ok_or_else(|| WriteError::Rejected("account not initialized".into()))?;
            items.push(LinkItem {
                link: link.to_string(),
                submitter: identity.pubkey(),
            });
            Ok(())
        }
    }

    async fn wait_for(handle: &mut SessionHandle, predicate: impl FnMut(&View) -> bool) -> View {
        tokio::time::timeout(Duration::from_secs(5), handle.wait_for(predicate))
            .await
            .expect("view did not reach expected state")
            .unwrap()
    }

    fn links(view: &View) -> Vec<String> {
        match &view.panel {
            Panel::SubmissionForm { items, .. } => items.iter().map(|item| item.link.clone()).collect(),
            other => panic!("expected submission form, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_trusted_wallet_loads_list_on_startup() {
        let wallet = Arc::new(FakeWallet::new(true));
        let program = Arc::new(FakeProgram::new(Some(vec![LinkItem {
            link: "https://media.giphy.com/a.gif".into(),
            submitter: Pubkey::new_unique(),
        }])));

        let session = PortalSession::new(wallet, program.clone());
        let mut handle = session.handle();
        let task = tokio::spawn(session.run());

        let view = wait_for(&mut handle, |view| matches!(view.panel, Panel::SubmissionForm { .. })).await;
        assert_eq!(links(&view), vec!["https://media.giphy.com/a.gif"]);
        assert_eq!(program.calls(), vec!["fetch"]);

        task.abort();
    }

    #[tokio::test]
    async fn test_full_flow_from_untrusted_wallet() {
        let wallet = Arc::new(FakeWallet::new(false));
        let program = Arc::new(FakeProgram::new(None));

        let session = PortalSession::new(wallet.clone(), program.clone());
        let mut handle = session.handle();
        let task = tokio::spawn(session.run());

        // Silent attempt fails quietly
        wallet.trusted_attempted.notified().await;
        let view = wait_for(&mut handle, |view| view.panel == Panel::ConnectPrompt { busy: false }).await;
        assert!(view.notice.is_none());

        handle.send(Intent::Connect).unwrap();
        wait_for(&mut handle, |view| matches!(view.panel, Panel::InitializePrompt { busy: false, .. })).await;

        handle.send(Intent::Initialize).unwrap();
        let view = wait_for(&mut handle, |view| matches!(view.panel, Panel::SubmissionForm { .. })).await;
        assert!(links(&view).is_empty());

        // Empty submissions never reach the program
        handle.send(Intent::Submit(String::new())).unwrap();
        handle.send(Intent::Submit("c".into())).unwrap();
        let view = wait_for(&mut handle, |view| {
            matches!(&view.panel, Panel::SubmissionForm { items, busy: false, .. } if !items.is_empty())
        })
        .await;
        assert_eq!(links(&view), vec!["c"]);

        // Every write is followed by exactly one fetch
        assert_eq!(
            program.calls(),
            vec!["fetch", "initialize", "fetch", "append", "fetch"]
        );

        task.abort();
    }

    #[tokio::test]
    async fn test_panicked_write_releases_guard() {
        let mut fake = FakeProgram::new(Some(Vec::new()));
        fake.panic_on_append = true;
        let program = Arc::new(fake);

        let session = PortalSession::new(Arc::new(FakeWallet::new(true)), program.clone());
        let mut handle = session.handle();
        let task = tokio::spawn(session.run());

        wait_for(&mut handle, |view| matches!(view.panel, Panel::SubmissionForm { .. })).await;
        handle.send(Intent::Submit("x".into())).unwrap();

        let view = wait_for(&mut handle, |view| view.notice.is_some()).await;
        match &view.panel {
            Panel::SubmissionForm { draft, busy, items, .. } => {
                assert_eq!(draft, "x");
                assert!(!busy);
                assert!(items.is_empty());
            }
            other => panic!("expected submission form, got {:?}", other),
        }

        // Guard is free again: the next submit reaches the program
        handle.send(Intent::Submit("y".into())).unwrap();
        wait_for(&mut handle, |_| program.calls().iter().filter(|c| **c == "append").count() == 2).await;

        task.abort();
    }

    #[tokio::test]
    async fn test_handle_reports_closed_session() {
        let session = PortalSession::new(Arc::new(FakeWallet::new(false)), Arc::new(FakeProgram::new(None)));
        let handle = session.handle();
        drop(session);

        assert_eq!(handle.send(Intent::Connect), Err(SessionClosed));
    }
}
