//! View Renderer
//!
//! Pure mapping from machine state to the panel the front-end shows.

use serde::Serialize;

use crate::machine::{ConnectionState, Notice, PortalMachine, RemoteAccountState, WriteKind};

/// One rendered link
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ItemView {
    pub link: String,
    pub submitter: String,
}

/// Mutually exclusive UI panels
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "panel", rename_all = "snake_case")]
pub enum Panel {
    /// Wallet not connected; `busy` while a connect is in flight
    ConnectPrompt { busy: bool },
    /// Connected, link account being fetched
    Loading { identity: String },
    /// Connected, link account does not exist yet
    InitializePrompt { identity: String, busy: bool },
    /// Connected, link account loaded
    SubmissionForm {
        identity: String,
        draft: String,
        busy: bool,
        items: Vec<ItemView>,
    },
}

impl Panel {
    /// Waiting on a remote call
    pub fn is_busy(&self) -> bool {
        match self {
            Panel::ConnectPrompt { busy }
            | Panel::InitializePrompt { busy, .. }
            | Panel::SubmissionForm { busy, .. } => *busy,
            Panel::Loading { .. } => true,
        }
    }
}

/// Everything the front-end needs for one render
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct View {
    #[serde(flatten)]
    pub panel: Panel,
    pub notice: Option<Notice>,
}

impl Default for View {
    fn default() -> Self {
        render(&PortalMachine::new())
    }
}

/// Render the current machine state
pub fn render(machine: &PortalMachine) -> View {
    let panel = match machine.state() {
        ConnectionState::Disconnected => Panel::ConnectPrompt { busy: false },
        ConnectionState::Connecting { .. } => Panel::ConnectPrompt { busy: true },
        ConnectionState::Connected { identity, account } => match account {
            RemoteAccountState::Unknown => Panel::Loading {
                identity: identity.to_string(),
            },
            RemoteAccountState::Missing => Panel::InitializePrompt {
                identity: identity.to_string(),
                busy: machine.pending_write() == Some(WriteKind::Initialize),
            },
            RemoteAccountState::Present(items) => Panel::SubmissionForm {
                identity: identity.to_string(),
                draft: machine.draft().to_string(),
                busy: machine.pending_write() == Some(WriteKind::Append),
                items: items
                    .iter()
                    .map(|item| ItemView {
                        link: item.link.clone(),
                        submitter: item.submitter.to_string(),
                    })
                    .collect(),
            },
        },
    };

    View {
        panel,
        notice: machine.notice().cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::{ConnectMode, Event, Intent};
    use program_client::{AccountSnapshot, FetchError, LinkItem};
    use serde_json::json;
    use solana_sdk::pubkey::Pubkey;
    use wallet_adapter::Identity;

    fn connected(identity: Identity) -> PortalMachine {
        let mut machine = PortalMachine::new();
        machine.handle(Event::Intent(Intent::Connect));
        machine.handle(Event::ConnectFinished {
            mode: ConnectMode::Interactive,
            result: Ok(identity),
        });
        machine
    }

    #[test]
    fn test_connect_prompt_busy_while_connecting() {
        let mut machine = PortalMachine::new();
        assert_eq!(render(&machine).panel, Panel::ConnectPrompt { busy: false });

        machine.handle(Event::Startup);
        let view = render(&machine);
        assert_eq!(view.panel, Panel::ConnectPrompt { busy: true });
        assert!(view.panel.is_busy());
    }

    #[test]
    fn test_loading_then_initialize_prompt() {
        let identity = Identity::new(Pubkey::new_unique());
        let mut machine = connected(identity);
        assert_eq!(
            render(&machine).panel,
            Panel::Loading {
                identity: identity.to_string()
            }
        );

        machine.handle(Event::FetchFinished {
            request: 1,
            result: Err(FetchError::NotFound(Pubkey::new_unique())),
        });
        assert_eq!(
            render(&machine).panel,
            Panel::InitializePrompt {
                identity: identity.to_string(),
                busy: false
            }
        );

        machine.handle(Event::Intent(Intent::Initialize));
        assert!(render(&machine).panel.is_busy());
    }

    #[test]
    fn test_submission_form_lists_items_in_order() {
        let identity = Identity::new(Pubkey::new_unique());
        let mut machine = connected(identity);
        let items = ["a", "b", "a"]
            .iter()
            .map(|link| LinkItem {
                link: link.to_string(),
                submitter: identity.pubkey(),
            })
            .collect();
        machine.handle(Event::FetchFinished {
            request: 1,
            result: Ok(AccountSnapshot {
                address: Pubkey::new_unique(),
                slot: 9,
                items,
            }),
        });

        let Panel::SubmissionForm { items, busy, .. } = render(&machine).panel else {
            panic!("expected submission form");
        };
        assert!(!busy);
        let links: Vec<_> = items.iter().map(|item| item.link.as_str()).collect();
        assert_eq!(links, vec!["a", "b", "a"]);
        assert_eq!(items[0].submitter, identity.to_string());
    }

    #[test]
    fn test_view_json_shape() {
        let view = View::default();
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value, json!({ "panel": "connect_prompt", "busy": false, "notice": null }));
    }
}
