//! HTML page for the current view
//!
//! Panels are dioxus components rendered server-side; text and attribute
//! values are escaped by the renderer.

use dioxus::prelude::*;
use portal_core::{ItemView, Notice, NoticeLevel, Panel, View};

/// Render the full HTML document for a view
pub fn render_page(view: &View) -> String {
    let mut dom = VirtualDom::new_with_props(Portal, PortalProps { view: view.clone() });
    dom.rebuild_in_place();
    let body = dioxus_ssr::render(&dom);

    // Poll while a remote call is in flight
    let refresh = if view.panel.is_busy() {
        r#"<meta http-equiv="refresh" content="1">"#
    } else {
        ""
    };

    format!(
        r#"<!DOCTYPE html><html><head><meta charset="utf-8">{refresh}<title>GIF Portal</title></head><body>{body}</body></html>"#
    )
}

#[component]
fn Portal(view: View) -> Element {
    let panel = match &view.panel {
        Panel::ConnectPrompt { busy } => rsx! {
            ConnectPrompt { busy: *busy }
        },
        Panel::Loading { identity } => rsx! {
            IdentityLine { identity: identity.clone() }
            p { class: "loading", "Loading GIF collection..." }
        },
        Panel::InitializePrompt { identity, busy } => rsx! {
            IdentityLine { identity: identity.clone() }
            InitializePrompt { busy: *busy }
        },
        Panel::SubmissionForm {
            identity,
            draft,
            busy,
            items,
        } => rsx! {
            IdentityLine { identity: identity.clone() }
            SubmissionForm { draft: draft.clone(), busy: *busy }
            GifGrid { items: items.clone() }
        },
    };

    rsx! {
        div { class: "container",
            p { class: "header", "🖼 GIF Portal" }
            p { class: "sub-text", "View your GIF collection in the metaverse ✨" }
            if let Some(notice) = view.notice.clone() {
                NoticeBanner { notice: notice }
            }
            {panel}
        }
    }
}

#[component]
fn NoticeBanner(notice: Notice) -> Element {
    let class = match notice.level {
        NoticeLevel::Info => "notice info",
        NoticeLevel::Error => "notice error",
    };

    rsx! {
        div { class: "{class}",
            span { {notice.message} }
            form { method: "post", action: "/dismiss",
                button { r#type: "submit", "Dismiss" }
            }
        }
    }
}

#[component]
fn IdentityLine(identity: String) -> Element {
    rsx! {
        p { class: "identity", {identity} }
    }
}

#[component]
fn ConnectPrompt(busy: bool) -> Element {
    rsx! {
        form { method: "post", action: "/connect",
            button {
                class: "cta-button connect-wallet-button",
                r#type: "submit",
                disabled: busy,
                "Connect to Wallet"
            }
        }
    }
}

#[component]
fn InitializePrompt(busy: bool) -> Element {
    rsx! {
        form { method: "post", action: "/initialize",
            button {
                class: "cta-button submit-gif-button",
                r#type: "submit",
                disabled: busy,
                "Do One-Time Initialization For GIF Program Account"
            }
        }
    }
}

#[component]
fn SubmissionForm(draft: String, busy: bool) -> Element {
    rsx! {
        form { method: "post", action: "/submit",
            input {
                r#type: "text",
                name: "link",
                placeholder: "Enter gif link!",
                value: draft,
                disabled: busy,
            }
            button {
                class: "cta-button submit-gif-button",
                r#type: "submit",
                disabled: busy,
                "Submit"
            }
        }
    }
}

#[component]
fn GifGrid(items: Vec<ItemView>) -> Element {
    rsx! {
        div { class: "gif-grid",
            for item in items {
                div { class: "gif-item",
                    img { src: item.link.clone(), alt: item.link.clone() }
                    p { class: "submitter", {item.submitter} }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(draft: &str, busy: bool, items: Vec<ItemView>) -> View {
        View {
            panel: Panel::SubmissionForm {
                identity: "abc".to_string(),
                draft: draft.to_string(),
                busy,
                items,
            },
            notice: None,
        }
    }

    #[test]
    fn test_connect_prompt_page() {
        let page = render_page(&View::default());
        assert!(page.contains("Connect to Wallet"));
        assert!(page.contains("/connect"));
        assert!(!page.contains("Enter gif link!"));
        assert!(!page.contains("http-equiv=\"refresh\""));
    }

    #[test]
    fn test_busy_page_disables_controls() {
        let view = View {
            panel: Panel::InitializePrompt {
                identity: "abc".to_string(),
                busy: true,
            },
            notice: None,
        };
        let page = render_page(&view);
        assert!(page.contains("Do One-Time Initialization For GIF Program Account"));
        assert!(page.contains("disabled"));
        assert!(page.contains("http-equiv=\"refresh\""));
        assert!(!page.contains("Connect to Wallet"));
    }

    #[test]
    fn test_submission_form_lists_items() {
        let items = vec![
            ItemView {
                link: "https://media.giphy.com/a.gif".to_string(),
                submitter: "alice".to_string(),
            },
            ItemView {
                link: "https://media.giphy.com/b.gif".to_string(),
                submitter: "bob".to_string(),
            },
        ];
        let page = render_page(&form("", false, items));

        assert!(page.contains("Enter gif link!"));
        assert_eq!(page.matches("class=\"gif-item\"").count(), 2);
        let first = page.find("a.gif").unwrap();
        let second = page.find("b.gif").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_user_text_is_escaped() {
        let items = vec![ItemView {
            link: "https://example.com/a.gif?x=1&y=<2>".to_string(),
            submitter: "<i>me</i>".to_string(),
        }];
        let mut view = form("\"><script>alert(1)</script>", false, items);
        view.notice = Some(Notice::error("<b>failed</b>"));
        let page = render_page(&view);

        assert!(!page.contains("<script>"));
        assert!(!page.contains("<b>failed</b>"));
        assert!(!page.contains("<i>me</i>"));
        assert!(page.contains("&lt;b&gt;failed"));
        assert!(page.contains("notice error"));
    }
}
