//! Browser front-end
//!
//! Serves the current view as a single HTML page and turns form posts into
//! session intents. Every post redirects back to `/` so a reload never
//! repeats a write.

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use portal_core::{Intent, SessionHandle, View};
use serde::Deserialize;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

use crate::page::render_page;

/// How long a post waits for the session to react before redirecting
const SETTLE: Duration = Duration::from_millis(250);

/// Submit form body
#[derive(Debug, Deserialize)]
pub struct SubmitForm {
    #[serde(default)]
    pub link: String,
}

/// HTTP front-end server
pub struct WebServer {
    handle: SessionHandle,
}

impl WebServer {
    pub fn new(handle: SessionHandle) -> Self {
        Self { handle }
    }

    /// Create the Axum router
    pub fn router(self) -> Router {
        // Read-only view for scripts and other local tools
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);
        let api: Router<SessionHandle> = Router::new()
            .route("/api/view", get(handle_view))
            .layer(cors);

        Router::new()
            .route("/", get(handle_page))
            .route("/connect", post(handle_connect))
            .route("/initialize", post(handle_initialize))
            .route("/submit", post(handle_submit))
            .route("/dismiss", post(handle_dismiss))
            .merge(api)
            .with_state(self.handle)
    }

    /// Run the server
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("GIF portal listening on http://{}", addr);

        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

async fn handle_page(State(handle): State<SessionHandle>) -> Html<String> {
    Html(render_page(&handle.view()))
}

async fn handle_view(State(handle): State<SessionHandle>) -> Json<View> {
    Json(handle.view())
}

async fn handle_connect(State(handle): State<SessionHandle>) -> Response {
    apply(handle, Intent::Connect).await
}

async fn handle_initialize(State(handle): State<SessionHandle>) -> Response {
    apply(handle, Intent::Initialize).await
}

async fn handle_submit(State(handle): State<SessionHandle>, Form(form): Form<SubmitForm>) -> Response {
    apply(handle, Intent::Submit(form.link)).await
}

async fn handle_dismiss(State(handle): State<SessionHandle>) -> Response {
    apply(handle, Intent::DismissNotice).await
}

async fn apply(mut handle: SessionHandle, intent: Intent) -> Response {
    tracing::debug!("Front-end intent: {:?}", intent);
    match handle.dispatch(intent, SETTLE).await {
        Ok(_) => Redirect::to("/").into_response(),
        Err(e) => {
            tracing::error!("Dropping intent: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use portal_core::PortalSession;
    use program_client::{ProgramConfig, RpcProgramClient};
    use solana_sdk::signature::Keypair;
    use std::sync::Arc;
    use tower::ServiceExt;
    use wallet_adapter::KeypairWallet;

    fn unreachable_session(dir: &std::path::Path) -> PortalSession {
        let wallet = Arc::new(KeypairWallet::new(
            dir.join("missing-wallet.json"),
            dir.join("trusted.json"),
        ));
        let config = Arc::new(ProgramConfig::new("http://127.0.0.1:1", Keypair::new()));
        let program = Arc::new(RpcProgramClient::new(config, wallet.clone()));
        PortalSession::new(wallet, program)
    }

    #[tokio::test]
    async fn test_api_view_reports_connect_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let session = unreachable_session(dir.path());
        let router = WebServer::new(session.handle()).router();

        let response = router
            .oneshot(Request::get("/api/view").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["panel"], "connect_prompt");
        assert_eq!(value["busy"], false);
        drop(session);
    }

    #[tokio::test]
    async fn test_page_renders_current_panel() {
        let dir = tempfile::tempdir().unwrap();
        let session = unreachable_session(dir.path());
        let router = WebServer::new(session.handle()).router();

        let response = router
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let page = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("Connect to Wallet"));
        drop(session);
    }

    #[tokio::test]
    async fn test_post_redirects_while_session_alive() {
        let dir = tempfile::tempdir().unwrap();
        let session = unreachable_session(dir.path());
        let router = WebServer::new(session.handle()).router();

        // Session not running: the intent is queued and the settle wait times out
        let response = router
            .oneshot(Request::post("/connect").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
        drop(session);
    }

    #[tokio::test]
    async fn test_post_after_session_stopped() {
        let dir = tempfile::tempdir().unwrap();
        let session = unreachable_session(dir.path());
        let router = WebServer::new(session.handle()).router();
        drop(session);

        let response = router
            .oneshot(
                Request::post("/submit")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("link=https%3A%2F%2Fexample.com%2Fa.gif"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
