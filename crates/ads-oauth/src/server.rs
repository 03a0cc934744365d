//! Local HTTP listener that captures the OAuth authorization redirect.
//!
//! The provider redirects the operator's browser to `http://localhost:<port>/`
//! with a `code` query parameter. The listener answers every path: a request
//! carrying a non-empty code gets a success page and resolves the pending
//! authorization exactly once; anything else gets a 400 page and the listener
//! keeps waiting so the operator can retry in-browser.

use axum::{
    Router,
    extract::Query,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;

/// Delay between resolving the code and closing the listener, so the
/// browser finishes rendering the success page before the socket goes away.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

#[derive(Deserialize)]
struct RedirectParams {
    code: Option<String>,
    error: Option<String>,
}

/// Channels handed to the redirect handler. Taken (not cloned) on the first
/// successful redirect, so the pending authorization resolves exactly once.
type PendingSlot = Arc<Mutex<Option<(oneshot::Sender<String>, oneshot::Sender<()>)>>>;

/// One-shot local listener for the authorization redirect.
///
/// Bound once per authorization attempt; a retry tears this down and binds a
/// fresh listener. The port is fully released before [`wait_for_code`]
/// returns on every path, so rebinding the same fixed port always works.
///
/// [`wait_for_code`]: CaptureServer::wait_for_code
pub struct CaptureServer {
    port: u16,
    code_rx: oneshot::Receiver<String>,
    server: JoinHandle<()>,
}

impl CaptureServer {
    /// Bind the listener on the given local port (0 picks an ephemeral port).
    pub async fn bind(port: u16) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
        let port = listener.local_addr()?.port();

        let (code_tx, code_rx) = oneshot::channel::<String>();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let pending: PendingSlot = Arc::new(Mutex::new(Some((code_tx, shutdown_tx))));

        let handler = move |Query(params): Query<RedirectParams>| {
            let pending = pending.clone();
            async move { handle_redirect(params, pending).await }
        };

        // Serve every path; providers differ in what they append to the
        // registered redirect URI.
        let app = Router::new().fallback(handler);

        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .ok();
        });

        Ok(Self {
            port,
            code_rx,
            server,
        })
    }

    /// Port the listener is bound to
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Wait for the authorization code, then wait for the listener to close.
    ///
    /// The wait is unbounded: the operator either completes the browser flow
    /// or interrupts the process. Returns only after the socket is released.
    pub async fn wait_for_code(self) -> Result<String, Box<dyn std::error::Error>> {
        let code = self
            .code_rx
            .await
            .map_err(|_| "Authorization listener closed before a code arrived")?;

        // The handler scheduled a graceful shutdown; joining the server task
        // guarantees the port is free before the caller proceeds or retries.
        self.server.await?;

        Ok(code)
    }

    /// Tear the listener down without consuming a code (operator declined).
    pub async fn abort(self) -> Result<(), Box<dyn std::error::Error>> {
        self.server.abort();
        // JoinError from abort is expected; the socket is closed either way.
        self.server.await.ok();
        Ok(())
    }
}

async fn handle_redirect(params: RedirectParams, pending: PendingSlot) -> Response {
    if let Some(error) = params.error {
        return (
            StatusCode::BAD_REQUEST,
            Html(format!(
                "<html><body><h1>Authorization Failed</h1><p>Error: {}</p>\
                <p>You can close this window and retry from the application.</p></body></html>",
                error
            )),
        )
            .into_response();
    }

    match params.code {
        Some(code) if !code.is_empty() => {
            if let Some((code_tx, shutdown_tx)) = pending.lock().await.take() {
                // The caller may have dropped the receiver; the page is
                // still the right answer for the browser.
                code_tx.send(code).ok();
                tokio::spawn(async move {
                    tokio::time::sleep(SHUTDOWN_GRACE).await;
                    shutdown_tx.send(()).ok();
                });
            }
            Html(
                "<html><body><h1>Authorization Successful!</h1>\
                <p>You can close this window and return to the application.</p></body></html>",
            )
            .into_response()
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Html(
                "<html><body><h1>Authorization Failed</h1><p>No code received.</p>\
                <p>You can close this window and retry from the application.</p></body></html>"
                    .to_string(),
            ),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[tokio::test]
    async fn redirect_with_code_returns_200_and_resolves_pending() {
        let server = CaptureServer::bind(0).await.unwrap();
        let port = server.port();

        let response = reqwest::get(format!("http://127.0.0.1:{}/?code=ABC123", port))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body = response.text().await.unwrap();
        assert!(body.contains("Authorization Successful"));

        let code = server.wait_for_code().await.unwrap();
        assert_eq!(code, "ABC123");
    }

    #[tokio::test]
    async fn redirect_without_code_returns_400_and_keeps_listening() {
        let server = CaptureServer::bind(0).await.unwrap();
        let port = server.port();

        let response = reqwest::get(format!("http://127.0.0.1:{}/?state=xyz", port))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

        // A later, correct redirect must still succeed.
        let response = reqwest::get(format!("http://127.0.0.1:{}/?code=second-try", port))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let code = server.wait_for_code().await.unwrap();
        assert_eq!(code, "second-try");
    }

    #[tokio::test]
    async fn empty_code_parameter_is_rejected() {
        let server = CaptureServer::bind(0).await.unwrap();
        let port = server.port();

        let response = reqwest::get(format!("http://127.0.0.1:{}/?code=", port))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

        let response = reqwest::get(format!("http://127.0.0.1:{}/?code=ok", port))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(server.wait_for_code().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn provider_error_param_returns_400_and_keeps_listening() {
        let server = CaptureServer::bind(0).await.unwrap();
        let port = server.port();

        let response = reqwest::get(format!("http://127.0.0.1:{}/?error=access_denied", port))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        let body = response.text().await.unwrap();
        assert!(body.contains("access_denied"));

        let response = reqwest::get(format!("http://127.0.0.1:{}/?code=after-denial", port))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(server.wait_for_code().await.unwrap(), "after-denial");
    }

    #[tokio::test]
    async fn any_path_is_served() {
        let server = CaptureServer::bind(0).await.unwrap();
        let port = server.port();

        let response = reqwest::get(format!(
            "http://127.0.0.1:{}/oauth2callback?code=deep-path",
            port
        ))
        .await
        .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(server.wait_for_code().await.unwrap(), "deep-path");
    }

    #[tokio::test]
    async fn port_is_released_after_success_and_can_be_rebound() {
        let server = CaptureServer::bind(0).await.unwrap();
        let port = server.port();

        reqwest::get(format!("http://127.0.0.1:{}/?code=x", port))
            .await
            .unwrap();
        server.wait_for_code().await.unwrap();

        // wait_for_code returns only after the socket is closed, so the
        // same fixed port must be bindable for a retry.
        let retry = CaptureServer::bind(port).await.unwrap();
        assert_eq!(retry.port(), port);
        retry.abort().await.unwrap();
    }

    #[tokio::test]
    async fn port_is_released_after_abort() {
        let server = CaptureServer::bind(0).await.unwrap();
        let port = server.port();
        server.abort().await.unwrap();

        let retry = CaptureServer::bind(port).await.unwrap();
        retry.abort().await.unwrap();
    }

    #[tokio::test]
    async fn second_redirect_after_success_does_not_panic() {
        let server = CaptureServer::bind(0).await.unwrap();
        let port = server.port();

        reqwest::get(format!("http://127.0.0.1:{}/?code=first", port))
            .await
            .unwrap();
        // The pending slot is already taken; within the shutdown grace the
        // listener may still answer, or the connection is refused. Both are
        // fine, the pending authorization stays resolved with "first".
        let _ = reqwest::get(format!("http://127.0.0.1:{}/?code=second", port)).await;

        assert_eq!(server.wait_for_code().await.unwrap(), "first");
    }

    #[tokio::test]
    async fn wait_does_not_resolve_without_redirect() {
        let server = CaptureServer::bind(0).await.unwrap();

        let waited = timeout(Duration::from_millis(200), server.wait_for_code()).await;
        assert!(waited.is_err(), "pending authorization resolved early");
    }
}
