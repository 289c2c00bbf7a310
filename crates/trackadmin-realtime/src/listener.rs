//! WebSocket listener with fixed-delay reconnect.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::watch;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use trackadmin_core::error::{Result, TrackAdminError};
use trackadmin_core::realtime::{AdminUpdate, ClientMessage};

use crate::handler::UpdateHandler;

pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

pub struct AdminListener {
    ws_url: String,
    user_id: i64,
    handler: Arc<dyn UpdateHandler>,
    reconnect_delay: Duration,
}

impl AdminListener {
    pub fn new(ws_url: impl Into<String>, user_id: i64, handler: Arc<dyn UpdateHandler>) -> Self {
        Self {
            ws_url: ws_url.into(),
            user_id,
            handler,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Run until `shutdown` becomes true (or its sender is dropped).
    ///
    /// Every session end, clean or not, is followed by the same fixed
    /// delay before the next connect attempt.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                result = self.run_session() => match result {
                    Ok(()) => tracing::info!("Admin WebSocket closed by server"),
                    Err(e) => tracing::warn!("Admin WebSocket session ended: {e}"),
                },
                _ = wait_for_shutdown(&mut shutdown) => break,
            }

            tracing::info!("Admin WebSocket disconnected, reconnecting in {:?}...", self.reconnect_delay);
            tokio::select! {
                _ = tokio::time::sleep(self.reconnect_delay) => {}
                _ = wait_for_shutdown(&mut shutdown) => break,
            }
        }
        tracing::info!("Admin WebSocket listener stopped");
    }

    /// One connection: connect, authenticate, dispatch until the stream ends.
    async fn run_session(&self) -> Result<()> {
        tracing::info!("Admin WebSocket: connecting to {}", self.ws_url);
        let (ws, _) = connect_async(self.ws_url.as_str())
            .await
            .map_err(|e| TrackAdminError::websocket(format!("connect {}: {e}", self.ws_url)))?;
        tracing::info!("Admin WebSocket: connected");

        let (mut write, mut read) = ws.split();
        let auth = ClientMessage::admin_auth(self.user_id).to_json()?;
        write
            .send(Message::text(auth))
            .await
            .map_err(|e| TrackAdminError::websocket(format!("send auth: {e}")))?;

        while let Some(frame) = read.next().await {
            let frame = frame.map_err(|e| TrackAdminError::websocket(format!("read: {e}")))?;
            match frame {
                Message::Text(text) => self.dispatch(text.as_str()).await,
                Message::Close(reason) => {
                    tracing::debug!("Close frame: {reason:?}");
                    break;
                }
                // Pings are answered by tungstenite itself.
                _ => {}
            }
        }
        Ok(())
    }

    async fn dispatch(&self, text: &str) {
        match AdminUpdate::parse(text) {
            Ok(Some(update)) => {
                let kind = update.kind().to_string();
                tracing::info!("Admin update received: {kind}");
                if let Err(e) = self.handler.handle(update).await {
                    tracing::error!("Admin update '{kind}' handler failed: {e}");
                }
            }
            Ok(None) => tracing::debug!("Ignoring non-admin frame"),
            Err(e) => tracing::warn!("Malformed realtime frame: {e}"),
        }
    }
}

/// Resolves once shutdown is requested or the controlling sender is gone.
async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}
