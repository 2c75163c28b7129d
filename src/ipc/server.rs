//! Unix domain socket server for IPC
//!
//! Provides request-response communication and, for subscribed
//! connections, pushed event notifications.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::capability::{Clipboard, ImagePicker, PickOutcome, ShareSheet};
use crate::events::GalleryEvent;
use crate::store::{GalleryItem, ItemStore};
use crate::voice::SessionHandle;

use super::protocol::{DaemonStatus, Notification, Request, Response};

/// Everything a client handler needs to serve requests
pub struct ServerCtx {
    pub store: ItemStore,
    pub session: SessionHandle,
    pub picker: ImagePicker,
    pub share: ShareSheet,
    pub clipboard: Clipboard,
    pub event_tx: broadcast::Sender<GalleryEvent>,
    start_time: Instant,
}

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: Option<UnixListener>,
    ctx: Arc<ServerCtx>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Server {
    /// Create a new IPC server bound to the given socket path
    pub fn new(
        socket_path: &Path,
        store: ItemStore,
        session: SessionHandle,
        picker: ImagePicker,
        share: ShareSheet,
        clipboard: Clipboard,
        event_tx: broadcast::Sender<GalleryEvent>,
    ) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Set socket permissions to owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        let ctx = Arc::new(ServerCtx {
            store,
            session,
            picker,
            share,
            clipboard,
            event_tx,
            start_time: Instant::now(),
        });

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener: Some(listener),
            ctx,
            shutdown_tx,
        })
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        let listener = self.listener.as_ref().context("server not initialized")?;

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let ctx = Arc::clone(&self.ctx);
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_client(stream, ctx) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Handle a single client connection
    async fn handle_client(mut stream: UnixStream, ctx: Arc<ServerCtx>) -> Result<()> {
        let mut len_buf = [0u8; 4];

        loop {
            // Read message length (4-byte little-endian)
            match stream.read_exact(&mut len_buf).await {
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    debug!("client disconnected");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }

            let len = u32::from_le_bytes(len_buf) as usize;
            if len > 1024 * 1024 {
                warn!(len, "message too large, disconnecting");
                return Ok(());
            }

            // Read message body
            let mut msg_buf = vec![0u8; len];
            stream.read_exact(&mut msg_buf).await?;

            // Parse request
            let request: Request =
                serde_json::from_slice(&msg_buf).context("failed to parse request")?;

            debug!(?request, "received request");

            // Process request
            let (response, subscribe) = Self::process_request(request, &ctx).await;

            // Send response
            Self::send_message(&mut stream, &response).await?;

            // A subscribed connection becomes notification-only from here
            if subscribe {
                debug!("client subscribed to notifications");
                return Self::stream_events(stream, ctx.event_tx.subscribe()).await;
            }
        }
    }

    /// Forward broadcast events to a subscribed client until it disconnects
    async fn stream_events(
        mut stream: UnixStream,
        mut event_rx: broadcast::Receiver<GalleryEvent>,
    ) -> Result<()> {
        loop {
            match event_rx.recv().await {
                Ok(event) => {
                    if Self::send_message(&mut stream, &Notification::Event { event })
                        .await
                        .is_err()
                    {
                        debug!("subscriber disconnected");
                        return Ok(());
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "subscriber lagged behind event stream");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Ok(());
                }
            }
        }
    }

    /// Send a length-prefixed JSON message
    async fn send_message<T: serde::Serialize>(stream: &mut UnixStream, msg: &T) -> Result<()> {
        let msg_bytes = serde_json::to_vec(msg)?;
        let msg_len = (msg_bytes.len() as u32).to_le_bytes();

        stream.write_all(&msg_len).await?;
        stream.write_all(&msg_bytes).await?;

        Ok(())
    }

    /// Process a request and return a response
    /// Returns (Response, should_subscribe)
    async fn process_request(request: Request, ctx: &ServerCtx) -> (Response, bool) {
        match request {
            Request::Ping => (Response::Pong, false),

            Request::GetStatus => {
                let status = DaemonStatus {
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    listening: ctx.session.state().listening,
                    item_count: ctx.store.load().await.len(),
                    uptime_secs: ctx.start_time.elapsed().as_secs(),
                };
                (Response::Status(status), false)
            }

            Request::ListItems => {
                let items = ctx.store.load().await;
                (Response::Items { items }, false)
            }

            Request::SaveItem { uri, caption } => match ctx.store.save(&uri, &caption).await {
                Ok(item) => {
                    info!(id = %item.id, "item saved via IPC");
                    let _ = ctx.event_tx.send(GalleryEvent::ItemSaved {
                        id: item.id.clone(),
                    });
                    (Response::Saved { item }, false)
                }
                Err(e) => {
                    error!(error = %e, "item save failed");
                    (
                        Response::Error {
                            code: "save_failed".to_string(),
                            message: e.to_string(),
                        },
                        false,
                    )
                }
            },

            Request::StartCapture => {
                ctx.session.start().await;
                (Response::Capture(ctx.session.state()), false)
            }

            Request::StopCapture => {
                ctx.session.stop().await;
                (Response::Capture(ctx.session.state()), false)
            }

            Request::GetCaptureState => (Response::Capture(ctx.session.state()), false),

            Request::PickImage => match ctx.picker.pick().await {
                Ok(PickOutcome::Picked { uri }) => (Response::Picked { uri: Some(uri) }, false),
                Ok(PickOutcome::Cancelled) => (Response::Picked { uri: None }, false),
                Err(e) => (capability_error(e), false),
            },

            Request::ShareItem { id } => match find_item(ctx, &id).await {
                Some(item) => match ctx.share.share(&item).await {
                    Ok(()) => (Response::Shared, false),
                    Err(e) => (capability_error(e), false),
                },
                None => (not_found(&id), false),
            },

            Request::CopyCaption { id } => match find_item(ctx, &id).await {
                Some(item) => match ctx.clipboard.copy(&item.caption).await {
                    Ok(()) => (Response::Copied, false),
                    Err(e) => (capability_error(e), false),
                },
                None => (not_found(&id), false),
            },

            Request::Subscribe => (Response::Subscribed, true),
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        // Remove socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}

/// The store has no per-item addressing; ids resolve against the loaded list
async fn find_item(ctx: &ServerCtx, id: &str) -> Option<GalleryItem> {
    ctx.store.load().await.into_iter().find(|item| item.id == id)
}

fn capability_error(e: crate::capability::CapabilityError) -> Response {
    Response::Error {
        code: "capability_unavailable".to_string(),
        message: e.to_string(),
    }
}

fn not_found(id: &str) -> Response {
    Response::Error {
        code: "not_found".to_string(),
        message: format!("no item with id {id}"),
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::{broadcast, mpsc};

    use super::*;
    use crate::voice::{CaptureSession, OneShotRecognizer};

    fn test_ctx(dir: &tempfile::TempDir) -> (ServerCtx, broadcast::Receiver<GalleryEvent>) {
        let (event_tx, event_rx) = broadcast::channel(16);
        let (provider_tx, provider_rx) = mpsc::channel(16);
        let recognizer = OneShotRecognizer::new("true", provider_tx);
        let (session, handle) = CaptureSession::new(
            Box::new(recognizer),
            provider_rx,
            "en-US".to_string(),
            event_tx.clone(),
        );
        tokio::spawn(session.run());

        let ctx = ServerCtx {
            store: ItemStore::open(dir.path()),
            session: handle,
            picker: ImagePicker::new(vec!["true".to_string()]),
            share: ShareSheet::new(vec!["true".to_string()]),
            clipboard: Clipboard::new(vec!["cat".to_string()]),
            event_tx,
            start_time: Instant::now(),
        };
        (ctx, event_rx)
    }

    #[tokio::test]
    async fn test_ping() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _events) = test_ctx(&dir);

        let (response, subscribe) = Server::process_request(Request::Ping, &ctx).await;
        assert!(matches!(response, Response::Pong));
        assert!(!subscribe);
    }

    #[tokio::test]
    async fn test_save_then_list() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, mut events) = test_ctx(&dir);

        let (response, _) = Server::process_request(
            Request::SaveItem {
                uri: "file:///a.jpg".to_string(),
                caption: "sunset".to_string(),
            },
            &ctx,
        )
        .await;
        let saved = match response {
            Response::Saved { item } => item,
            other => panic!("unexpected response: {other:?}"),
        };
        assert!(matches!(
            events.recv().await,
            Ok(GalleryEvent::ItemSaved { .. })
        ));

        let (response, _) = Server::process_request(Request::ListItems, &ctx).await;
        match response {
            Response::Items { items } => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0], saved);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_status_counts_items() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _events) = test_ctx(&dir);

        ctx.store.save("file:///a.jpg", "one").await.unwrap();

        let (response, _) = Server::process_request(Request::GetStatus, &ctx).await;
        match response {
            Response::Status(status) => {
                assert_eq!(status.item_count, 1);
                assert!(!status.listening);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_item_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _events) = test_ctx(&dir);

        let (response, _) = Server::process_request(
            Request::ShareItem {
                id: "missing".to_string(),
            },
            &ctx,
        )
        .await;
        match response {
            Response::Error { code, .. } => assert_eq!(code, "not_found"),
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_copy_caption() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _events) = test_ctx(&dir);

        let saved = ctx.store.save("file:///a.jpg", "a caption").await.unwrap();

        let (response, _) =
            Server::process_request(Request::CopyCaption { id: saved.id }, &ctx).await;
        assert!(matches!(response, Response::Copied));
    }

    #[tokio::test]
    async fn test_subscribe_flips_connection_mode() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _events) = test_ctx(&dir);

        let (response, subscribe) = Server::process_request(Request::Subscribe, &ctx).await;
        assert!(matches!(response, Response::Subscribed));
        assert!(subscribe);
    }

    #[tokio::test]
    async fn test_capture_state_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _events) = test_ctx(&dir);

        let (response, _) = Server::process_request(Request::GetCaptureState, &ctx).await;
        match response {
            Response::Capture(state) => {
                assert!(!state.listening);
                assert_eq!(state.transcript, "");
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }
}
