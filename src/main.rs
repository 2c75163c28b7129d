//! gallery-daemon: background daemon for a voice-captioned image gallery
//!
//! The daemon owns the persistent core of the gallery and provides:
//! - Durable item storage (image reference + caption) under one namespace key
//! - Voice capture sessions bridging a platform speech provider
//! - Thin platform capability wrappers (picker, share sheet, clipboard)
//! - IPC server for UI clients, with event notifications
//!
//! Screens and styling live in the UI clients; nothing here renders.

mod capability;
mod config;
mod events;
mod ipc;
mod lifecycle;
mod store;
mod voice;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::capability::{Clipboard, ImagePicker, ShareSheet};
use crate::config::Config;
use crate::events::GalleryEvent;
use crate::ipc::Server;
use crate::store::ItemStore;
use crate::voice::CaptureSession;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "gallery-daemon starting"
    );

    // Load configuration
    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(?config.socket_path, "configuration loaded");

    let store = ItemStore::open(&config.data_dir);

    // Capture and store events, fanned out to IPC subscribers
    let (event_tx, _event_rx) = broadcast::channel::<GalleryEvent>(64);

    // Recognizer events flow only to the session that owns the backend
    let (provider_tx, provider_rx) = mpsc::channel(32);
    let recognizer = voice::detect_backend(&config, provider_tx);

    let (session, session_handle) = CaptureSession::new(
        recognizer,
        provider_rx,
        config.locale.clone(),
        event_tx.clone(),
    );
    let session_task = tokio::spawn(session.run());

    // Create IPC server over the store, session, and capabilities
    let server = Server::new(
        &config.socket_path,
        store,
        session_handle.clone(),
        ImagePicker::new(config.picker_cmd.clone()),
        ShareSheet::new(config.share_cmd.clone()),
        Clipboard::new(config.clipboard_cmd.clone()),
        event_tx.clone(),
    )?;

    info!("daemon initialized, entering main loop");

    // Main event loop
    tokio::select! {
        // Run the IPC server (accepts client connections)
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        // Wait for shutdown signal
        result = lifecycle::shutdown_requested() => {
            match result {
                Ok(()) => info!("shutdown signal received"),
                Err(e) => error!(?e, "signal handler error"),
            }
        }
    }

    // Cleanup
    info!("shutting down...");

    session_handle.shutdown().await;
    if let Err(e) = session_task.await {
        error!(?e, "capture session task failed");
    }
    server.shutdown().await;

    info!("gallery-daemon stopped");

    Ok(())
}
