//! Capture session state machine
//!
//! Coordinates a single voice-to-text attempt: idle until started, listening
//! until the recognizer delivers a result or an error. The session owns its
//! recognizer and publishes the observable `{listening, transcript, error}`
//! triple through a watch channel.

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info};

use crate::events::GalleryEvent;

use super::recognizer::{RecognizerEvent, SpeechRecognizer};

/// Observable state of the capture session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureState {
    /// A capture attempt is in progress
    pub listening: bool,

    /// Last recognized text, empty until a result arrives
    pub transcript: String,

    /// Last recognition error, absent until a failure
    pub error: Option<String>,
}

/// Control messages sent to the session task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureCommand {
    Start,
    Stop,
    Shutdown,
}

/// Cloneable handle for controlling and observing the session
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<CaptureCommand>,
    state_rx: watch::Receiver<CaptureState>,
}

impl SessionHandle {
    /// Begin a capture attempt
    ///
    /// Starting while already listening is unsupported and unguarded: the
    /// last attempt's events win.
    pub async fn start(&self) {
        let _ = self.command_tx.send(CaptureCommand::Start).await;
    }

    /// End an in-progress capture attempt
    pub async fn stop(&self) {
        let _ = self.command_tx.send(CaptureCommand::Stop).await;
    }

    /// Tear the session down, releasing the recognizer best-effort
    pub async fn shutdown(&self) {
        let _ = self.command_tx.send(CaptureCommand::Shutdown).await;
    }

    /// Snapshot of the current capture state
    pub fn state(&self) -> CaptureState {
        self.state_rx.borrow().clone()
    }

    /// Fresh watch receiver for observing state changes
    pub fn subscribe(&self) -> watch::Receiver<CaptureState> {
        self.state_rx.clone()
    }
}

/// The session actor; consumes commands and recognizer events
pub struct CaptureSession {
    recognizer: Box<dyn SpeechRecognizer>,
    locale: String,
    command_rx: mpsc::Receiver<CaptureCommand>,
    provider_rx: mpsc::Receiver<RecognizerEvent>,
    state_tx: watch::Sender<CaptureState>,
    event_tx: broadcast::Sender<GalleryEvent>,
}

impl CaptureSession {
    /// Create a session around a recognizer backend
    ///
    /// `provider_rx` is the receiving end of the channel the recognizer was
    /// constructed with; no other session can observe its events.
    pub fn new(
        recognizer: Box<dyn SpeechRecognizer>,
        provider_rx: mpsc::Receiver<RecognizerEvent>,
        locale: String,
        event_tx: broadcast::Sender<GalleryEvent>,
    ) -> (Self, SessionHandle) {
        let (command_tx, command_rx) = mpsc::channel(16);
        let (state_tx, state_rx) = watch::channel(CaptureState::default());

        let session = Self {
            recognizer,
            locale,
            command_rx,
            provider_rx,
            state_tx,
            event_tx,
        };
        let handle = SessionHandle {
            command_tx,
            state_rx,
        };
        (session, handle)
    }

    /// Run the session until shutdown, processing commands and provider
    /// events
    ///
    /// A provider that never calls back leaves the session listening
    /// indefinitely; no timeout is enforced here.
    pub async fn run(mut self) {
        info!(locale = %self.locale, "capture session started in idle state");

        loop {
            tokio::select! {
                command = self.command_rx.recv() => match command {
                    Some(CaptureCommand::Start) => self.handle_start().await,
                    Some(CaptureCommand::Stop) => self.handle_stop().await,
                    Some(CaptureCommand::Shutdown) | None => break,
                },
                event = self.provider_rx.recv() => match event {
                    Some(event) => self.apply(event),
                    None => break,
                },
            }
        }

        self.recognizer.shutdown().await;
        info!("capture session stopped");
    }

    async fn handle_start(&mut self) {
        if let Err(e) = self.recognizer.start(&self.locale).await {
            // Start failures take the same path as provider errors
            self.apply(RecognizerEvent::Error(e.to_string()));
        }
    }

    async fn handle_stop(&mut self) {
        if let Err(e) = self.recognizer.stop().await {
            self.apply(RecognizerEvent::Error(e.to_string()));
        }
    }

    /// Apply one recognizer event to the observable state
    fn apply(&mut self, event: RecognizerEvent) {
        debug!(?event, "recognizer event");

        match event {
            RecognizerEvent::Started => {
                self.transition(|state| state.listening = true);
                self.emit(GalleryEvent::CaptureStarted);
            }
            RecognizerEvent::Results(values) => {
                let transcript = values.into_iter().next().unwrap_or_default();
                self.transition(|state| {
                    state.transcript = transcript.clone();
                    state.listening = false;
                });
                self.emit(GalleryEvent::CaptureFinished { transcript });
            }
            RecognizerEvent::Error(message) => {
                self.transition(|state| {
                    state.error = Some(message.clone());
                    state.listening = false;
                });
                self.emit(GalleryEvent::CaptureFailed { message });
            }
            RecognizerEvent::Cleared => {
                self.transition(|state| {
                    state.error = None;
                    state.listening = false;
                });
                self.emit(GalleryEvent::CaptureStopped);
            }
        }
    }

    fn transition(&self, update: impl FnOnce(&mut CaptureState)) {
        let was_listening = self.state_tx.borrow().listening;
        self.state_tx.send_modify(update);
        let now_listening = self.state_tx.borrow().listening;

        if was_listening != now_listening {
            info!(
                from = if was_listening { "listening" } else { "idle" },
                to = if now_listening { "listening" } else { "idle" },
                "capture transition"
            );
        }
    }

    fn emit(&self, event: GalleryEvent) {
        debug!(%event, "emitting event");
        let _ = self.event_tx.send(event);
    }
}
