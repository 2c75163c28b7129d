//! Speech recognizer capability interface
//!
//! Backends adapt a platform speech provider into one event shape. Each
//! backend is constructed with the owning session's event sender, so a
//! session only ever observes its own recognizer.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Events a recognizer backend delivers to its owning session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognizerEvent {
    /// Capture began
    Started,

    /// Recognition alternatives, best first; may be empty when capture
    /// ended without recognized speech
    Results(Vec<String>),

    /// Recognition failed; the message is rendered verbatim by clients
    Error(String),

    /// Capture state reset without a result or an error
    Cleared,
}

/// Errors surfaced by recognizer control calls
#[derive(Debug, Error)]
pub enum RecognizerError {
    #[error("speech backend unavailable: {0}")]
    Unavailable(String),

    #[error("speech backend io failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Channel recognizer backends deliver events on
pub type RecognizerEventSender = mpsc::Sender<RecognizerEvent>;

/// Capability interface over a platform speech-to-text provider
#[async_trait]
pub trait SpeechRecognizer: Send {
    /// Begin an asynchronous capture in the given locale
    ///
    /// Effects are observed through the event channel, not the return
    /// value; an error here means capture never began.
    async fn start(&mut self, locale: &str) -> Result<(), RecognizerError>;

    /// End an in-progress capture
    ///
    /// Efficacy is backend-specific: the bridge family stops the retained
    /// helper, the one-shot family can only reset the observed state.
    async fn stop(&mut self) -> Result<(), RecognizerError>;

    /// Release backend resources, best effort; failures are swallowed
    async fn shutdown(&mut self);
}
