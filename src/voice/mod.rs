//! Voice capture: session state machine and speech backends
//!
//! One capability interface, two provider families:
//! - the bridge backend retains its helper process and can stop it
//! - the one-shot backend fires and forgets; stop only resets state
//!
//! The backend is selected once at startup by probing the environment.

mod bridge;
mod oneshot;
mod recognizer;
mod session;

pub use bridge::BridgeRecognizer;
pub use oneshot::OneShotRecognizer;
pub use recognizer::{RecognizerError, RecognizerEvent, RecognizerEventSender, SpeechRecognizer};
pub use session::{CaptureCommand, CaptureSession, CaptureState, SessionHandle};

use std::path::Path;

use tracing::info;

use crate::config::Config;

/// Pick a speech backend for this environment
///
/// The retained bridge helper is preferred; when it is not installed the
/// fire-and-forget backend is used instead.
pub fn detect_backend(
    config: &Config,
    events: RecognizerEventSender,
) -> Box<dyn SpeechRecognizer> {
    if command_available(&config.bridge_cmd) {
        info!(cmd = %config.bridge_cmd, "using retained speech bridge backend");
        Box::new(BridgeRecognizer::new(&config.bridge_cmd, events))
    } else {
        info!(cmd = %config.oneshot_cmd, "speech bridge not found, using one-shot backend");
        Box::new(OneShotRecognizer::new(&config.oneshot_cmd, events))
    }
}

fn command_available(cmd: &str) -> bool {
    let path = Path::new(cmd);
    if path.components().count() > 1 {
        return path.is_file();
    }

    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(cmd).is_file()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_path_detection() {
        let dir = tempfile::tempdir().unwrap();
        let helper = dir.path().join("helper");
        std::fs::write(&helper, "#!/bin/sh\n").unwrap();

        assert!(command_available(&helper.to_string_lossy()));
        assert!(!command_available(
            &dir.path().join("missing").to_string_lossy()
        ));
    }

    #[test]
    fn test_unknown_command_is_unavailable() {
        assert!(!command_available("gallery-daemon-no-such-helper"));
    }
}
