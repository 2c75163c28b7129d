//! Fire-and-forget speech backend
//!
//! Each start spawns a fresh recognition helper whose handle is deliberately
//! not retained, so an in-flight capture cannot be addressed again. `stop`
//! only resets the observed state: it reports a cleared error and leaves any
//! running capture to finish in the background. Callers must tolerate that
//! capture may still be running after a stop.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::debug;

use super::recognizer::{RecognizerError, RecognizerEvent, SpeechRecognizer};

pub struct OneShotRecognizer {
    cmd: String,
    events: mpsc::Sender<RecognizerEvent>,
}

impl OneShotRecognizer {
    pub fn new(cmd: impl Into<String>, events: mpsc::Sender<RecognizerEvent>) -> Self {
        Self {
            cmd: cmd.into(),
            events,
        }
    }
}

#[async_trait]
impl SpeechRecognizer for OneShotRecognizer {
    async fn start(&mut self, locale: &str) -> Result<(), RecognizerError> {
        let child = Command::new(&self.cmd)
            .arg("--locale")
            .arg(locale)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| RecognizerError::Unavailable(format!("{}: {e}", self.cmd)))?;

        let _ = self.events.send(RecognizerEvent::Started).await;

        let events = self.events.clone();
        tokio::spawn(async move {
            match child.wait_with_output().await {
                Ok(output) if output.status.success() => {
                    let values: Vec<String> = String::from_utf8_lossy(&output.stdout)
                        .lines()
                        .map(str::trim)
                        .filter(|line| !line.is_empty())
                        .map(str::to_string)
                        .collect();
                    let _ = events.send(RecognizerEvent::Results(values)).await;
                }
                Ok(output) => {
                    let _ = events
                        .send(RecognizerEvent::Error(format!(
                            "speech helper exited with {}",
                            output.status
                        )))
                        .await;
                }
                Err(e) => {
                    let _ = events
                        .send(RecognizerEvent::Error(format!("speech helper failed: {e}")))
                        .await;
                }
            }
        });

        Ok(())
    }

    async fn stop(&mut self) -> Result<(), RecognizerError> {
        debug!("one-shot backend cannot address an in-flight capture; resetting state only");
        let _ = self.events.send(RecognizerEvent::Cleared).await;
        Ok(())
    }

    async fn shutdown(&mut self) {
        // Nothing retained to release.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_helper(dir: &tempfile::TempDir, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.path().join("speech-helper");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn test_result_is_forwarded() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = stub_helper(&dir, "echo \"hello world\"");

        let (tx, mut rx) = mpsc::channel(8);
        let mut recognizer = OneShotRecognizer::new(cmd, tx);

        recognizer.start("en-US").await.unwrap();
        assert_eq!(rx.recv().await, Some(RecognizerEvent::Started));
        assert_eq!(
            rx.recv().await,
            Some(RecognizerEvent::Results(vec!["hello world".to_string()]))
        );
    }

    #[tokio::test]
    async fn test_stop_only_clears_state() {
        let dir = tempfile::tempdir().unwrap();
        // Helper that outlives the stop call
        let cmd = stub_helper(&dir, "sleep 5\necho late");

        let (tx, mut rx) = mpsc::channel(8);
        let mut recognizer = OneShotRecognizer::new(cmd, tx);

        recognizer.start("en-US").await.unwrap();
        assert_eq!(rx.recv().await, Some(RecognizerEvent::Started));

        recognizer.stop().await.unwrap();
        assert_eq!(rx.recv().await, Some(RecognizerEvent::Cleared));
    }

    #[tokio::test]
    async fn test_missing_helper_fails_start() {
        let (tx, _rx) = mpsc::channel(8);
        let mut recognizer =
            OneShotRecognizer::new("/nonexistent/speech-helper-for-tests", tx);

        let err = recognizer.start("en-US").await.unwrap_err();
        assert!(matches!(err, RecognizerError::Unavailable(_)));
    }
}
