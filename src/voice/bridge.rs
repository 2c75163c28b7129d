//! Retained-handle speech backend
//!
//! Spawns the configured helper process per capture and keeps hold of it,
//! so an in-progress capture can actually be stopped. The helper contract:
//! it captures audio for the locale it was started with, writes recognition
//! alternatives to stdout one per line, finalizes when asked to stop (or
//! when its stdin closes), and exits zero.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use super::recognizer::{RecognizerError, RecognizerEvent, SpeechRecognizer};

pub struct BridgeRecognizer {
    cmd: String,
    events: mpsc::Sender<RecognizerEvent>,
    live: Arc<Mutex<LiveCapture>>,
}

#[derive(Default)]
struct LiveCapture {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
}

impl BridgeRecognizer {
    pub fn new(cmd: impl Into<String>, events: mpsc::Sender<RecognizerEvent>) -> Self {
        Self {
            cmd: cmd.into(),
            events,
            live: Arc::new(Mutex::new(LiveCapture::default())),
        }
    }
}

#[async_trait]
impl SpeechRecognizer for BridgeRecognizer {
    async fn start(&mut self, locale: &str) -> Result<(), RecognizerError> {
        let mut child = Command::new(&self.cmd)
            .arg("--locale")
            .arg(locale)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RecognizerError::Unavailable(format!("{}: {e}", self.cmd)))?;

        let stdout = child.stdout.take().ok_or_else(|| {
            RecognizerError::Unavailable("speech helper stdout not captured".to_string())
        })?;
        let stdin = child.stdin.take();

        {
            // Any capture left over from an earlier start is dropped here;
            // kill_on_drop reaps the abandoned helper.
            let mut live = self.live.lock().await;
            live.child = Some(child);
            live.stdin = stdin;
        }

        let _ = self.events.send(RecognizerEvent::Started).await;

        let events = self.events.clone();
        let live = Arc::clone(&self.live);
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            let mut values = Vec::new();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if !line.is_empty() {
                            values.push(line.to_string());
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        let _ = events
                            .send(RecognizerEvent::Error(format!("speech helper read failed: {e}")))
                            .await;
                        return;
                    }
                }
            }

            let status = {
                let mut live = live.lock().await;
                live.stdin = None;
                match live.child.take() {
                    Some(mut child) => child.wait().await.ok(),
                    None => None,
                }
            };

            match status {
                Some(status) if !status.success() => {
                    let _ = events
                        .send(RecognizerEvent::Error(format!(
                            "speech helper exited with {status}"
                        )))
                        .await;
                }
                // A clean exit delivers whatever the helper flushed; an
                // empty list reads as an empty transcript, not an error.
                _ => {
                    let _ = events.send(RecognizerEvent::Results(values)).await;
                }
            }
        });

        Ok(())
    }

    async fn stop(&mut self) -> Result<(), RecognizerError> {
        let stdin = self.live.lock().await.stdin.take();
        match stdin {
            Some(mut stdin) => {
                stdin.write_all(b"stop\n").await?;
                stdin.shutdown().await?;
                // Dropping the handle closes the pipe; the helper finalizes
                // and the reader task delivers whatever it flushed.
                Ok(())
            }
            // Nothing in flight; nothing to stop.
            None => Ok(()),
        }
    }

    async fn shutdown(&mut self) {
        let mut live = self.live.lock().await;
        live.stdin = None;
        if let Some(mut child) = live.child.take() {
            if let Err(e) = child.start_kill() {
                debug!(error = %e, "speech helper kill failed during shutdown");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Write an executable stub helper and return its path
    fn stub_helper(dir: &tempfile::TempDir, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.path().join("speech-helper");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn test_stop_flushes_final_result() {
        let dir = tempfile::tempdir().unwrap();
        // Helper blocks until stopped, then flushes its transcript
        let cmd = stub_helper(&dir, "read _ignored\necho \"hello world\"");

        let (tx, mut rx) = mpsc::channel(8);
        let mut recognizer = BridgeRecognizer::new(cmd, tx);

        recognizer.start("en-US").await.unwrap();
        assert_eq!(rx.recv().await, Some(RecognizerEvent::Started));

        recognizer.stop().await.unwrap();
        assert_eq!(
            rx.recv().await,
            Some(RecognizerEvent::Results(vec!["hello world".to_string()]))
        );
    }

    #[tokio::test]
    async fn test_helper_failure_is_a_recognition_error() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = stub_helper(&dir, "exit 3");

        let (tx, mut rx) = mpsc::channel(8);
        let mut recognizer = BridgeRecognizer::new(cmd, tx);

        recognizer.start("en-US").await.unwrap();
        assert_eq!(rx.recv().await, Some(RecognizerEvent::Started));

        match rx.recv().await {
            Some(RecognizerEvent::Error(message)) => {
                assert!(message.contains("exited"), "unexpected message: {message}")
            }
            other => panic!("expected error event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_clean_exit_without_speech_is_an_empty_result() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = stub_helper(&dir, "exit 0");

        let (tx, mut rx) = mpsc::channel(8);
        let mut recognizer = BridgeRecognizer::new(cmd, tx);

        recognizer.start("en-US").await.unwrap();
        assert_eq!(rx.recv().await, Some(RecognizerEvent::Started));
        assert_eq!(rx.recv().await, Some(RecognizerEvent::Results(Vec::new())));
    }

    #[tokio::test]
    async fn test_missing_helper_fails_start() {
        let (tx, _rx) = mpsc::channel(8);
        let mut recognizer =
            BridgeRecognizer::new("/nonexistent/speech-helper-for-tests", tx);

        let err = recognizer.start("en-US").await.unwrap_err();
        assert!(matches!(err, RecognizerError::Unavailable(_)));
    }
}
