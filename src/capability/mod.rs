//! Thin wrappers around platform capabilities
//!
//! The daemon treats each capability as an opaque external command: image
//! acquisition, the share sheet, and the clipboard. A failure is terminal
//! for the attempt; nothing here retries or substitutes a fallback.

mod clipboard;
mod picker;
mod share;

pub use clipboard::Clipboard;
pub use picker::{ImagePicker, PickOutcome};
pub use share::{SharePayload, ShareSheet};

use std::process::Stdio;

use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// Errors surfaced by capability invocations
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("capability unavailable: {0}")]
    Unavailable(String),

    #[error("capability io failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Run a capability command with extra arguments and capture its output
async fn run_command(
    cmd: &[String],
    extra_args: &[&str],
) -> Result<std::process::Output, CapabilityError> {
    let (program, args) = cmd
        .split_first()
        .ok_or_else(|| CapabilityError::Unavailable("empty capability command".to_string()))?;

    tokio::process::Command::new(program)
        .args(args)
        .args(extra_args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .await
        .map_err(|e| CapabilityError::Unavailable(format!("{program}: {e}")))
}

/// Run a capability command, piping `input` to its stdin
async fn run_command_with_stdin(cmd: &[String], input: &[u8]) -> Result<(), CapabilityError> {
    let (program, args) = cmd
        .split_first()
        .ok_or_else(|| CapabilityError::Unavailable("empty capability command".to_string()))?;

    let mut child = tokio::process::Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| CapabilityError::Unavailable(format!("{program}: {e}")))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input).await?;
        // Dropping stdin signals EOF to the child
        drop(stdin);
    }

    let status = child.wait().await?;
    if status.success() {
        Ok(())
    } else {
        Err(CapabilityError::Unavailable(format!(
            "{program} exited with {status}"
        )))
    }
}
