//! Image acquisition
//!
//! Delegates to an external picker command whose stdout is the chosen
//! image path. The returned uri is stored as-is, never validated or
//! dereferenced.

use tracing::debug;

use super::{run_command, CapabilityError};

/// Result of an image acquisition attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    /// The user chose an image
    Picked { uri: String },

    /// The user dismissed the picker without choosing
    Cancelled,
}

/// External image picker capability
#[derive(Debug, Clone)]
pub struct ImagePicker {
    cmd: Vec<String>,
}

impl ImagePicker {
    pub fn new(cmd: Vec<String>) -> Self {
        Self { cmd }
    }

    /// Ask the platform for an image
    ///
    /// A dismissed picker (non-zero exit or empty output) is `Cancelled`;
    /// a picker that cannot be launched surfaces `CapabilityError`.
    pub async fn pick(&self) -> Result<PickOutcome, CapabilityError> {
        let output = run_command(&self.cmd, &[]).await?;

        if !output.status.success() {
            debug!(status = %output.status, "picker dismissed");
            return Ok(PickOutcome::Cancelled);
        }

        let uri = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if uri.is_empty() {
            Ok(PickOutcome::Cancelled)
        } else {
            Ok(PickOutcome::Picked { uri })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn picker(cmd: &[&str]) -> ImagePicker {
        ImagePicker::new(cmd.iter().map(|s| s.to_string()).collect())
    }

    #[tokio::test]
    async fn test_picked_path_is_returned() {
        let outcome = picker(&["echo", "file:///photos/cat.jpg"]).pick().await.unwrap();
        assert_eq!(
            outcome,
            PickOutcome::Picked {
                uri: "file:///photos/cat.jpg".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_empty_output_is_cancelled() {
        let outcome = picker(&["true"]).pick().await.unwrap();
        assert_eq!(outcome, PickOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_dismissal_is_cancelled() {
        let outcome = picker(&["false"]).pick().await.unwrap();
        assert_eq!(outcome, PickOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_missing_picker_is_unavailable() {
        let err = picker(&["gallery-daemon-no-such-picker"]).pick().await.unwrap_err();
        assert!(matches!(err, CapabilityError::Unavailable(_)));
    }
}
