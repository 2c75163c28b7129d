//! Clipboard capability
//!
//! Pipes text into the configured clipboard command's stdin.

use super::{run_command_with_stdin, CapabilityError};

/// External clipboard capability
#[derive(Debug, Clone)]
pub struct Clipboard {
    cmd: Vec<String>,
}

impl Clipboard {
    pub fn new(cmd: Vec<String>) -> Self {
        Self { cmd }
    }

    /// Copy text to the clipboard
    pub async fn copy(&self, text: &str) -> Result<(), CapabilityError> {
        run_command_with_stdin(&self.cmd, text.as_bytes()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_copy_success() {
        // `cat` consumes stdin and exits zero, standing in for wl-copy
        let clipboard = Clipboard::new(vec!["cat".to_string()]);
        clipboard.copy("a caption").await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_clipboard_is_unavailable() {
        let clipboard = Clipboard::new(vec!["gallery-daemon-no-such-clipboard".to_string()]);
        let err = clipboard.copy("a caption").await.unwrap_err();
        assert!(matches!(err, CapabilityError::Unavailable(_)));
    }
}
