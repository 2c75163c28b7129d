//! Configuration loading and management

use std::path::PathBuf;

use anyhow::Result;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for runtime data (item slots live here)
    pub data_dir: PathBuf,

    /// Recognition locale passed to the speech backend
    pub locale: String,

    /// Helper command for the retained speech bridge backend
    pub bridge_cmd: String,

    /// Helper command for the fire-and-forget speech backend
    pub oneshot_cmd: String,

    /// Command invoked to pick an image; stdout is the chosen path
    pub picker_cmd: Vec<String>,

    /// Command invoked to hand an item to the platform share sheet
    pub share_cmd: Vec<String>,

    /// Command that copies stdin to the clipboard
    pub clipboard_cmd: Vec<String>,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        let home = std::env::var("HOME")?;
        let data_dir = PathBuf::from(&home)
            .join(".local")
            .join("share")
            .join("gallery-daemon");

        let socket_path = data_dir.join("daemon.sock");

        Ok(Self {
            socket_path,
            data_dir,
            locale: env_or("GALLERY_LOCALE", "en-US"),
            bridge_cmd: env_or("GALLERY_SPEECH_BRIDGE", "gallery-speech-bridge"),
            oneshot_cmd: env_or("GALLERY_SPEECH_ONESHOT", "gallery-speech-once"),
            picker_cmd: env_cmd_or("GALLERY_PICKER", &["zenity", "--file-selection"]),
            share_cmd: env_cmd_or("GALLERY_SHARE", &["xdg-open"]),
            clipboard_cmd: env_cmd_or("GALLERY_CLIPBOARD", &["wl-copy"]),
        })
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Whitespace-split command override, e.g. `GALLERY_PICKER="zenity --file-selection"`
fn env_cmd_or(key: &str, default: &[&str]) -> Vec<String> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.split_whitespace().map(str::to_string).collect()
        }
        _ => default.iter().map(|s| s.to_string()).collect(),
    }
}
