//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.

use serde::{Deserialize, Serialize};

use crate::events::GalleryEvent;
use crate::store::GalleryItem;
use crate::voice::CaptureState;

/// Requests from UI to daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Ping to check connectivity
    Ping,

    /// Request current daemon status
    GetStatus,

    /// Read the persisted item list, most-recent first
    ListItems,

    /// Persist a new item at the head of the list
    SaveItem {
        uri: String,
        #[serde(default)]
        caption: String,
    },

    /// Begin a voice capture attempt
    StartCapture,

    /// End an in-progress capture attempt
    StopCapture,

    /// Snapshot the capture session state
    GetCaptureState,

    /// Ask the platform for an image
    PickImage,

    /// Offer an item to the platform share sheet
    ShareItem { id: String },

    /// Copy an item's caption to the clipboard
    CopyCaption { id: String },

    /// Subscribe this connection to event notifications
    Subscribe,
}

/// Responses from daemon to UI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Pong response to ping
    Pong,

    /// Current daemon status
    Status(DaemonStatus),

    /// The persisted item list
    Items { items: Vec<GalleryItem> },

    /// The newly saved item
    Saved { item: GalleryItem },

    /// Capture session state snapshot
    Capture(CaptureState),

    /// Picker outcome; `uri` is absent when the picker was dismissed
    Picked { uri: Option<String> },

    /// Item was offered to the share sheet
    Shared,

    /// Caption was copied to the clipboard
    Copied,

    /// Subscription confirmed; this connection now receives notifications
    Subscribed,

    /// Error response
    Error { code: String, message: String },
}

/// Push notification from daemon to subscribed UI clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// A capture or store event occurred
    Event { event: GalleryEvent },
}

/// Full daemon status snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonStatus {
    /// Daemon version
    pub version: String,

    /// A capture attempt is in progress
    pub listening: bool,

    /// Number of persisted items
    pub item_count: usize,

    /// Uptime in seconds
    pub uptime_secs: u64,
}

impl Default for DaemonStatus {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            listening: false,
            item_count: 0,
            uptime_secs: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let req = Request::SaveItem {
            uri: "file:///a.jpg".to_string(),
            caption: "sunset".to_string(),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("save_item"));
        assert!(json.contains("sunset"));
    }

    #[test]
    fn test_save_item_caption_defaults_to_empty() {
        let json = r#"{"type":"save_item","uri":"file:///a.jpg"}"#;
        let req: Request = serde_json::from_str(json).unwrap();
        match req {
            Request::SaveItem { uri, caption } => {
                assert_eq!(uri, "file:///a.jpg");
                assert_eq!(caption, "");
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn test_response_serialization() {
        let resp = Response::Status(DaemonStatus::default());
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("status"));

        let resp = Response::Capture(CaptureState::default());
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("listening"));
    }

    #[test]
    fn test_notification_serialization() {
        let note = Notification::Event {
            event: GalleryEvent::ItemSaved {
                id: "123".to_string(),
            },
        };
        let json = serde_json::to_string(&note).unwrap();
        assert!(json.contains("item_saved"));
        let round: Notification = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            round,
            Notification::Event {
                event: GalleryEvent::ItemSaved { .. }
            }
        ));
    }
}
