//! Events broadcast to IPC subscribers
//!
//! Provides structured event types for capture session transitions and
//! item persistence.

use serde::{Deserialize, Serialize};

/// Events emitted by the capture session and item store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GalleryEvent {
    /// A voice capture attempt began
    CaptureStarted,

    /// A capture attempt produced a transcript
    CaptureFinished {
        /// Recognized text, empty when the provider returned no value
        transcript: String,
    },

    /// A capture attempt failed
    CaptureFailed {
        /// Provider error, rendered verbatim by clients
        message: String,
    },

    /// A capture attempt was reset without a result
    CaptureStopped,

    /// An item was persisted to the gallery
    ItemSaved {
        /// Id of the newly stored item
        id: String,
    },
}

impl std::fmt::Display for GalleryEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GalleryEvent::CaptureStarted => write!(f, "CAPTURE_STARTED"),
            GalleryEvent::CaptureFinished { transcript } => {
                write!(f, "CAPTURE_FINISHED ({} chars)", transcript.len())
            }
            GalleryEvent::CaptureFailed { message } => {
                write!(f, "CAPTURE_FAILED ({})", message)
            }
            GalleryEvent::CaptureStopped => write!(f, "CAPTURE_STOPPED"),
            GalleryEvent::ItemSaved { id } => write!(f, "ITEM_SAVED ({})", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = GalleryEvent::CaptureFinished {
            transcript: "hello world".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("capture_finished"));
        assert!(json.contains("hello world"));
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"item_saved","id":"1722850000000"}"#;
        let event: GalleryEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(event, GalleryEvent::ItemSaved { .. }));
    }

    #[test]
    fn test_display() {
        let event = GalleryEvent::CaptureFailed {
            message: "no speech detected".to_string(),
        };
        assert_eq!(event.to_string(), "CAPTURE_FAILED (no speech detected)");
    }
}
