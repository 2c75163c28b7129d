//! Gallery item persistence
//!
//! Items are immutable after creation. The only operations are reading the
//! whole list and prepending a new item, with the full list rewritten on
//! every save.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{SlotStore, StoreError};

/// Namespace key the entire item list is stored under
pub const ITEMS_KEY: &str = "gallery_items_v1";

/// A persisted record pairing an image reference with a caption
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryItem {
    /// Opaque id assigned at creation time
    pub id: String,

    /// Reference to the image bytes; never validated or dereferenced here
    pub uri: String,

    /// Caption text, possibly empty
    pub caption: String,
}

/// Durable, ordered list of captured items
#[derive(Debug, Clone)]
pub struct ItemStore {
    slot: SlotStore,
}

impl ItemStore {
    /// Open the item store rooted at the given data directory
    pub fn open(data_dir: impl AsRef<Path>) -> Self {
        Self {
            slot: SlotStore::new(data_dir.as_ref()),
        }
    }

    /// Load the persisted list, most-recent item first
    ///
    /// Never fails outward: a missing slot, an unreadable slot, invalid
    /// JSON, or a non-array payload all degrade to an empty list.
    pub async fn load(&self) -> Vec<GalleryItem> {
        let raw = match self.slot.get(ITEMS_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                debug!(error = %e, "item slot unreadable, treating as empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<GalleryItem>>(&raw) {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "stored payload is not an item list, treating as empty");
                Vec::new()
            }
        }
    }

    /// Persist a new item at the head of the list and return it
    ///
    /// Write failures propagate to the caller; nothing is retried.
    pub async fn save(&self, uri: &str, caption: &str) -> Result<GalleryItem, StoreError> {
        let item = GalleryItem {
            id: next_item_id(),
            uri: uri.to_string(),
            caption: caption.to_string(),
        };

        let mut items = self.load().await;
        items.insert(0, item.clone());

        let encoded = serde_json::to_string(&items)?;
        self.slot.set(ITEMS_KEY, &encoded).await?;

        debug!(id = %item.id, total = items.len(), "item saved");
        Ok(item)
    }
}

/// Millisecond-timestamp id; two saves within the same millisecond can
/// collide, which the original design accepts.
fn next_item_id() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
        .to_string()
}
