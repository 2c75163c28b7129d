//! Item store: a durable, ordered list of captured items
//!
//! The whole list is serialized as one JSON array under a single namespace
//! key. Reads never fail outward; writes surface errors to the caller.

mod items;
mod slot;

pub use items::{GalleryItem, ItemStore, ITEMS_KEY};
pub use slot::SlotStore;

use thiserror::Error;

/// Errors that can occur while persisting items
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("item list encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}
