//! Share sheet capability
//!
//! Hands an item to the platform share command. The payload pairs the
//! caption with the image reference; targets that cannot take both get the
//! flattened message form.

use serde::Serialize;
use tracing::debug;

use crate::store::GalleryItem;

use super::{run_command, CapabilityError};

/// What gets handed to the share sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharePayload {
    /// Caption text, possibly empty
    pub text: String,

    /// Image reference
    pub url: String,
}

impl SharePayload {
    pub fn for_item(item: &GalleryItem) -> Self {
        Self {
            text: item.caption.clone(),
            url: item.uri.clone(),
        }
    }

    /// Single-string form for targets without separate text/url fields
    pub fn message(&self) -> String {
        format!("{} {}", self.text, self.url).trim().to_string()
    }
}

/// External share sheet capability
#[derive(Debug, Clone)]
pub struct ShareSheet {
    cmd: Vec<String>,
}

impl ShareSheet {
    pub fn new(cmd: Vec<String>) -> Self {
        Self { cmd }
    }

    /// Offer an item to the platform share sheet
    ///
    /// No return value is consumed beyond success; a sheet that cannot be
    /// launched or exits non-zero surfaces `CapabilityError`.
    pub async fn share(&self, item: &GalleryItem) -> Result<(), CapabilityError> {
        let payload = SharePayload::for_item(item);
        debug!(message = %payload.message(), "offering item to share sheet");
        let output = run_command(&self.cmd, &[payload.url.as_str()]).await?;

        if output.status.success() {
            Ok(())
        } else {
            Err(CapabilityError::Unavailable(format!(
                "share sheet exited with {}",
                output.status
            )))
        }
    }
}
