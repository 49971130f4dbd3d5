//! Image frames
//!
//! A frame is an immutable image payload. Clones share the bytes, so binding
//! one frame to several places (sequence, assignment, step slot) is cheap.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Media type used when the payload type is unknown
pub const FALLBACK_MEDIA_TYPE: &str = "image/jpeg";

/// An uploaded image
#[derive(Clone)]
pub struct Frame {
    /// Identity of this upload; a re-upload of the same file gets a new id
    pub id: Uuid,
    /// Client-side file name
    pub file_name: String,
    /// Detected image media type (e.g. "image/png")
    pub media_type: String,
    bytes: Arc<[u8]>,
}

impl Frame {
    pub fn new(
        file_name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_name: file_name.into(),
            media_type: media_type.into(),
            bytes: Arc::from(bytes),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }

    /// URL the UI uses to display this frame
    pub fn preview_url(&self) -> String {
        format!("/api/frames/{}", self.id)
    }

    /// Inline `data:` URL carrying the base64 payload
    pub fn data_url(&self) -> String {
        let media_type = if self.media_type.starts_with("image/") {
            self.media_type.as_str()
        } else {
            FALLBACK_MEDIA_TYPE
        };
        format!("data:{};base64,{}", media_type, STANDARD.encode(&self.bytes))
    }

    pub fn summary(&self) -> FrameSummary {
        FrameSummary {
            id: self.id,
            file_name: self.file_name.clone(),
            media_type: self.media_type.clone(),
            size_bytes: self.size_bytes(),
            preview_url: self.preview_url(),
        }
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("id", &self.id)
            .field("file_name", &self.file_name)
            .field("media_type", &self.media_type)
            .field("size_bytes", &self.bytes.len())
            .finish()
    }
}

/// Serializable frame description (no payload)
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FrameSummary {
    pub id: Uuid,
    pub file_name: String,
    pub media_type: String,
    pub size_bytes: usize,
    pub preview_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url_encodes_payload_with_media_type() {
        let frame = Frame::new("a.png", "image/png", vec![1, 2, 3]);
        assert_eq!(frame.data_url(), "data:image/png;base64,AQID");
    }

    #[test]
    fn test_data_url_falls_back_to_jpeg() {
        let frame = Frame::new("a.bin", "application/octet-stream", vec![0xff]);
        assert!(frame.data_url().starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_clones_share_identity() {
        let frame = Frame::new("a.png", "image/png", vec![9; 16]);
        let clone = frame.clone();
        assert_eq!(frame.id, clone.id);
        assert_eq!(clone.bytes(), frame.bytes());
        assert_eq!(frame.summary().preview_url, format!("/api/frames/{}", frame.id));
    }
}
