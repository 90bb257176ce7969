//! Media payloads and their queue-safe envelope
//!
//! [`Media`] holds raw bytes. [`QueueableMedia`] is the base64 envelope used
//! whenever media crosses a serialization boundary (task queue, cache).
//! `QueueableMedia::from_media(m).to_media()` reproduces `m` exactly.

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::{Error, Result};

const KIND_IMAGE: &str = "image";
const KIND_DOCUMENT: &str = "document";

// ============================================================================
// Media
// ============================================================================

/// Binary content sent alongside a prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Media {
    Image {
        bytes: Vec<u8>,
        mime_type: Option<String>,
    },
    Document {
        bytes: Vec<u8>,
        mime_type: Option<String>,
        title: Option<String>,
    },
}

impl Media {
    pub fn image(bytes: impl Into<Vec<u8>>, mime_type: Option<String>) -> Self {
        Media::Image {
            bytes: bytes.into(),
            mime_type,
        }
    }

    pub fn document(
        bytes: impl Into<Vec<u8>>,
        mime_type: Option<String>,
        title: Option<String>,
    ) -> Self {
        Media::Document {
            bytes: bytes.into(),
            mime_type,
            title,
        }
    }

    /// Load a file, classifying it by extension
    ///
    /// Images keep only their mime type; anything else becomes a document
    /// titled after the file stem.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let mime_type = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(mime_for_extension)
            .map(str::to_string);

        let is_image = mime_type
            .as_deref()
            .is_some_and(|m| m.starts_with("image/"));
        if is_image {
            return Ok(Media::image(bytes, mime_type));
        }

        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string);
        Ok(Media::document(bytes, mime_type, title))
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            Media::Image { .. } => MediaKind::Image,
            Media::Document { .. } => MediaKind::Document,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            Media::Image { bytes, .. } | Media::Document { bytes, .. } => bytes,
        }
    }

    pub fn mime_type(&self) -> Option<&str> {
        match self {
            Media::Image { mime_type, .. } | Media::Document { mime_type, .. } => {
                mime_type.as_deref()
            }
        }
    }

    /// Documents only
    pub fn title(&self) -> Option<&str> {
        match self {
            Media::Image { .. } => None,
            Media::Document { title, .. } => title.as_deref(),
        }
    }

    /// Base64 of the payload (standard alphabet, padded)
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.bytes())
    }
}

fn mime_for_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "html" | "htm" => "text/html",
        "csv" => "text/csv",
        "json" => "application/json",
        _ => return None,
    };
    Some(mime)
}

// ============================================================================
// MediaKind
// ============================================================================

/// Envelope discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Document,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => KIND_IMAGE,
            MediaKind::Document => KIND_DOCUMENT,
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            KIND_IMAGE => Ok(MediaKind::Image),
            KIND_DOCUMENT => Ok(MediaKind::Document),
            other => Err(Error::InvalidMediaKind(other.to_string())),
        }
    }
}

// ============================================================================
// QueueableMedia
// ============================================================================

/// Serialization-safe media envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueableMedia {
    /// "image" or "document"
    pub kind: String,

    /// Base64 payload
    pub payload: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    /// Documents only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl QueueableMedia {
    /// Encode media for transport
    pub fn from_media(media: &Media) -> Self {
        Self {
            kind: media.kind().as_str().to_string(),
            payload: media.to_base64(),
            mime_type: media.mime_type().map(str::to_string),
            title: media.title().map(str::to_string),
        }
    }

    /// Rebuild the media value
    ///
    /// Fails with `InvalidMediaKind` on an unknown discriminator and
    /// `InvalidMedia` on a corrupt payload.
    pub fn to_media(&self) -> Result<Media> {
        let kind: MediaKind = self.kind.parse()?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(self.payload.as_bytes())
            .map_err(|e| Error::InvalidMedia(format!("{} payload: {}", kind, e)))?;

        Ok(match kind {
            MediaKind::Image => Media::image(bytes, self.mime_type.clone()),
            MediaKind::Document => {
                Media::document(bytes, self.mime_type.clone(), self.title.clone())
            }
        })
    }
}

impl From<&Media> for QueueableMedia {
    fn from(media: &Media) -> Self {
        QueueableMedia::from_media(media)
    }
}

impl TryFrom<&QueueableMedia> for Media {
    type Error = Error;

    fn try_from(queued: &QueueableMedia) -> Result<Self> {
        queued.to_media()
    }
}

/// Encode media for transport
pub fn encode(media: &Media) -> QueueableMedia {
    QueueableMedia::from_media(media)
}

/// Decode a transport envelope
pub fn decode(queued: &QueueableMedia) -> Result<Media> {
    queued.to_media()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_round_trip() {
        let image = Media::image(vec![0x89, b'P', b'N', b'G', 0, 255], Some("image/png".into()));

        let queued = encode(&image);
        assert_eq!(queued.kind, "image");
        assert!(queued.title.is_none());

        assert_eq!(decode(&queued).unwrap(), image);
    }

    #[test]
    fn test_document_round_trip_through_json() {
        let doc = Media::document(
            b"%PDF-1.7 ...".to_vec(),
            Some("application/pdf".into()),
            Some("Quarterly report".into()),
        );

        let json = serde_json::to_string(&QueueableMedia::from(&doc)).unwrap();
        let queued: QueueableMedia = serde_json::from_str(&json).unwrap();
        let restored = Media::try_from(&queued).unwrap();

        assert_eq!(restored, doc);
        assert_eq!(restored.title(), Some("Quarterly report"));
    }

    #[test]
    fn test_missing_mime_survives() {
        let image = Media::image(b"raw".to_vec(), None);
        let restored = decode(&encode(&image)).unwrap();
        assert_eq!(restored.mime_type(), None);
        assert_eq!(restored.bytes(), b"raw");
    }

    #[test]
    fn test_unknown_kind_is_fatal() {
        let queued = QueueableMedia {
            kind: "video".into(),
            payload: String::new(),
            mime_type: None,
            title: None,
        };

        let err = decode(&queued).unwrap_err();
        assert!(matches!(err, Error::InvalidMediaKind(ref k) if k == "video"));
    }

    #[test]
    fn test_corrupt_payload() {
        let queued = QueueableMedia {
            kind: "image".into(),
            payload: "***not base64***".into(),
            mime_type: None,
            title: None,
        };
        assert!(matches!(decode(&queued), Err(Error::InvalidMedia(_))));
    }

    #[test]
    fn test_from_path_classifies() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("chart.PNG");
        let pdf = dir.path().join("notes.pdf");
        std::fs::write(&png, [1u8, 2, 3]).unwrap();
        std::fs::write(&pdf, b"%PDF").unwrap();

        let image = Media::from_path(&png).unwrap();
        assert_eq!(image.kind(), MediaKind::Image);
        assert_eq!(image.mime_type(), Some("image/png"));

        let doc = Media::from_path(&pdf).unwrap();
        assert_eq!(doc.kind(), MediaKind::Document);
        assert_eq!(doc.title(), Some("notes"));
    }
}
