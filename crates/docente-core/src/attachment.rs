//! Justification images attached to incidences.
//!
//! Images travel as a multipart file part; there is no base64-in-JSON path.

use std::fs;
use std::path::Path;

use chrono::Utc;
use reqwest::multipart::Part;

use crate::error::PortalError;

pub const DEFAULT_MIME: &str = "image/jpeg";
pub const PNG_MIME: &str = "image/png";
pub const IMAGE_FIELD: &str = "imagen";

/// An image picked by the docente.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    pub bytes: Vec<u8>,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
}

impl ImageSource {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            file_name: None,
            mime_type: None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, PortalError> {
        let bytes = fs::read(path).map_err(PortalError::Attachment)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .filter(|name| !name.trim().is_empty());
        Ok(Self {
            bytes,
            file_name,
            mime_type: None,
        })
    }
}

/// Ready-to-send file part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPayload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadPayload {
    pub fn into_part(self) -> Result<Part, PortalError> {
        Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.mime_type)
            .map_err(PortalError::Transport)
    }
}

pub trait AttachmentEncoder: Send + Sync {
    fn encode(&self, image: &ImageSource) -> Result<UploadPayload, PortalError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MultipartEncoder;

impl AttachmentEncoder for MultipartEncoder {
    fn encode(&self, image: &ImageSource) -> Result<UploadPayload, PortalError> {
        let file_name = image
            .file_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(default_file_name);
        let mime_type = image
            .mime_type
            .clone()
            .filter(|mime| !mime.trim().is_empty())
            .unwrap_or_else(|| infer_mime(&file_name).to_string());
        Ok(UploadPayload {
            file_name,
            mime_type,
            bytes: image.bytes.clone(),
        })
    }
}

pub fn default_file_name() -> String {
    format!("justificacion_{}.jpg", Utc::now().timestamp_millis())
}

pub fn infer_mime(file_name: &str) -> &'static str {
    if file_name.to_ascii_lowercase().ends_with(".png") {
        PNG_MIME
    } else {
        DEFAULT_MIME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_name_and_mime_when_source_has_none() {
        let payload = MultipartEncoder
            .encode(&ImageSource::from_bytes(vec![1, 2, 3]))
            .unwrap();
        assert!(payload.file_name.starts_with("justificacion_"));
        assert!(payload.file_name.ends_with(".jpg"));
        assert_eq!(payload.mime_type, DEFAULT_MIME);
        assert_eq!(payload.bytes, vec![1, 2, 3]);
    }

    #[test]
    fn png_suffix_selects_png_mime() {
        let image = ImageSource {
            bytes: vec![0x89],
            file_name: Some("Receta.PNG".into()),
            mime_type: None,
        };
        assert_eq!(MultipartEncoder.encode(&image).unwrap().mime_type, PNG_MIME);
    }

    #[test]
    fn explicit_mime_is_kept() {
        let image = ImageSource {
            bytes: vec![],
            file_name: Some("foto.png".into()),
            mime_type: Some("image/webp".into()),
        };
        assert_eq!(MultipartEncoder.encode(&image).unwrap().mime_type, "image/webp");
    }

    #[test]
    fn from_path_reads_file_and_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("constancia.png");
        fs::write(&path, b"png-bytes").unwrap();
        let image = ImageSource::from_path(&path).unwrap();
        assert_eq!(image.file_name.as_deref(), Some("constancia.png"));
        assert_eq!(image.bytes, b"png-bytes");

        let missing = ImageSource::from_path(&dir.path().join("nope.jpg"));
        assert!(matches!(missing, Err(PortalError::Attachment(_))));
    }
}
