//! Multipart form handling and image upload validation.

use axum::body::Bytes;
use axum::extract::Multipart;

use crate::error::ApiError;

/// Image content types accepted for OCR.
pub const ALLOWED_CONTENT_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/bmp"];

/// One part of a multipart form.
#[derive(Debug, Clone)]
pub struct Upload {
    pub field: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl Upload {
    /// Check type and size; the error is the message reported for this file.
    pub fn validate_image(&self, max_file_size: usize) -> Result<(), String> {
        validate_image(self.content_type.as_deref(), self.bytes.len(), max_file_size)
    }

    pub fn text(&self) -> Result<&str, ApiError> {
        std::str::from_utf8(&self.bytes)
            .map_err(|_| ApiError::bad_request(format!("Field '{}' is not valid UTF-8.", self.field)))
    }
}

/// Strip parameters from a content type, e.g. `image/png; charset=binary`.
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

pub fn is_allowed_content_type(content_type: &str) -> bool {
    ALLOWED_CONTENT_TYPES.contains(&essence(content_type).as_str())
}

pub fn validate_image(content_type: Option<&str>, len: usize, max_file_size: usize) -> Result<(), String> {
    let content_type = content_type.unwrap_or_default();
    if !is_allowed_content_type(content_type) {
        return Err(format!("Invalid file type '{}'.", content_type));
    }
    if len > max_file_size {
        return Err(format!("File too large ({} bytes).", len));
    }
    Ok(())
}

/// A fully buffered multipart form.
#[derive(Debug, Default)]
pub struct UploadForm {
    parts: Vec<Upload>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut parts = Vec::new();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            let filename = field.file_name().unwrap_or(&name).to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await?;

            parts.push(Upload {
                field: name,
                filename,
                content_type,
                bytes,
            });
        }

        Ok(Self { parts })
    }

    /// Remove and return every part named `field`, in upload order.
    pub fn take_all(&mut self, field: &str) -> Vec<Upload> {
        let (taken, rest) = std::mem::take(&mut self.parts)
            .into_iter()
            .partition(|p| p.field == field);
        self.parts = rest;
        taken
    }

    /// Remove and return the first part named `field`.
    pub fn take_one(&mut self, field: &str) -> Result<Upload, ApiError> {
        let idx = self
            .parts
            .iter()
            .position(|p| p.field == field)
            .ok_or_else(|| ApiError::bad_request(format!("Missing multipart field '{}'.", field)))?;
        Ok(self.parts.remove(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_essence() {
        assert!(is_allowed_content_type("image/png"));
        assert!(is_allowed_content_type("IMAGE/JPEG; charset=binary"));
        assert!(!is_allowed_content_type("application/pdf"));
        assert!(!is_allowed_content_type(""));
    }

    #[test]
    fn test_validate_messages() {
        assert_eq!(
            validate_image(Some("text/plain"), 10, 100),
            Err("Invalid file type 'text/plain'.".to_string())
        );
        assert_eq!(
            validate_image(Some("image/png"), 101, 100),
            Err("File too large (101 bytes).".to_string())
        );
        assert_eq!(validate_image(Some("image/webp"), 100, 100), Ok(()));
        assert_eq!(validate_image(None, 1, 100), Err("Invalid file type ''.".to_string()));
    }

    #[test]
    fn test_take_keeps_order() {
        let part = |field: &str, name: &str| Upload {
            field: field.to_string(),
            filename: name.to_string(),
            content_type: None,
            bytes: Bytes::new(),
        };
        let mut form = UploadForm {
            parts: vec![part("files", "a"), part("history_pdf", "h"), part("files", "b")],
        };

        let files: Vec<_> = form.take_all("files").into_iter().map(|u| u.filename).collect();
        assert_eq!(files, vec!["a", "b"]);
        assert_eq!(form.take_one("history_pdf").unwrap().filename, "h");
        assert!(form.take_one("history_pdf").is_err());
    }
}
