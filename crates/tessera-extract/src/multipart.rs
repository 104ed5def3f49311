//! Multipart form data materialization.
//!
//! The binding engine works on fully received bodies, so a
//! `multipart/form-data` payload is read part by part with `multer` and
//! collected into a [`FormData`] before validation starts.

use bytes::Bytes;
use std::io;

use tessera_core::UploadedFile;

use crate::{BodyError, FormData, FormPart};

/// Default maximum size per field (1 MiB).
pub const DEFAULT_MAX_FIELD_SIZE: usize = 1024 * 1024;

/// Default maximum number of fields.
pub const DEFAULT_MAX_FIELDS: usize = 100;

/// Limits applied while reading a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartConfig {
    /// Maximum size per field in bytes.
    pub max_field_size: usize,
    /// Maximum number of fields allowed.
    pub max_fields: usize,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            max_field_size: DEFAULT_MAX_FIELD_SIZE,
            max_fields: DEFAULT_MAX_FIELDS,
        }
    }
}

impl MultipartConfig {
    /// Creates a configuration with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum field size.
    #[must_use]
    pub fn max_field_size(mut self, size: usize) -> Self {
        self.max_field_size = size;
        self
    }

    /// Sets the maximum number of fields.
    #[must_use]
    pub fn max_fields(mut self, count: usize) -> Self {
        self.max_fields = count;
        self
    }
}

/// Reads every part of a multipart body into memory.
///
/// Parts with a file name become [`FormPart::File`]; the rest must be UTF-8
/// text and become [`FormPart::Text`]. Parts without a name are skipped.
pub async fn read_multipart(
    content_type: &str,
    body: Bytes,
    config: &MultipartConfig,
) -> Result<FormData, BodyError> {
    let boundary =
        multer::parse_boundary(content_type).map_err(|e| BodyError::InvalidBoundary(e.to_string()))?;

    let stream = futures_util::stream::once(async move { Ok::<_, io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut form = FormData::new();
    let mut count = 0usize;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| BodyError::Multipart(e.to_string()))?
    {
        count += 1;
        if count > config.max_fields {
            return Err(BodyError::TooManyFields(config.max_fields));
        }

        let Some(name) = field.name().map(String::from) else {
            continue;
        };
        let file_name = field.file_name().map(String::from);
        let content_type = field.content_type().map(ToString::to_string);

        let data = field
            .bytes()
            .await
            .map_err(|e| BodyError::Multipart(format!("failed to read field '{name}': {e}")))?;
        if data.len() > config.max_field_size {
            return Err(BodyError::PayloadTooLarge {
                limit: config.max_field_size,
                actual: data.len(),
            });
        }

        let part = if file_name.is_some() {
            FormPart::File(UploadedFile::new(name.clone(), file_name, content_type, data))
        } else {
            let text = String::from_utf8(data.to_vec())
                .map_err(|_| BodyError::Multipart(format!("field '{name}' is not valid UTF-8")))?;
            FormPart::Text(text)
        };
        form.push(name, part);
    }

    Ok(form)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn create_multipart_body(
        boundary: &str,
        parts: &[(&str, &str, Option<&str>, &[u8])],
    ) -> Vec<u8> {
        let mut body = Vec::new();

        for (name, content_type, filename, data) in parts {
            body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());

            if let Some(fname) = filename {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{fname}\"\r\n"
                    )
                    .as_bytes(),
                );
            } else {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n").as_bytes(),
                );
            }

            body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }

        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        body
    }

    #[tokio::test]
    async fn test_text_and_file_parts() {
        let boundary = "----boundary";
        let body = create_multipart_body(
            boundary,
            &[
                ("description", "text/plain", None, b"holiday photo"),
                ("file", "image/png", Some("photo.png"), b"PNG_DATA"),
            ],
        );

        let form = read_multipart(
            &format!("multipart/form-data; boundary={boundary}"),
            Bytes::from(body),
            &MultipartConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(form.texts("description"), ["holiday photo"]);
        let files = form.files("file");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name(), Some("photo.png"));
        assert_eq!(files[0].content_type(), Some("image/png"));
        assert_eq!(&files[0].data()[..], b"PNG_DATA");
    }

    #[tokio::test]
    async fn test_missing_boundary() {
        let err = read_multipart("multipart/form-data", Bytes::new(), &MultipartConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BodyError::InvalidBoundary(_)));
    }

    #[tokio::test]
    async fn test_too_many_fields() {
        let boundary = "b";
        let body = create_multipart_body(
            boundary,
            &[
                ("a", "text/plain", None, b"1"),
                ("b", "text/plain", None, b"2"),
                ("c", "text/plain", None, b"3"),
            ],
        );

        let err = read_multipart(
            &format!("multipart/form-data; boundary={boundary}"),
            Bytes::from(body),
            &MultipartConfig::new().max_fields(2),
        )
        .await
        .unwrap_err();
        assert_eq!(err, BodyError::TooManyFields(2));
    }

    #[tokio::test]
    async fn test_field_too_large() {
        let boundary = "b";
        let body = create_multipart_body(
            boundary,
            &[("file", "application/octet-stream", Some("blob.bin"), &[0u8; 32])],
        );

        let err = read_multipart(
            &format!("multipart/form-data; boundary={boundary}"),
            Bytes::from(body),
            &MultipartConfig::new().max_field_size(16),
        )
        .await
        .unwrap_err();
        assert_eq!(err, BodyError::PayloadTooLarge { limit: 16, actual: 32 });
    }
}
