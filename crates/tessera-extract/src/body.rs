//! Request body materialization.
//!
//! [`read_body`] turns raw body bytes into a [`RequestBody`] based on the
//! Content-Type:
//!
//! | Content-Type | Result |
//! |--------------|--------|
//! | (empty body) | [`RequestBody::Empty`] |
//! | `multipart/form-data` | [`RequestBody::Form`] with text and file parts |
//! | `application/x-www-form-urlencoded` | [`RequestBody::Form`] with text parts |
//! | `application/json`, `*/*+json`, or none | [`RequestBody::Json`] or [`RequestBody::Malformed`] |
//! | anything else | [`BodyError::UnsupportedMediaType`] |

use bytes::Bytes;
use http::{header, HeaderMap};
use mime::Mime;

use tessera_core::UploadedFile;

use crate::multipart::{read_multipart, MultipartConfig};
use crate::BodyError;

/// A fully received, parsed request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body bytes.
    Empty,
    /// A JSON document of any shape.
    Json(serde_json::Value),
    /// Form fields (urlencoded or multipart).
    Form(FormData),
    /// Bytes that should have been JSON but do not parse.
    Malformed(String),
}

impl RequestBody {
    /// Returns true for [`RequestBody::Empty`].
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// One part of a form body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    /// Text value.
    Text(String),
    /// Uploaded file.
    File(UploadedFile),
}

/// Form fields in body order. Names may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    parts: Vec<(String, FormPart)>,
}

impl FormData {
    /// Creates an empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a part.
    pub fn push(&mut self, name: impl Into<String>, part: FormPart) {
        self.parts.push((name.into(), part));
    }

    /// Returns every text value for a name, in body order.
    #[must_use]
    pub fn texts(&self, name: &str) -> Vec<&str> {
        self.parts
            .iter()
            .filter(|(n, _)| n == name)
            .filter_map(|(_, part)| match part {
                FormPart::Text(text) => Some(text.as_str()),
                FormPart::File(_) => None,
            })
            .collect()
    }

    /// Returns every file for a name, in body order.
    #[must_use]
    pub fn files(&self, name: &str) -> Vec<&UploadedFile> {
        self.parts
            .iter()
            .filter(|(n, _)| n == name)
            .filter_map(|(_, part)| match part {
                FormPart::File(file) => Some(file),
                FormPart::Text(_) => None,
            })
            .collect()
    }

    /// Returns the number of parts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Returns true if the form has no parts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// Parses a received body according to its Content-Type.
pub async fn read_body(
    headers: &HeaderMap,
    body: Bytes,
    multipart: &MultipartConfig,
) -> Result<RequestBody, BodyError> {
    if body.is_empty() {
        return Ok(RequestBody::Empty);
    }

    let Some(raw) = headers.get(header::CONTENT_TYPE) else {
        return Ok(parse_json(&body));
    };
    let raw = raw
        .to_str()
        .map_err(|_| BodyError::UnsupportedMediaType("<non-ascii>".to_string()))?;
    let mime: Mime = raw
        .parse()
        .map_err(|_| BodyError::UnsupportedMediaType(raw.to_string()))?;

    if mime.type_() == mime::MULTIPART && mime.subtype() == mime::FORM_DATA {
        return read_multipart(raw, body, multipart)
            .await
            .map(RequestBody::Form);
    }

    if mime.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str() {
        return Ok(RequestBody::Form(parse_urlencoded(&body)?));
    }

    if mime.subtype() == mime::JSON || mime.suffix() == Some(mime::JSON) {
        return Ok(parse_json(&body));
    }

    Err(BodyError::UnsupportedMediaType(mime.essence_str().to_string()))
}

fn parse_json(body: &[u8]) -> RequestBody {
    match serde_json::from_slice(body) {
        Ok(value) => RequestBody::Json(value),
        Err(e) => {
            tracing::debug!(error = %e, "request body is not valid JSON");
            RequestBody::Malformed(e.to_string())
        }
    }
}

fn parse_urlencoded(body: &[u8]) -> Result<FormData, BodyError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
        .map_err(|e| BodyError::Multipart(format!("invalid urlencoded form: {e}")))?;
    let mut form = FormData::new();
    for (name, value) in pairs {
        form.push(name, FormPart::Text(value));
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multipart::tests::create_multipart_body;
    use http::HeaderValue;

    fn headers(content_type: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        headers
    }

    #[tokio::test]
    async fn test_empty_body() {
        let body = read_body(&HeaderMap::new(), Bytes::new(), &MultipartConfig::default())
            .await
            .unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_json_without_content_type() {
        let body = read_body(
            &HeaderMap::new(),
            Bytes::from_static(br#"{"name":"Foo"}"#),
            &MultipartConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(body, RequestBody::Json(serde_json::json!({"name": "Foo"})));
    }

    #[tokio::test]
    async fn test_json_suffix_and_charset() {
        let body = read_body(
            &headers("application/vnd.api+json; charset=utf-8"),
            Bytes::from_static(b"[1,2]"),
            &MultipartConfig::default(),
        )
        .await
        .unwrap();
        assert!(matches!(body, RequestBody::Json(serde_json::Value::Array(_))));
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let body = read_body(
            &headers("application/json"),
            Bytes::from_static(b"{not json"),
            &MultipartConfig::default(),
        )
        .await
        .unwrap();
        assert!(matches!(body, RequestBody::Malformed(_)));
    }

    #[tokio::test]
    async fn test_urlencoded_form() {
        let body = read_body(
            &headers("application/x-www-form-urlencoded"),
            Bytes::from_static(b"description=a+b&tag=1&tag=2"),
            &MultipartConfig::default(),
        )
        .await
        .unwrap();
        let RequestBody::Form(form) = body else {
            panic!("expected form body");
        };
        assert_eq!(form.texts("description"), ["a b"]);
        assert_eq!(form.texts("tag"), ["1", "2"]);
    }

    #[tokio::test]
    async fn test_multipart_form() {
        let data = create_multipart_body("xyz", &[("file", "text/plain", Some("a.txt"), b"hi")]);
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("multipart/form-data; boundary=xyz"),
        );

        let body = read_body(&headers, Bytes::from(data), &MultipartConfig::default())
            .await
            .unwrap();
        let RequestBody::Form(form) = body else {
            panic!("expected form body");
        };
        assert_eq!(form.files("file").len(), 1);
        assert!(form.texts("file").is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_media_type() {
        let err = read_body(
            &headers("text/xml"),
            Bytes::from_static(b"<a/>"),
            &MultipartConfig::default(),
        )
        .await
        .unwrap_err();
        assert_eq!(err, BodyError::UnsupportedMediaType("text/xml".to_string()));
    }
}
