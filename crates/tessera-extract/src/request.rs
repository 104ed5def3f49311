//! Materialized request representation.
//!
//! [`RequestParts`] is the transport-level view the binding engine reads
//! from: everything is already received and decoded, so extraction is a
//! pure lookup.

use http::{HeaderMap, HeaderName, Method, Uri};

use crate::{Cookies, PathParams, QueryPairs, RequestBody};

/// Every part of an HTTP request the engine can bind from.
///
/// # Example
///
/// ```rust
/// use http::Method;
/// use tessera_extract::{RequestBody, RequestParts};
///
/// let parts = RequestParts::builder()
///     .method(Method::GET)
///     .uri("/items/foo?needy=sooo")
///     .header("x-token", "coneofsilence")
///     .path_param("item_id", "foo")
///     .build();
///
/// assert_eq!(parts.query().get("needy"), Some("sooo"));
/// assert_eq!(parts.path_params().get("item_id"), Some("foo"));
/// assert_eq!(parts.body(), &RequestBody::Empty);
/// ```
#[derive(Debug, Clone)]
pub struct RequestParts {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    header_text: Vec<(HeaderName, String)>,
    path_params: PathParams,
    query: QueryPairs,
    cookies: Cookies,
    body: RequestBody,
}

impl RequestParts {
    /// Creates request parts, decoding the query string, cookies and header values.
    #[must_use]
    pub fn new(
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        path_params: PathParams,
        body: RequestBody,
    ) -> Self {
        let query = uri.query().map(QueryPairs::parse).unwrap_or_default();
        let cookies = Cookies::from_headers(&headers);
        let header_text = headers
            .iter()
            .map(|(name, value)| (name.clone(), latin1(value.as_bytes())))
            .collect();
        Self {
            method,
            uri,
            headers,
            header_text,
            path_params,
            query,
            cookies,
            body,
        }
    }

    /// Creates a builder.
    #[must_use]
    pub fn builder() -> RequestPartsBuilder {
        RequestPartsBuilder::default()
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns every value of a header as text, in request order.
    ///
    /// Values are decoded as ISO-8859-1, so bytes outside visible ASCII are
    /// kept rather than dropped.
    #[must_use]
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.header_text
            .iter()
            .filter(|(key, _)| key.as_str().eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
            .collect()
    }

    /// Returns the matched path parameters.
    #[must_use]
    pub fn path_params(&self) -> &PathParams {
        &self.path_params
    }

    /// Returns the decoded query pairs.
    #[must_use]
    pub fn query(&self) -> &QueryPairs {
        &self.query
    }

    /// Returns the cookies.
    #[must_use]
    pub fn cookies(&self) -> &Cookies {
        &self.cookies
    }

    /// Returns the materialized body.
    #[must_use]
    pub fn body(&self) -> &RequestBody {
        &self.body
    }
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}

/// Builder for [`RequestParts`], mostly for tests.
///
/// Unset method and URI default to `GET /`.
#[derive(Debug, Default)]
pub struct RequestPartsBuilder {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    path_params: PathParams,
    body: Option<RequestBody>,
}

impl RequestPartsBuilder {
    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the URI. An unparsable URI is ignored.
    #[must_use]
    pub fn uri(mut self, uri: &str) -> Self {
        if let Ok(uri) = uri.parse() {
            self.uri = uri;
        }
        self
    }

    /// Appends a header. Invalid names or values are ignored.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::HeaderName::from_bytes(name.as_bytes()),
            http::HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Replaces all headers.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Adds a path parameter.
    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.push(name, value);
        self
    }

    /// Sets a JSON body.
    #[must_use]
    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.body = Some(RequestBody::Json(value));
        self
    }

    /// Sets a materialized body.
    #[must_use]
    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Builds the request parts.
    #[must_use]
    pub fn build(self) -> RequestParts {
        RequestParts::new(
            self.method,
            self.uri,
            self.headers,
            self.path_params,
            self.body.unwrap_or(RequestBody::Empty),
        )
    }
}
