//! Parameter sources.
//!
//! A [`ParamSource`] says where in the request a declared parameter lives.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source of a declared parameter (where its raw value is read from).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParamSource {
    /// Path segment matched by the route pattern (e.g., `/items/{item_id}`)
    Path,
    /// Query string parameter
    Query,
    /// HTTP header
    Header,
    /// Cookie from the `Cookie` header
    Cookie,
    /// Top-level key of a JSON object body
    BodyField,
    /// The entire JSON body
    BodyWhole,
    /// Text field of a form body (urlencoded or multipart)
    FormField,
    /// File part of a multipart body
    File,
}

impl ParamSource {
    /// Returns the first element of an error location for this source.
    ///
    /// Every body-like source reports under `"body"`.
    #[must_use]
    pub const fn loc_root(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
            Self::BodyField | Self::BodyWhole | Self::FormField | Self::File => "body",
        }
    }

    /// Returns true for sources read from the request body.
    #[must_use]
    pub const fn is_body(self) -> bool {
        matches!(
            self,
            Self::BodyField | Self::BodyWhole | Self::FormField | Self::File
        )
    }

    /// Returns true for sources read from a form body.
    #[must_use]
    pub const fn is_form(self) -> bool {
        matches!(self, Self::FormField | Self::File)
    }
}

impl fmt::Display for ParamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::Query => write!(f, "query"),
            Self::Header => write!(f, "header"),
            Self::Cookie => write!(f, "cookie"),
            Self::BodyField => write!(f, "body-field"),
            Self::BodyWhole => write!(f, "body-whole"),
            Self::FormField => write!(f, "form-field"),
            Self::File => write!(f, "file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loc_root() {
        assert_eq!(ParamSource::Path.loc_root(), "path");
        assert_eq!(ParamSource::Cookie.loc_root(), "cookie");
        assert_eq!(ParamSource::BodyWhole.loc_root(), "body");
        assert_eq!(ParamSource::File.loc_root(), "body");
    }

    #[test]
    fn test_body_classification() {
        assert!(ParamSource::BodyField.is_body());
        assert!(ParamSource::FormField.is_form());
        assert!(!ParamSource::Query.is_body());
        assert!(!ParamSource::BodyWhole.is_form());
    }

    #[test]
    fn test_display() {
        assert_eq!(ParamSource::BodyField.to_string(), "body-field");
        assert_eq!(ParamSource::Header.to_string(), "header");
    }
}
