//! Error types for Tessera.
//!
//! There are three disjoint families of errors:
//!
//! | Family | Type | Raised when | Wire status |
//! |--------|------|-------------|-------------|
//! | Binding/validation | [`ValidationErrors`] | input is malformed or violates a constraint | 422 |
//! | Domain | [`HttpError`] | handler logic rejects a well-formed request | handler-chosen |
//! | Configuration | [`ContractError`] | a route contract is inconsistent | startup abort |
//!
//! A fourth, internal kind, [`ShapeError`], signals a defect in handler output
//! and maps to 500.

use http::StatusCode;
use serde::ser::{SerializeSeq, SerializeStruct};
use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

use crate::ParamSource;

/// One element of an error location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocItem {
    /// Named element (source name, field name, mapping key)
    Key(String),
    /// Position inside a sequence
    Index(usize),
}

impl Serialize for LocItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Key(key) => serializer.serialize_str(key),
            Self::Index(idx) => serializer.serialize_u64(*idx as u64),
        }
    }
}

impl fmt::Display for LocItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "{key}"),
            Self::Index(idx) => write!(f, "{idx}"),
        }
    }
}

impl From<&str> for LocItem {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for LocItem {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for LocItem {
    fn from(idx: usize) -> Self {
        Self::Index(idx)
    }
}

/// Ordered path to a field, e.g. `["body", "item", "price"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Location(Vec<LocItem>);

impl Location {
    /// Creates a location rooted at a parameter source.
    #[must_use]
    pub fn root(source: ParamSource) -> Self {
        Self(vec![LocItem::Key(source.loc_root().to_string())])
    }

    /// Creates a location for a named parameter of a source.
    #[must_use]
    pub fn param(source: ParamSource, name: &str) -> Self {
        Self::root(source).child(name)
    }

    /// Returns a new location extended by one element.
    #[must_use]
    pub fn child(&self, item: impl Into<LocItem>) -> Self {
        let mut items = self.0.clone();
        items.push(item.into());
        Self(items)
    }

    /// Returns the location elements.
    #[must_use]
    pub fn items(&self) -> &[LocItem] {
        &self.0
    }

    /// Returns the last element, if any.
    #[must_use]
    pub fn last(&self) -> Option<&LocItem> {
        self.0.last()
    }
}

impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for item in &self.0 {
            seq.serialize_element(item)?;
        }
        seq.end()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}

impl<I: Into<LocItem>> FromIterator<I> for Location {
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Classification of a binding failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Required value absent
    Missing,
    /// Raw value could not be converted to the target type
    TypeMismatch,
    /// Coerced value violated the named constraint
    ConstraintViolation(&'static str),
    /// Several raw values were supplied for a scalar parameter
    DuplicateValue,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::TypeMismatch => write!(f, "type_mismatch"),
            Self::ConstraintViolation(name) => write!(f, "constraint_violation:{name}"),
            Self::DuplicateValue => write!(f, "duplicate_value"),
        }
    }
}

/// A single binding failure for one field.
///
/// # Example
///
/// ```
/// use tessera_core::{ErrorKind, Location, ParamSource, ValidationError};
///
/// let err = ValidationError::missing(Location::param(ParamSource::Header, "x-token"));
/// assert_eq!(err.kind(), ErrorKind::Missing);
/// assert_eq!(err.location().to_string(), "header.x-token");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    location: Location,
    kind: ErrorKind,
    message: String,
    input: Option<serde_json::Value>,
}

impl ValidationError {
    /// Creates an error for a required value that was not supplied.
    #[must_use]
    pub fn missing(location: Location) -> Self {
        Self {
            location,
            kind: ErrorKind::Missing,
            message: "Field required".to_string(),
            input: None,
        }
    }

    /// Creates an error for a value that failed type coercion.
    #[must_use]
    pub fn type_mismatch(
        location: Location,
        message: impl Into<String>,
        input: Option<serde_json::Value>,
    ) -> Self {
        Self {
            location,
            kind: ErrorKind::TypeMismatch,
            message: message.into(),
            input,
        }
    }

    /// Creates an error for a violated constraint.
    #[must_use]
    pub fn constraint(
        location: Location,
        constraint: &'static str,
        message: impl Into<String>,
        input: Option<serde_json::Value>,
    ) -> Self {
        Self {
            location,
            kind: ErrorKind::ConstraintViolation(constraint),
            message: message.into(),
            input,
        }
    }

    /// Creates an error for a scalar parameter that received several values.
    #[must_use]
    pub fn duplicate(location: Location, input: Option<serde_json::Value>) -> Self {
        Self {
            location,
            kind: ErrorKind::DuplicateValue,
            message: "Expected a single value, received several".to_string(),
            input,
        }
    }

    /// Returns the location of the failing field.
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Returns the failure kind.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the raw input that failed, if there was one.
    #[must_use]
    pub fn input(&self) -> Option<&serde_json::Value> {
        self.input.as_ref()
    }
}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.input.is_some() { 4 } else { 3 };
        let mut state = serializer.serialize_struct("ValidationError", len)?;
        state.serialize_field("loc", &self.location)?;
        state.serialize_field("msg", &self.message)?;
        state.serialize_field("type", &self.kind.to_string())?;
        if let Some(input) = &self.input {
            state.serialize_field("input", input)?;
        }
        state.end()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} [{}]", self.location, self.message, self.kind)
    }
}

/// All binding failures of one request, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Error)]
#[error("{} validation error(s)", .0.len())]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// Creates an empty error list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an error.
    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    /// Appends every error of another list.
    pub fn append(&mut self, other: &mut Self) {
        self.0.append(&mut other.0);
    }

    /// Returns true if no error was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates the errors in order.
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    /// Consumes the list and returns the inner vector.
    #[must_use]
    pub fn into_inner(self) -> Vec<ValidationError> {
        self.0
    }

    /// The HTTP status for a validation failure.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        StatusCode::UNPROCESSABLE_ENTITY
    }

    /// Builds the `{"detail": [...]}` response payload.
    #[must_use]
    pub fn to_body(&self) -> serde_json::Value {
        let detail: Vec<serde_json::Value> = self
            .0
            .iter()
            .filter_map(|e| serde_json::to_value(e).ok())
            .collect();
        serde_json::json!({ "detail": detail })
    }
}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self(errors)
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A business-rule failure raised by handler logic after binding succeeded.
///
/// Serialises as `{"detail": "<message>"}` with a status chosen by the handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status}: {detail}")]
pub struct HttpError {
    status: StatusCode,
    detail: String,
}

impl HttpError {
    /// Creates an error with an explicit status.
    #[must_use]
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    /// 400 Bad Request.
    #[must_use]
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    /// 404 Not Found.
    #[must_use]
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail)
    }

    /// 409 Conflict.
    #[must_use]
    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, detail)
    }

    /// 500 Internal Server Error with the generic detail.
    #[must_use]
    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    }

    /// Returns the status code.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Returns the detail message.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Builds the `{"detail": "..."}` response payload.
    #[must_use]
    pub fn to_body(&self) -> serde_json::Value {
        serde_json::json!({ "detail": self.detail })
    }
}

/// A route contract defect, detected when contracts are built at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// Two parameters share a `(source, name)` pair.
    #[error("duplicate {param_source} parameter '{name}' in {owner}")]
    DuplicateParameter {
        /// Route operation or model name.
        owner: String,
        /// Parameter source.
        param_source: ParamSource,
        /// Wire name.
        name: String,
    },

    /// A default value does not conform to the declared target type.
    #[error("default for '{name}' does not conform to {expected}")]
    DefaultTypeMismatch {
        /// Parameter name.
        name: String,
        /// Declared target type.
        expected: String,
    },

    /// A parameter is marked required but carries a default.
    #[error("parameter '{name}' is required but declares a default")]
    RequiredWithDefault {
        /// Parameter name.
        name: String,
    },

    /// A constraint cannot be evaluated against the target type.
    #[error("constraint '{constraint}' does not apply to {target} parameter '{name}'")]
    ConstraintNotApplicable {
        /// Parameter name.
        name: String,
        /// Constraint name.
        constraint: &'static str,
        /// Declared target type.
        target: String,
    },

    /// A regex constraint failed to compile.
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// Pattern source.
        pattern: String,
        /// Compiler message.
        reason: String,
    },

    /// A mapping declares a key type that cannot be parsed from text.
    #[error("mapping key type {key} of '{name}' is not a scalar type")]
    UnsupportedMapKey {
        /// Parameter name.
        name: String,
        /// Declared key type.
        key: String,
    },

    /// A target type is not usable for the parameter's source.
    #[error("{param_source} parameter '{name}' cannot bind to {target}")]
    UnsupportedTarget {
        /// Parameter name.
        name: String,
        /// Parameter source.
        param_source: ParamSource,
        /// Declared target type.
        target: String,
    },

    /// A path parameter is optional or missing from the route pattern.
    #[error("path parameter '{name}' of {operation_id}: {reason}")]
    InvalidPathParameter {
        /// Route operation.
        operation_id: String,
        /// Parameter name.
        name: String,
        /// What is wrong.
        reason: String,
    },

    /// The contract mixes body binding styles.
    #[error("route {operation_id} mixes incompatible body bindings: {reason}")]
    MixedBodyBinding {
        /// Route operation.
        operation_id: String,
        /// What is mixed.
        reason: String,
    },

    /// Two routes registered for the same method and pattern, or the same operation id.
    #[error("duplicate route registration: {0}")]
    DuplicateRoute(String),
}

/// Failure while shaping a handler result into a response payload.
///
/// Validation already guaranteed the inputs, so any of these is a defect in
/// handler output rather than bad input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// A derived field could not be computed.
    #[error("cannot derive '{field}': {reason}")]
    Derivation {
        /// Derived field name.
        field: String,
        /// What failed.
        reason: String,
    },

    /// A value cannot be represented in the JSON payload.
    #[error("cannot serialize '{field}': {reason}")]
    Serialization {
        /// Field path.
        field: String,
        /// What failed.
        reason: String,
    },
}

impl ShapeError {
    /// Creates a derivation error.
    #[must_use]
    pub fn derivation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Derivation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Serialization {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_location_serializes_mixed_items() {
        let loc = Location::param(ParamSource::BodyWhole, "images")
            .child(0usize)
            .child("url");
        assert_eq!(
            serde_json::to_value(&loc).unwrap(),
            json!(["body", "images", 0, "url"])
        );
        assert_eq!(loc.to_string(), "body.images.0.url");
    }

    #[test]
    fn test_missing_error_has_no_input() {
        let err = ValidationError::missing(Location::param(ParamSource::Query, "needy"));
        let value = serde_json::to_value(&err).unwrap();

        assert_eq!(value["loc"], json!(["query", "needy"]));
        assert_eq!(value["type"], "missing");
        assert_eq!(value["msg"], "Field required");
        assert!(value.get("input").is_none());
    }

    #[test]
    fn test_constraint_kind_wire_name() {
        let err = ValidationError::constraint(
            Location::param(ParamSource::Path, "item_id"),
            "ge",
            "Input should be greater than or equal to 1",
            Some(json!("0")),
        );

        assert_eq!(err.kind(), ErrorKind::ConstraintViolation("ge"));
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["type"], "constraint_violation:ge");
        assert_eq!(value["input"], "0");
    }

    #[test]
    fn test_validation_errors_body() {
        let mut errors = ValidationErrors::new();
        errors.push(ValidationError::missing(Location::param(
            ParamSource::Header,
            "x-token",
        )));
        errors.push(ValidationError::type_mismatch(
            Location::param(ParamSource::Query, "short"),
            "Input should be a valid boolean",
            Some(json!("maybe")),
        ));

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = errors.to_body();
        let detail = body["detail"].as_array().unwrap();
        assert_eq!(detail.len(), 2);
        assert_eq!(detail[0]["loc"], json!(["header", "x-token"]));
        assert_eq!(detail[1]["type"], "type_mismatch");
    }

    #[test]
    fn test_http_error_body() {
        let err = HttpError::bad_request("Invalid X-Token header");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_body(), json!({"detail": "Invalid X-Token header"}));

        let err = HttpError::not_found("Item not found");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_contract_error_display() {
        let err = ContractError::DuplicateParameter {
            owner: "read_items".to_string(),
            param_source: ParamSource::Query,
            name: "q".to_string(),
        };
        assert_eq!(err.to_string(), "duplicate query parameter 'q' in read_items");
    }
}
