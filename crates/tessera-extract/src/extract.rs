//! Field extraction.
//!
//! [`extract`] looks up the raw value(s) of one declared parameter. It never
//! fails: an unreadable source is simply absent, and deciding whether absence
//! or a wrong shape is an error is the binder's job.

use smallvec::{smallvec, SmallVec};

use tessera_core::{ParamSource, ParameterSpec, UploadedFile};

use crate::{RequestBody, RequestParts};

/// A raw value as found in the request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue<'a> {
    /// Text from the path, query, a header, a cookie or a form field.
    Text(&'a str),
    /// A node of the parsed JSON body.
    Json(&'a serde_json::Value),
    /// An uploaded file.
    File(&'a UploadedFile),
}

impl RawValue<'_> {
    /// Echo of the raw value for error reports.
    #[must_use]
    pub fn echo(&self) -> serde_json::Value {
        match self {
            Self::Text(text) => serde_json::Value::String((*text).to_string()),
            Self::Json(value) => (*value).clone(),
            Self::File(file) => serde_json::Value::String(
                file.file_name().unwrap_or(file.field_name()).to_string(),
            ),
        }
    }
}

/// Outcome of extracting one parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction<'a> {
    /// The parameter does not occur in the request.
    Absent,
    /// One or more occurrences, in request order.
    Present(SmallVec<[RawValue<'a>; 1]>),
}

impl<'a> Extraction<'a> {
    fn collect_from(values: impl IntoIterator<Item = RawValue<'a>>) -> Self {
        let values: SmallVec<[RawValue<'a>; 1]> = values.into_iter().collect();
        if values.is_empty() {
            Self::Absent
        } else {
            Self::Present(values)
        }
    }

    fn one(value: Option<RawValue<'a>>) -> Self {
        value.map_or(Self::Absent, |v| Self::Present(smallvec![v]))
    }

    /// Returns true for [`Extraction::Absent`].
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// Retrieves the raw value(s) of `spec` from the request.
///
/// Lookups use the spec's wire name. Path and cookie sources yield at most
/// one value; query, header and form sources yield every occurrence. JSON
/// body sources yield nothing unless the body parsed as JSON, and form
/// sources yield nothing unless it is a form.
///
/// # Example
///
/// ```rust
/// use tessera_core::{ParameterSpec, TargetType};
/// use tessera_extract::{extract, Extraction, RawValue, RequestParts};
///
/// let parts = RequestParts::builder().uri("/items?q-2=1&q-2=2").build();
/// let spec = ParameterSpec::query("q2", TargetType::sequence(TargetType::String)).alias("q-2");
///
/// let Extraction::Present(values) = extract(&spec, &parts) else { unreachable!() };
/// assert_eq!(values.as_slice(), [RawValue::Text("1"), RawValue::Text("2")]);
/// ```
#[must_use]
pub fn extract<'a>(spec: &ParameterSpec, request: &'a RequestParts) -> Extraction<'a> {
    let name = spec.name();
    match spec.source() {
        ParamSource::Path => Extraction::one(request.path_params().get(name).map(RawValue::Text)),
        ParamSource::Query => {
            Extraction::collect_from(request.query().get_all(name).into_iter().map(RawValue::Text))
        }
        ParamSource::Header => Extraction::collect_from(
            request
                .header_values(name)
                .into_iter()
                .map(|v| RawValue::Text(v.trim())),
        ),
        ParamSource::Cookie => Extraction::one(request.cookies().get(name).map(RawValue::Text)),
        ParamSource::BodyWhole => match request.body() {
            RequestBody::Json(value) => Extraction::one(Some(RawValue::Json(value))),
            _ => Extraction::Absent,
        },
        ParamSource::BodyField => match request.body() {
            RequestBody::Json(serde_json::Value::Object(map)) => {
                Extraction::one(map.get(name).map(RawValue::Json))
            }
            _ => Extraction::Absent,
        },
        ParamSource::FormField => match request.body() {
            RequestBody::Form(form) => {
                Extraction::collect_from(form.texts(name).into_iter().map(RawValue::Text))
            }
            _ => Extraction::Absent,
        },
        ParamSource::File => match request.body() {
            RequestBody::Form(form) => {
                Extraction::collect_from(form.files(name).into_iter().map(RawValue::File))
            }
            _ => Extraction::Absent,
        },
    }
}
