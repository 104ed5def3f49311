//! Typed values produced by binding.
//!
//! A [`BoundValue`] is the tagged tree every successful coercion produces.
//! Nested models are carried as [`ModelInstance`]s, which remember for each
//! field whether the caller supplied it or it took its default. Response
//! shaping reads that bit to implement unset-exclusion.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeDelta};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use url::Url;
use uuid::Uuid;

use crate::{TargetType, UploadedFile};

/// A coerced, typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    /// Absent optional value or explicit JSON `null`
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Exact decimal
    Decimal(Decimal),
    /// String or e-mail address
    Str(String),
    /// Calendar date
    Date(NaiveDate),
    /// Timestamp with offset
    DateTime(DateTime<FixedOffset>),
    /// Time of day
    Time(NaiveTime),
    /// Signed duration
    Duration(TimeDelta),
    /// UUID
    Uuid(Uuid),
    /// Absolute URL
    Url(Url),
    /// Enum member
    Enum(String),
    /// Untyped JSON passthrough
    Json(serde_json::Value),
    /// Uploaded file
    File(UploadedFile),
    /// Sequence
    Seq(Vec<BoundValue>),
    /// Mapping with typed keys, in input order
    Map(Vec<(BoundValue, BoundValue)>),
    /// Nested model instance
    Model(ModelInstance),
}

impl BoundValue {
    /// Returns true for [`BoundValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Truthiness: null, `false`, zero, empty text and empty collections are falsy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(n) => *n != 0,
            Self::Decimal(d) => !d.is_zero(),
            Self::Str(s) => !s.is_empty(),
            Self::Duration(d) => !d.is_zero(),
            Self::Seq(items) => !items.is_empty(),
            Self::Map(entries) => !entries.is_empty(),
            Self::File(file) => !file.is_empty(),
            Self::Json(value) => json_truthy(value),
            Self::Date(_)
            | Self::DateTime(_)
            | Self::Time(_)
            | Self::Uuid(_)
            | Self::Url(_)
            | Self::Enum(_)
            | Self::Model(_) => true,
        }
    }

    /// Returns the value as a decimal if it is numeric.
    #[must_use]
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Int(n) => Some(Decimal::from(*n)),
            Self::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the value as text if it is textual.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) | Self::Enum(s) => Some(s),
            Self::Url(url) => Some(url.as_str()),
            _ => None,
        }
    }

    /// Returns the nested model, if this is one.
    #[must_use]
    pub fn as_model(&self) -> Option<&ModelInstance> {
        match self {
            Self::Model(model) => Some(model),
            _ => None,
        }
    }

    /// Checks structural conformance to a target type.
    ///
    /// `Null` conforms to every type; nullability is decided by the parameter,
    /// not the type.
    #[must_use]
    pub fn conforms_to(&self, target: &TargetType) -> bool {
        match (self, target) {
            (Self::Null, _) | (_, TargetType::Any) => true,
            (Self::Str(_), TargetType::String | TargetType::Email)
            | (Self::Int(_), TargetType::Integer | TargetType::Decimal)
            | (Self::Decimal(_), TargetType::Decimal)
            | (Self::Bool(_), TargetType::Boolean)
            | (Self::Date(_), TargetType::Date)
            | (Self::DateTime(_), TargetType::DateTime)
            | (Self::Time(_), TargetType::Time)
            | (Self::Duration(_), TargetType::Duration)
            | (Self::Uuid(_), TargetType::Uuid)
            | (Self::Url(_), TargetType::Url)
            | (Self::File(_), TargetType::File) => true,
            (Self::Enum(member), TargetType::Enum(spec)) => spec.contains(member),
            (Self::Seq(items), TargetType::Sequence(inner)) => {
                items.iter().all(|item| item.conforms_to(inner))
            }
            (Self::Map(entries), TargetType::Mapping(key, value)) => entries
                .iter()
                .all(|(k, v)| k.conforms_to(key) && v.conforms_to(value)),
            (Self::Model(instance), TargetType::Model(model)) => {
                instance.name() == model.name()
                    && instance
                        .iter()
                        .all(|(name, field)| match model.field(name) {
                            Some(spec) => field.value.conforms_to(spec.target()),
                            None => false,
                        })
            }
            _ => false,
        }
    }
}

fn json_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n
            .to_string()
            .trim_start_matches('-')
            .chars()
            .any(|c| c.is_ascii_digit() && c != '0'),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(items) => !items.is_empty(),
        serde_json::Value::Object(map) => !map.is_empty(),
    }
}

impl From<bool> for BoundValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for BoundValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<Decimal> for BoundValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<String> for BoundValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&str> for BoundValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<Uuid> for BoundValue {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<ModelInstance> for BoundValue {
    fn from(value: ModelInstance) -> Self {
        Self::Model(value)
    }
}

impl From<serde_json::Value> for BoundValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl<T: Into<BoundValue>> From<Option<T>> for BoundValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<BoundValue>> From<Vec<T>> for BoundValue {
    fn from(value: Vec<T>) -> Self {
        Self::Seq(value.into_iter().map(Into::into).collect())
    }
}

/// One field of a [`ModelInstance`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    /// The bound value.
    pub value: BoundValue,
    /// Whether the caller supplied the value (as opposed to a default).
    pub explicit: bool,
}

/// A bound nested model: ordered fields plus the explicit bit for each.
///
/// # Example
///
/// ```
/// use tessera_core::{BoundValue, ModelInstance};
///
/// let mut item = ModelInstance::new("Item").with("name", "Foo");
/// item.insert("tags", BoundValue::Seq(vec![]), false);
///
/// assert!(item.is_explicit("name"));
/// assert!(!item.is_explicit("tags"));
/// assert_eq!(item.get("name"), Some(&BoundValue::from("Foo")));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInstance {
    name: String,
    fields: IndexMap<String, FieldValue>,
}

impl ModelInstance {
    /// Creates an empty instance of the named model.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Returns the model name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts a field with an explicit bit, replacing any previous value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<BoundValue>, explicit: bool) {
        self.fields.insert(
            name.into(),
            FieldValue {
                value: value.into(),
                explicit,
            },
        );
    }

    /// Sets a field as explicitly supplied.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<BoundValue>) {
        self.insert(name, value, true);
    }

    /// Builder form of [`ModelInstance::set`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<BoundValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Returns a field's value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BoundValue> {
        self.fields.get(name).map(|f| &f.value)
    }

    /// Returns a field with its explicit bit.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Returns true if the field exists and was supplied by the caller.
    #[must_use]
    pub fn is_explicit(&self, name: &str) -> bool {
        self.fields.get(name).is_some_and(|f| f.explicit)
    }

    /// Removes a field, preserving the order of the rest.
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.shift_remove(name)
    }

    /// Keeps only the fields for which the predicate holds.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &FieldValue) -> bool) {
        self.fields.retain(|name, field| keep(name, field));
    }

    /// Iterates fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    /// Iterates fields mutably in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut FieldValue)> {
        self.fields
            .iter_mut()
            .map(|(name, field)| (name.as_str(), field))
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the instance has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Conversion from a bound value into a Rust type.
///
/// Returns `None` when the value has a different shape.
pub trait FromBound: Sized {
    /// Converts a bound value.
    fn from_bound(value: &BoundValue) -> Option<Self>;
}

impl FromBound for BoundValue {
    fn from_bound(value: &BoundValue) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromBound for String {
    fn from_bound(value: &BoundValue) -> Option<Self> {
        value.as_str().map(ToString::to_string)
    }
}

impl FromBound for i64 {
    fn from_bound(value: &BoundValue) -> Option<Self> {
        match value {
            BoundValue::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl FromBound for bool {
    fn from_bound(value: &BoundValue) -> Option<Self> {
        match value {
            BoundValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromBound for Decimal {
    fn from_bound(value: &BoundValue) -> Option<Self> {
        value.as_decimal()
    }
}

impl FromBound for Uuid {
    fn from_bound(value: &BoundValue) -> Option<Self> {
        match value {
            BoundValue::Uuid(id) => Some(*id),
            _ => None,
        }
    }
}

impl FromBound for NaiveDate {
    fn from_bound(value: &BoundValue) -> Option<Self> {
        match value {
            BoundValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl FromBound for DateTime<FixedOffset> {
    fn from_bound(value: &BoundValue) -> Option<Self> {
        match value {
            BoundValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }
}

impl FromBound for NaiveTime {
    fn from_bound(value: &BoundValue) -> Option<Self> {
        match value {
            BoundValue::Time(t) => Some(*t),
            _ => None,
        }
    }
}

impl FromBound for TimeDelta {
    fn from_bound(value: &BoundValue) -> Option<Self> {
        match value {
            BoundValue::Duration(d) => Some(*d),
            _ => None,
        }
    }
}

impl FromBound for Url {
    fn from_bound(value: &BoundValue) -> Option<Self> {
        match value {
            BoundValue::Url(url) => Some(url.clone()),
            _ => None,
        }
    }
}

impl FromBound for ModelInstance {
    fn from_bound(value: &BoundValue) -> Option<Self> {
        value.as_model().cloned()
    }
}

impl FromBound for UploadedFile {
    fn from_bound(value: &BoundValue) -> Option<Self> {
        match value {
            BoundValue::File(file) => Some(file.clone()),
            _ => None,
        }
    }
}

impl FromBound for serde_json::Value {
    fn from_bound(value: &BoundValue) -> Option<Self> {
        match value {
            BoundValue::Json(json) => Some(json.clone()),
            _ => None,
        }
    }
}

impl<T: FromBound> FromBound for Option<T> {
    fn from_bound(value: &BoundValue) -> Option<Self> {
        match value {
            BoundValue::Null => Some(None),
            other => T::from_bound(other).map(Some),
        }
    }
}

impl<T: FromBound> FromBound for Vec<T> {
    fn from_bound(value: &BoundValue) -> Option<Self> {
        match value {
            BoundValue::Seq(items) => items.iter().map(T::from_bound).collect(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EnumSpec, Model, ParameterSpec};
    use std::str::FromStr;
    use std::sync::Arc;

    #[test]
    fn test_truthiness() {
        assert!(!BoundValue::Null.is_truthy());
        assert!(!BoundValue::Decimal(Decimal::ZERO).is_truthy());
        assert!(BoundValue::Decimal(Decimal::from_str("0.891").unwrap()).is_truthy());
        assert!(!BoundValue::from("").is_truthy());
        assert!(BoundValue::from("x").is_truthy());
        assert!(!BoundValue::Seq(vec![]).is_truthy());
        assert!(!BoundValue::Json(serde_json::json!(0)).is_truthy());
        assert!(BoundValue::Json(serde_json::json!(0.5)).is_truthy());
    }

    #[test]
    fn test_conforms_to_collections() {
        let seq = BoundValue::from(vec!["aa", "bb"]);
        assert!(seq.conforms_to(&TargetType::sequence(TargetType::String)));
        assert!(!seq.conforms_to(&TargetType::sequence(TargetType::Integer)));

        let member = BoundValue::Enum("lenet".to_string());
        assert!(member.conforms_to(&TargetType::Enum(EnumSpec::new("M", ["lenet"]))));
        assert!(!member.conforms_to(&TargetType::Enum(EnumSpec::new("M", ["resnet"]))));

        assert!(BoundValue::Null.conforms_to(&TargetType::Integer));
        assert!(BoundValue::Int(1).conforms_to(&TargetType::Decimal));
    }

    #[test]
    fn test_conforms_to_model() {
        let model = Arc::new(
            Model::builder("User")
                .field(ParameterSpec::field("username", TargetType::String))
                .build()
                .unwrap(),
        );
        let ok = BoundValue::Model(ModelInstance::new("User").with("username", "jane"));
        let wrong_field = BoundValue::Model(ModelInstance::new("User").with("nickname", "jane"));

        assert!(ok.conforms_to(&TargetType::model(model.clone())));
        assert!(!wrong_field.conforms_to(&TargetType::model(model)));
    }

    #[test]
    fn test_model_instance_order_and_removal() {
        let mut item = ModelInstance::new("Item")
            .with("name", "Foo")
            .with("price", Decimal::ONE);
        item.insert("tags", BoundValue::Seq(vec![]), false);
        item.remove("price");

        let names: Vec<&str> = item.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["name", "tags"]);
        assert!(!item.is_explicit("tags"));
        assert!(!item.is_explicit("missing"));
    }

    #[test]
    fn test_from_bound_containers() {
        let seq = BoundValue::from(vec!["1", "2"]);
        assert_eq!(
            Vec::<String>::from_bound(&seq),
            Some(vec!["1".to_string(), "2".to_string()])
        );
        assert_eq!(Option::<i64>::from_bound(&BoundValue::Null), Some(None));
        assert_eq!(Option::<i64>::from_bound(&BoundValue::Int(3)), Some(Some(3)));
        assert_eq!(i64::from_bound(&BoundValue::from("3")), None);
    }
}
