//! Target types a parameter can bind to.

use std::fmt;
use std::sync::Arc;

use crate::Model;

/// Semantic type a raw value is coerced into.
///
/// # Example
///
/// ```
/// use tessera_core::{EnumSpec, TargetType};
///
/// let ids = TargetType::sequence(TargetType::Integer);
/// assert_eq!(ids.describe(), "list[integer]");
///
/// let model = TargetType::Enum(EnumSpec::new("ModelName", ["alexnet", "resnet", "lenet"]));
/// assert!(model.is_scalar());
/// ```
#[derive(Debug, Clone)]
pub enum TargetType {
    /// Any string
    String,
    /// 64-bit signed integer
    Integer,
    /// Arbitrary precision decimal
    Decimal,
    /// Boolean with truthy/falsy word sets
    Boolean,
    /// Calendar date, `YYYY-MM-DD`
    Date,
    /// RFC 3339 timestamp with offset
    DateTime,
    /// Time of day, `HH:MM:SS[.fff]`
    Time,
    /// ISO 8601 duration (`P1DT2H`), or seconds when given as a JSON number
    Duration,
    /// Hyphenated UUID
    Uuid,
    /// Absolute `http`/`https` URL with a host
    Url,
    /// E-mail address
    Email,
    /// Any JSON value, passed through untouched
    Any,
    /// Uploaded multipart file
    File,
    /// Closed set of string members
    Enum(EnumSpec),
    /// Nested model
    Model(Arc<Model>),
    /// Ordered sequence of one element type
    Sequence(Box<TargetType>),
    /// Mapping from a scalar key type to a value type
    Mapping(Box<TargetType>, Box<TargetType>),
}

impl TargetType {
    /// Creates a sequence type.
    #[must_use]
    pub fn sequence(element: TargetType) -> Self {
        Self::Sequence(Box::new(element))
    }

    /// Creates a mapping type.
    #[must_use]
    pub fn mapping(key: TargetType, value: TargetType) -> Self {
        Self::Mapping(Box::new(key), Box::new(value))
    }

    /// Creates a nested model type.
    #[must_use]
    pub fn model(model: Arc<Model>) -> Self {
        Self::Model(model)
    }

    /// Human-readable type name used in error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::String => "string".to_string(),
            Self::Integer => "integer".to_string(),
            Self::Decimal => "decimal".to_string(),
            Self::Boolean => "boolean".to_string(),
            Self::Date => "date".to_string(),
            Self::DateTime => "datetime".to_string(),
            Self::Time => "time".to_string(),
            Self::Duration => "duration".to_string(),
            Self::Uuid => "uuid".to_string(),
            Self::Url => "url".to_string(),
            Self::Email => "email".to_string(),
            Self::Any => "any".to_string(),
            Self::File => "file".to_string(),
            Self::Enum(spec) => spec.name().to_string(),
            Self::Model(model) => model.name().to_string(),
            Self::Sequence(inner) => format!("list[{}]", inner.describe()),
            Self::Mapping(key, value) => format!("dict[{}, {}]", key.describe(), value.describe()),
        }
    }

    /// Returns true for types parsed from a single piece of text.
    ///
    /// Only scalar types can be mapping keys or bind from path, header,
    /// cookie and form sources.
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::String
                | Self::Integer
                | Self::Decimal
                | Self::Boolean
                | Self::Date
                | Self::DateTime
                | Self::Time
                | Self::Duration
                | Self::Uuid
                | Self::Url
                | Self::Email
                | Self::Enum(_)
        )
    }

    /// Returns true for integer and decimal types.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Decimal)
    }

    /// Returns true for types whose bound value is text.
    #[must_use]
    pub const fn is_textual(&self) -> bool {
        matches!(self, Self::String | Self::Email | Self::Url | Self::Enum(_))
    }

    /// Returns true for sequence and mapping types.
    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(self, Self::Sequence(_) | Self::Mapping(..))
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// A closed set of string members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumSpec {
    name: String,
    members: Vec<String>,
}

impl EnumSpec {
    /// Creates an enum with the given members, in declaration order.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the enum name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the members.
    #[must_use]
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Case-sensitive membership test.
    #[must_use]
    pub fn contains(&self, candidate: &str) -> bool {
        self.members.iter().any(|m| m == candidate)
    }

    /// Renders the members as `'a', 'b' or 'c'`.
    #[must_use]
    pub fn describe_members(&self) -> String {
        describe_choices(&self.members)
    }
}

/// Renders choices as `'a', 'b' or 'c'`.
pub(crate) fn describe_choices(choices: &[String]) -> String {
    let quoted: Vec<String> = choices.iter().map(|c| format!("'{c}'")).collect();
    match quoted.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} or {}", rest.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_nested() {
        let ty = TargetType::mapping(
            TargetType::Integer,
            TargetType::sequence(TargetType::Decimal),
        );
        assert_eq!(ty.describe(), "dict[integer, list[decimal]]");
    }

    #[test]
    fn test_scalar_classification() {
        assert!(TargetType::Uuid.is_scalar());
        assert!(TargetType::Enum(EnumSpec::new("E", ["a"])).is_scalar());
        assert!(!TargetType::Any.is_scalar());
        assert!(!TargetType::File.is_scalar());
        assert!(!TargetType::sequence(TargetType::String).is_scalar());
    }

    #[test]
    fn test_enum_members() {
        let spec = EnumSpec::new("ModelName", ["alexnet", "resnet", "lenet"]);
        assert!(spec.contains("resnet"));
        assert!(!spec.contains("ResNet"));
        assert_eq!(spec.describe_members(), "'alexnet', 'resnet' or 'lenet'");
    }

    #[test]
    fn test_describe_choices_short_lists() {
        assert_eq!(describe_choices(&[]), "");
        assert_eq!(describe_choices(&["a".to_string()]), "'a'");
        assert_eq!(
            describe_choices(&["a".to_string(), "b".to_string()]),
            "'a' or 'b'"
        );
    }
}
