//! Parameter specifications.
//!
//! A [`ParameterSpec`] is the static description of one route parameter (or
//! one model field): where its raw value comes from, what it binds to, and
//! which constraints the bound value must satisfy.
//!
//! Specs are built with by-value builder methods. Mistakes that can only be
//! detected while building (an invalid regex, for instance) are remembered
//! and reported by [`ParameterSpec::check`], which route and model builders
//! call before accepting the spec.

use rust_decimal::Decimal;

use crate::{BoundValue, Constraint, ContractError, ParamSource, TargetType};

/// Static description of one parameter.
///
/// # Example
///
/// ```
/// use tessera_core::{ParamSource, ParameterSpec, TargetType};
///
/// let token = ParameterSpec::header("x_token", TargetType::String);
/// assert_eq!(token.name(), "x-token");
/// assert_eq!(token.binding(), "x_token");
///
/// let q2 = ParameterSpec::query("q2", TargetType::sequence(TargetType::String)).alias("q-2");
/// assert_eq!(q2.name(), "q-2");
/// assert_eq!(q2.source(), ParamSource::Query);
/// ```
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    name: String,
    binding: String,
    source: ParamSource,
    required: bool,
    default: Option<BoundValue>,
    target: TargetType,
    constraints: Vec<Constraint>,
    deprecated: bool,
    title: Option<String>,
    description: Option<String>,
    examples: Vec<serde_json::Value>,
    invalid: Option<ContractError>,
}

impl ParameterSpec {
    fn new(binding: impl Into<String>, source: ParamSource, target: TargetType) -> Self {
        let binding = binding.into();
        Self {
            name: binding.clone(),
            binding,
            source,
            required: true,
            default: None,
            target,
            constraints: Vec::new(),
            deprecated: false,
            title: None,
            description: None,
            examples: Vec::new(),
            invalid: None,
        }
    }

    /// A path segment parameter. Always required.
    #[must_use]
    pub fn path(name: impl Into<String>, target: TargetType) -> Self {
        Self::new(name, ParamSource::Path, target)
    }

    /// A query string parameter.
    #[must_use]
    pub fn query(name: impl Into<String>, target: TargetType) -> Self {
        Self::new(name, ParamSource::Query, target)
    }

    /// A header parameter.
    ///
    /// The wire name is the identifier lower-cased with underscores turned
    /// into hyphens (`x_token` reads `x-token`).
    #[must_use]
    pub fn header(ident: impl Into<String>, target: TargetType) -> Self {
        let mut spec = Self::new(ident, ParamSource::Header, target);
        spec.name = spec.binding.replace('_', "-").to_ascii_lowercase();
        spec
    }

    /// A cookie parameter.
    #[must_use]
    pub fn cookie(name: impl Into<String>, target: TargetType) -> Self {
        Self::new(name, ParamSource::Cookie, target)
    }

    /// A top-level key of the JSON body object.
    #[must_use]
    pub fn body_field(name: impl Into<String>, target: TargetType) -> Self {
        Self::new(name, ParamSource::BodyField, target)
    }

    /// The entire JSON body, bound under `binding`.
    #[must_use]
    pub fn body(binding: impl Into<String>, target: TargetType) -> Self {
        Self::new(binding, ParamSource::BodyWhole, target)
    }

    /// A text field of a form body.
    #[must_use]
    pub fn form_field(name: impl Into<String>, target: TargetType) -> Self {
        Self::new(name, ParamSource::FormField, target)
    }

    /// A file part of a multipart body.
    #[must_use]
    pub fn file(name: impl Into<String>) -> Self {
        Self::new(name, ParamSource::File, TargetType::File)
    }

    /// A field of a [`Model`](crate::Model).
    #[must_use]
    pub fn field(name: impl Into<String>, target: TargetType) -> Self {
        Self::new(name, ParamSource::BodyField, target)
    }

    /// Sets the wire name, keeping the binding identifier.
    #[must_use]
    pub fn alias(mut self, wire_name: impl Into<String>) -> Self {
        self.name = wire_name.into();
        self
    }

    /// Uses the binding identifier verbatim as the header name.
    #[must_use]
    pub fn preserve_underscores(mut self) -> Self {
        self.name = self.binding.to_ascii_lowercase();
        self
    }

    /// Marks the parameter optional; absent values bind to `null`.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Marks the parameter required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Makes the parameter optional with a default for absent values.
    #[must_use]
    pub fn default(mut self, value: impl Into<BoundValue>) -> Self {
        self.required = false;
        self.default = Some(value.into());
        self
    }

    /// Adds a constraint.
    #[must_use]
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Adds a minimum character count.
    #[must_use]
    pub fn min_length(self, len: usize) -> Self {
        self.constraint(Constraint::MinLength(len))
    }

    /// Adds a maximum character count.
    #[must_use]
    pub fn max_length(self, len: usize) -> Self {
        self.constraint(Constraint::MaxLength(len))
    }

    /// Adds a regex constraint. An invalid pattern surfaces from [`ParameterSpec::check`].
    #[must_use]
    pub fn pattern(mut self, source: &str) -> Self {
        match Constraint::pattern(source) {
            Ok(c) => self.constraints.push(c),
            Err(e) => {
                self.invalid.get_or_insert(e);
            }
        }
        self
    }

    /// Adds an inclusive lower bound.
    #[must_use]
    pub fn ge(self, bound: impl Into<Decimal>) -> Self {
        self.constraint(Constraint::Ge(bound.into()))
    }

    /// Adds an exclusive lower bound.
    #[must_use]
    pub fn gt(self, bound: impl Into<Decimal>) -> Self {
        self.constraint(Constraint::Gt(bound.into()))
    }

    /// Adds an inclusive upper bound.
    #[must_use]
    pub fn le(self, bound: impl Into<Decimal>) -> Self {
        self.constraint(Constraint::Le(bound.into()))
    }

    /// Adds an exclusive upper bound.
    #[must_use]
    pub fn lt(self, bound: impl Into<Decimal>) -> Self {
        self.constraint(Constraint::Lt(bound.into()))
    }

    /// Adds a minimum element count.
    #[must_use]
    pub fn min_items(self, n: usize) -> Self {
        self.constraint(Constraint::MinItems(n))
    }

    /// Adds a maximum element count.
    #[must_use]
    pub fn max_items(self, n: usize) -> Self {
        self.constraint(Constraint::MaxItems(n))
    }

    /// Marks the parameter deprecated. Informational only.
    #[must_use]
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Sets a title. Informational only.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets a description. Informational only.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds an example value. Informational only.
    #[must_use]
    pub fn example(mut self, example: serde_json::Value) -> Self {
        self.examples.push(example);
        self
    }

    /// Returns the wire name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the identifier the value is bound to.
    #[must_use]
    pub fn binding(&self) -> &str {
        &self.binding
    }

    /// Returns the source.
    #[must_use]
    pub fn source(&self) -> ParamSource {
        self.source
    }

    /// Returns true if an absent value is an error.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the declared default.
    #[must_use]
    pub fn default_value(&self) -> Option<&BoundValue> {
        self.default.as_ref()
    }

    /// Returns the target type.
    #[must_use]
    pub fn target(&self) -> &TargetType {
        &self.target
    }

    /// Returns the constraints in declaration order.
    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Returns true if the parameter is deprecated.
    #[must_use]
    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    /// Returns the title.
    #[must_use]
    pub fn title_text(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Returns the description.
    #[must_use]
    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the example values.
    #[must_use]
    pub fn examples(&self) -> &[serde_json::Value] {
        &self.examples
    }

    /// Checks the spec for internal consistency.
    pub fn check(&self) -> Result<(), ContractError> {
        if let Some(err) = &self.invalid {
            return Err(err.clone());
        }

        if self.required && self.default.is_some() {
            return Err(ContractError::RequiredWithDefault {
                name: self.binding.clone(),
            });
        }

        if let Some(default) = &self.default {
            if !default.conforms_to(&self.target) {
                return Err(ContractError::DefaultTypeMismatch {
                    name: self.binding.clone(),
                    expected: self.target.describe(),
                });
            }
        }

        for constraint in &self.constraints {
            if !constraint.applies_to(&self.target) {
                return Err(ContractError::ConstraintNotApplicable {
                    name: self.binding.clone(),
                    constraint: constraint.name(),
                    target: self.target.describe(),
                });
            }
        }

        check_map_keys(&self.binding, &self.target)?;

        if !source_accepts(self.source, &self.target) {
            return Err(ContractError::UnsupportedTarget {
                name: self.binding.clone(),
                param_source: self.source,
                target: self.target.describe(),
            });
        }

        Ok(())
    }
}

fn check_map_keys(name: &str, target: &TargetType) -> Result<(), ContractError> {
    match target {
        TargetType::Mapping(key, value) => {
            if !key.is_scalar() {
                return Err(ContractError::UnsupportedMapKey {
                    name: name.to_string(),
                    key: key.describe(),
                });
            }
            check_map_keys(name, value)
        }
        TargetType::Sequence(inner) => check_map_keys(name, inner),
        _ => Ok(()),
    }
}

fn source_accepts(source: ParamSource, target: &TargetType) -> bool {
    let scalar_or_list = |t: &TargetType| match t {
        TargetType::Sequence(inner) => inner.is_scalar(),
        other => other.is_scalar(),
    };

    match source {
        ParamSource::Path | ParamSource::Cookie => target.is_scalar(),
        ParamSource::Query | ParamSource::Header | ParamSource::FormField => scalar_or_list(target),
        ParamSource::File => match target {
            TargetType::Sequence(inner) => matches!(**inner, TargetType::File),
            other => matches!(other, TargetType::File),
        },
        ParamSource::BodyField | ParamSource::BodyWhole => !matches!(target, TargetType::File),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_name_conversion() {
        let spec = ParameterSpec::header("X_Dummy_Header", TargetType::String);
        assert_eq!(spec.name(), "x-dummy-header");
        assert_eq!(spec.binding(), "X_Dummy_Header");

        let spec = spec.preserve_underscores();
        assert_eq!(spec.name(), "x_dummy_header");
    }

    #[test]
    fn test_default_makes_optional() {
        let spec = ParameterSpec::query("short", TargetType::Boolean).default(false);
        assert!(!spec.is_required());
        assert_eq!(spec.default_value(), Some(&BoundValue::Bool(false)));
        assert!(spec.check().is_ok());
    }

    #[test]
    fn test_required_with_default_rejected() {
        let spec = ParameterSpec::query("short", TargetType::Boolean)
            .default(false)
            .required();
        assert!(matches!(
            spec.check(),
            Err(ContractError::RequiredWithDefault { .. })
        ));
    }

    #[test]
    fn test_default_must_conform() {
        let spec = ParameterSpec::body_field("importance", TargetType::Integer).default("one");
        assert!(matches!(
            spec.check(),
            Err(ContractError::DefaultTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_constraint_applicability_checked() {
        let spec = ParameterSpec::path("item_id", TargetType::Integer).max_length(3);
        assert!(matches!(
            spec.check(),
            Err(ContractError::ConstraintNotApplicable { constraint: "max_length", .. })
        ));
    }

    #[test]
    fn test_invalid_pattern_deferred() {
        let spec = ParameterSpec::query("q", TargetType::String).pattern("[");
        assert!(matches!(
            spec.check(),
            Err(ContractError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_map_key_must_be_scalar() {
        let spec = ParameterSpec::body(
            "weights",
            TargetType::mapping(TargetType::sequence(TargetType::Integer), TargetType::Decimal),
        );
        assert!(matches!(
            spec.check(),
            Err(ContractError::UnsupportedMapKey { .. })
        ));
    }

    #[test]
    fn test_source_target_compatibility() {
        assert!(ParameterSpec::query("q", TargetType::sequence(TargetType::String))
            .check()
            .is_ok());
        assert!(ParameterSpec::path("id", TargetType::sequence(TargetType::String))
            .check()
            .is_err());
        assert!(ParameterSpec::cookie("c", TargetType::Any).check().is_err());
        assert!(ParameterSpec::body_field("f", TargetType::File).check().is_err());
        assert!(ParameterSpec::file("upload").check().is_ok());
    }
}
