//! Validated parameter bundle handed to handlers.

use indexmap::IndexMap;
use thiserror::Error;

use tessera_core::{BoundValue, FieldValue, FromBound, ModelInstance};

/// Error reading a typed value out of a [`ParamBundle`].
///
/// Either variant means the handler asked for something its own contract
/// does not declare, so the server maps both to 500.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BundleError {
    /// No parameter with this binding name.
    #[error("no bound parameter named '{0}'")]
    Missing(String),

    /// The parameter exists but holds a different type.
    #[error("parameter '{name}' cannot be read as {expected}")]
    TypeMismatch {
        /// Binding name.
        name: String,
        /// Requested Rust type.
        expected: &'static str,
    },
}

/// Every declared parameter of a route, bound and typed, keyed by binding name.
///
/// Iteration follows declaration order.
///
/// # Example
///
/// ```
/// use tessera_bind::ParamBundle;
/// use tessera_core::BoundValue;
///
/// let bundle: ParamBundle = [("item_id", BoundValue::Int(3))].into_iter().collect();
/// let item_id: i64 = bundle.get("item_id").unwrap();
/// assert_eq!(item_id, 3);
/// assert!(bundle.get::<String>("item_id").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamBundle {
    values: IndexMap<String, FieldValue>,
}

impl ParamBundle {
    /// Creates an empty bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, binding: &str, value: BoundValue, explicit: bool) {
        self.values
            .insert(binding.to_string(), FieldValue { value, explicit });
    }

    /// Reads a parameter as `T`.
    ///
    /// # Errors
    ///
    /// [`BundleError::Missing`] for an undeclared name,
    /// [`BundleError::TypeMismatch`] if the value is not a `T`.
    pub fn get<T: FromBound>(&self, binding: &str) -> Result<T, BundleError> {
        let value = self.value(binding)?;
        T::from_bound(value).ok_or_else(|| BundleError::TypeMismatch {
            name: binding.to_string(),
            expected: std::any::type_name::<T>(),
        })
    }

    /// Returns the raw bound value of a parameter.
    ///
    /// # Errors
    ///
    /// [`BundleError::Missing`] for an undeclared name.
    pub fn value(&self, binding: &str) -> Result<&BoundValue, BundleError> {
        self.values
            .get(binding)
            .map(|field| &field.value)
            .ok_or_else(|| BundleError::Missing(binding.to_string()))
    }

    /// Returns true if the caller supplied the parameter.
    #[must_use]
    pub fn is_explicit(&self, binding: &str) -> bool {
        self.values.get(binding).is_some_and(|field| field.explicit)
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true for a route without parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over `(binding, field)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(name, field)| (name.as_str(), field))
    }

    /// Converts the bundle into a model instance, keeping the explicit bits.
    #[must_use]
    pub fn into_model(self, name: impl Into<String>) -> ModelInstance {
        let mut instance = ModelInstance::new(name);
        for (binding, field) in self.values {
            instance.insert(binding, field.value, field.explicit);
        }
        instance
    }
}

impl<S: Into<String>> FromIterator<(S, BoundValue)> for ParamBundle {
    fn from_iter<I: IntoIterator<Item = (S, BoundValue)>>(iter: I) -> Self {
        let values = iter
            .into_iter()
            .map(|(name, value)| {
                (
                    name.into(),
                    FieldValue {
                        value,
                        explicit: true,
                    },
                )
            })
            .collect();
        Self { values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn bundle() -> ParamBundle {
        let mut bundle = ParamBundle::new();
        bundle.insert("item_id", BoundValue::Int(5), true);
        bundle.insert("q", BoundValue::Null, false);
        bundle.insert("price", BoundValue::Decimal(Decimal::new(150, 2)), true);
        bundle
    }

    #[test]
    fn test_typed_get() {
        let bundle = bundle();
        assert_eq!(bundle.get::<i64>("item_id").unwrap(), 5);
        assert_eq!(bundle.get::<Option<String>>("q").unwrap(), None);
        assert_eq!(bundle.get::<Decimal>("price").unwrap().to_string(), "1.50");
    }

    #[test]
    fn test_get_errors() {
        let bundle = bundle();
        assert_eq!(
            bundle.get::<i64>("nope"),
            Err(BundleError::Missing("nope".to_string()))
        );
        assert!(matches!(
            bundle.get::<bool>("item_id"),
            Err(BundleError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_into_model_keeps_explicit_bits() {
        let model = bundle().into_model("Params");
        assert!(model.is_explicit("item_id"));
        assert!(!model.is_explicit("q"));
        assert_eq!(model.len(), 3);
    }
}
