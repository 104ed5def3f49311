//! Response shaping policy.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::Model;

/// What to do when a scalar parameter receives several raw values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Bind the first occurrence and ignore the rest.
    #[default]
    First,
    /// Report a `duplicate_value` error.
    Reject,
}

/// How a handler result is turned into the response payload.
///
/// Steps are applied in this order: derived fields, response model
/// projection, unset exclusion, then the include and exclude lists.
///
/// # Example
///
/// ```
/// use tessera_core::{DerivedField, ShapePolicy};
///
/// let policy = ShapePolicy::new()
///     .derive(DerivedField::sum("price_with_tax", ["price", "tax"]).when_truthy("tax"))
///     .exclude(["internal_note"]);
///
/// assert_eq!(policy.derived_fields().len(), 1);
/// assert!(policy.excluded().contains("internal_note"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ShapePolicy {
    exclude_unset: bool,
    include: Option<BTreeSet<String>>,
    exclude: BTreeSet<String>,
    response_model: Option<Arc<Model>>,
    derived: Vec<DerivedField>,
}

impl ShapePolicy {
    /// Creates a policy that emits the result unchanged.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits only fields the caller explicitly supplied.
    #[must_use]
    pub fn exclude_unset(mut self) -> Self {
        self.exclude_unset = true;
        self
    }

    /// Restricts top-level output to the given fields.
    #[must_use]
    pub fn include<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include
            .get_or_insert_with(BTreeSet::new)
            .extend(fields.into_iter().map(Into::into));
        self
    }

    /// Removes the given top-level fields from output.
    #[must_use]
    pub fn exclude<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Projects the result onto a response model.
    #[must_use]
    pub fn response_model(mut self, model: Arc<Model>) -> Self {
        self.response_model = Some(model);
        self
    }

    /// Adds a derived field.
    #[must_use]
    pub fn derive(mut self, field: DerivedField) -> Self {
        self.derived.push(field);
        self
    }

    /// Returns true if unset fields are dropped.
    #[must_use]
    pub fn excludes_unset(&self) -> bool {
        self.exclude_unset
    }

    /// Returns the allow list, if any.
    #[must_use]
    pub fn included(&self) -> Option<&BTreeSet<String>> {
        self.include.as_ref()
    }

    /// Returns the deny list.
    #[must_use]
    pub fn excluded(&self) -> &BTreeSet<String> {
        &self.exclude
    }

    /// Returns the response model, if any.
    #[must_use]
    pub fn model(&self) -> Option<&Arc<Model>> {
        self.response_model.as_ref()
    }

    /// Returns the derived fields in declaration order.
    #[must_use]
    pub fn derived_fields(&self) -> &[DerivedField] {
        &self.derived
    }
}

/// Arithmetic producing a derived field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Derivation {
    /// Sum of numeric fields
    Sum(Vec<String>),
}

/// A field computed from other fields of the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedField {
    name: String,
    derivation: Derivation,
    guard: Option<String>,
}

impl DerivedField {
    /// Derives `name` as the sum of `operands`.
    #[must_use]
    pub fn sum<I, S>(name: impl Into<String>, operands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            derivation: Derivation::Sum(operands.into_iter().map(Into::into).collect()),
            guard: None,
        }
    }

    /// Computes the field only when `field` is truthy.
    #[must_use]
    pub fn when_truthy(mut self, field: impl Into<String>) -> Self {
        self.guard = Some(field.into());
        self
    }

    /// Returns the output field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the arithmetic.
    #[must_use]
    pub fn derivation(&self) -> &Derivation {
        &self.derivation
    }

    /// Returns the guard field, if any.
    #[must_use]
    pub fn guard(&self) -> Option<&str> {
        self.guard.as_deref()
    }
}
