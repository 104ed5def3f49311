//! Nested body models.

use std::collections::HashSet;

use crate::{ContractError, ParamSource, ParameterSpec};

/// A named structure of field specs describing a JSON object.
///
/// Models nest through [`TargetType::Model`](crate::TargetType::Model) and are
/// shared behind `Arc` once built.
///
/// # Example
///
/// ```
/// use tessera_core::{Model, ParameterSpec, TargetType};
///
/// let image = Model::builder("Image")
///     .field(ParameterSpec::field("url", TargetType::Url))
///     .field(ParameterSpec::field("name", TargetType::String))
///     .build()
///     .unwrap();
///
/// assert_eq!(image.fields().len(), 2);
/// assert!(image.field("url").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    fields: Vec<ParameterSpec>,
}

impl Model {
    /// Creates a model builder.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ModelBuilder {
        ModelBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Returns the model name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[ParameterSpec] {
        &self.fields
    }

    /// Looks up a field by binding identifier.
    #[must_use]
    pub fn field(&self, binding: &str) -> Option<&ParameterSpec> {
        self.fields.iter().find(|f| f.binding() == binding)
    }
}

/// Builder for [`Model`].
#[derive(Debug)]
pub struct ModelBuilder {
    name: String,
    fields: Vec<ParameterSpec>,
}

impl ModelBuilder {
    /// Adds a field.
    #[must_use]
    pub fn field(mut self, field: ParameterSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Validates the fields and builds the model.
    pub fn build(self) -> Result<Model, ContractError> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name()) {
                return Err(ContractError::DuplicateParameter {
                    owner: self.name.clone(),
                    param_source: ParamSource::BodyField,
                    name: field.name().to_string(),
                });
            }
            field.check()?;
        }

        Ok(Model {
            name: self.name,
            fields: self.fields,
        })
    }
}
