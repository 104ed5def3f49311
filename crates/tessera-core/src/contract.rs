//! Route contracts.
//!
//! A [`RouteContract`] is the declarative artifact a handler publishes: its
//! parameters in declaration order, plus the success status and shaping
//! policy of its response. Contracts are built once at startup and every
//! consistency check runs in [`RouteContractBuilder::build`], so a defective
//! contract aborts startup instead of failing requests.
//!
//! # Example
//!
//! ```
//! use http::{Method, StatusCode};
//! use tessera_core::{ParameterSpec, RouteContract, TargetType};
//!
//! let contract = RouteContract::builder("read_item", Method::GET, "/items/{item_id}")
//!     .param(ParameterSpec::path("item_id", TargetType::Integer).ge(1))
//!     .param(ParameterSpec::query("needy", TargetType::String))
//!     .param(ParameterSpec::header("x_token", TargetType::String))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(contract.params().len(), 3);
//! assert_eq!(contract.response().status(), StatusCode::OK);
//! assert_eq!(contract.path_params(), ["item_id"]);
//! ```

use http::{Method, StatusCode};
use std::collections::HashSet;

use crate::{ContractError, ParamSource, ParameterSpec, ShapePolicy};

/// Success status and shaping policy of a route.
#[derive(Debug, Clone)]
pub struct ResponseSpec {
    status: StatusCode,
    policy: ShapePolicy,
}

impl ResponseSpec {
    /// Returns the success status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the shaping policy.
    #[must_use]
    pub fn policy(&self) -> &ShapePolicy {
        &self.policy
    }
}

/// Immutable description of one route.
#[derive(Debug, Clone)]
pub struct RouteContract {
    operation_id: String,
    method: Method,
    path: String,
    params: Vec<ParameterSpec>,
    response: ResponseSpec,
    summary: Option<String>,
}

impl RouteContract {
    /// Creates a contract builder.
    #[must_use]
    pub fn builder(
        operation_id: impl Into<String>,
        method: Method,
        path: impl Into<String>,
    ) -> RouteContractBuilder {
        RouteContractBuilder {
            operation_id: operation_id.into(),
            method,
            path: path.into(),
            params: Vec::new(),
            status: StatusCode::OK,
            policy: ShapePolicy::default(),
            summary: None,
        }
    }

    /// Returns the operation identifier.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the path pattern.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the parameters in declaration order.
    #[must_use]
    pub fn params(&self) -> &[ParameterSpec] {
        &self.params
    }

    /// Returns the response description.
    #[must_use]
    pub fn response(&self) -> &ResponseSpec {
        &self.response
    }

    /// Returns the summary, if any.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Returns the placeholder names of the path pattern.
    #[must_use]
    pub fn path_params(&self) -> Vec<&str> {
        placeholders(&self.path)
    }

    /// Returns true if any parameter reads the request body.
    #[must_use]
    pub fn reads_body(&self) -> bool {
        self.params.iter().any(|p| p.source().is_body())
    }
}

/// Builder for [`RouteContract`].
#[derive(Debug)]
pub struct RouteContractBuilder {
    operation_id: String,
    method: Method,
    path: String,
    params: Vec<ParameterSpec>,
    status: StatusCode,
    policy: ShapePolicy,
    summary: Option<String>,
}

impl RouteContractBuilder {
    /// Adds a parameter.
    #[must_use]
    pub fn param(mut self, param: ParameterSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Adds several parameters.
    #[must_use]
    pub fn params(mut self, params: impl IntoIterator<Item = ParameterSpec>) -> Self {
        self.params.extend(params);
        self
    }

    /// Sets the success status (default 200).
    #[must_use]
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Sets the shaping policy.
    #[must_use]
    pub fn policy(mut self, policy: ShapePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets a summary. Informational only.
    #[must_use]
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Checks the contract and builds it.
    pub fn build(self) -> Result<RouteContract, ContractError> {
        let placeholders = placeholders(&self.path);
        let mut seen: HashSet<(ParamSource, &str)> = HashSet::new();

        let mut whole_body = 0usize;
        let mut body_fields = 0usize;
        let mut form = 0usize;

        for param in &self.params {
            if !seen.insert((param.source(), param.name())) {
                return Err(ContractError::DuplicateParameter {
                    owner: self.operation_id.clone(),
                    param_source: param.source(),
                    name: param.name().to_string(),
                });
            }

            param.check()?;

            match param.source() {
                ParamSource::Path => {
                    if !param.is_required() {
                        return Err(self.path_error(param, "must be required"));
                    }
                    if !placeholders.contains(&param.name()) {
                        return Err(self.path_error(param, "not present in route pattern"));
                    }
                }
                ParamSource::BodyWhole => whole_body += 1,
                ParamSource::BodyField => body_fields += 1,
                ParamSource::FormField | ParamSource::File => form += 1,
                ParamSource::Query | ParamSource::Header | ParamSource::Cookie => {}
            }
        }

        let mixed = if whole_body > 1 {
            Some("more than one whole-body parameter")
        } else if whole_body > 0 && body_fields > 0 {
            Some("whole-body and body-field parameters")
        } else if whole_body + body_fields > 0 && form > 0 {
            Some("JSON body and form parameters")
        } else {
            None
        };
        if let Some(reason) = mixed {
            return Err(ContractError::MixedBodyBinding {
                operation_id: self.operation_id,
                reason: reason.to_string(),
            });
        }

        Ok(RouteContract {
            operation_id: self.operation_id,
            method: self.method,
            path: self.path,
            params: self.params,
            response: ResponseSpec {
                status: self.status,
                policy: self.policy,
            },
            summary: self.summary,
        })
    }

    fn path_error(&self, param: &ParameterSpec, reason: &str) -> ContractError {
        ContractError::InvalidPathParameter {
            operation_id: self.operation_id.clone(),
            name: param.name().to_string(),
            reason: reason.to_string(),
        }
    }
}

fn placeholders(path: &str) -> Vec<&str> {
    path.split('/')
        .filter_map(|segment| segment.strip_prefix('{')?.strip_suffix('}'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Model, TargetType};
    use std::sync::Arc;

    fn item_model() -> Arc<Model> {
        Arc::new(
            Model::builder("Item")
                .field(ParameterSpec::field("name", TargetType::String))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders("/items/{item_id}"), ["item_id"]);
        assert_eq!(placeholders("/a/{x}/b/{y}/"), ["x", "y"]);
        assert!(placeholders("/items").is_empty());
    }

    #[test]
    fn test_duplicate_parameter_rejected() {
        let err = RouteContract::builder("read_items", Method::GET, "/items")
            .param(ParameterSpec::query("q", TargetType::String).optional())
            .param(ParameterSpec::query("q", TargetType::String).optional())
            .build()
            .unwrap_err();
        assert!(matches!(err, ContractError::DuplicateParameter { .. }));
    }

    #[test]
    fn test_same_name_different_source_allowed() {
        let contract = RouteContract::builder("read_items", Method::GET, "/items")
            .param(ParameterSpec::query("q", TargetType::String).optional())
            .param(ParameterSpec::cookie("q", TargetType::String).optional())
            .build();
        assert!(contract.is_ok());
    }

    #[test]
    fn test_path_parameter_must_be_in_pattern() {
        let err = RouteContract::builder("read_item", Method::GET, "/items/{id}")
            .param(ParameterSpec::path("item_id", TargetType::Integer))
            .build()
            .unwrap_err();
        assert!(matches!(err, ContractError::InvalidPathParameter { .. }));
    }

    #[test]
    fn test_path_parameter_must_be_required() {
        let err = RouteContract::builder("read_item", Method::GET, "/items/{item_id}")
            .param(ParameterSpec::path("item_id", TargetType::Integer).optional())
            .build()
            .unwrap_err();
        assert!(matches!(err, ContractError::InvalidPathParameter { .. }));
    }

    #[test]
    fn test_mixed_body_binding_rejected() {
        let err = RouteContract::builder("update_item", Method::PUT, "/item/{item_id}")
            .param(ParameterSpec::path("item_id", TargetType::Integer))
            .param(ParameterSpec::body("item", TargetType::model(item_model())))
            .param(ParameterSpec::body_field("importance", TargetType::Integer))
            .build()
            .unwrap_err();
        assert!(matches!(err, ContractError::MixedBodyBinding { .. }));

        let err = RouteContract::builder("upload", Method::POST, "/uploads/")
            .param(ParameterSpec::body_field("meta", TargetType::Any))
            .param(ParameterSpec::file("file"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ContractError::MixedBodyBinding { .. }));
    }

    #[test]
    fn test_status_and_flags() {
        let contract = RouteContract::builder("create_item", Method::POST, "/item")
            .param(ParameterSpec::body("item", TargetType::model(item_model())))
            .status(StatusCode::CREATED)
            .summary("Create an item")
            .build()
            .unwrap();

        assert_eq!(contract.response().status(), StatusCode::CREATED);
        assert!(contract.reads_body());
        assert_eq!(contract.summary(), Some("Create an item"));
    }
}
