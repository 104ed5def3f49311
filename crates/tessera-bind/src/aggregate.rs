//! Route-level validation.
//!
//! Validates every declared parameter of a route against one request and
//! either produces the complete [`ParamBundle`] or the complete list of
//! errors. Nothing is short-circuited: a request with three bad fields gets
//! three error entries.

use serde_json::Value;
use tracing::debug;

use tessera_core::{
    Location, ParamSource, RouteContract, ValidationError, ValidationErrors,
};
use tessera_extract::{extract, RequestBody, RequestParts};

use crate::binder::{bind_param, BindOptions};
use crate::ParamBundle;

/// Validates a request against a route contract.
///
/// Parameters are processed in declaration order, so errors come out in
/// that order too.
///
/// # Errors
///
/// Returns every binding failure as one [`ValidationErrors`] list.
///
/// # Example
///
/// ```
/// use http::Method;
/// use tessera_bind::{validate_route, BindOptions};
/// use tessera_core::{ParameterSpec, RouteContract, TargetType};
/// use tessera_extract::RequestParts;
///
/// let contract = RouteContract::builder("read_item", Method::GET, "/items/{item_id}")
///     .param(ParameterSpec::path("item_id", TargetType::Integer))
///     .build()
///     .unwrap();
///
/// let parts = RequestParts::builder().uri("/items/7").path_param("item_id", "7").build();
/// let bundle = validate_route(&contract, &parts, &BindOptions::default()).unwrap();
/// assert_eq!(bundle.get::<i64>("item_id").unwrap(), 7);
///
/// let parts = RequestParts::builder().uri("/items/x").path_param("item_id", "x").build();
/// let errors = validate_route(&contract, &parts, &BindOptions::default()).unwrap_err();
/// assert_eq!(errors.len(), 1);
/// ```
pub fn validate_route(
    contract: &RouteContract,
    request: &RequestParts,
    options: &BindOptions,
) -> Result<ParamBundle, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let mut bundle = ParamBundle::new();

    let body_usable = check_body_shape(contract, request.body(), &mut errors);

    for spec in contract.params() {
        if spec.source().is_body() && !body_usable {
            continue;
        }
        let extraction = extract(spec, request);
        if let Some(bound) = bind_param(spec, &extraction, options, &mut errors) {
            bundle.insert(spec.binding(), bound.value, bound.explicit);
        }
    }

    if errors.is_empty() {
        Ok(bundle)
    } else {
        debug!(
            operation_id = contract.operation_id(),
            error_count = errors.len(),
            "request failed validation"
        );
        Err(errors)
    }
}

/// Checks that the body has the shape the body parameters need.
///
/// On mismatch a single error at `["body"]` is recorded and the body
/// parameters are skipped, rather than reporting each of them as missing.
fn check_body_shape(
    contract: &RouteContract,
    body: &RequestBody,
    errors: &mut ValidationErrors,
) -> bool {
    let sources = contract.params().iter().map(|p| p.source());
    let (mut json, mut fields, mut form) = (false, false, false);
    for source in sources {
        match source {
            ParamSource::BodyWhole => json = true,
            ParamSource::BodyField => {
                json = true;
                fields = true;
            }
            ParamSource::FormField | ParamSource::File => form = true,
            _ => {}
        }
    }

    let problem = match body {
        RequestBody::Malformed(reason) if json => {
            Some((format!("JSON decode error: {reason}"), None))
        }
        RequestBody::Form(_) if json => Some(("Expected a JSON body".to_string(), None)),
        RequestBody::Json(value) if fields && !value.is_object() => Some((
            "Input should be a valid dictionary".to_string(),
            Some(value.clone()),
        )),
        RequestBody::Json(_) | RequestBody::Malformed(_) if form => {
            Some(("Expected form data".to_string(), None::<Value>))
        }
        _ => None,
    };

    match problem {
        Some((message, input)) => {
            errors.push(ValidationError::type_mismatch(
                Location::root(ParamSource::BodyWhole),
                message,
                input,
            ));
            false
        }
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use serde_json::json;
    use std::sync::Arc;
    use tessera_core::{ErrorKind, Model, ParameterSpec, TargetType};
    use tessera_extract::{FormData, FormPart};

    fn item_model() -> Arc<Model> {
        Arc::new(
            Model::builder("Item")
                .field(ParameterSpec::field("name", TargetType::String))
                .field(ParameterSpec::field("price", TargetType::Decimal))
                .build()
                .unwrap(),
        )
    }

    fn update_contract() -> RouteContract {
        RouteContract::builder("update_item", Method::PUT, "/items/{item_id}")
            .param(ParameterSpec::path("item_id", TargetType::Integer))
            .param(ParameterSpec::body_field("item", TargetType::model(item_model())))
            .param(ParameterSpec::body_field("importance", TargetType::Integer).gt(0))
            .param(ParameterSpec::query("q", TargetType::String).optional())
            .build()
            .unwrap()
    }

    fn locs(errors: &ValidationErrors) -> Vec<Value> {
        errors
            .iter()
            .map(|e| serde_json::to_value(e.location()).unwrap())
            .collect()
    }

    #[test]
    fn test_embedded_body_binds() {
        let parts = RequestParts::builder()
            .method(Method::PUT)
            .uri("/items/5?q=x")
            .path_param("item_id", "5")
            .json(json!({"item": {"name": "Foo", "price": 3.5}, "importance": 2}))
            .build();

        let bundle = validate_route(&update_contract(), &parts, &BindOptions::default()).unwrap();
        assert_eq!(bundle.len(), 4);
        assert_eq!(bundle.get::<i64>("importance").unwrap(), 2);
        assert_eq!(bundle.get::<Option<String>>("q").unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn test_all_failures_reported_in_declaration_order() {
        let parts = RequestParts::builder()
            .method(Method::PUT)
            .uri("/items/abc")
            .path_param("item_id", "abc")
            .json(json!({"item": {"price": "cheap"}, "importance": 0}))
            .build();

        let errors = validate_route(&update_contract(), &parts, &BindOptions::default()).unwrap_err();
        assert_eq!(
            locs(&errors),
            [
                json!(["path", "item_id"]),
                json!(["body", "item", "name"]),
                json!(["body", "item", "price"]),
                json!(["body", "importance"]),
            ]
        );
        assert_eq!(
            errors.iter().last().unwrap().kind(),
            ErrorKind::ConstraintViolation("gt")
        );
    }

    #[test]
    fn test_malformed_json_is_one_error() {
        let parts = RequestParts::builder()
            .method(Method::PUT)
            .uri("/items/1")
            .path_param("item_id", "1")
            .body(RequestBody::Malformed("expected value at line 1 column 1".into()))
            .build();

        let errors = validate_route(&update_contract(), &parts, &BindOptions::default()).unwrap_err();
        assert_eq!(locs(&errors), [json!(["body"])]);
        assert!(errors.iter().next().unwrap().message().starts_with("JSON decode error"));
    }

    #[test]
    fn test_non_object_body_for_embedded_fields() {
        let parts = RequestParts::builder()
            .method(Method::PUT)
            .uri("/items/1")
            .path_param("item_id", "1")
            .json(json!([1, 2]))
            .build();

        let errors = validate_route(&update_contract(), &parts, &BindOptions::default()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.iter().next().unwrap().input(), Some(&json!([1, 2])));
    }

    #[test]
    fn test_empty_body_reports_each_required_field() {
        let parts = RequestParts::builder()
            .method(Method::PUT)
            .uri("/items/1")
            .path_param("item_id", "1")
            .build();

        let errors = validate_route(&update_contract(), &parts, &BindOptions::default()).unwrap_err();
        assert_eq!(
            locs(&errors),
            [json!(["body", "item"]), json!(["body", "importance"])]
        );
        assert!(errors.iter().all(|e| e.kind() == ErrorKind::Missing));
    }

    #[test]
    fn test_form_route_rejects_json_body() {
        let contract = RouteContract::builder("login", Method::POST, "/login")
            .param(ParameterSpec::form_field("username", TargetType::String))
            .build()
            .unwrap();
        let parts = RequestParts::builder()
            .method(Method::POST)
            .uri("/login")
            .json(json!({"username": "joe"}))
            .build();

        let errors = validate_route(&contract, &parts, &BindOptions::default()).unwrap_err();
        assert_eq!(errors.iter().next().unwrap().message(), "Expected form data");

        let mut form = FormData::new();
        form.push("username", FormPart::Text("joe".into()));
        let parts = RequestParts::builder()
            .method(Method::POST)
            .uri("/login")
            .body(RequestBody::Form(form))
            .build();
        let bundle = validate_route(&contract, &parts, &BindOptions::default()).unwrap();
        assert_eq!(bundle.get::<String>("username").unwrap(), "joe");
    }
}
