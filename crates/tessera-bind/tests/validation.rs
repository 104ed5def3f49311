//! Route validation integration tests.
//!
//! Exercise the full extract, bind and shape path over hand-built
//! requests, plus property tests for the coercion rules.

use std::str::FromStr;
use std::sync::Arc;

use http::Method;
use proptest::prelude::*;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tessera_bind::{shape, validate_route, BindOptions};
use tessera_core::{
    BoundValue, DerivedField, DuplicatePolicy, ErrorKind, Model, ParameterSpec, RouteContract,
    ShapePolicy, TargetType,
};
use tessera_extract::RequestParts;

/// The `Item` model: name, optional description, price, optional tax, tags.
fn item_model() -> Arc<Model> {
    Arc::new(
        Model::builder("Item")
            .field(ParameterSpec::field("name", TargetType::String))
            .field(ParameterSpec::field("description", TargetType::String).optional())
            .field(ParameterSpec::field("price", TargetType::Decimal))
            .field(ParameterSpec::field("tax", TargetType::Decimal).optional())
            .field(
                ParameterSpec::field("tags", TargetType::sequence(TargetType::String))
                    .default(BoundValue::Seq(vec![])),
            )
            .build()
            .unwrap(),
    )
}

fn create_item_contract() -> RouteContract {
    RouteContract::builder("create_item", Method::POST, "/items")
        .param(ParameterSpec::body("item", TargetType::model(item_model())))
        .policy(
            ShapePolicy::new()
                .derive(DerivedField::sum("price_with_tax", ["price", "tax"]).when_truthy("tax")),
        )
        .build()
        .unwrap()
}

fn list_query_contract() -> RouteContract {
    RouteContract::builder("read_items", Method::GET, "/items")
        .param(
            ParameterSpec::query("q_2", TargetType::sequence(TargetType::String))
                .alias("q-2")
                .default(BoundValue::from(vec!["foo", "bar"])),
        )
        .build()
        .unwrap()
}

fn header_contract() -> RouteContract {
    RouteContract::builder("read_header", Method::GET, "/header")
        .param(ParameterSpec::header("x_token", TargetType::String))
        .build()
        .unwrap()
}

fn int_contract() -> RouteContract {
    RouteContract::builder("read_number", Method::GET, "/numbers/{n}")
        .param(ParameterSpec::path("n", TargetType::Integer))
        .build()
        .unwrap()
}

fn path_request(value: &str) -> RequestParts {
    RequestParts::builder()
        .uri("/numbers/0")
        .path_param("n", value)
        .build()
}

#[test]
fn repeated_query_keys_bind_in_order() {
    let parts = RequestParts::builder().uri("/items?q-2=1&q-2=2&q-2=3").build();
    let bundle = validate_route(&list_query_contract(), &parts, &BindOptions::default()).unwrap();

    assert_eq!(bundle.get::<Vec<String>>("q_2").unwrap(), ["1", "2", "3"]);
    assert!(bundle.is_explicit("q_2"));
}

#[test]
fn absent_list_query_uses_default() {
    let parts = RequestParts::builder().uri("/items").build();
    let bundle = validate_route(&list_query_contract(), &parts, &BindOptions::default()).unwrap();

    assert_eq!(bundle.get::<Vec<String>>("q_2").unwrap(), ["foo", "bar"]);
    assert!(!bundle.is_explicit("q_2"));
}

#[test]
fn price_with_tax_keeps_decimal_scale() {
    let body: Value =
        serde_json::from_str(r#"{"name": "Foo", "price": 1.590, "tax": 0.891}"#).unwrap();
    let parts = RequestParts::builder()
        .method(Method::POST)
        .uri("/items")
        .json(body)
        .build();

    let contract = create_item_contract();
    let bundle = validate_route(&contract, &parts, &BindOptions::default()).unwrap();
    let item = bundle.value("item").unwrap();
    let out = shape(item, contract.response().policy()).unwrap();

    assert_eq!(out["price_with_tax"].to_string(), "2.481");
    assert_eq!(out["price"].to_string(), "1.590");
    assert_eq!(out["description"], Value::Null);
    assert_eq!(out["tags"], json!([]));
}

#[test]
fn missing_required_header_is_single_error() {
    let parts = RequestParts::builder().uri("/header").build();
    let errors = validate_route(&header_contract(), &parts, &BindOptions::default()).unwrap_err();

    assert_eq!(
        errors.to_body(),
        json!({"detail": [{"loc": ["header", "x-token"], "msg": "Field required", "type": "missing"}]})
    );
}

#[test]
fn duplicate_header_rejected_under_strict_policy() {
    let parts = RequestParts::builder()
        .uri("/header")
        .header("x-token", "a")
        .header("x-token", "b")
        .build();

    let lenient = validate_route(&header_contract(), &parts, &BindOptions::default()).unwrap();
    assert_eq!(lenient.get::<String>("x_token").unwrap(), "a");

    let strict = BindOptions::default().duplicate_policy(DuplicatePolicy::Reject);
    let errors = validate_route(&header_contract(), &parts, &strict).unwrap_err();
    assert_eq!(errors.iter().next().unwrap().kind(), ErrorKind::DuplicateValue);
}

#[test]
fn invalid_item_reports_every_field() {
    let parts = RequestParts::builder()
        .method(Method::POST)
        .uri("/items")
        .json(json!({"description": 3, "price": "x", "tags": ["a", 1]}))
        .build();

    let errors = validate_route(&create_item_contract(), &parts, &BindOptions::default()).unwrap_err();
    let body = errors.to_body();
    let locs: Vec<&Value> = body["detail"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| &entry["loc"])
        .collect();

    assert_eq!(
        locs,
        [
            &json!(["body", "name"]),
            &json!(["body", "description"]),
            &json!(["body", "price"]),
            &json!(["body", "tags", 1]),
        ]
    );
}

proptest! {
    #[test]
    fn any_i64_text_binds_to_integer(n in any::<i64>()) {
        let bundle = validate_route(&int_contract(), &path_request(&n.to_string()), &BindOptions::default())
            .unwrap();
        prop_assert_eq!(bundle.get::<i64>("n").unwrap(), n);
    }

    #[test]
    fn non_numeric_text_never_binds_to_integer(text in "[a-zA-Z_ ]{1,12}") {
        let errors = validate_route(&int_contract(), &path_request(&text), &BindOptions::default())
            .unwrap_err();
        prop_assert_eq!(errors.len(), 1);
        prop_assert_eq!(errors.iter().next().unwrap().kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn boolean_words_are_case_insensitive(
        word in prop::sample::select(vec!["true", "false", "yes", "no", "on", "off", "1", "0"]),
        upper in prop::collection::vec(any::<bool>(), 5),
    ) {
        let mixed: String = word
            .chars()
            .zip(upper.iter().cycle())
            .map(|(c, up)| if *up { c.to_ascii_uppercase() } else { c })
            .collect();
        let contract = RouteContract::builder("flag", Method::GET, "/flag")
            .param(ParameterSpec::query("short", TargetType::Boolean).default(false))
            .build()
            .unwrap();
        let parts = RequestParts::builder().uri(&format!("/flag?short={mixed}")).build();

        let bundle = validate_route(&contract, &parts, &BindOptions::default()).unwrap();
        let expected = matches!(word, "true" | "yes" | "on" | "1");
        prop_assert_eq!(bundle.get::<bool>("short").unwrap(), expected);
    }

    #[test]
    fn error_count_matches_invalid_fields(
        bad_name in any::<bool>(),
        bad_price in any::<bool>(),
        bad_tax in any::<bool>(),
    ) {
        let mut body = serde_json::Map::new();
        body.insert("name".into(), if bad_name { json!(1) } else { json!("Foo") });
        body.insert("price".into(), if bad_price { json!("cheap") } else { json!(2.5) });
        body.insert("tax".into(), if bad_tax { json!([1]) } else { json!(0.25) });
        let parts = RequestParts::builder()
            .method(Method::POST)
            .uri("/items")
            .json(Value::Object(body))
            .build();

        let expected = usize::from(bad_name) + usize::from(bad_price) + usize::from(bad_tax);
        match validate_route(&create_item_contract(), &parts, &BindOptions::default()) {
            Ok(_) => prop_assert_eq!(expected, 0),
            Err(errors) => prop_assert_eq!(errors.len(), expected),
        }
    }

    #[test]
    fn decimal_text_round_trips_exactly(int in 0u32..100_000, frac in "[0-9]{1,4}") {
        let text = format!("{int}.{frac}");
        let value: Value = serde_json::from_str(&format!(r#"{{"name":"n","price":{text}}}"#)).unwrap();
        let parts = RequestParts::builder().method(Method::POST).uri("/items").json(value).build();

        let contract = create_item_contract();
        let bundle = validate_route(&contract, &parts, &BindOptions::default()).unwrap();
        let out = shape(bundle.value("item").unwrap(), contract.response().policy()).unwrap();
        prop_assert_eq!(out["price"].to_string(), text.clone());
        prop_assert_eq!(
            bundle.value("item").unwrap().as_model().unwrap().get("price").unwrap().as_decimal(),
            Some(Decimal::from_str(&text).unwrap())
        );
    }
}
