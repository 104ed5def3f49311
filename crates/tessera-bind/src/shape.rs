//! Response shaping.
//!
//! Turns a handler result into the JSON payload according to the route's
//! [`ShapePolicy`]. The steps run in a fixed order:
//!
//! 1. derived fields are computed and added
//! 2. the result is projected onto the response model
//! 3. unset fields are dropped (when `exclude_unset`)
//! 4. the include and exclude lists are applied
//!
//! Decimals are written as JSON numbers with their scale intact, so
//! `Decimal("2.480")` becomes `2.480` on the wire, not `2.48`.

use std::str::FromStr;

use chrono::TimeDelta;
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};

use tessera_core::{
    BoundValue, Derivation, DerivedField, Model, ModelInstance, ShapeError, ShapePolicy,
    TargetType,
};

/// Shapes a handler result into its JSON payload.
///
/// # Errors
///
/// A [`ShapeError`] means the handler produced something the policy cannot
/// shape (a non-numeric operand, a missing required field of the response
/// model, an unrepresentable value). It maps to 500.
pub fn shape(value: &BoundValue, policy: &ShapePolicy) -> Result<Value, ShapeError> {
    let mut value = value.clone();

    if !policy.derived_fields().is_empty() {
        let BoundValue::Model(instance) = &mut value else {
            return Err(ShapeError::derivation(
                policy.derived_fields()[0].name(),
                "result is not a model",
            ));
        };
        for field in policy.derived_fields() {
            derive(instance, field)?;
        }
    }

    if let Some(model) = policy.model() {
        value = project(value, &TargetType::Model(model.clone()), "")?;
    }

    if policy.excludes_unset() {
        drop_unset(&mut value);
    }

    if let BoundValue::Model(instance) = &mut value {
        if let Some(include) = policy.included() {
            instance.retain(|name, _| include.contains(name));
        }
        instance.retain(|name, _| !policy.excluded().contains(name));
    }

    to_json(&value, "")
}

fn derive(instance: &mut ModelInstance, field: &DerivedField) -> Result<(), ShapeError> {
    if let Some(guard) = field.guard() {
        if !instance.get(guard).is_some_and(BoundValue::is_truthy) {
            return Ok(());
        }
    }

    let value = match field.derivation() {
        Derivation::Sum(operands) => sum(instance, field.name(), operands)?,
    };
    instance.insert(field.name(), value, true);
    Ok(())
}

fn sum(instance: &ModelInstance, name: &str, operands: &[String]) -> Result<BoundValue, ShapeError> {
    let mut int_total: Option<i64> = Some(0);
    let mut total = Decimal::ZERO;

    for operand in operands {
        let value = instance
            .get(operand)
            .ok_or_else(|| ShapeError::derivation(name, format!("'{operand}' is not set")))?;
        let decimal = value
            .as_decimal()
            .ok_or_else(|| ShapeError::derivation(name, format!("'{operand}' is not numeric")))?;

        int_total = match (int_total, value) {
            (Some(acc), BoundValue::Int(n)) => acc.checked_add(*n),
            _ => None,
        };
        total = total
            .checked_add(decimal)
            .ok_or_else(|| ShapeError::derivation(name, "overflow"))?;
    }

    Ok(int_total.map_or(BoundValue::Decimal(total), BoundValue::Int))
}

/// Projects a value onto a target, keeping only declared model fields.
fn project(value: BoundValue, target: &TargetType, path: &str) -> Result<BoundValue, ShapeError> {
    match (value, target) {
        (BoundValue::Model(instance), TargetType::Model(model)) => {
            project_model(instance, model, path).map(BoundValue::Model)
        }
        (BoundValue::Seq(items), TargetType::Sequence(inner)) => items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| project(item, inner, &join(path, &idx.to_string())))
            .collect::<Result<_, _>>()
            .map(BoundValue::Seq),
        (BoundValue::Map(entries), TargetType::Mapping(_, inner)) => entries
            .into_iter()
            .map(|(key, item)| {
                let entry_path = join(path, &key_text(&key).unwrap_or_default());
                project(item, inner, &entry_path).map(|item| (key, item))
            })
            .collect::<Result<_, _>>()
            .map(BoundValue::Map),
        (value, _) => Ok(value),
    }
}

fn project_model(
    mut instance: ModelInstance,
    model: &Model,
    path: &str,
) -> Result<ModelInstance, ShapeError> {
    let mut projected = ModelInstance::new(model.name());

    for spec in model.fields() {
        let field_path = join(path, spec.binding());
        match instance.remove(spec.binding()) {
            Some(field) => {
                let value = project(field.value, spec.target(), &field_path)?;
                projected.insert(spec.binding(), value, field.explicit);
            }
            None if spec.is_required() => {
                return Err(ShapeError::serialization(
                    field_path,
                    format!("missing from result of model '{}'", model.name()),
                ));
            }
            None => {
                let default = spec.default_value().cloned().unwrap_or(BoundValue::Null);
                projected.insert(spec.binding(), default, false);
            }
        }
    }

    Ok(projected)
}

fn drop_unset(value: &mut BoundValue) {
    match value {
        BoundValue::Model(instance) => {
            instance.retain(|_, field| field.explicit);
            for (_, field) in instance.iter_mut() {
                drop_unset(&mut field.value);
            }
        }
        BoundValue::Seq(items) => items.iter_mut().for_each(drop_unset),
        BoundValue::Map(entries) => entries.iter_mut().for_each(|(_, item)| drop_unset(item)),
        _ => {}
    }
}

fn join(path: &str, item: &str) -> String {
    if path.is_empty() {
        item.to_string()
    } else {
        format!("{path}.{item}")
    }
}

/// Serializes a bound value into JSON.
///
/// # Errors
///
/// Fails for a mapping key that has no text form.
pub fn to_json(value: &BoundValue, path: &str) -> Result<Value, ShapeError> {
    Ok(match value {
        BoundValue::Null => Value::Null,
        BoundValue::Bool(b) => Value::Bool(*b),
        BoundValue::Int(n) => Value::from(*n),
        BoundValue::Decimal(d) => Value::Number(
            Number::from_str(&d.to_string())
                .map_err(|e| ShapeError::serialization(path, e.to_string()))?,
        ),
        BoundValue::Str(s) | BoundValue::Enum(s) => Value::String(s.clone()),
        BoundValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
        BoundValue::DateTime(dt) => Value::String(dt.to_rfc3339()),
        BoundValue::Time(t) => Value::String(t.format("%H:%M:%S%.f").to_string()),
        BoundValue::Duration(d) => Value::String(format_iso_duration(*d)),
        BoundValue::Uuid(id) => Value::String(id.hyphenated().to_string()),
        BoundValue::Url(url) => Value::String(url.to_string()),
        BoundValue::Json(json) => json.clone(),
        BoundValue::File(file) => serde_json::json!({
            "filename": file.file_name(),
            "content_type": file.content_type(),
            "size": file.size(),
        }),
        BoundValue::Seq(items) => Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(idx, item)| to_json(item, &join(path, &idx.to_string())))
                .collect::<Result<_, _>>()?,
        ),
        BoundValue::Map(entries) => {
            let mut map = Map::with_capacity(entries.len());
            for (key, item) in entries {
                let key = key_text(key).ok_or_else(|| {
                    ShapeError::serialization(path, "mapping key has no text form")
                })?;
                let item = to_json(item, &join(path, &key))?;
                map.insert(key, item);
            }
            Value::Object(map)
        }
        BoundValue::Model(instance) => {
            let mut map = Map::with_capacity(instance.len());
            for (name, field) in instance.iter() {
                map.insert(name.to_string(), to_json(&field.value, &join(path, name))?);
            }
            Value::Object(map)
        }
    })
}

fn key_text(key: &BoundValue) -> Option<String> {
    match key {
        BoundValue::Str(s) | BoundValue::Enum(s) => Some(s.clone()),
        BoundValue::Int(n) => Some(n.to_string()),
        BoundValue::Decimal(d) => Some(d.to_string()),
        BoundValue::Bool(b) => Some(b.to_string()),
        BoundValue::Uuid(id) => Some(id.to_string()),
        BoundValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        _ => None,
    }
}

/// Formats a duration as ISO 8601, e.g. `P1DT2H0.5S` or `-PT30M`.
#[must_use]
pub fn format_iso_duration(delta: TimeDelta) -> String {
    let negative = delta < TimeDelta::zero();
    let delta = delta.abs();
    let total = delta.num_seconds();
    let nanos = delta.subsec_nanos();

    let days = total / 86_400;
    let hours = total % 86_400 / 3_600;
    let minutes = total % 3_600 / 60;
    let seconds = total % 60;

    let mut out = String::from(if negative { "-P" } else { "P" });
    if days > 0 {
        out.push_str(&format!("{days}D"));
    }
    let has_time = hours > 0 || minutes > 0 || seconds > 0 || nanos > 0;
    if has_time || days == 0 {
        out.push('T');
        if hours > 0 {
            out.push_str(&format!("{hours}H"));
        }
        if minutes > 0 {
            out.push_str(&format!("{minutes}M"));
        }
        if seconds > 0 || nanos > 0 || !has_time {
            out.push_str(&seconds.to_string());
            if nanos > 0 {
                let fraction = format!("{nanos:09}");
                out.push('.');
                out.push_str(fraction.trim_end_matches('0'));
            }
            out.push('S');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::parse_iso_duration;
    use serde_json::json;
    use std::sync::Arc;
    use tessera_core::ParameterSpec;

    fn dec(text: &str) -> BoundValue {
        BoundValue::Decimal(Decimal::from_str(text).unwrap())
    }

    fn item(tax: BoundValue) -> BoundValue {
        let mut item = ModelInstance::new("Item").with("name", "Foo").with("price", dec("1.590"));
        item.insert("tax", tax, true);
        item.insert("tags", BoundValue::Seq(vec![]), false);
        BoundValue::Model(item)
    }

    fn tax_policy() -> ShapePolicy {
        ShapePolicy::new().derive(DerivedField::sum("price_with_tax", ["price", "tax"]).when_truthy("tax"))
    }

    #[test]
    fn test_derived_sum_keeps_scale() {
        let out = shape(&item(dec("0.891")), &tax_policy()).unwrap();
        assert_eq!(out["price_with_tax"].to_string(), "2.481");
        assert_eq!(out["price"].to_string(), "1.590");
    }

    #[test]
    fn test_derived_field_skipped_when_guard_falsy() {
        let out = shape(&item(BoundValue::Null), &tax_policy()).unwrap();
        assert!(out.get("price_with_tax").is_none());
        assert_eq!(out["tax"], Value::Null);
    }

    #[test]
    fn test_derived_sum_of_integers_stays_integer() {
        let value = BoundValue::Model(ModelInstance::new("Pair").with("a", 2i64).with("b", 3i64));
        let policy = ShapePolicy::new().derive(DerivedField::sum("total", ["a", "b"]));
        assert_eq!(shape(&value, &policy).unwrap()["total"], json!(5));
    }

    #[test]
    fn test_derived_non_numeric_operand_fails() {
        let value = BoundValue::Model(ModelInstance::new("Item").with("price", "cheap").with("tax", 1i64));
        let err = shape(&value, &tax_policy()).unwrap_err();
        assert!(matches!(err, ShapeError::Derivation { .. }));
    }

    #[test]
    fn test_exclude_unset_is_recursive() {
        let inner = ModelInstance::new("Image").with("url", "http://x.io/a.png");
        let mut outer = ModelInstance::new("Item").with("name", "Foo");
        outer.insert("description", BoundValue::Null, false);
        outer.insert("images", BoundValue::Seq(vec![BoundValue::Model(inner)]), true);

        let out = shape(&BoundValue::Model(outer), &ShapePolicy::new().exclude_unset()).unwrap();
        assert_eq!(out, json!({"name": "Foo", "images": [{"url": "http://x.io/a.png"}]}));
    }

    #[test]
    fn test_response_model_drops_undeclared_fields() {
        let user_out = Arc::new(
            Model::builder("UserOut")
                .field(ParameterSpec::field("username", TargetType::String))
                .field(ParameterSpec::field("email", TargetType::Email))
                .field(ParameterSpec::field("full_name", TargetType::String).optional())
                .build()
                .unwrap(),
        );
        let user_in = ModelInstance::new("UserIn")
            .with("username", "joe")
            .with("password", "secret")
            .with("email", "joe@example.com");

        let policy = ShapePolicy::new().response_model(user_out.clone());
        let out = shape(&BoundValue::Model(user_in.clone()), &policy).unwrap();
        assert_eq!(
            out,
            json!({"username": "joe", "email": "joe@example.com", "full_name": null})
        );

        let policy = ShapePolicy::new().response_model(user_out).exclude_unset();
        let out = shape(&BoundValue::Model(user_in), &policy).unwrap();
        assert_eq!(out, json!({"username": "joe", "email": "joe@example.com"}));
    }

    #[test]
    fn test_mapping_values_are_projected_and_pruned() {
        let image_out = Arc::new(
            Model::builder("Image")
                .field(ParameterSpec::field("url", TargetType::Url))
                .field(ParameterSpec::field("name", TargetType::String).optional())
                .build()
                .unwrap(),
        );
        let gallery = Arc::new(
            Model::builder("Gallery")
                .field(ParameterSpec::field(
                    "by_slot",
                    TargetType::mapping(TargetType::String, TargetType::model(image_out)),
                ))
                .build()
                .unwrap(),
        );
        let mut image = ModelInstance::new("ImageIn")
            .with("url", "http://x.io/a.png")
            .with("secret", "hidden");
        image.insert("name", BoundValue::Null, false);
        let result = ModelInstance::new("Gallery").with(
            "by_slot",
            BoundValue::Map(vec![(BoundValue::from("front"), BoundValue::Model(image))]),
        );

        let policy = ShapePolicy::new().response_model(gallery).exclude_unset();
        let out = shape(&BoundValue::Model(result), &policy).unwrap();
        assert_eq!(out, json!({"by_slot": {"front": {"url": "http://x.io/a.png"}}}));
    }

    #[test]
    fn test_response_model_missing_required_field_fails() {
        let model = Arc::new(
            Model::builder("Out")
                .field(ParameterSpec::field("id", TargetType::Integer))
                .build()
                .unwrap(),
        );
        let value = BoundValue::Model(ModelInstance::new("In").with("name", "x"));
        let err = shape(&value, &ShapePolicy::new().response_model(model)).unwrap_err();
        assert_eq!(err, ShapeError::serialization("id", "missing from result of model 'Out'"));
    }

    #[test]
    fn test_include_and_exclude() {
        let policy = ShapePolicy::new().include(["name", "price", "tax"]).exclude(["tax"]);
        let out = shape(&item(dec("1")), &policy).unwrap();
        assert_eq!(out.as_object().unwrap().keys().collect::<Vec<_>>(), ["name", "price"]);
    }

    #[test]
    fn test_iso_duration_format() {
        assert_eq!(format_iso_duration(TimeDelta::zero()), "PT0S");
        assert_eq!(format_iso_duration(TimeDelta::hours(26)), "P1DT2H");
        assert_eq!(format_iso_duration(TimeDelta::milliseconds(-1_500)), "-PT1.5S");
        assert_eq!(format_iso_duration(TimeDelta::days(3)), "P3D");

        for text in ["P2DT3H4M5.25S", "PT45M", "-P7D", "PT0.000001S"] {
            let parsed = parse_iso_duration(text).unwrap();
            assert_eq!(format_iso_duration(parsed), text);
        }
    }

    #[test]
    fn test_scalar_serialization() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(to_json(&BoundValue::Date(date), "").unwrap(), json!("2024-02-29"));

        let time = chrono::NaiveTime::from_hms_milli_opt(14, 23, 55, 3).unwrap();
        assert_eq!(to_json(&BoundValue::Time(time), "").unwrap(), json!("14:23:55.003"));

        let map = BoundValue::Map(vec![(BoundValue::Int(1), dec("0.5"))]);
        assert_eq!(to_json(&map, "").unwrap().to_string(), r#"{"1":0.5}"#);
    }
}
