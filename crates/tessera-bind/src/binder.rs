//! Model binder.
//!
//! Binds raw values to declared parameters, descending recursively into
//! nested models, sequences and mappings. Errors are appended to a shared
//! [`ValidationErrors`] list and binding carries on, so one pass reports
//! every failure. A value whose coercion failed skips its constraint checks;
//! otherwise every constraint runs.

use serde_json::Value;

use tessera_core::{
    BoundValue, DuplicatePolicy, Location, Model, ModelInstance, ParamSource, ParameterSpec,
    TargetType, ValidationError, ValidationErrors,
};
use tessera_extract::{Extraction, RawValue};

use crate::coerce::{coerce_scalar, coerce_text, structure_mismatch};

/// Options that change binding behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindOptions {
    /// Policy for scalar parameters that receive several values.
    pub duplicate_policy: DuplicatePolicy,
}

impl BindOptions {
    /// Creates default options (first value wins).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the duplicate-scalar policy.
    #[must_use]
    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }
}

/// A successfully bound parameter value and whether the caller supplied it.
#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    /// The typed value.
    pub value: BoundValue,
    /// False when the value came from a default.
    pub explicit: bool,
}

/// Location of a top-level parameter in error reports.
///
/// A whole-body parameter reports at `["body"]`; every other parameter at
/// `[<source root>, <wire name>]`.
#[must_use]
pub fn param_location(spec: &ParameterSpec) -> Location {
    match spec.source() {
        ParamSource::BodyWhole => Location::root(ParamSource::BodyWhole),
        source => Location::param(source, spec.name()),
    }
}

/// Binds one top-level parameter from its extraction.
///
/// Returns `None` if any error was recorded for the parameter.
pub fn bind_param(
    spec: &ParameterSpec,
    extraction: &Extraction<'_>,
    options: &BindOptions,
    errors: &mut ValidationErrors,
) -> Option<Bound> {
    let loc = param_location(spec);

    let values = match extraction {
        Extraction::Absent => return bind_absent(spec, &loc, errors),
        Extraction::Present(values) => values,
    };

    // Multi-valued sources feed sequences element by element.
    if let TargetType::Sequence(inner) = spec.target() {
        if values.iter().all(|v| !matches!(v, RawValue::Json(_))) {
            let before = errors.len();
            let items: Vec<BoundValue> = values
                .iter()
                .enumerate()
                .filter_map(|(idx, raw)| bind_value(*raw, inner, &loc.child(idx), errors))
                .collect();
            if errors.len() > before {
                return None;
            }
            return check_constraints(spec, BoundValue::Seq(items), &loc, errors)
                .map(|value| Bound { value, explicit: true });
        }
    }

    let first = values.first().copied()?;
    if values.len() > 1 && options.duplicate_policy == DuplicatePolicy::Reject {
        let echo = Value::Array(values.iter().map(RawValue::echo).collect());
        errors.push(ValidationError::duplicate(loc, Some(echo)));
        return None;
    }

    bind_present(spec, first, &loc, errors)
}

fn bind_absent(spec: &ParameterSpec, loc: &Location, errors: &mut ValidationErrors) -> Option<Bound> {
    if spec.is_required() {
        errors.push(ValidationError::missing(loc.clone()));
        return None;
    }
    Some(Bound {
        value: spec.default_value().cloned().unwrap_or(BoundValue::Null),
        explicit: false,
    })
}

/// Binds a single supplied raw value to a spec, handling `null` and constraints.
fn bind_present(
    spec: &ParameterSpec,
    raw: RawValue<'_>,
    loc: &Location,
    errors: &mut ValidationErrors,
) -> Option<Bound> {
    if let RawValue::Json(Value::Null) = raw {
        if spec.is_required() && !matches!(spec.target(), TargetType::Any) {
            errors.push(ValidationError::type_mismatch(
                loc.clone(),
                structure_mismatch(spec.target()).0,
                Some(Value::Null),
            ));
            return None;
        }
        return Some(Bound {
            value: BoundValue::Null,
            explicit: true,
        });
    }

    let value = bind_value(raw, spec.target(), loc, errors)?;
    check_constraints(spec, value, loc, errors).map(|value| Bound {
        value,
        explicit: true,
    })
}

fn check_constraints(
    spec: &ParameterSpec,
    value: BoundValue,
    loc: &Location,
    errors: &mut ValidationErrors,
) -> Option<BoundValue> {
    let mut ok = true;
    for constraint in spec.constraints() {
        if let Err(violation) = constraint.check(&value) {
            ok = false;
            errors.push(ValidationError::constraint(
                loc.clone(),
                violation.constraint,
                violation.message,
                Some(echo_bound(&value)),
            ));
        }
    }
    ok.then_some(value)
}

/// Binds a raw value to a target type, recursing into structures.
///
/// Returns `None` if any error was recorded.
pub fn bind_value(
    raw: RawValue<'_>,
    target: &TargetType,
    loc: &Location,
    errors: &mut ValidationErrors,
) -> Option<BoundValue> {
    match (target, raw) {
        (TargetType::Model(model), RawValue::Json(Value::Object(map))) => {
            bind_model(map, model, loc, errors).map(BoundValue::Model)
        }
        (TargetType::Sequence(inner), RawValue::Json(Value::Array(items))) => {
            let before = errors.len();
            let bound: Vec<BoundValue> = items
                .iter()
                .enumerate()
                .filter_map(|(idx, item)| bind_value(RawValue::Json(item), inner, &loc.child(idx), errors))
                .collect();
            (errors.len() == before).then_some(BoundValue::Seq(bound))
        }
        (TargetType::Mapping(key_type, value_type), RawValue::Json(Value::Object(map))) => {
            let before = errors.len();
            let mut entries = Vec::with_capacity(map.len());
            for (key, item) in map {
                let entry_loc = loc.child(key.as_str());
                let key = match coerce_text(key, key_type) {
                    Ok(key) => Some(key),
                    Err(mismatch) => {
                        errors.push(ValidationError::type_mismatch(
                            entry_loc.child("[key]"),
                            mismatch.0,
                            Some(Value::String(key.clone())),
                        ));
                        None
                    }
                };
                let value = bind_value(RawValue::Json(item), value_type, &entry_loc, errors);
                if let (Some(key), Some(value)) = (key, value) {
                    entries.push((key, value));
                }
            }
            (errors.len() == before).then_some(BoundValue::Map(entries))
        }
        (TargetType::Model(_) | TargetType::Sequence(_) | TargetType::Mapping(..), raw) => {
            errors.push(ValidationError::type_mismatch(
                loc.clone(),
                structure_mismatch(target).0,
                Some(raw.echo()),
            ));
            None
        }
        (_, RawValue::Json(Value::Null)) if !matches!(target, TargetType::Any) => {
            errors.push(ValidationError::type_mismatch(
                loc.clone(),
                structure_mismatch(target).0,
                Some(Value::Null),
            ));
            None
        }
        (_, raw) => match coerce_scalar(raw, target) {
            Ok(value) => Some(value),
            Err(mismatch) => {
                errors.push(ValidationError::type_mismatch(
                    loc.clone(),
                    mismatch.0,
                    Some(raw.echo()),
                ));
                None
            }
        },
    }
}

/// Binds a JSON object to a model. Unknown keys are ignored.
pub fn bind_model(
    map: &serde_json::Map<String, Value>,
    model: &Model,
    loc: &Location,
    errors: &mut ValidationErrors,
) -> Option<ModelInstance> {
    let before = errors.len();
    let mut instance = ModelInstance::new(model.name());

    for field in model.fields() {
        let field_loc = loc.child(field.name());
        let bound = match map.get(field.name()) {
            None => bind_absent(field, &field_loc, errors),
            Some(raw) => bind_present(field, RawValue::Json(raw), &field_loc, errors),
        };
        if let Some(bound) = bound {
            instance.insert(field.binding(), bound.value, bound.explicit);
        }
    }

    (errors.len() == before).then_some(instance)
}

/// Best-effort JSON echo of a bound value for constraint error reports.
fn echo_bound(value: &BoundValue) -> Value {
    match value {
        BoundValue::Str(s) | BoundValue::Enum(s) => Value::String(s.clone()),
        BoundValue::Int(n) => Value::from(*n),
        BoundValue::Decimal(d) => Value::String(d.to_string()),
        BoundValue::Seq(items) => Value::Array(items.iter().map(echo_bound).collect()),
        BoundValue::Json(json) => json.clone(),
        BoundValue::Url(url) => Value::String(url.to_string()),
        BoundValue::Bool(b) => Value::Bool(*b),
        _ => Value::Null,
    }
}
