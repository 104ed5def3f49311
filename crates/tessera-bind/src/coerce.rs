//! Scalar coercion.
//!
//! Converts one raw value into one scalar [`BoundValue`]. Text is parsed
//! strictly against a single format per type. JSON nodes of the natural
//! JSON type are accepted directly, and JSON strings fall back to the text
//! rules (so `"5"` binds to an integer field, as a query string would).
//!
//! | Target | Accepted text |
//! |--------|---------------|
//! | integer | optional sign and digits |
//! | decimal | plain or scientific notation, exact |
//! | boolean | `1 true on yes` / `0 false off no`, case-insensitive |
//! | date | `YYYY-MM-DD` |
//! | datetime | RFC 3339 with offset |
//! | time | `HH:MM:SS[.fraction]` |
//! | duration | ISO 8601 `[-]P[nW][nD][T[nH][nM][n[.f]S]]` |
//! | uuid | hyphenated, 36 characters |
//! | url | absolute `http`/`https` with host |

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use url::Url;
use uuid::Uuid;

use tessera_core::{BoundValue, TargetType};
use tessera_extract::RawValue;

const TRUTHY: [&str; 4] = ["1", "true", "on", "yes"];
const FALSY: [&str; 4] = ["0", "false", "off", "no"];

/// Why a raw value could not be coerced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch(pub String);

impl Mismatch {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Coerces a raw value into a scalar, `any` or `file` target.
///
/// Structured targets (model, sequence, mapping) are handled by the binder
/// and always mismatch here.
pub fn coerce_scalar(raw: RawValue<'_>, target: &TargetType) -> Result<BoundValue, Mismatch> {
    match raw {
        RawValue::Text(text) => coerce_text(text, target),
        RawValue::Json(value) => coerce_json(value, target),
        RawValue::File(file) => match target {
            TargetType::File => Ok(BoundValue::File(file.clone())),
            other => Err(expected(other)),
        },
    }
}

/// Coerces text into a scalar target.
pub fn coerce_text(text: &str, target: &TargetType) -> Result<BoundValue, Mismatch> {
    match target {
        TargetType::String => Ok(BoundValue::Str(text.to_string())),
        TargetType::Integer => parse_int(text).map(BoundValue::Int),
        TargetType::Decimal => parse_decimal(text).map(BoundValue::Decimal),
        TargetType::Boolean => parse_bool(text).map(BoundValue::Bool),
        TargetType::Date => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(BoundValue::Date)
            .map_err(|_| Mismatch::new("Input should be a valid date in the format YYYY-MM-DD")),
        TargetType::DateTime => DateTime::parse_from_rfc3339(text)
            .map(BoundValue::DateTime)
            .map_err(|_| Mismatch::new("Input should be a valid datetime")),
        TargetType::Time => NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
            .map(BoundValue::Time)
            .map_err(|_| Mismatch::new("Input should be a valid time")),
        TargetType::Duration => parse_iso_duration(text)
            .map(BoundValue::Duration)
            .ok_or_else(|| Mismatch::new("Input should be a valid duration")),
        TargetType::Uuid => parse_uuid(text).map(BoundValue::Uuid),
        TargetType::Url => parse_url(text).map(BoundValue::Url),
        TargetType::Email => parse_email(text).map(BoundValue::Str),
        TargetType::Enum(spec) => {
            if spec.contains(text) {
                Ok(BoundValue::Enum(text.to_string()))
            } else {
                Err(Mismatch::new(format!(
                    "Input should be {}",
                    spec.describe_members()
                )))
            }
        }
        TargetType::Any => Ok(BoundValue::Json(Value::String(text.to_string()))),
        other => Err(expected(other)),
    }
}

fn coerce_json(value: &Value, target: &TargetType) -> Result<BoundValue, Mismatch> {
    if let TargetType::Any = target {
        return Ok(BoundValue::Json(value.clone()));
    }

    match (value, target) {
        (Value::String(text), TargetType::String) => Ok(BoundValue::Str(text.clone())),
        (_, TargetType::String) => Err(expected(target)),
        (Value::String(text), _) => coerce_text(text, target),
        (Value::Number(n), TargetType::Integer) => json_int(n).map(BoundValue::Int),
        (Value::Number(n), TargetType::Decimal) => parse_decimal(&n.to_string()).map(BoundValue::Decimal),
        (Value::Number(n), TargetType::Duration) => parse_decimal(&n.to_string())
            .ok()
            .and_then(seconds_to_delta)
            .map(BoundValue::Duration)
            .ok_or_else(|| expected(target)),
        (Value::Number(n), TargetType::Boolean) => match n.to_string().as_str() {
            "0" => Ok(BoundValue::Bool(false)),
            "1" => Ok(BoundValue::Bool(true)),
            _ => Err(bool_mismatch()),
        },
        (Value::Bool(b), TargetType::Boolean) => Ok(BoundValue::Bool(*b)),
        _ => Err(expected(target)),
    }
}

fn expected(target: &TargetType) -> Mismatch {
    let message = match target {
        TargetType::String | TargetType::Email => "Input should be a valid string".to_string(),
        TargetType::Integer => "Input should be a valid integer".to_string(),
        TargetType::Decimal => "Input should be a valid decimal".to_string(),
        TargetType::Boolean => "Input should be a valid boolean".to_string(),
        TargetType::File => "Expected an uploaded file".to_string(),
        TargetType::Model(_) => {
            "Input should be a valid dictionary or object to extract fields from".to_string()
        }
        TargetType::Sequence(_) => "Input should be a valid list".to_string(),
        TargetType::Mapping(..) => "Input should be a valid dictionary".to_string(),
        other => format!("Input should be a valid {}", other.describe()),
    };
    Mismatch(message)
}

/// The mismatch reported for a structured target given the wrong JSON shape.
pub(crate) fn structure_mismatch(target: &TargetType) -> Mismatch {
    expected(target)
}

fn bool_mismatch() -> Mismatch {
    Mismatch::new("Input should be a valid boolean, unable to interpret input")
}

fn parse_int(text: &str) -> Result<i64, Mismatch> {
    text.parse::<i64>().map_err(|_| {
        Mismatch::new("Input should be a valid integer, unable to parse string as an integer")
    })
}

fn json_int(n: &serde_json::Number) -> Result<i64, Mismatch> {
    if let Some(i) = n.as_i64() {
        return Ok(i);
    }
    let decimal = parse_decimal(&n.to_string())
        .map_err(|_| Mismatch::new("Input should be a valid integer"))?;
    if !decimal.fract().is_zero() {
        return Err(Mismatch::new(
            "Input should be a valid integer, got a number with a fractional part",
        ));
    }
    decimal
        .to_i64()
        .ok_or_else(|| Mismatch::new("Input should be a valid integer, number out of range"))
}

/// Parses a decimal exactly, falling back to scientific notation.
pub(crate) fn parse_decimal(text: &str) -> Result<Decimal, Mismatch> {
    Decimal::from_str_exact(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| Mismatch::new("Input should be a valid decimal"))
}

fn parse_bool(text: &str) -> Result<bool, Mismatch> {
    let lower = text.to_ascii_lowercase();
    if TRUTHY.contains(&lower.as_str()) {
        Ok(true)
    } else if FALSY.contains(&lower.as_str()) {
        Ok(false)
    } else {
        Err(bool_mismatch())
    }
}

fn parse_uuid(text: &str) -> Result<Uuid, Mismatch> {
    if text.len() != 36 {
        return Err(Mismatch::new("Input should be a valid UUID"));
    }
    Uuid::parse_str(text).map_err(|_| Mismatch::new("Input should be a valid UUID"))
}

fn parse_url(text: &str) -> Result<Url, Mismatch> {
    let url = Url::parse(text).map_err(|e| {
        Mismatch::new(format!("Input should be a valid URL, {e}"))
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Mismatch::new(
            "URL scheme should be 'http' or 'https'",
        ));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(Mismatch::new("Input should be a valid URL, empty host"));
    }
    Ok(url)
}

fn parse_email(text: &str) -> Result<String, Mismatch> {
    let invalid = || Mismatch::new("value is not a valid email address");

    if text.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = text.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid());
    }
    Ok(text.to_string())
}

/// Parses an ISO 8601 duration such as `P1DT2H30M` or `PT0.5S`.
///
/// Years and months are rejected: they have no fixed length.
pub fn parse_iso_duration(text: &str) -> Option<TimeDelta> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let rest = rest.strip_prefix('P')?;
    let (date_part, time_part) = match rest.split_once('T') {
        Some((date, time)) => {
            if time.is_empty() {
                return None;
            }
            (date, time)
        }
        None => (rest, ""),
    };
    if date_part.is_empty() && time_part.is_empty() {
        return None;
    }

    let days = sum_components(date_part, &[('W', 604_800), ('D', 86_400)], false)?;
    let seconds =
        days.checked_add(sum_components(time_part, &[('H', 3_600), ('M', 60), ('S', 1)], true)?)?;

    let delta = seconds_to_delta(seconds)?;
    Some(if negative { -delta } else { delta })
}

/// Sums `<number><designator>` components appearing in the order of `units`.
///
/// Only the last unit may carry a fraction, and only when `fractional_last`.
fn sum_components(part: &str, units: &[(char, i64)], fractional_last: bool) -> Option<Decimal> {
    let mut total = Decimal::ZERO;
    let mut next_unit = 0usize;
    let mut number = String::new();

    for c in part.chars() {
        if c.is_ascii_digit() || c == '.' {
            number.push(c);
            continue;
        }
        let offset = units[next_unit..].iter().position(|(d, _)| *d == c)?;
        let idx = next_unit + offset;
        let is_last = idx == units.len() - 1;
        if number.is_empty() || (number.contains('.') && !(fractional_last && is_last)) {
            return None;
        }
        let value = Decimal::from_str_exact(&number).ok()?;
        total = total.checked_add(value.checked_mul(Decimal::from(units[idx].1))?)?;
        number.clear();
        next_unit = idx + 1;
    }

    if number.is_empty() {
        Some(total)
    } else {
        None
    }
}

fn seconds_to_delta(seconds: Decimal) -> Option<TimeDelta> {
    let whole = seconds.trunc();
    let nanos = ((seconds - whole) * Decimal::from(1_000_000_000)).trunc();
    TimeDelta::try_seconds(whole.to_i64()?)?.checked_add(&TimeDelta::nanoseconds(nanos.to_i64()?))
}
