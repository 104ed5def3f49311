//! Constraint library.
//!
//! A [`Constraint`] is an independent predicate over a coerced value. Every
//! constraint declared on a parameter is evaluated, so one field can report
//! several violations at once.

use regex::Regex;
use rust_decimal::Decimal;
use std::fmt;

use crate::types::describe_choices;
use crate::{BoundValue, ContractError, TargetType};

/// A compiled regular expression constraint.
#[derive(Clone)]
pub struct Pattern(Regex);

impl Pattern {
    /// Compiles a pattern.
    pub fn new(source: &str) -> Result<Self, ContractError> {
        Regex::new(source)
            .map(Self)
            .map_err(|e| ContractError::InvalidPattern {
                pattern: source.to_string(),
                reason: e.to_string(),
            })
    }

    /// Returns the pattern source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Tests the pattern against text (unanchored search, like `re.search`).
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.as_str()).finish()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

/// A predicate over a coerced value.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Minimum number of characters
    MinLength(usize),
    /// Maximum number of characters
    MaxLength(usize),
    /// Regular expression the text must match
    Pattern(Pattern),
    /// Inclusive lower bound
    Ge(Decimal),
    /// Exclusive lower bound
    Gt(Decimal),
    /// Inclusive upper bound
    Le(Decimal),
    /// Exclusive upper bound
    Lt(Decimal),
    /// Minimum number of elements
    MinItems(usize),
    /// Maximum number of elements
    MaxItems(usize),
    /// Membership in a fixed set of strings
    OneOf(Vec<String>),
}

/// A failed constraint check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintViolation {
    /// Constraint name, as reported in the error `type`.
    pub constraint: &'static str,
    /// Human-readable message.
    pub message: String,
}

impl Constraint {
    /// Creates a pattern constraint.
    pub fn pattern(source: &str) -> Result<Self, ContractError> {
        Pattern::new(source).map(Self::Pattern)
    }

    /// Creates a membership constraint.
    #[must_use]
    pub fn one_of<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::OneOf(choices.into_iter().map(Into::into).collect())
    }

    /// The constraint name used in `constraint_violation:<name>`.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MinLength(_) => "min_length",
            Self::MaxLength(_) => "max_length",
            Self::Pattern(_) => "pattern",
            Self::Ge(_) => "ge",
            Self::Gt(_) => "gt",
            Self::Le(_) => "le",
            Self::Lt(_) => "lt",
            Self::MinItems(_) => "min_items",
            Self::MaxItems(_) => "max_items",
            Self::OneOf(_) => "enum",
        }
    }

    /// Returns true if the constraint can be evaluated against values of `target`.
    #[must_use]
    pub fn applies_to(&self, target: &TargetType) -> bool {
        match self {
            Self::MinLength(_) | Self::MaxLength(_) | Self::Pattern(_) | Self::OneOf(_) => {
                target.is_textual()
            }
            Self::Ge(_) | Self::Gt(_) | Self::Le(_) | Self::Lt(_) => target.is_numeric(),
            Self::MinItems(_) | Self::MaxItems(_) => target.is_collection(),
        }
    }

    /// Evaluates the constraint.
    ///
    /// `Null` always passes: an absent optional value has nothing to test.
    pub fn check(&self, value: &BoundValue) -> Result<(), ConstraintViolation> {
        if value.is_null() {
            return Ok(());
        }

        let passed = match self {
            Self::MinLength(min) => value.as_str().map_or(true, |s| s.chars().count() >= *min),
            Self::MaxLength(max) => value.as_str().map_or(true, |s| s.chars().count() <= *max),
            Self::Pattern(pattern) => value.as_str().map_or(true, |s| pattern.is_match(s)),
            Self::OneOf(choices) => value
                .as_str()
                .map_or(true, |s| choices.iter().any(|c| c == s)),
            Self::Ge(bound) => value.as_decimal().map_or(true, |n| n >= *bound),
            Self::Gt(bound) => value.as_decimal().map_or(true, |n| n > *bound),
            Self::Le(bound) => value.as_decimal().map_or(true, |n| n <= *bound),
            Self::Lt(bound) => value.as_decimal().map_or(true, |n| n < *bound),
            Self::MinItems(min) => collection_len(value).map_or(true, |len| len >= *min),
            Self::MaxItems(max) => collection_len(value).map_or(true, |len| len <= *max),
        };

        if passed {
            Ok(())
        } else {
            Err(ConstraintViolation {
                constraint: self.name(),
                message: self.failure_message(),
            })
        }
    }

    fn failure_message(&self) -> String {
        match self {
            Self::MinLength(n) => format!("String should have at least {}", plural(*n, "character")),
            Self::MaxLength(n) => format!("String should have at most {}", plural(*n, "character")),
            Self::Pattern(p) => format!("String should match pattern '{}'", p.as_str()),
            Self::OneOf(choices) => format!("Input should be {}", describe_choices(choices)),
            Self::Ge(n) => format!("Input should be greater than or equal to {n}"),
            Self::Gt(n) => format!("Input should be greater than {n}"),
            Self::Le(n) => format!("Input should be less than or equal to {n}"),
            Self::Lt(n) => format!("Input should be less than {n}"),
            Self::MinItems(n) => format!("List should have at least {}", plural(*n, "item")),
            Self::MaxItems(n) => format!("List should have at most {}", plural(*n, "item")),
        }
    }
}

fn collection_len(value: &BoundValue) -> Option<usize> {
    match value {
        BoundValue::Seq(items) => Some(items.len()),
        BoundValue::Map(entries) => Some(entries.len()),
        _ => None,
    }
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{n} {noun}")
    } else {
        format!("{n} {noun}s")
    }
}
