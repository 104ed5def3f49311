//! # Tessera Core
//!
//! Declarative route contracts and the typed data model of the Tessera
//! binding engine.
//!
//! - [`RouteContract`] - Immutable per-route parameter list, response status and shaping policy
//! - [`ParameterSpec`] - One parameter: wire name, binding, source, target type, constraints, default
//! - [`Model`] - Named nested structure of field specs
//! - [`TargetType`] - Semantic types raw values are coerced into
//! - [`Constraint`] - Predicates over coerced values
//! - [`BoundValue`] / [`ModelInstance`] - Typed values with the explicit-vs-default bit
//! - [`ValidationErrors`] / [`HttpError`] / [`ContractError`] / [`ShapeError`] - Error families
//!
//! Contracts are consumed by `tessera-bind`; this crate performs no I/O.

#![doc(html_root_url = "https://docs.rs/tessera-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod constraint;
mod contract;
mod error;
mod file;
mod model;
mod param;
mod policy;
mod source;
mod types;
mod value;

pub use constraint::{Constraint, ConstraintViolation, Pattern};
pub use contract::{ResponseSpec, RouteContract, RouteContractBuilder};
pub use error::{
    ContractError, ErrorKind, HttpError, LocItem, Location, ShapeError, ValidationError,
    ValidationErrors,
};
pub use file::UploadedFile;
pub use model::{Model, ModelBuilder};
pub use param::ParameterSpec;
pub use policy::{Derivation, DerivedField, DuplicatePolicy, ShapePolicy};
pub use source::ParamSource;
pub use types::{EnumSpec, TargetType};
pub use value::{BoundValue, FieldValue, FromBound, ModelInstance};
