//! # Tessera
//!
//! **Declarative request binding and validation for HTTP services**
//!
//! A route publishes a [`RouteContract`](prelude::RouteContract): the
//! parameters it reads, where each one comes from, its target type and
//! constraints. Tessera extracts the raw values from a request, coerces
//! them, checks every constraint and reports *all* failures at once as a
//! 422 body. Handlers only ever see fully typed parameters, and their
//! results are shaped (derived fields, response models, unset-field
//! exclusion) before serialization.
//!
//! ## Quick Start
//!
//! ```rust
//! use tessera::prelude::*;
//! use http::Method;
//!
//! let contract = RouteContract::builder("read_item", Method::GET, "/items/{item_id}")
//!     .param(ParameterSpec::path("item_id", TargetType::Integer).ge(1))
//!     .param(ParameterSpec::query("short", TargetType::Boolean).default(false))
//!     .build()
//!     .unwrap();
//!
//! let request = RequestParts::builder()
//!     .uri("/items/0?short=yes")
//!     .path_param("item_id", "0")
//!     .build();
//!
//! let errors = validate_route(&contract, &request, &BindOptions::default()).unwrap_err();
//! assert_eq!(errors.to_body()["detail"][0]["loc"], serde_json::json!(["path", "item_id"]));
//! ```
//!
//! ## Crates
//!
//! ```text
//! tessera-core       contracts, target types, constraints, bound values, errors
//! tessera-extract    materialized requests and raw value extraction
//! tessera-bind       coercion, model binding, route validation, response shaping
//! tessera-config     layered configuration
//! tessera-telemetry  logging setup
//! tessera-server     demo service and hyper transport
//! ```

#![doc(html_root_url = "https://docs.rs/tessera/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use tessera_bind as bind;
pub use tessera_config as config;
pub use tessera_core as core;
pub use tessera_extract as extract;
pub use tessera_server as server;
pub use tessera_telemetry as telemetry;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use tessera_core::{
        BoundValue, Constraint, ContractError, DerivedField, DuplicatePolicy, EnumSpec, HttpError,
        Model, ModelInstance, ParameterSpec, RouteContract, ShapePolicy, TargetType,
        UploadedFile, ValidationError, ValidationErrors,
    };

    pub use tessera_extract::{read_body, RequestBody, RequestParts};

    pub use tessera_bind::{shape, validate_route, BindOptions, BundleError, ParamBundle};

    pub use tessera_config::{ConfigLoader, TesseraConfig};

    pub use tessera_server::{App, AppState, HandlerError, Server};
}
