//! # Tessera Bind
//!
//! The validation engine: coerces raw request values into typed values,
//! binds nested models, validates a whole route in one pass and shapes
//! handler results into response payloads.
//!
//! ## Binding a request
//!
//! ```rust
//! use http::Method;
//! use tessera_bind::{validate_route, BindOptions};
//! use tessera_core::{ParameterSpec, RouteContract, TargetType};
//! use tessera_extract::RequestParts;
//!
//! let contract = RouteContract::builder("read_items", Method::GET, "/items")
//!     .param(ParameterSpec::query("q", TargetType::String).optional().max_length(50))
//!     .param(ParameterSpec::header("user_agent", TargetType::String).optional())
//!     .build()
//!     .unwrap();
//!
//! let parts = RequestParts::builder()
//!     .uri("/items?q=boots")
//!     .header("user-agent", "curl/8.0")
//!     .build();
//!
//! let bundle = validate_route(&contract, &parts, &BindOptions::default()).unwrap();
//! assert_eq!(bundle.get::<Option<String>>("q").unwrap().as_deref(), Some("boots"));
//! ```
//!
//! ## Failures
//!
//! Every failure is collected. The resulting [`tessera_core::ValidationErrors`]
//! serializes to the 422 body `{"detail": [{"loc": [...], "msg": ..., "type": ...}]}`.

#![doc(html_root_url = "https://docs.rs/tessera-bind/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod aggregate;
mod binder;
mod bundle;
mod coerce;
mod shape;

pub use aggregate::validate_route;
pub use binder::{bind_model, bind_param, bind_value, param_location, BindOptions, Bound};
pub use bundle::{BundleError, ParamBundle};
pub use coerce::{coerce_scalar, coerce_text, parse_iso_duration, Mismatch};
pub use shape::{format_iso_duration, shape, to_json};
