//! # Tessera Extract
//!
//! Raw value extraction for the Tessera binding engine.
//!
//! The engine never streams: the transport hands over a fully received
//! request, [`read_body`] materializes its body, and [`RequestParts`] holds
//! the decoded result. [`extract`] then reads the raw value(s) of one
//! declared parameter from it.
//!
//! | Source | Storage | Values per parameter |
//! |--------|---------|----------------------|
//! | path | [`PathParams`] | exactly one when the route matched |
//! | query | [`QueryPairs`] | every occurrence, in request order |
//! | header | `http::HeaderMap` | every occurrence, trimmed |
//! | cookie | [`Cookies`] | zero or one |
//! | body field / whole body | [`RequestBody::Json`] | zero or one JSON node |
//! | form field / file | [`FormData`] | every occurrence |
//!
//! ## Example
//!
//! ```rust
//! use tessera_core::{ParameterSpec, TargetType};
//! use tessera_extract::{extract, Extraction, RawValue, RequestParts};
//!
//! let parts = RequestParts::builder()
//!     .uri("/items/3?needy=yes")
//!     .path_param("item_id", "3")
//!     .build();
//!
//! let needy = ParameterSpec::query("needy", TargetType::String);
//! assert!(matches!(extract(&needy, &parts), Extraction::Present(v) if v[0] == RawValue::Text("yes")));
//! ```

#![doc(html_root_url = "https://docs.rs/tessera-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod body;
mod cookie;
mod error;
mod extract;
pub mod multipart;
mod params;
mod query;
mod request;

pub use body::{read_body, FormData, FormPart, RequestBody};
pub use cookie::Cookies;
pub use error::BodyError;
pub use extract::{extract, Extraction, RawValue};
pub use multipart::MultipartConfig;
pub use params::PathParams;
pub use query::QueryPairs;
pub use request::{RequestParts, RequestPartsBuilder};
