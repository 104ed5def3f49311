//! # Tessera Server
//!
//! The demo service of the Tessera binding engine: a set of route
//! contracts with their handlers, a segment router, and a hyper HTTP/1
//! transport.
//!
//! - [`App`] - Route table plus the dispatch pipeline (route, bind, handle, shape)
//! - [`Router`] - `{param}` path templates to operation IDs
//! - [`Server`] - TCP listener, per-request timeout, graceful shutdown
//! - [`demo_app`] - The demo routes wired to injected collaborators
//!
//! ## Example
//!
//! ```rust
//! use bytes::Bytes;
//! use http::{Request, StatusCode};
//! use tessera_config::TesseraConfig;
//! use tessera_server::{demo_app, AppState};
//!
//! # tokio_test::block_on(async {
//! let app = demo_app(&TesseraConfig::default(), AppState::default()).unwrap();
//! let request = Request::builder()
//!     .uri("/model/lenet")
//!     .body(Bytes::new())
//!     .unwrap();
//!
//! let response = app.dispatch(request).await;
//! assert_eq!(response.status(), StatusCode::OK);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/tessera-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod collaborators;
mod error;
pub mod models;
mod response;
mod router;
mod routes;
mod server;

pub use app::{App, AppBuilder, AppState, Handler};
pub use collaborators::{
    CredentialVerifier, InMemoryItemStore, ItemStore, StaticTokenVerifier, DEMO_SECRET_TOKEN,
};
pub use error::{HandlerError, ServerError};
pub use response::{detail_response, internal_error, json_response};
pub use router::{Resolution, RouteMatch, Router};
pub use routes::{demo_app, register};
pub use server::Server;
