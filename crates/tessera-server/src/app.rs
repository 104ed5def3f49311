//! The application: route table, handlers and request dispatch.
//!
//! [`App::dispatch`] runs the whole pipeline on a fully received request:
//!
//! 1. Resolve the route (404 / 405 on failure)
//! 2. Materialize the body (413 / 415 / 400 on failure)
//! 3. Validate every declared parameter (422 with the full error list)
//! 4. Invoke the handler (domain errors keep their status)
//! 5. Shape the result and serialize it with the route's success status
//!
//! Dispatch never touches the network, so tests drive it directly.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::{Request, Response, StatusCode};
use tracing::{debug, error, info, warn, Instrument, Span};

use tessera_bind::{shape, validate_route, BindOptions, ParamBundle};
use tessera_config::TesseraConfig;
use tessera_core::{BoundValue, ContractError, RouteContract};
use tessera_extract::{read_body, BodyError, MultipartConfig, RequestBody, RequestParts};
use tessera_telemetry::{fields, request_span};

use crate::collaborators::{CredentialVerifier, InMemoryItemStore, ItemStore, StaticTokenVerifier};
use crate::response::{detail_response, internal_error, json_response};
use crate::router::{Resolution, RouteMatch, Router};
use crate::HandlerError;

/// A route handler.
///
/// Receives the injected collaborators and the validated parameters, and
/// returns the value to shape into the response.
pub type Handler =
    Arc<dyn Fn(&AppState, &ParamBundle) -> Result<BoundValue, HandlerError> + Send + Sync>;

/// Collaborators shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Token check for `X-Token`.
    pub credentials: Arc<dyn CredentialVerifier>,
    /// Item records.
    pub items: Arc<dyn ItemStore>,
}

impl AppState {
    /// Creates state from explicit collaborators.
    pub fn new(credentials: Arc<dyn CredentialVerifier>, items: Arc<dyn ItemStore>) -> Self {
        Self { credentials, items }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(
            Arc::new(StaticTokenVerifier::default()),
            Arc::new(InMemoryItemStore::seeded()),
        )
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

struct Route {
    contract: RouteContract,
    handler: Handler,
}

/// A routed set of contracts and handlers.
pub struct App {
    router: Router,
    routes: HashMap<String, Route>,
    state: AppState,
    options: BindOptions,
    multipart: MultipartConfig,
    max_body_bytes: usize,
}

impl App {
    /// Creates an application builder.
    #[must_use]
    pub fn builder() -> AppBuilder {
        AppBuilder::default()
    }

    /// Returns the contract registered under an operation ID.
    #[must_use]
    pub fn contract(&self, operation_id: &str) -> Option<&RouteContract> {
        self.routes.get(operation_id).map(|route| &route.contract)
    }

    /// Returns the largest accepted body in bytes.
    #[must_use]
    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// Handles one fully received request.
    pub async fn dispatch(&self, request: Request<Bytes>) -> Response<Bytes> {
        let span = request_span(request.method().as_str(), request.uri().path());
        self.handle(request).instrument(span).await
    }

    async fn handle(&self, request: Request<Bytes>) -> Response<Bytes> {
        let started = Instant::now();
        let (head, body) = request.into_parts();

        let response = match self.router.resolve(&head.method, head.uri.path()) {
            Resolution::Matched(found) => self.invoke(found, head, body).await,
            Resolution::MethodNotAllowed => {
                detail_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
            }
            Resolution::NotFound => detail_response(StatusCode::NOT_FOUND, "Not Found"),
        };

        let status = response.status().as_u16();
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        Span::current().record(fields::HTTP_STATUS, status);
        info!(http.status_code = status, duration_ms, "request completed");
        response
    }

    async fn invoke(
        &self,
        found: RouteMatch,
        head: http::request::Parts,
        body: Bytes,
    ) -> Response<Bytes> {
        let Some(route) = self.routes.get(found.operation_id()) else {
            error!(operation_id = found.operation_id(), "route has no handler");
            return internal_error();
        };
        let contract = &route.contract;
        Span::current().record(fields::OPERATION_ID, contract.operation_id());

        if body.len() > self.max_body_bytes {
            let err = BodyError::PayloadTooLarge {
                limit: self.max_body_bytes,
                actual: body.len(),
            };
            return json_response(err.status_code(), &err.to_body());
        }

        // Routes without body parameters never look at the payload.
        let materialized = if contract.reads_body() {
            match read_body(&head.headers, body, &self.multipart).await {
                Ok(materialized) => materialized,
                Err(err) => {
                    debug!(error = %err, "request body rejected");
                    return json_response(err.status_code(), &err.to_body());
                }
            }
        } else {
            RequestBody::Empty
        };

        let parts = RequestParts::new(
            head.method,
            head.uri,
            head.headers,
            found.into_params(),
            materialized,
        );

        let bundle = match validate_route(contract, &parts, &self.options) {
            Ok(bundle) => bundle,
            Err(errors) => {
                return json_response(StatusCode::UNPROCESSABLE_ENTITY, &errors.to_body());
            }
        };

        let result = match (route.handler)(&self.state, &bundle) {
            Ok(result) => result,
            Err(HandlerError::Http(err)) => {
                warn!(
                    http.status_code = err.status_code().as_u16(),
                    detail = err.detail(),
                    "request rejected by handler"
                );
                return json_response(err.status_code(), &err.to_body());
            }
            Err(err) => {
                error!(error = %err, "handler failed");
                return internal_error();
            }
        };

        match shape(&result, contract.response().policy()) {
            Ok(payload) => json_response(contract.response().status(), &payload),
            Err(err) => {
                error!(error = %err, "failed to shape handler result");
                internal_error()
            }
        }
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("routes", &self.router.len())
            .field("options", &self.options)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish_non_exhaustive()
    }
}

/// Builder for [`App`].
pub struct AppBuilder {
    routes: Vec<Route>,
    state: AppState,
    options: BindOptions,
    multipart: MultipartConfig,
    max_body_bytes: usize,
}

impl Default for AppBuilder {
    fn default() -> Self {
        let defaults = TesseraConfig::default();
        Self {
            routes: Vec::new(),
            state: AppState::default(),
            options: BindOptions::default(),
            multipart: MultipartConfig::default(),
            max_body_bytes: defaults.server.max_body_bytes,
        }
    }
}

impl AppBuilder {
    /// Registers a contract with its handler.
    #[must_use]
    pub fn route<F>(mut self, contract: RouteContract, handler: F) -> Self
    where
        F: Fn(&AppState, &ParamBundle) -> Result<BoundValue, HandlerError> + Send + Sync + 'static,
    {
        self.routes.push(Route {
            contract,
            handler: Arc::new(handler),
        });
        self
    }

    /// Sets the collaborators handed to handlers.
    #[must_use]
    pub fn state(mut self, state: AppState) -> Self {
        self.state = state;
        self
    }

    /// Sets the binding options.
    #[must_use]
    pub fn bind_options(mut self, options: BindOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the multipart limits.
    #[must_use]
    pub fn multipart(mut self, multipart: MultipartConfig) -> Self {
        self.multipart = multipart;
        self
    }

    /// Sets the largest accepted body.
    #[must_use]
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Applies the binding and body limits of a loaded configuration.
    #[must_use]
    pub fn config(self, config: &TesseraConfig) -> Self {
        self.bind_options(BindOptions::new().duplicate_policy(config.binding.duplicate_scalar))
            .multipart(
                MultipartConfig::new()
                    .max_fields(config.binding.multipart_max_fields)
                    .max_field_size(config.binding.multipart_max_field_bytes),
            )
            .max_body_bytes(config.server.max_body_bytes)
    }

    /// Builds the route table.
    ///
    /// # Errors
    ///
    /// [`ContractError::DuplicateRoute`] if two routes share a method and
    /// pattern, or an operation ID.
    pub fn build(self) -> Result<App, ContractError> {
        let mut router = Router::new();
        let mut routes = HashMap::with_capacity(self.routes.len());

        for route in self.routes {
            let operation_id = route.contract.operation_id().to_string();
            if routes.contains_key(&operation_id) {
                return Err(ContractError::DuplicateRoute(format!(
                    "operation '{operation_id}' registered twice"
                )));
            }
            router.add_route(
                route.contract.method().clone(),
                route.contract.path(),
                &operation_id,
            )?;
            debug!(
                operation_id = %operation_id,
                method = %route.contract.method(),
                path = route.contract.path(),
                "route registered"
            );
            routes.insert(operation_id, route);
        }

        Ok(App {
            router,
            routes,
            state: self.state,
            options: self.options,
            multipart: self.multipart,
            max_body_bytes: self.max_body_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use tessera_core::{HttpError, ModelInstance, ParameterSpec, TargetType};

    fn echo_contract(operation_id: &str, path: &str) -> RouteContract {
        RouteContract::builder(operation_id, Method::GET, path)
            .param(ParameterSpec::query("n", TargetType::Integer))
            .build()
            .unwrap()
    }

    fn echo(_: &AppState, params: &ParamBundle) -> Result<BoundValue, HandlerError> {
        let n: i64 = params.get("n")?;
        if n < 0 {
            return Err(HttpError::bad_request("negative").into());
        }
        Ok(ModelInstance::new("Echo").with("n", n).into())
    }

    fn request(uri: &str) -> Request<Bytes> {
        Request::builder().uri(uri).body(Bytes::new()).unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_statuses() {
        let app = App::builder()
            .route(echo_contract("echo", "/echo"), echo)
            .build()
            .unwrap();

        assert_eq!(app.dispatch(request("/echo?n=3")).await.status(), StatusCode::OK);
        assert_eq!(
            app.dispatch(request("/echo?n=x")).await.status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            app.dispatch(request("/echo?n=-1")).await.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(app.dispatch(request("/other")).await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_handler_reading_undeclared_param_is_internal_error() {
        let app = App::builder()
            .route(echo_contract("broken", "/broken"), |_: &AppState, params: &ParamBundle| {
                let missing: String = params.get("nope")?;
                Ok(BoundValue::from(missing))
            })
            .build()
            .unwrap();

        let response = app.dispatch(request("/broken?n=1")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body().as_ref(), br#"{"detail":"Internal Server Error"}"#);
    }

    #[test]
    fn test_duplicate_operation_rejected() {
        let err = App::builder()
            .route(echo_contract("echo", "/a"), echo)
            .route(echo_contract("echo", "/b"), echo)
            .build()
            .unwrap_err();
        assert!(matches!(err, ContractError::DuplicateRoute(_)));
    }

    #[test]
    fn test_config_applies_limits() {
        let mut config = TesseraConfig::default();
        config.server.max_body_bytes = 64;
        let app = App::builder().config(&config).build().unwrap();
        assert_eq!(app.max_body_bytes(), 64);
    }
}
