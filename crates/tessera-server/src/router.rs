//! Request routing and path matching.
//!
//! Routes are registered as `{name}`-style path templates. Matching is
//! segment by segment; empty segments are ignored, so `/images/multiple`
//! and `/images/multiple/` resolve to the same route. Segments are bound
//! exactly as they appear in the request path.
//!
//! # Example
//!
//! ```rust
//! use http::Method;
//! use tessera_server::{Resolution, Router};
//!
//! let mut router = Router::new();
//! router.add_route(Method::GET, "/items/{item_id}", "read_item").unwrap();
//!
//! let Resolution::Matched(found) = router.resolve(&Method::GET, "/items/42") else {
//!     panic!("route should match");
//! };
//! assert_eq!(found.operation_id(), "read_item");
//! assert_eq!(found.params().get("item_id"), Some("42"));
//!
//! assert!(matches!(router.resolve(&Method::POST, "/items/42"), Resolution::MethodNotAllowed));
//! assert!(matches!(router.resolve(&Method::GET, "/users"), Resolution::NotFound));
//! ```

use http::Method;

use tessera_core::ContractError;
use tessera_extract::PathParams;

/// A matched route with its path parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    operation_id: String,
    params: PathParams,
}

impl RouteMatch {
    /// Returns the operation ID of the matched route.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Returns the path parameters.
    #[must_use]
    pub fn params(&self) -> &PathParams {
        &self.params
    }

    /// Consumes the match, returning the path parameters.
    #[must_use]
    pub fn into_params(self) -> PathParams {
        self.params
    }
}

/// Outcome of routing one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A route matched path and method.
    Matched(RouteMatch),
    /// The path matched, but not for this method.
    MethodNotAllowed,
    /// No route matches the path.
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone)]
struct Route {
    method: Method,
    pattern: String,
    segments: Vec<PathSegment>,
    operation_id: String,
}

impl Route {
    fn new(method: Method, pattern: &str, operation_id: &str) -> Self {
        Self {
            method,
            pattern: pattern.to_string(),
            segments: parse_segments(pattern),
            operation_id: operation_id.to_string(),
        }
    }

    fn match_path(&self, path: &[&str]) -> Option<PathParams> {
        if path.len() != self.segments.len() {
            return None;
        }

        let mut params = PathParams::new();
        for (pattern, actual) in self.segments.iter().zip(path) {
            match pattern {
                PathSegment::Literal(expected) if expected != actual => return None,
                PathSegment::Literal(_) => {}
                PathSegment::Param(name) => params.push(name.as_str(), *actual),
            }
        }
        Some(params)
    }
}

fn parse_segments(pattern: &str) -> Vec<PathSegment> {
    pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => PathSegment::Param(name.to_string()),
            None => PathSegment::Literal(s.to_string()),
        })
        .collect()
}

/// Maps `(method, path)` to an operation ID.
///
/// Routes are tried in registration order; the first match wins.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route.
    ///
    /// # Errors
    ///
    /// [`ContractError::DuplicateRoute`] if the method and pattern are
    /// already registered. Patterns that differ only in parameter names
    /// count as the same pattern.
    pub fn add_route(
        &mut self,
        method: Method,
        pattern: &str,
        operation_id: &str,
    ) -> Result<(), ContractError> {
        let route = Route::new(method, pattern, operation_id);
        let clash = self.routes.iter().find(|existing| {
            existing.method == route.method
                && same_shape(&existing.segments, &route.segments)
        });
        if let Some(existing) = clash {
            return Err(ContractError::DuplicateRoute(format!(
                "{} {} ({}) conflicts with {} ({})",
                route.method, route.pattern, route.operation_id, existing.pattern, existing.operation_id
            )));
        }
        self.routes.push(route);
        Ok(())
    }

    /// Resolves a request path.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> Resolution {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut path_known = false;

        for route in &self.routes {
            if let Some(params) = route.match_path(&segments) {
                if route.method == *method {
                    return Resolution::Matched(RouteMatch {
                        operation_id: route.operation_id.clone(),
                        params,
                    });
                }
                path_known = true;
            }
        }

        if path_known {
            Resolution::MethodNotAllowed
        } else {
            Resolution::NotFound
        }
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if no route is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn same_shape(a: &[PathSegment], b: &[PathSegment]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|pair| match pair {
            (PathSegment::Literal(x), PathSegment::Literal(y)) => x == y,
            (PathSegment::Param(_), PathSegment::Param(_)) => true,
            _ => false,
        })
}
