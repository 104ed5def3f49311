//! HTTP transport.
//!
//! A hyper HTTP/1 server on tokio. Each request body is collected up to
//! the configured size limit and handed to [`App::dispatch`]; body
//! collection and dispatch each run under the request timeout.
//!
//! # Example
//!
//! ```rust,no_run
//! use tessera_config::TesseraConfig;
//! use tessera_server::{demo_app, AppState, Server};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TesseraConfig::default();
//! let app = demo_app(&config, AppState::default())?;
//! Server::new(app, &config.server).run().await?;
//! # Ok(())
//! # }
//! ```

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use tessera_config::ServerConfig;

use crate::response::detail_response;
use crate::{App, ServerError};

/// The HTTP server.
#[derive(Debug)]
pub struct Server {
    app: Arc<App>,
    http_addr: String,
    request_timeout: Duration,
    shutdown_timeout: Duration,
}

impl Server {
    /// Creates a server for `app` with the given transport settings.
    #[must_use]
    pub fn new(app: App, config: &ServerConfig) -> Self {
        Self {
            app: Arc::new(app),
            http_addr: config.http_addr.clone(),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            shutdown_timeout: Duration::from_secs(config.shutdown_timeout_secs),
        }
    }

    /// Binds the configured address.
    ///
    /// # Errors
    ///
    /// [`ServerError::Bind`] if the address is invalid or in use.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let addr: SocketAddr = self.http_addr.parse().map_err(|e| {
            ServerError::Bind(format!("invalid address '{}': {e}", self.http_addr))
        })?;
        TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(format!("failed to bind to {addr}: {e}")))
    }

    /// Serves until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        self.serve(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for Ctrl-C");
            }
        })
        .await
    }

    /// Serves connections from `listener` until `shutdown` resolves, then
    /// waits up to the shutdown timeout for in-flight connections.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener address cannot be read.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), ServerError> {
        info!(addr = %listener.local_addr()?, "server listening");

        let graceful = GracefulShutdown::new();
        let handler = Arc::new(RequestHandler {
            app: Arc::clone(&self.app),
            request_timeout: self.request_timeout,
        });
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, remote) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            error!(error = %e, "failed to accept connection");
                            continue;
                        }
                    };

                    let handler = Arc::clone(&handler);
                    let service = service_fn(move |request: Request<Incoming>| {
                        let handler = Arc::clone(&handler);
                        async move { Ok::<_, Infallible>(handler.handle(request).await) }
                    });
                    let connection = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service);
                    let connection = graceful.watch(connection);

                    tokio::spawn(async move {
                        if let Err(e) = connection.await {
                            debug!(%remote, error = %e, "connection closed with error");
                        }
                    });
                }

                () = &mut shutdown => {
                    info!("shutdown signal received, stopping server");
                    break;
                }
            }
        }

        drop(listener);
        tokio::select! {
            () = graceful.shutdown() => info!("all connections closed"),
            () = tokio::time::sleep(self.shutdown_timeout) => {
                warn!(timeout = ?self.shutdown_timeout, "shutdown timeout reached with connections still open");
            }
        }
        info!("server stopped");
        Ok(())
    }
}

struct RequestHandler {
    app: Arc<App>,
    request_timeout: Duration,
}

impl RequestHandler {
    async fn handle(&self, request: Request<Incoming>) -> Response<Full<Bytes>> {
        let (head, body) = request.into_parts();
        let limit = self.app.max_body_bytes();

        let collected =
            tokio::time::timeout(self.request_timeout, Limited::new(body, limit).collect()).await;
        let body = match collected {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(e)) if e.downcast_ref::<LengthLimitError>().is_some() => {
                return detail_response(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    &format!("payload too large: max {limit} bytes"),
                )
                .map(Full::new);
            }
            Ok(Err(e)) => {
                warn!(error = %e, "failed to read request body");
                return detail_response(StatusCode::BAD_REQUEST, "Failed to read request body")
                    .map(Full::new);
            }
            Err(_) => {
                warn!("request body collection timed out");
                return detail_response(StatusCode::REQUEST_TIMEOUT, "Request body collection timed out")
                    .map(Full::new);
            }
        };

        let request = Request::from_parts(head, body);
        match tokio::time::timeout(self.request_timeout, self.app.dispatch(request)).await {
            Ok(response) => response.map(Full::new),
            Err(_) => {
                warn!("request handling timed out");
                detail_response(StatusCode::GATEWAY_TIMEOUT, "Request handling timed out")
                    .map(Full::new)
            }
        }
    }
}
