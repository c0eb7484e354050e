//! HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wrap each route in request logging and the body read deadline
//! - Bind the listener and serve in a background task
//! - Drain connections on shutdown, within a deadline

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{handler::Handler, routing::MethodRouter, Router};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinError;
use tower_http::timeout::RequestBodyTimeoutLayer;

use crate::config::ServerConfig;
use crate::http::handlers;
use crate::http::middleware::logged;
use crate::lifecycle::shutdown::{drain, Drain};
use crate::lifecycle::{Lifecycle, ServerState, Shutdown, DEFAULT_SHUTDOWN_TIMEOUT};
use crate::net::{self, ConnectionTimeouts};
use crate::version::BuildInfo;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub build: Arc<BuildInfo>,
    pub started_at: Instant,
}

impl AppState {
    /// State for a process that starts now.
    pub fn new(build: BuildInfo) -> Self {
        Self {
            build: Arc::new(build),
            started_at: Instant::now(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Fatal server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] io::Error),

    #[error("server task failed: {0}")]
    Task(#[from] JoinError),

    #[error("graceful shutdown did not finish within {0:?}")]
    ShutdownTimeout(Duration),
}

/// HTTP server for the service.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
    shutdown_timeout: Duration,
    lifecycle: Lifecycle,
}

impl HttpServer {
    /// Create a server exposing the service routes.
    pub fn new(config: ServerConfig, build: BuildInfo) -> Self {
        let router = build_router(&config, AppState::new(build));
        Self::with_router(config, router)
    }

    /// Create a server around an arbitrary router.
    pub fn with_router(config: ServerConfig, router: Router) -> Self {
        Self {
            router,
            config,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            lifecycle: Lifecycle::new(),
        }
    }

    /// Override the graceful shutdown deadline.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn state(&self) -> ServerState {
        self.lifecycle.current()
    }

    /// Watch lifecycle transitions.
    pub fn subscribe(&self) -> watch::Receiver<ServerState> {
        self.lifecycle.subscribe()
    }

    /// Bind the configured port on all interfaces.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let addr = self.config.bind_address();
        TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })
    }

    /// Serve on `listener` until `signal` resolves, then shut down gracefully.
    ///
    /// Returns [`ServerError::ShutdownTimeout`] when in-flight requests do not
    /// finish within the shutdown deadline. Remaining connections are aborted
    /// in that case.
    pub async fn run<F>(self, listener: TcpListener, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send,
    {
        let addr = listener.local_addr().map_err(ServerError::Serve)?;
        let timeouts = ConnectionTimeouts::from_config(&self.config);

        let shutdown = Shutdown::new();
        let mut serve_task = tokio::spawn(net::serve(
            listener,
            self.router,
            timeouts,
            shutdown.notified(),
        ));

        self.lifecycle.transition(ServerState::Running);
        tracing::info!(
            address = %addr,
            read_timeout = ?timeouts.read,
            write_timeout = ?timeouts.write,
            idle_timeout = ?timeouts.idle,
            "HTTP server listening"
        );

        tokio::select! {
            result = &mut serve_task => {
                self.lifecycle.transition(ServerState::Stopped);
                tracing::error!("HTTP server stopped unexpectedly");
                return result.map_err(ServerError::Task);
            }
            _ = signal => {}
        }

        self.lifecycle.transition(ServerState::ShuttingDown);
        tracing::info!(deadline = ?self.shutdown_timeout, "Shutting down server...");
        shutdown.trigger();

        let outcome = drain(serve_task, self.shutdown_timeout).await;
        self.lifecycle.transition(ServerState::Stopped);

        match outcome {
            Drain::Completed(()) => {
                tracing::info!("Server stopped gracefully");
                Ok(())
            }
            Drain::Failed(e) => Err(ServerError::Task(e)),
            Drain::TimedOut => Err(ServerError::ShutdownTimeout(self.shutdown_timeout)),
        }
    }
}

/// Build the Axum router with every route wrapped in logging and deadlines.
pub fn build_router(config: &ServerConfig, state: AppState) -> Router {
    let routes = RouteLayers::from_config(config);

    Router::new()
        .route("/", routes.wrap(handlers::root))
        .route("/hello", routes.wrap(handlers::hello))
        .route("/health", routes.wrap(handlers::health))
        .route("/ready", routes.wrap(handlers::ready))
        .route("/metrics", routes.wrap(handlers::metrics))
        .fallback_service(routes.wrap(handlers::not_found).with_state::<()>(state.clone()))
        .with_state(state)
}

/// Per-route middleware stack.
///
/// Logging is outermost so every request is logged, including those whose
/// body read times out. Header read and response write deadlines are enforced
/// per connection (see [`crate::net`]).
#[derive(Debug, Clone, Copy)]
pub struct RouteLayers {
    body_timeout: Option<Duration>,
}

impl RouteLayers {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            body_timeout: ConnectionTimeouts::from_config(config).read,
        }
    }

    /// Register `handler` for every method with the service middleware.
    pub fn wrap<H, T>(&self, handler: H) -> MethodRouter<AppState>
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        match self.body_timeout {
            Some(timeout) => logged(handler.layer(RequestBodyTimeoutLayer::new(timeout))),
            None => logged(handler),
        }
    }
}
