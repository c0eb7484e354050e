//! Request logging middleware.
//!
//! Wraps a handler, times it, and emits one `tracing` event per request with
//! method, path, final status, elapsed time and peer address. The status is
//! read from the response the inner service returns, so a handler that never
//! sets one is reported as 200.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request},
    handler::Handler,
    middleware::{self, Next},
    response::Response,
    routing::{any, MethodRouter},
};

/// Middleware function; use through [`logged`] or `middleware::from_fn`.
pub async fn log_request(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    // Absent when the router is driven without a socket, e.g. `oneshot` in tests.
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        duration = ?start.elapsed(),
        remote_addr = %remote_addr,
        "Request completed"
    );

    response
}

/// Register `handler` for every method, wrapped in request logging.
pub fn logged<H, T, S>(handler: H) -> MethodRouter<S>
where
    H: Handler<T, S>,
    T: 'static,
    S: Clone + Send + Sync + 'static,
{
    any(handler).layer(middleware::from_fn(log_request))
}
