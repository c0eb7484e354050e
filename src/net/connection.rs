//! Accept loop and per-connection HTTP/1.1 serving.
//!
//! # Responsibilities
//! - Drive hyper's HTTP/1 state machine over each accepted stream
//! - Bound request header reads with the read timeout
//! - Arm the write deadline when a request has been read
//! - Attach the peer address for request logging
//! - Drain open connections when asked to stop
//!
//! # Data Flow
//! ```text
//! TimeoutListener::accept
//!     → DeadlineStream (idle timeout, write deadline)
//!     → hyper http1 connection (header read timeout)
//!     → ConnectionService (ConnectInfo, in-flight guard)
//!     → axum Router
//! ```

use std::convert::Infallible;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::time::Duration;

use axum::extract::ConnectInfo;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tower::ServiceExt;

use crate::config::ServerConfig;
use crate::net::listener::TimeoutListener;
use crate::net::stream::ConnectionClock;

/// Pause after an accept error that is not specific to one connection,
/// e.g. running out of file descriptors.
const ACCEPT_BACKOFF: Duration = Duration::from_secs(1);

/// Connection deadlines. `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionTimeouts {
    /// Time allowed to read request headers.
    pub read: Option<Duration>,
    /// Time allowed from reading a request to writing its response.
    pub write: Option<Duration>,
    /// Time a connection may sit with no socket activity.
    pub idle: Option<Duration>,
}

impl ConnectionTimeouts {
    /// Timeouts from configuration; a zero value disables that timeout.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            read: enabled(config.read_timeout()),
            write: enabled(config.write_timeout()),
            idle: enabled(config.idle_timeout()),
        }
    }
}

fn enabled(timeout: Duration) -> Option<Duration> {
    (!timeout.is_zero()).then_some(timeout)
}

/// hyper service answering one connection's requests with the router.
#[derive(Clone)]
pub struct ConnectionService {
    router: Router,
    peer: SocketAddr,
    clock: ConnectionClock,
    write_timeout: Option<Duration>,
}

impl ConnectionService {
    pub fn new(
        router: Router,
        peer: SocketAddr,
        clock: ConnectionClock,
        write_timeout: Option<Duration>,
    ) -> Self {
        Self {
            router,
            peer,
            clock,
            write_timeout,
        }
    }
}

impl hyper::service::Service<Request<Incoming>> for ConnectionService {
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn call(&self, mut request: Request<Incoming>) -> Self::Future {
        let in_flight = self.clock.begin_request(self.write_timeout);
        request.extensions_mut().insert(ConnectInfo(self.peer));
        let router = self.router.clone();

        Box::pin(async move {
            let response = router.oneshot(request).await;
            drop(in_flight);
            response
        })
    }
}

/// Serve `router` on `listener` until `stop` resolves, then drain.
///
/// After `stop` the listener is closed, idle connections are closed, and
/// connections with a request in flight finish that request first. The
/// returned future completes once every connection is gone; dropping it
/// aborts whatever is left.
pub async fn serve<F>(listener: TcpListener, router: Router, timeouts: ConnectionTimeouts, stop: F)
where
    F: Future<Output = ()> + Send,
{
    let listener = TimeoutListener::new(listener, timeouts.idle);

    let mut http = http1::Builder::new();
    http.timer(TokioTimer::new())
        .header_read_timeout(timeouts.read);

    let graceful = GracefulShutdown::new();
    let mut connections = JoinSet::new();
    tokio::pin!(stop);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        backoff_after(e).await;
                        continue;
                    }
                };

                let service = ConnectionService::new(router.clone(), peer, stream.clock(), timeouts.write);
                let conn = graceful.watch(http.serve_connection(TokioIo::new(stream), service));
                connections.spawn(async move {
                    if let Err(e) = conn.await {
                        tracing::debug!(peer_addr = %peer, error = %e, "Connection closed with error");
                    }
                });
            }
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            _ = &mut stop => break,
        }
    }

    drop(listener);
    tracing::debug!(open_connections = connections.len(), "Listener closed, draining connections");

    graceful.shutdown().await;
    while connections.join_next().await.is_some() {}
}

async fn backoff_after(e: io::Error) {
    if matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    ) {
        tracing::debug!(error = %e, "Connection failed during accept");
        return;
    }
    tracing::error!(error = %e, backoff = ?ACCEPT_BACKOFF, "Accept failed");
    tokio::time::sleep(ACCEPT_BACKOFF).await;
}
