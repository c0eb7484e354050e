//! TCP listener handing out deadline-aware connections.
//!
//! # Responsibilities
//! - Accept incoming TCP connections
//! - Wrap each one in a [`DeadlineStream`] carrying the idle timeout

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};

use crate::net::stream::DeadlineStream;

/// A listener whose connections close when idle.
pub struct TimeoutListener {
    inner: TcpListener,
    idle_timeout: Option<Duration>,
}

impl TimeoutListener {
    /// Wrap `inner`; `None` disables the idle timeout.
    pub fn new(inner: TcpListener, idle_timeout: Option<Duration>) -> Self {
        Self {
            inner,
            idle_timeout,
        }
    }

    /// Accept the next connection.
    pub async fn accept(&self) -> io::Result<(DeadlineStream<TcpStream>, SocketAddr)> {
        let (stream, addr) = self.inner.accept().await?;
        tracing::trace!(peer_addr = %addr, "Connection accepted");
        Ok((DeadlineStream::new(stream, self.idle_timeout), addr))
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }
}
