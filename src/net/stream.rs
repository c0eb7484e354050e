//! Connection streams with idle and write deadlines.
//!
//! # Responsibilities
//! - Close connections that see no socket activity for the idle timeout
//! - Fail response writes that start after the request's write deadline
//!
//! A [`ConnectionClock`] is shared between a connection's stream and the
//! service answering its requests. The service marks requests in flight and
//! arms the write deadline; the stream enforces both. Handlers are never
//! cancelled by either deadline: a late response fails at the socket and the
//! connection closes once the handler returns.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::time::{Instant, Sleep};

/// Per-connection request bookkeeping shared with [`DeadlineStream`].
#[derive(Debug, Clone)]
pub struct ConnectionClock {
    inner: Arc<ClockState>,
}

#[derive(Debug)]
struct ClockState {
    epoch: Instant,
    /// Nanoseconds after `epoch`; zero when no deadline is armed.
    write_deadline: AtomicU64,
    in_flight: AtomicUsize,
}

impl ConnectionClock {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ClockState {
                epoch: Instant::now(),
                write_deadline: AtomicU64::new(0),
                in_flight: AtomicUsize::new(0),
            }),
        }
    }

    /// Record that a request has been read.
    ///
    /// Its response must be written within `write_timeout`, if set. The
    /// request counts as in flight until the returned guard is dropped.
    pub fn begin_request(&self, write_timeout: Option<Duration>) -> InFlight {
        let armed = match write_timeout {
            Some(timeout) => {
                let at = self.inner.epoch.elapsed().saturating_add(timeout);
                u64::try_from(at.as_nanos()).unwrap_or(u64::MAX).max(1)
            }
            None => 0,
        };
        self.inner.write_deadline.store(armed, Ordering::SeqCst);
        self.inner.in_flight.fetch_add(1, Ordering::SeqCst);
        InFlight {
            clock: self.clone(),
        }
    }

    /// Deadline for the current response, if one is armed.
    pub fn write_deadline(&self) -> Option<Instant> {
        match self.inner.write_deadline.load(Ordering::SeqCst) {
            0 => None,
            nanos => Some(self.inner.epoch + Duration::from_nanos(nanos)),
        }
    }

    /// Whether a handler is currently running on this connection.
    pub fn is_busy(&self) -> bool {
        self.inner.in_flight.load(Ordering::SeqCst) > 0
    }
}

impl Default for ConnectionClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard for a request in flight. Decrements the count on drop.
#[derive(Debug)]
pub struct InFlight {
    clock: ConnectionClock,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.clock.inner.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Stream wrapper enforcing the idle timeout and the write deadline.
pub struct DeadlineStream<S> {
    inner: S,
    clock: ConnectionClock,
    idle_timeout: Option<Duration>,
    idle: Pin<Box<Sleep>>,
    write_timer: Pin<Box<Sleep>>,
}

impl<S> DeadlineStream<S> {
    pub fn new(inner: S, idle_timeout: Option<Duration>) -> Self {
        let idle_in = idle_timeout.unwrap_or(Duration::ZERO);
        Self {
            inner,
            clock: ConnectionClock::new(),
            idle_timeout,
            idle: Box::pin(tokio::time::sleep(idle_in)),
            write_timer: Box::pin(tokio::time::sleep(Duration::ZERO)),
        }
    }

    /// Handle for the service answering requests on this stream.
    pub fn clock(&self) -> ConnectionClock {
        self.clock.clone()
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    fn touch(&mut self) {
        if let Some(timeout) = self.idle_timeout {
            self.idle.as_mut().reset(Instant::now() + timeout);
        }
    }

    fn poll_idle(&mut self, cx: &mut Context<'_>) -> Poll<io::Error> {
        let Some(timeout) = self.idle_timeout else {
            return Poll::Pending;
        };
        if self.idle.as_mut().poll(cx).is_pending() {
            return Poll::Pending;
        }
        if self.clock.is_busy() {
            // A handler is still computing; the connection is not idle.
            self.idle.as_mut().reset(Instant::now() + timeout);
            let _ = self.idle.as_mut().poll(cx);
            return Poll::Pending;
        }
        tracing::debug!(timeout = ?timeout, "Closing idle connection");
        Poll::Ready(io::Error::new(
            io::ErrorKind::TimedOut,
            "connection idle timeout",
        ))
    }

    fn poll_write_deadline(&mut self, cx: &mut Context<'_>) -> Poll<io::Error> {
        let Some(deadline) = self.clock.write_deadline() else {
            return Poll::Pending;
        };
        if self.write_timer.deadline() != deadline {
            self.write_timer.as_mut().reset(deadline);
        }
        match self.write_timer.as_mut().poll(cx) {
            Poll::Ready(()) => {
                tracing::debug!("Write deadline exceeded, closing connection");
                Poll::Ready(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "response write deadline exceeded",
                ))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for DeadlineStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_read(cx, buf) {
            Poll::Ready(result) => {
                this.touch();
                Poll::Ready(result)
            }
            Poll::Pending => this.poll_idle(cx).map(Err),
        }
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for DeadlineStream<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if let Poll::Ready(err) = this.poll_write_deadline(cx) {
            return Poll::Ready(Err(err));
        }
        match Pin::new(&mut this.inner).poll_write(cx, buf) {
            Poll::Ready(result) => {
                this.touch();
                Poll::Ready(result)
            }
            Poll::Pending => this.poll_idle(cx).map(Err),
        }
    }

    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if let Poll::Ready(err) = this.poll_write_deadline(cx) {
            return Poll::Ready(Err(err));
        }
        match Pin::new(&mut this.inner).poll_write_vectored(cx, bufs) {
            Poll::Ready(result) => {
                this.touch();
                Poll::Ready(result)
            }
            Poll::Pending => this.poll_idle(cx).map(Err),
        }
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }

    // Flushes carry no new response bytes, so only the idle clock applies.
    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_flush(cx) {
            Poll::Ready(result) => Poll::Ready(result),
            Poll::Pending => this.poll_idle(cx).map(Err),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}
