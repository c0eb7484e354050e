//! Network layer.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept, attach idle timeout)
//!     → stream.rs (idle timeout, write deadline)
//!     → connection.rs (hyper HTTP/1, header read timeout, drain)
//!     → axum Router
//! ```

pub mod connection;
pub mod listener;
pub mod stream;

pub use connection::{serve, ConnectionService, ConnectionTimeouts};
pub use listener::TimeoutListener;
pub use stream::{ConnectionClock, DeadlineStream, InFlight};
