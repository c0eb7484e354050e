//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! State (state.rs):
//!     Created → Running → ShuttingDown → Stopped
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → resolve the shutdown future
//!
//! Shutdown (shutdown.rs):
//!     Trigger → stop accepting → drain connections (bounded) → exit
//! ```
//!
//! # Design Decisions
//! - Startup failures are fatal
//! - Shutdown has a deadline: the accept task is aborted when it expires

pub mod shutdown;
pub mod signals;
pub mod state;

pub use shutdown::{Shutdown, DEFAULT_SHUTDOWN_TIMEOUT};
pub use signals::shutdown_signal;
pub use state::{Lifecycle, ServerState};
