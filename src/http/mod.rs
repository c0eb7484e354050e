//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (net: deadlines, hyper HTTP/1)
//!     → server.rs (Axum router, per-route logging and body deadline)
//!     → middleware/logging.rs (timing, one log event per request)
//!     → handlers.rs (GET-only endpoints)
//!     → response.rs (JSON bodies, hardening headers)
//!     → Send to client
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, AppState, HttpServer, RouteLayers, ServerError};
