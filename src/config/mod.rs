//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! process environment (PORT, READ_TIMEOUT, ...)
//!     → loader.rs (lookup & parse, defaults on failure)
//!     → ServerConfig (immutable)
//!     → owned by the HTTP server
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - Every field has a default; malformed values are ignored, never reported

pub mod loader;
pub mod schema;

pub use schema::ServerConfig;
