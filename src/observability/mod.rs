//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request middleware, lifecycle, startup
//!     → tracing events
//!     → logging.rs subscriber (env filter + fmt layer)
//!     → stdout
//! ```

pub mod logging;
