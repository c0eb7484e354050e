//! Minimal HTTP status service library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod version;

pub use config::ServerConfig;
pub use http::{HttpServer, ServerError};
pub use lifecycle::ServerState;
pub use version::BuildInfo;
