//! hello-server
//!
//! A small HTTP service answering greeting, health, readiness and metrics
//! checks, built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │                 HELLO SERVER                  │
//!  Client Request    │  ┌──────────┐   ┌──────────┐   ┌──────────┐  │
//!  ──────────────────┼─▶│   net    │──▶│ logging  │──▶│ handlers │  │
//!                    │  │ listener │   │middleware│   │  (GET)   │  │
//!                    │  └──────────┘   └──────────┘   └────┬─────┘  │
//!  Client Response   │                                     │        │
//!  ◀─────────────────┼─────────── JSON body ◀──────────────┘        │
//!                    │                                              │
//!                    │  ┌────────┐ ┌─────────┐ ┌──────────────────┐  │
//!                    │  │ config │ │ version │ │    lifecycle     │  │
//!                    │  │ (env)  │ │  info   │ │ signals/shutdown │  │
//!                    │  └────────┘ └─────────┘ └──────────────────┘  │
//!                    └──────────────────────────────────────────────┘
//! ```
//!
//! # Exit Codes
//! - 0: clean shutdown after SIGINT/SIGTERM
//! - 1: bind failure, or in-flight requests outlived the shutdown deadline

use std::process::ExitCode;

use hello_server::config::ServerConfig;
use hello_server::http::HttpServer;
use hello_server::lifecycle::shutdown_signal;
use hello_server::observability;
use hello_server::version::BuildInfo;

#[tokio::main]
async fn main() -> ExitCode {
    observability::logging::init();

    let build = BuildInfo::from_build_env();
    tracing::info!(
        version = %build.version,
        build_time = %build.build_time,
        runtime = %build.runtime,
        "hello-server starting"
    );

    let config = ServerConfig::from_env();
    let config_json = serde_json::to_string(&config).unwrap_or_else(|_| format!("{:?}", config));
    tracing::info!(config = %config_json, "Configuration loaded");

    let server = HttpServer::new(config, build);

    let listener = match server.bind().await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, "Server failed to start");
            return ExitCode::FAILURE;
        }
    };

    match server.run(listener, shutdown_signal()).await {
        Ok(()) => {
            tracing::info!("Application exited successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Server shutdown failed");
            ExitCode::FAILURE
        }
    }
}
