//! Shared utilities for integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::Router;
use hello_server::config::ServerConfig;
use hello_server::http::{AppState, HttpServer, ServerError};
use hello_server::version::BuildInfo;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub const TEST_VERSION: &str = "9.9.9-test";
pub const TEST_BUILD_TIME: &str = "2024-06-01T12:00:00Z";

/// A server running on an ephemeral localhost port.
#[allow(dead_code)]
pub struct TestServer {
    pub addr: SocketAddr,
    pub started: Instant,
    pub client: reqwest::Client,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<(), ServerError>>,
}

#[allow(dead_code)]
impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Deliver the shutdown signal without waiting for the result.
    pub fn signal(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }

    /// Deliver the shutdown signal and wait for `run` to return.
    pub async fn stop(mut self) -> Result<(), ServerError> {
        self.signal();
        self.task.await.expect("server task panicked")
    }
}

/// Start the service routes with default configuration.
#[allow(dead_code)]
pub async fn spawn_service() -> TestServer {
    let started = Instant::now();
    let server = HttpServer::new(
        ServerConfig::default(),
        BuildInfo::new(TEST_VERSION, TEST_BUILD_TIME),
    );
    spawn(server, started).await
}

/// Start the service routes with `config`.
#[allow(dead_code)]
pub async fn spawn_configured(config: ServerConfig) -> TestServer {
    let server = HttpServer::new(config, BuildInfo::new(TEST_VERSION, TEST_BUILD_TIME));
    spawn(server, Instant::now()).await
}

/// Start `router` with `config` and the given shutdown deadline.
#[allow(dead_code)]
pub async fn spawn_router(
    config: ServerConfig,
    router: Router,
    shutdown_timeout: Duration,
) -> TestServer {
    let server = HttpServer::with_router(config, router).with_shutdown_timeout(shutdown_timeout);
    spawn(server, Instant::now()).await
}

/// State for routers built in tests.
#[allow(dead_code)]
pub fn app_state() -> AppState {
    AppState::new(BuildInfo::new(TEST_VERSION, TEST_BUILD_TIME))
}

async fn spawn(server: HttpServer, started: Instant) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();

    let task = tokio::spawn(server.run(listener, wait_for(stopped)));

    let client = reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap();

    TestServer {
        addr,
        started,
        client,
        stop: Some(stop),
        task,
    }
}

fn wait_for(rx: oneshot::Receiver<()>) -> impl Future<Output = ()> + Send {
    async move {
        let _ = rx.await;
    }
}

/// Parse an uptime string such as `1h 2m 3.456s` back into a duration.
#[allow(dead_code)]
pub fn parse_uptime(uptime: &str) -> Duration {
    let mut total = Duration::ZERO;
    for part in uptime.split_whitespace() {
        if let Some(h) = part.strip_suffix('h') {
            total += Duration::from_secs(h.parse::<u64>().unwrap() * 3600);
        } else if let Some(m) = part.strip_suffix('m') {
            total += Duration::from_secs(m.parse::<u64>().unwrap() * 60);
        } else if let Some(s) = part.strip_suffix('s') {
            total += Duration::from_secs_f64(s.parse::<f64>().unwrap());
        } else {
            panic!("unexpected uptime component {:?} in {:?}", part, uptime);
        }
    }
    total
}
