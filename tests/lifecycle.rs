//! Startup and graceful shutdown behaviour.

use std::time::Duration;

use axum::Router;
use hello_server::config::ServerConfig;
use hello_server::http::{HttpServer, RouteLayers, ServerError};
use hello_server::lifecycle::ServerState;
use hello_server::version::BuildInfo;
use reqwest::StatusCode;
use tokio::net::{TcpListener, TcpStream};

mod common;

/// A `/slow` route behind the same middleware as the service routes.
fn slow_router(config: &ServerConfig, delay: Duration) -> Router {
    Router::new()
        .route(
            "/slow",
            RouteLayers::from_config(config).wrap(move || async move {
                tokio::time::sleep(delay).await;
                "done"
            }),
        )
        .with_state(common::app_state())
}

#[tokio::test]
async fn idle_server_shuts_down_cleanly() {
    let server = common::spawn_service().await;
    let addr = server.addr;

    let res = server.client.get(server.url("/ready")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    tokio::time::timeout(Duration::from_secs(5), server.stop())
        .await
        .expect("shutdown took too long")
        .expect("shutdown reported an error");

    assert!(
        TcpStream::connect(addr).await.is_err(),
        "listener still accepting after shutdown"
    );
}

#[tokio::test]
async fn in_flight_request_completes_during_shutdown() {
    let config = ServerConfig::default();
    let mut server = common::spawn_router(
        config.clone(),
        slow_router(&config, Duration::from_millis(400)),
        Duration::from_secs(10),
    )
    .await;

    let client = server.client.clone();
    let url = server.url("/slow");
    let request = tokio::spawn(async move { client.get(url).send().await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    server.signal();

    let res = request.await.unwrap().expect("in-flight request was dropped");
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "done");

    server.stop().await.expect("graceful shutdown failed");
}

#[tokio::test]
async fn shutdown_deadline_is_enforced() {
    let config = ServerConfig::default();
    let mut server = common::spawn_router(
        config.clone(),
        slow_router(&config, Duration::from_secs(30)),
        Duration::from_millis(300),
    )
    .await;

    let client = server.client.clone();
    let url = server.url("/slow");
    let _stuck = tokio::spawn(async move { client.get(url).send().await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    server.signal();

    let result = tokio::time::timeout(Duration::from_secs(5), server.stop())
        .await
        .expect("deadline was not enforced");

    match result {
        Err(ServerError::ShutdownTimeout(deadline)) => {
            assert_eq!(deadline, Duration::from_millis(300));
        }
        other => panic!("expected shutdown timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn handler_past_write_deadline_still_holds_shutdown() {
    let config = ServerConfig {
        write_timeout: 1,
        ..ServerConfig::default()
    };
    let mut server = common::spawn_router(
        config.clone(),
        slow_router(&config, Duration::from_secs(30)),
        Duration::from_secs(2),
    )
    .await;

    let client = server.client.clone();
    let url = server.url("/slow");
    let _stuck = tokio::spawn(async move { client.get(url).send().await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    server.signal();

    let result = tokio::time::timeout(Duration::from_secs(10), server.stop())
        .await
        .expect("deadline was not enforced");

    match result {
        Err(ServerError::ShutdownTimeout(deadline)) => {
            assert_eq!(deadline, Duration::from_secs(2));
        }
        other => panic!("handler was cut short by the write deadline: {:?}", other),
    }
}

#[tokio::test]
async fn bind_conflict_is_reported() {
    let occupied = TcpListener::bind("0.0.0.0:0").await.unwrap();
    let port = occupied.local_addr().unwrap().port();

    let config = ServerConfig {
        port,
        ..ServerConfig::default()
    };
    let server = HttpServer::new(config, BuildInfo::new("t", "t"));

    match server.bind().await {
        Err(ServerError::Bind { addr, .. }) => assert_eq!(addr.port(), port),
        other => panic!("expected bind error, got {:?}", other),
    }
}

#[tokio::test]
async fn state_walks_through_lifecycle() {
    let server = HttpServer::new(ServerConfig::default(), BuildInfo::new("t", "t"));
    assert_eq!(server.state(), ServerState::Created);

    let mut states = server.subscribe();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let (stop, stopped) = tokio::sync::oneshot::channel::<()>();

    let task = tokio::spawn(server.run(listener, async move {
        let _ = stopped.await;
    }));

    states
        .wait_for(|s| *s == ServerState::Running)
        .await
        .unwrap();

    stop.send(()).unwrap();
    task.await.unwrap().unwrap();

    assert_eq!(*states.borrow_and_update(), ServerState::Stopped);
}
