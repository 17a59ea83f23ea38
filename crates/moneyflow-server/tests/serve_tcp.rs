//! The server over a real socket.

use std::sync::Arc;
use std::time::Duration;

use http::{Method, StatusCode};
use moneyflow_middleware::{handler_fn, Chain, Response, ResponseExt};
use moneyflow_server::{
    App, Server, ServerConfig, ShutdownSignal, BODY_TOO_LARGE_MESSAGE, TIMEOUT_MESSAGE,
};
use moneyflow_store::{Executor, MemoryDb, Scope, StoreError, Transactor, TxStats};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

async fn send(addr: std::net::SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();
    raw
}

async fn get(addr: std::net::SocketAddr, path: &str) -> String {
    send(
        addr,
        &format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"),
    )
    .await
}

fn app(shutdown: &ShutdownSignal, db: &Arc<MemoryDb>) -> App {
    let mut app = App::new(shutdown.clone(), Chain::new());
    app.handle(
        Method::GET,
        "v1",
        "/ping",
        handler_fn(|_ctx, _req| Box::pin(async { Ok(Response::json(StatusCode::OK, &"pong")) })),
        &[],
    )
    .unwrap();
    app.handle(
        Method::GET,
        "v1",
        "/slow",
        handler_fn(|ctx, _req| {
            Box::pin(async move {
                ctx.cancellation().cancelled().await;
                Ok(Response::no_content())
            })
        }),
        &[],
    )
    .unwrap();
    let db = Arc::clone(db);
    app.handle(
        Method::POST,
        "v1",
        "/stuck",
        handler_fn(move |ctx, _req| {
            let scope = Scope::new(Arc::clone(&db)).with_cancellation(ctx.cancellation().clone());
            Box::pin(async move {
                let _: Result<(), StoreError> = scope
                    .within_transaction(|tx| async move {
                        tx.handle().insert("notes", "n-1", json!({"id": "n-1"})).await?;
                        std::future::pending::<()>().await;
                        Ok(())
                    })
                    .await;
                Ok(Response::no_content())
            })
        }),
        &[],
    )
    .unwrap();
    app.handle(
        Method::POST,
        "v1",
        "/echo",
        handler_fn(|_ctx, req| {
            Box::pin(async move { Ok(Response::json(StatusCode::OK, &req.body().len())) })
        }),
        &[],
    )
    .unwrap();
    app
}

#[tokio::test]
async fn test_serves_probes_routes_and_deadlines() {
    let shutdown = ShutdownSignal::new();
    let config = ServerConfig::builder()
        .request_timeout(Duration::from_millis(200))
        .shutdown_timeout(Duration::from_secs(2))
        .build();
    let server = Server::new(config, app(&shutdown, &Arc::new(MemoryDb::new())));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let serving = tokio::spawn(server.serve(listener));

    let liveness = get(addr, "/liveness").await;
    assert!(liveness.starts_with("HTTP/1.1 200"), "{liveness}");
    assert!(liveness.contains("\"status\":\"up\""));

    let ping = get(addr, "/v1/ping").await;
    assert!(ping.starts_with("HTTP/1.1 200"), "{ping}");
    assert!(ping.contains("x-trace-id"));
    assert!(ping.ends_with("\"pong\""));

    let missing = get(addr, "/v1/missing").await;
    assert!(missing.starts_with("HTTP/1.1 404"), "{missing}");

    let slow = get(addr, "/v1/slow").await;
    assert!(slow.starts_with("HTTP/1.1 504"), "{slow}");
    assert!(slow.contains(TIMEOUT_MESSAGE));

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), serving)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_deadline_rolls_back_open_transaction() {
    let shutdown = ShutdownSignal::new();
    let db = Arc::new(MemoryDb::new());
    let config = ServerConfig::builder()
        .request_timeout(Duration::from_millis(100))
        .cancel_grace(Duration::from_secs(2))
        .build();
    let server = Server::new(config, app(&shutdown, &db));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let serving = tokio::spawn(server.serve(listener));

    let stuck = send(
        addr,
        "POST /v1/stuck HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(stuck.starts_with("HTTP/1.1 504"), "{stuck}");
    assert_eq!(
        db.stats(),
        TxStats {
            begun: 1,
            committed: 0,
            rolled_back: 1,
        }
    );
    assert!(db.handle().fetch_by_id("notes", "n-1").await.unwrap().is_none());

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), serving)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_rejects_oversized_body() {
    let shutdown = ShutdownSignal::new();
    let config = ServerConfig::builder().max_body_bytes(16).build();
    let server = Server::new(config, app(&shutdown, &Arc::new(MemoryDb::new())));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let serving = tokio::spawn(server.serve(listener));

    let small = send(
        addr,
        "POST /v1/echo HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
    )
    .await;
    assert!(small.starts_with("HTTP/1.1 200"), "{small}");
    assert!(small.ends_with('5'), "{small}");

    // The declared length alone trips the limit.
    let large = send(
        addr,
        "POST /v1/echo HTTP/1.1\r\nHost: localhost\r\nContent-Length: 4096\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(large.starts_with("HTTP/1.1 413"), "{large}");
    assert!(large.contains(BODY_TOO_LARGE_MESSAGE));

    // Chunked bodies carry no length and are cut off while streaming.
    let body = "a".repeat(64);
    let chunked = send(
        addr,
        &format!(
            "POST /v1/echo HTTP/1.1\r\nHost: localhost\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n40\r\n{body}\r\n0\r\n\r\n"
        ),
    )
    .await;
    assert!(chunked.starts_with("HTTP/1.1 413"), "{chunked}");
    assert!(chunked.contains(BODY_TOO_LARGE_MESSAGE));

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), serving)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}
