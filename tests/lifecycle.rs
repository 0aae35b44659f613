mod common;

use std::time::Duration;

use localserve::{Error, LocalhostServer, Method, Request, Response, ServerConfig};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use common::{free_port, get};

async fn hello(_req: Request) -> Response {
    Response::text("hello")
}

fn server(port: u16) -> LocalhostServer {
    let mut server = LocalhostServer::new(ServerConfig::new(port)).unwrap();
    server.serve_raw_route(Method::Get, "/hello", hello).unwrap();
    server
}

#[test]
fn port_zero_is_invalid() {
    assert!(matches!(
        LocalhostServer::new(ServerConfig::new(0)),
        Err(Error::InvalidPort(0))
    ));
}

#[tokio::test]
async fn binds_loopback_on_configured_port() {
    let port = free_port();
    let mut server = server(port);
    assert!(!server.is_listening());
    assert_eq!(server.local_addr(), None);

    let addr = server.start().await.unwrap();
    assert!(addr.ip().is_loopback());
    assert_eq!(addr.port(), port);
    assert_eq!(server.local_addr(), Some(addr));
    assert!(server.is_listening());

    assert_eq!(get(addr, "/hello").await.body, b"hello");
    server.stop().await.unwrap();
}

#[tokio::test]
async fn double_start_fails_without_rebinding() {
    let mut server = server(free_port());
    let addr = server.start().await.unwrap();

    assert!(matches!(server.start().await, Err(Error::AlreadyListening)));
    // The original socket is still serving.
    assert_eq!(get(addr, "/hello").await.status, 200);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn stop_requires_listening() {
    let mut server = server(free_port());
    assert!(matches!(server.stop().await, Err(Error::NotListening)));

    server.start().await.unwrap();
    server.stop().await.unwrap();
    assert!(matches!(server.stop().await, Err(Error::NotListening)));
}

#[tokio::test]
async fn restart_accepts_new_connections() {
    let mut server = server(free_port());
    let addr = server.start().await.unwrap();
    assert_eq!(get(addr, "/hello").await.status, 200);

    server.stop().await.unwrap();
    assert!(!server.is_listening());
    assert!(TcpStream::connect(addr).await.is_err());

    let again = server.start().await.unwrap();
    assert_eq!(again, addr);
    assert_eq!(get(again, "/hello").await.body, b"hello");
    server.stop().await.unwrap();
}

#[tokio::test]
async fn stop_aborts_stalled_connections_after_timeout() {
    let mut server = LocalhostServer::new(
        ServerConfig::new(free_port()).shutdown_timeout(Duration::from_millis(200)),
    )
    .unwrap();
    let addr = server.start().await.unwrap();

    // A connection that never finishes its request head.
    let mut stalled = TcpStream::connect(addr).await.unwrap();
    stalled.write_all(b"GET /hello HTTP/1.1\r\n").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let stopped = tokio::time::timeout(Duration::from_secs(3), server.stop()).await;
    assert!(matches!(stopped, Ok(Ok(()))));
}

#[tokio::test]
async fn routes_added_while_listening_apply_after_restart() {
    let mut server = LocalhostServer::new(ServerConfig::new(free_port())).unwrap();
    let addr = server.start().await.unwrap();

    server.serve_raw_route(Method::Get, "/late", hello).unwrap();
    assert_eq!(get(addr, "/late").await.status, 404);

    server.stop().await.unwrap();
    let addr = server.start().await.unwrap();
    assert_eq!(get(addr, "/late").await.status, 200);
    server.stop().await.unwrap();
}
