//! ---
//! mkp_section: "03-observability-logging"
//! mkp_subsection: "module"
//! mkp_type: "source"
//! mkp_scope: "code"
//! mkp_description: "Metrics collection and export utilities."
//! mkp_version: "v0.0.0-prealpha"
//! mkp_owner: "tbd"
//! ---
use std::net::SocketAddr;

use mkp_metrics::{new_registry, spawn_http_server, DaemonMetrics};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn scrape_endpoint_serves_registered_metrics() {
    let registry = new_registry();
    let daemon = DaemonMetrics::new(registry.clone()).expect("daemon metrics");
    daemon.inc_start();
    daemon.set_build_info("0.1.0", "debug");

    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let server = spawn_http_server(registry, addr).expect("server");
    assert_ne!(server.addr().port(), 0);

    let mut stream = TcpStream::connect(server.addr()).await.expect("connect");
    stream
        .write_all(b"GET /metrics HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");

    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains("mkpd_starts_total 1"));
    assert!(response.contains(r#"mkpd_build_info{profile="debug",version="0.1.0"} 1"#));

    server.shutdown().await.expect("shutdown");
}
