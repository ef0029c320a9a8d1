use axum::{extract::Path, http::StatusCode, response::IntoResponse, routing::get, Router};
use cinfo::error::LookupError;
use cinfo::lookup::{HttpLookup, Lookup};
use cinfo::output::MemorySink;
use cinfo::pipeline::Pipeline;
use cinfo::types::{Config, LookupSettings, OutputMode};
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

const KNOWN: &str = r#"{"cpes":["cpe:/a:openbsd:openssh"],"hostnames":["dns.example"],"ip":"192.0.2.53","ports":[22,53],"tags":["cloud"],"vulns":["CVE-2023-38408"]}"#;

async fn host(Path(ip): Path<String>) -> impl IntoResponse {
    match ip.as_str() {
        "192.0.2.53" => (StatusCode::OK, KNOWN.to_string()),
        "192.0.2.99" => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            (StatusCode::OK, "{}".to_string())
        }
        _ => (
            StatusCode::NOT_FOUND,
            r#"{"detail":"No information available"}"#.to_string(),
        ),
    }
}

/// Serve a minimal host intelligence API on an ephemeral local port.
async fn spawn_service() -> SocketAddr {
    let app = Router::new().route("/{ip}", get(host));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn settings(addr: SocketAddr) -> LookupSettings {
    LookupSettings {
        endpoint: format!("http://{addr}/"),
        timeout: Duration::from_millis(500),
        verify_tls: false,
    }
}

#[tokio::test]
async fn success_returns_body_unparsed() {
    let addr = spawn_service().await;
    let client = HttpLookup::new(&settings(addr)).unwrap();

    let body = client.lookup("192.0.2.53").await.unwrap();
    assert_eq!(body, KNOWN.as_bytes());
}

#[tokio::test]
async fn non_success_status_is_a_failure() {
    let addr = spawn_service().await;
    let client = HttpLookup::new(&settings(addr)).unwrap();

    let err = client.lookup("192.0.2.1").await.unwrap_err();
    match err {
        LookupError::Status { ip, status } => {
            assert_eq!(ip, "192.0.2.1");
            assert_eq!(status, 404);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn slow_service_times_out() {
    let addr = spawn_service().await;
    let client = HttpLookup::new(&settings(addr)).unwrap();

    let err = client.lookup("192.0.2.99").await.unwrap_err();
    assert!(err.is_timeout(), "expected timeout, got {err}");
}

#[tokio::test]
async fn connection_refused_is_a_request_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpLookup::new(&settings(addr)).unwrap();
    let err = client.lookup("192.0.2.53").await.unwrap_err();
    assert!(matches!(err, LookupError::Request { .. }), "got {err}");
}

#[tokio::test]
async fn pipeline_against_http_service() {
    let addr = spawn_service().await;
    let client = HttpLookup::new(&settings(addr)).unwrap();
    let sink = Arc::new(MemorySink::new());
    let cfg = Config {
        concurrency: NonZeroUsize::new(4).unwrap(),
        mode: OutputMode::Csv,
        lookup: settings(addr),
    };
    let pipeline = Pipeline::new(cfg, Arc::new(client), sink.clone());

    let input: &[u8] = b"192.0.2.53\n192.0.2.52/31\n";
    let summary = pipeline.run_stream(input).await;

    assert_eq!(summary.lookups, 3);
    // 192.0.2.52 is unknown to the service.
    assert_eq!(summary.failed, 1);

    let mut lines = sink.lines();
    lines.sort();
    assert_eq!(
        lines,
        vec![
            "192.0.2.53:22,dns.example,cloud,cpe:/a:openbsd:openssh,CVE-2023-38408",
            "192.0.2.53:22,dns.example,cloud,cpe:/a:openbsd:openssh,CVE-2023-38408",
            "192.0.2.53:53,dns.example,cloud,cpe:/a:openbsd:openssh,CVE-2023-38408",
            "192.0.2.53:53,dns.example,cloud,cpe:/a:openbsd:openssh,CVE-2023-38408",
        ]
    );
}
