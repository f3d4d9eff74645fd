//! TCP connect probe tests against local listeners

use pscan::{Job, PortProbe, ProbeOutcome, ScanConfig, TcpConnectProbe};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const LOCALHOST: Ipv4Addr = Ipv4Addr::LOCALHOST;

fn probe(timeout_ms: u64) -> TcpConnectProbe {
    TcpConnectProbe::new(Duration::from_millis(timeout_ms), 128, b"hello pscan\r\n".to_vec())
}

async fn listener() -> (TcpListener, u16) {
    let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

/// A port nothing listens on
fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind((LOCALHOST, 0)).unwrap();
    listener.local_addr().unwrap().port()
}

#[tokio::test]
async fn test_greeting_service_banner() {
    let (listener, port) = listener().await;
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream.write_all(b"SSH-2.0-OpenSSH_9.6\r\n").await.unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
    });

    let outcome = probe(1000).probe(Job::new(LOCALHOST, port)).await;

    assert_eq!(outcome, ProbeOutcome::open(port, Some("SSH-2.0-OpenSSH_9.6".to_string())));
}

#[tokio::test]
async fn test_echo_service_returns_payload() {
    let (listener, port) = listener().await;
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 64];
        let n = stream.read(&mut buf).await.unwrap();
        stream.write_all(&buf[..n]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
    });

    let outcome = probe(1000).probe(Job::new(LOCALHOST, port)).await;

    assert!(outcome.open);
    assert_eq!(outcome.banner.as_deref(), Some("hello pscan"));
}

#[tokio::test]
async fn test_silent_service_is_open_without_banner() {
    let (listener, port) = listener().await;
    tokio::spawn(async move {
        let (_stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;
    });

    let start = Instant::now();
    let outcome = probe(200).probe(Job::new(LOCALHOST, port)).await;

    assert_eq!(outcome, ProbeOutcome::open(port, None));
    assert!(start.elapsed() < Duration::from_secs(2), "banner read must respect the timeout");
}

#[tokio::test]
async fn test_immediate_close_is_still_open() {
    let (listener, port) = listener().await;
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        drop(stream);
    });

    let outcome = probe(1000).probe(Job::new(LOCALHOST, port)).await;

    assert!(outcome.open);
    assert!(outcome.banner.is_none());
}

#[tokio::test]
async fn test_refused_port_is_closed() {
    let port = closed_port();

    let outcome = probe(1000).probe(Job::new(LOCALHOST, port)).await;

    assert_eq!(outcome, ProbeOutcome::closed(port));
}

#[tokio::test]
async fn test_job_without_address_is_closed() {
    let outcome = probe(1000).probe(Job { address: None, port: 22 }).await;

    assert_eq!(outcome, ProbeOutcome::closed(22));
}

#[tokio::test]
async fn test_banner_is_capped_at_byte_budget() {
    let (listener, port) = listener().await;
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream.write_all(&[b'A'; 300]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
    });

    let outcome = probe(1000).probe(Job::new(LOCALHOST, port)).await;

    let banner = outcome.banner.expect("banner expected");
    assert!(!banner.is_empty());
    assert!(banner.len() <= 128);
}

#[tokio::test]
async fn test_from_config_uses_configured_payload() {
    let (listener, port) = listener().await;
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 64];
        let n = stream.read(&mut buf).await.unwrap();
        stream.write_all(&buf[..n]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
    });

    let mut config = ScanConfig::default().with_timeout(1000);
    config.probe_payload = "PING\n".to_string();
    let scanner = TcpConnectProbe::from_config(&config);

    let outcome = scanner.scan_port(SocketAddr::from((LOCALHOST, port))).await;
    assert_eq!(outcome.banner.as_deref(), Some("PING"));
}
