//! TCP connect probing with best-effort banner capture

use crate::config::ScanConfig;
use crate::network::ProbeOutcome;
use crate::scanner::Job;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Probes one job and reports what it found.
///
/// Implementations must not fail: every error is expressed in the outcome.
#[async_trait]
pub trait PortProbe: Send + Sync {
    async fn probe(&self, job: Job) -> ProbeOutcome;
}

/// TCP connect scanner
///
/// A completed handshake is the open/closed verdict. After connecting, a
/// short payload is written and up to `banner_bytes` are read back; neither
/// step can turn an open port into a closed one.
#[derive(Debug, Clone)]
pub struct TcpConnectProbe {
    timeout: Duration,
    banner_bytes: usize,
    payload: Vec<u8>,
}

impl TcpConnectProbe {
    pub fn new(timeout: Duration, banner_bytes: usize, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            timeout,
            banner_bytes,
            payload: payload.into(),
        }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(
            config.timeout_duration(),
            config.banner_bytes,
            config.probe_payload.as_bytes().to_vec(),
        )
    }

    /// Perform a TCP connect scan on a single port
    pub async fn scan_port(&self, addr: SocketAddr) -> ProbeOutcome {
        let port = addr.port();

        let mut stream = match timeout(self.timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                log::debug!("{} closed: {}", addr, e);
                return ProbeOutcome::closed(port);
            }
            Err(_) => {
                log::debug!("{} timed out after {:?}", addr, self.timeout);
                return ProbeOutcome::closed(port);
            }
        };

        let banner = self.grab_banner(&mut stream, addr).await;

        // The stream is closed when dropped on return.
        ProbeOutcome::open(port, banner)
    }

    async fn grab_banner(&self, stream: &mut TcpStream, addr: SocketAddr) -> Option<String> {
        match timeout(self.timeout, stream.write_all(&self.payload)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::trace!("{} probe write failed: {}", addr, e),
            Err(_) => log::trace!("{} probe write timed out", addr),
        }

        let mut buf = vec![0u8; self.banner_bytes];
        let read = match timeout(self.timeout, stream.read(&mut buf)).await {
            Ok(Ok(read)) => read,
            Ok(Err(e)) => {
                log::trace!("{} banner read failed: {}", addr, e);
                return None;
            }
            Err(_) => {
                log::trace!("{} banner read timed out", addr);
                return None;
            }
        };

        let banner = String::from_utf8_lossy(&buf[..read]).trim().to_string();
        if banner.is_empty() {
            None
        } else {
            Some(banner)
        }
    }
}

#[async_trait]
impl PortProbe for TcpConnectProbe {
    async fn probe(&self, job: Job) -> ProbeOutcome {
        match job.socket_addr() {
            Some(addr) => self.scan_port(addr).await,
            None => {
                log::debug!("port {} closed: target has no IPv4 address", job.port);
                ProbeOutcome::closed(job.port)
            }
        }
    }
}
