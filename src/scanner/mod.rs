//! Scanner module containing the scan coordinator and the top-level scan flow

pub mod engine;

use crate::config::ScanConfig;
use crate::network::PortProbe;
use crate::output::Reporter;
use crate::utils::port_parser::parse_ports;
use crate::utils::target_parser::{NameService, TargetResolver};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;

pub use engine::ScanEngine;

/// One unit of scan work
///
/// `address` is `None` when the target literal has no IPv4 form; such a job
/// can never connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Job {
    pub address: Option<Ipv4Addr>,
    pub port: u16,
}

impl Job {
    pub fn new(address: Ipv4Addr, port: u16) -> Self {
        Self { address: Some(address), port }
    }

    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.address
            .map(|address| SocketAddr::V4(SocketAddrV4::new(address, self.port)))
    }
}

/// Aggregate result of a scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Number of jobs enqueued, duplicates included
    pub total_ports: usize,

    /// Number of outcomes with `open = true`
    pub open_count: usize,
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} tcp ports open", self.open_count, self.total_ports)
    }
}

/// Resolve, parse, announce and scan.
///
/// Resolution and port parsing both finish before any job exists, so a fatal
/// error here leaves the probe untouched and writes no port output.
pub async fn run_scan<N: NameService>(
    config: &ScanConfig,
    host: &str,
    port_tokens: &[String],
    resolver: &TargetResolver<N>,
    probe: Arc<dyn PortProbe>,
    mut reporter: Reporter,
) -> crate::Result<ScanSummary> {
    config.validate()?;

    let target = resolver.resolve(host).await?;
    let ports = parse_ports(port_tokens)?;

    reporter.target(&target)?;
    reporter.ports(&ports)?;

    let engine = ScanEngine::new(config.clone(), probe)?;
    let (mut reporter, summary) = engine.scan(target.address.clone(), ports.as_slice(), reporter).await?;

    reporter.summary(&summary)?;
    Ok(summary)
}
