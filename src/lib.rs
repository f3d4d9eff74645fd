//! pscan - a concurrent TCP connect port scanner
//!
//! Resolves one target, expands a port specification, then probes every port
//! through a bounded worker pool, capturing a short banner from open ports.

pub mod config;
pub mod error;
pub mod network;
pub mod output;
pub mod scanner;
pub mod utils;

// Re-export commonly used types
pub use config::ScanConfig;
pub use error::ScanError;
pub use network::{PortProbe, ProbeOutcome, TcpConnectProbe};
pub use output::{OutputFormat, Reporter};
pub use scanner::{engine::ScanEngine, run_scan, Job, ScanSummary};
pub use utils::port_parser::{parse_ports, PortSequence};
pub use utils::target_parser::{
    NameService, ResolvedTarget, SystemNameService, TargetAddress, TargetResolver,
};

pub type Result<T> = std::result::Result<T, ScanError>;
