//! Error handling for the pscan scanner
//!
//! Only conditions that stop a scan before the worker pool starts are
//! represented here. Per-port failures (refused, timed out, reset, banner read
//! errors) never become a `ScanError`; they are folded into a closed or
//! banner-less [`ProbeOutcome`](crate::network::ProbeOutcome) at the probe.

use std::num::ParseIntError;
use thiserror::Error;

/// Main error type for scanning operations
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Failed to resolve host '{host}': {source}")]
    Resolution {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid port '{token}': {source}")]
    PortParse {
        token: String,
        #[source]
        source: ParseIntError,
    },

    #[error("Port range error: start port {lower} is greater than end port {upper}")]
    PortRange { lower: u16, upper: u16 },

    #[error("No ports specified")]
    EmptyPorts,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Output error: {0}")]
    OutputError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ScanError {
    /// Process exit status for this error.
    ///
    /// Forward resolution failure gets its own status so wrappers can tell
    /// "host does not exist" apart from bad arguments.
    pub fn exit_code(&self) -> i32 {
        match self {
            ScanError::Resolution { .. } => 2,
            _ => 1,
        }
    }
}
