//! Network module: per-port probe results and the TCP connect probe

pub mod socket;

use serde::{Deserialize, Serialize};

pub use socket::{PortProbe, TcpConnectProbe};

/// Port state as reported by a connect probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortState {
    Open,
    Closed,
}

impl std::fmt::Display for PortState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortState::Open => write!(f, "open"),
            PortState::Closed => write!(f, "closed"),
        }
    }
}

/// Result of probing a single port
///
/// `banner` is only ever set on open ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub port: u16,
    pub open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
}

impl ProbeOutcome {
    pub fn closed(port: u16) -> Self {
        Self { port, open: false, banner: None }
    }

    pub fn open(port: u16, banner: Option<String>) -> Self {
        Self { port, open: true, banner }
    }

    pub fn state(&self) -> PortState {
        if self.open {
            PortState::Open
        } else {
            PortState::Closed
        }
    }
}
