//! Port set parsing
//!
//! Accepted forms:
//! - several tokens: every token is one explicit port, kept in input order,
//!   duplicates included
//! - one token containing `-`: an inclusive range `A-B`, split on the first `-`
//! - one token without `-`: a single port
//!
//! A range cannot be mixed with explicit ports in the same invocation.

use crate::ScanError;
use std::fmt;

/// Ordered, finite list of ports; one scan job per element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSequence {
    ports: Vec<u16>,
}

impl PortSequence {
    pub fn as_slice(&self) -> &[u16] {
        &self.ports
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn into_vec(self) -> Vec<u16> {
        self.ports
    }
}

impl From<Vec<u16>> for PortSequence {
    fn from(ports: Vec<u16>) -> Self {
        Self { ports }
    }
}

impl fmt::Display for PortSequence {
    /// Ascending contiguous runs of three or more ports print as `A-B`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        let mut i = 0;
        while i < self.ports.len() {
            let start = self.ports[i];
            let mut j = i;
            while j + 1 < self.ports.len() && self.ports[j] < u16::MAX && self.ports[j + 1] == self.ports[j] + 1 {
                j += 1;
            }
            if j - i >= 2 {
                parts.push(format!("{}-{}", start, self.ports[j]));
                i = j + 1;
            } else {
                parts.push(start.to_string());
                i += 1;
            }
        }
        write!(f, "{}", parts.join(","))
    }
}

/// Parse raw port tokens into a [`PortSequence`]
pub fn parse_ports<S: AsRef<str>>(tokens: &[S]) -> crate::Result<PortSequence> {
    match tokens {
        [] => Err(ScanError::EmptyPorts),
        [single] => {
            let single = single.as_ref().trim();
            match single.split_once('-') {
                Some((lower, upper)) => parse_range(lower, upper),
                None => Ok(PortSequence { ports: vec![parse_port(single)?] }),
            }
        }
        many => {
            let ports = many
                .iter()
                .map(|token| parse_port(token.as_ref().trim()))
                .collect::<crate::Result<Vec<u16>>>()?;
            Ok(PortSequence { ports })
        }
    }
}

fn parse_range(lower: &str, upper: &str) -> crate::Result<PortSequence> {
    let lower = parse_port(lower.trim())?;
    let upper = parse_port(upper.trim())?;

    if lower > upper {
        return Err(ScanError::PortRange { lower, upper });
    }

    Ok(PortSequence { ports: (lower..=upper).collect() })
}

fn parse_port(token: &str) -> crate::Result<u16> {
    token.parse::<u16>().map_err(|source| ScanError::PortParse {
        token: token.to_string(),
        source,
    })
}
