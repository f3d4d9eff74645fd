//! Target resolution
//!
//! Turns the user's host argument into the address that gets scanned and the
//! name shown next to it. Input that looks like a dotted quad is never
//! forward-resolved; its display name comes from a best-effort reverse lookup.
//! Anything else is treated as a hostname and must forward-resolve.
//!
//! The dotted-quad check is deliberately loose: four groups of one to three
//! digits, with no bound on each group. A literal with a group above 255 is
//! still a literal: it is kept as text, shown as "Unknown", and every port
//! probed against it reports closed.

use crate::ScanError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io;
use std::net::Ipv4Addr;

/// Display name used when reverse resolution yields nothing
pub const UNKNOWN_HOST: &str = "Unknown";

static DOTTED_QUAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}$").expect("dotted quad pattern is valid")
});

/// Address a scan is aimed at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetAddress {
    V4(Ipv4Addr),
    /// Dotted-quad text with no IPv4 representation, e.g. `999.1.1.1`
    Literal(String),
}

impl TargetAddress {
    /// The connectable address, if there is one
    pub fn ipv4(&self) -> Option<Ipv4Addr> {
        match self {
            TargetAddress::V4(addr) => Some(*addr),
            TargetAddress::Literal(_) => None,
        }
    }
}

impl From<Ipv4Addr> for TargetAddress {
    fn from(addr: Ipv4Addr) -> Self {
        TargetAddress::V4(addr)
    }
}

impl std::fmt::Display for TargetAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetAddress::V4(addr) => write!(f, "{}", addr),
            TargetAddress::Literal(text) => write!(f, "{}", text),
        }
    }
}

/// Resolved scan target, shared read-only by every worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTarget {
    pub address: TargetAddress,
    pub display_name: String,
}

/// Name lookups used by the resolver
#[async_trait]
pub trait NameService: Send + Sync {
    /// Hostname to IPv4 address
    async fn forward(&self, host: &str) -> io::Result<Ipv4Addr>;

    /// IPv4 address to hostname
    async fn reverse(&self, address: Ipv4Addr) -> io::Result<String>;
}

/// Resolver backed by the operating system's resolver
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemNameService;

#[async_trait]
impl NameService for SystemNameService {
    async fn forward(&self, host: &str) -> io::Result<Ipv4Addr> {
        let addrs = tokio::net::lookup_host((host, 0)).await?;
        addrs
            .filter_map(|addr| match addr.ip() {
                std::net::IpAddr::V4(v4) => Some(v4),
                std::net::IpAddr::V6(_) => None,
            })
            .next()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, format!("no IPv4 address found for {}", host))
            })
    }

    async fn reverse(&self, address: Ipv4Addr) -> io::Result<String> {
        tokio::task::spawn_blocking(move || reverse_lookup(address))
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
    }
}

#[cfg(unix)]
fn reverse_lookup(address: Ipv4Addr) -> io::Result<String> {
    use std::ffi::CStr;

    const HOST_BUF_LEN: usize = 1025;

    // SAFETY: sockaddr_in is plain old data; all-zero is a valid starting value.
    let mut sin: libc::sockaddr_in = unsafe { std::mem::zeroed() };
    sin.sin_family = libc::AF_INET as libc::sa_family_t;
    sin.sin_addr = libc::in_addr { s_addr: u32::from(address).to_be() };

    let mut host = [0 as libc::c_char; HOST_BUF_LEN];

    // SAFETY: every pointer refers to a live local of the advertised length,
    // and NI_NAMEREQD makes the call fail instead of echoing the numeric form.
    let rc = unsafe {
        libc::getnameinfo(
            &sin as *const libc::sockaddr_in as *const libc::sockaddr,
            std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
            host.as_mut_ptr(),
            HOST_BUF_LEN as libc::socklen_t,
            std::ptr::null_mut(),
            0,
            libc::NI_NAMEREQD,
        )
    };

    if rc != 0 {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no reverse DNS entry for {} (getnameinfo code {})", address, rc),
        ));
    }

    // SAFETY: getnameinfo NUL-terminates the buffer on success.
    let name = unsafe { CStr::from_ptr(host.as_ptr()) };
    Ok(name.to_string_lossy().into_owned())
}

#[cfg(not(unix))]
fn reverse_lookup(address: Ipv4Addr) -> io::Result<String> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("reverse lookup of {} is not supported on this platform", address),
    ))
}

/// True if `host` has the shape of a dotted-quad IPv4 literal
pub fn is_dotted_quad(host: &str) -> bool {
    DOTTED_QUAD.is_match(host)
}

/// Target resolver
pub struct TargetResolver<N: NameService> {
    names: N,
}

impl Default for TargetResolver<SystemNameService> {
    fn default() -> Self {
        Self::new(SystemNameService)
    }
}

impl<N: NameService> TargetResolver<N> {
    pub fn new(names: N) -> Self {
        Self { names }
    }

    pub fn name_service(&self) -> &N {
        &self.names
    }

    /// Resolve a host argument into a [`ResolvedTarget`].
    ///
    /// Fails with [`ScanError::Resolution`] only when a hostname does not
    /// forward-resolve. Reverse lookup failure is not an error.
    pub async fn resolve(&self, host: &str) -> crate::Result<ResolvedTarget> {
        let host = host.trim();

        if is_dotted_quad(host) {
            let Some(address) = literal_address(host) else {
                log::info!("{} has a group above 255; skipping reverse lookup", host);
                return Ok(ResolvedTarget {
                    address: TargetAddress::Literal(host.to_string()),
                    display_name: UNKNOWN_HOST.to_string(),
                });
            };

            let display_name = match self.names.reverse(address).await {
                Ok(name) if !name.is_empty() => name,
                Ok(_) => UNKNOWN_HOST.to_string(),
                Err(e) => {
                    log::info!("Reverse lookup for {} failed: {}", address, e);
                    UNKNOWN_HOST.to_string()
                }
            };
            return Ok(ResolvedTarget { address: address.into(), display_name });
        }

        let address = self
            .names
            .forward(host)
            .await
            .map_err(|source| ScanError::Resolution { host: host.to_string(), source })?;

        log::debug!("Resolved {} to {}", host, address);

        Ok(ResolvedTarget { address: address.into(), display_name: host.to_string() })
    }
}

/// Build the address for a dotted-quad literal.
///
/// Groups are read as decimal, so leading zeros are accepted. Returns `None`
/// when a group is above 255.
fn literal_address(host: &str) -> Option<Ipv4Addr> {
    let mut octets = [0u8; 4];
    for (octet, group) in octets.iter_mut().zip(host.split('.')) {
        *octet = group.parse::<u8>().ok()?;
    }
    Some(Ipv4Addr::from(octets))
}
