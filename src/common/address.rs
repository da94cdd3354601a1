//! Address type for dial and listen targets

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use tokio::net::lookup_host;

use crate::error::{Error, Result};

/// Network address representation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Address {
    /// IP socket address (IP + port)
    Socket(SocketAddr),
    /// Domain name with port
    Domain(String, u16),
}

impl Address {
    /// Create an unspecified address (0.0.0.0:port)
    pub fn unspecified(port: u16) -> Self {
        Address::Socket(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port))
    }

    /// Create from domain and port
    pub fn domain(domain: impl Into<String>, port: u16) -> Self {
        Address::Domain(domain.into(), port)
    }

    /// Get the port
    pub fn port(&self) -> u16 {
        match self {
            Address::Socket(addr) => addr.port(),
            Address::Domain(_, port) => *port,
        }
    }

    /// Get the host part as string
    pub fn host(&self) -> String {
        match self {
            Address::Socket(addr) => addr.ip().to_string(),
            Address::Domain(domain, _) => domain.clone(),
        }
    }

    /// Check if this is a domain address
    pub fn is_domain(&self) -> bool {
        matches!(self, Address::Domain(_, _))
    }

    /// Resolve to a single socket address.
    ///
    /// Socket addresses are returned as-is. Domains go through the system
    /// resolver and the first answer wins.
    pub async fn resolve(&self) -> Result<SocketAddr> {
        match self {
            Address::Socket(addr) => Ok(*addr),
            Address::Domain(domain, port) => {
                let mut addrs = lookup_host((domain.as_str(), *port))
                    .await
                    .map_err(|e| Error::AddressResolution(format!("{}: {}", self, e)))?;
                addrs
                    .next()
                    .ok_or_else(|| Error::AddressResolution(format!("{}: no addresses found", self)))
            }
        }
    }
}

impl FromStr for Address {
    type Err = Error;

    /// Parse `host:port`.
    ///
    /// IPv6 literals must be bracketed (`[::1]:80`). An empty host (`:8080`)
    /// means the unspecified address.
    fn from_str(s: &str) -> Result<Self> {
        if let Ok(addr) = s.parse::<SocketAddr>() {
            return Ok(Address::Socket(addr));
        }

        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| Error::AddressResolution(format!("{}: missing port", s)))?;

        let port: u16 = port
            .parse()
            .map_err(|_| Error::AddressResolution(format!("{}: invalid port {:?}", s, port)))?;

        if host.is_empty() {
            return Ok(Address::unspecified(port));
        }

        if host.contains(':') {
            return Err(Error::AddressResolution(format!("{}: too many colons", s)));
        }

        if host.contains(['[', ']']) || host.chars().any(char::is_whitespace) {
            return Err(Error::AddressResolution(format!("{}: invalid host {:?}", s, host)));
        }

        Ok(Address::Domain(host.to_string(), port))
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Address::Socket(addr) => write!(f, "{}", addr),
            Address::Domain(domain, port) => write!(f, "{}:{}", domain, port),
        }
    }
}

impl From<SocketAddr> for Address {
    fn from(addr: SocketAddr) -> Self {
        Address::Socket(addr)
    }
}
