//! Common types for port forwarding

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

/// IP protocol of a forwarding rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IpProtocol {
    /// TCP protocol
    TCP,
    /// UDP protocol
    UDP,
}

impl IpProtocol {
    /// Protocol name as carried in `NewProtocol`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TCP => "TCP",
            Self::UDP => "UDP",
        }
    }
}

impl fmt::Display for IpProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IpProtocol {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        if s.eq_ignore_ascii_case("tcp") {
            Ok(Self::TCP)
        } else if s.eq_ignore_ascii_case("udp") {
            Ok(Self::UDP)
        } else {
            Err(crate::Error::InvalidProtocol(s.to_string()))
        }
    }
}

/// Parameters of one `AddPortMapping` call
///
/// Built per call and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardingRequest {
    /// TCP or UDP
    pub protocol: IpProtocol,
    /// Port opened on the gateway's WAN side
    pub external_port: u16,
    /// Port on the internal client
    pub internal_port: u16,
    /// LAN address the gateway forwards to
    pub internal_client: Ipv4Addr,
    /// Free-form rule description shown by the router
    pub description: String,
    /// Lease duration in seconds (0 = until the gateway reboots)
    pub lease_secs: u32,
}

impl ForwardingRequest {
    /// Create a request with an empty description and a permanent lease
    pub fn new(
        protocol: IpProtocol,
        external_port: u16,
        internal_port: u16,
        internal_client: Ipv4Addr,
    ) -> Self {
        Self {
            protocol,
            external_port,
            internal_port,
            internal_client,
            description: String::new(),
            lease_secs: 0,
        }
    }

    /// Set the rule description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the lease duration in seconds
    pub fn with_lease_secs(mut self, lease_secs: u32) -> Self {
        self.lease_secs = lease_secs;
        self
    }
}

/// Result of a completed port mapping
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortMappingResult {
    /// External IP address reported by the gateway
    pub external_ip: IpAddr,
    /// External port mapped on the gateway
    pub external_port: u16,
    /// Lifetime of the mapping in seconds
    pub lifetime_secs: u32,
    /// Protocol of the mapping
    pub protocol: IpProtocol,
    /// Timestamp when mapping was created (Unix milliseconds)
    pub created_at_ms: i64,
}
