//! upnp-forward - UPnP Internet Gateway Device port forwarding
//!
//! This library finds the UPnP router on the local network and asks it to
//! open or close port forwards, so a peer-to-peer application can become
//! reachable from outside without any manual router configuration.
//!
//! The work happens in three stages:
//! 1. SSDP multicast search for the gateway's description document ([`ssdp`])
//! 2. Fetching and walking the device description to the WANIPConnection
//!    service ([`description`], [`locator`])
//! 3. SOAP control requests against that service ([`soap`], [`gateway`])
//!
//! # Example
//!
//! ```no_run
//! use upnp_forward::{discover, ForwardingRequest, IpProtocol, UpnpSettings};
//!
//! # fn example() -> upnp_forward::Result<()> {
//! let gateway = discover(&UpnpSettings::default())?;
//! let request = ForwardingRequest::new(IpProtocol::TCP, 60001, 60001, "192.168.1.50".parse().unwrap())
//!     .with_description("my-app");
//! gateway.forward_port(&request)?;
//! gateway.delete_forwarding_rule(IpProtocol::TCP, 60001)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod description;
pub mod gateway;
pub mod http;
pub mod locator;
pub mod mapping;
pub mod soap;
pub mod ssdp;
pub mod types;

pub use config::UpnpSettings;
pub use description::{DeviceNode, ServiceNode};
pub use gateway::{Gateway, GatewayHandle, PortForwarder};
pub use http::{HttpResponse, HttpTransport, ReqwestTransport};
pub use locator::SchemaLevel;
pub use mapping::{delete_upnp_mapping, discover_gateway, try_upnp_mapping, try_upnp_mapping_with_protocol};
pub use ssdp::{discover, discover_with_transport, SsdpDiscoverer};
pub use types::{ForwardingRequest, IpProtocol, PortMappingResult};

/// Result type alias for upnp-forward operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for upnp-forward operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Socket bind/send/receive failure
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// No qualifying SSDP reply within the attempt budget
    #[error("No gateway answered the SSDP search after {attempts} attempts")]
    Timeout {
        /// Number of search attempts made
        attempts: u32,
    },

    /// Malformed SSDP reply
    #[error("Malformed SSDP response: {0}")]
    Protocol(String),

    /// HTTP status >= 400 from the description fetch or a SOAP action
    #[error("HTTP error {status} for {context}")]
    Http {
        /// Description URL or SOAP action name
        context: String,
        /// HTTP status code
        status: u16,
    },

    /// HTTP request could not be completed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Device description is not well-formed XML
    #[error("Description parse error: {0}")]
    Parse(String),

    /// Required device or service missing from the description tree
    #[error("No {0}")]
    Schema(SchemaLevel),

    /// SOAP fault returned with a success status
    #[error("SOAP fault {code}: {message}")]
    Fault {
        /// UPnP error code, or the SOAP faultcode when none is given
        code: String,
        /// UPnP error description, or the SOAP faultstring
        message: String,
    },

    /// URL could not be parsed or composed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// SOAP response lacks an expected value
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Protocol name other than TCP or UDP
    #[error("Unknown protocol: {0}")]
    InvalidProtocol(String),

    /// Settings could not be read or written
    #[error("Settings error: {0}")]
    Settings(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Initialize logging for applications embedding upnp-forward
pub fn init() {
    tracing_subscriber::fmt::init();
}

#[cfg(test)]
mod tests;
