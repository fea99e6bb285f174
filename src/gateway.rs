//! Caller-facing gateway bound to one WANIPConnection control URL

use crate::config::UpnpSettings;
use crate::http::{HttpTransport, ReqwestTransport};
use crate::soap::{build_action, response_value, SoapInvoker};
use crate::types::{ForwardingRequest, IpProtocol};
use crate::{Error, Result};
use serde::Serialize;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use tracing::{debug, info};

/// Control URL of a fully resolved WANIPConnection service
///
/// Only produced by the locator once the whole device chain was found.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GatewayHandle {
    control_url: String,
}

impl GatewayHandle {
    pub(crate) fn new(control_url: String) -> Self {
        Self { control_url }
    }

    /// Absolute control URL
    pub fn control_url(&self) -> &str {
        &self.control_url
    }
}

/// Port forwarding operations offered by a NAT gateway
pub trait PortForwarder {
    /// Open a forwarding rule
    fn forward_port(&self, request: &ForwardingRequest) -> Result<()>;

    /// Remove the rule for `protocol`/`external_port`
    fn delete_forwarding_rule(&self, protocol: IpProtocol, external_port: u16) -> Result<()>;
}

/// A discovered UPnP gateway
///
/// Holds an immutable control URL and a reentrant transport, so one
/// instance can be shared (e.g. behind `Arc`) by concurrent callers.
#[derive(Debug, Clone)]
pub struct Gateway<T = ReqwestTransport> {
    handle: GatewayHandle,
    invoker: SoapInvoker<T>,
}

impl<T: HttpTransport> Gateway<T> {
    /// Bind a gateway to a resolved handle
    pub fn new(handle: GatewayHandle, transport: T) -> Self {
        Self {
            handle,
            invoker: SoapInvoker::new(transport),
        }
    }

    /// Bind a gateway using the User-Agent from settings
    pub fn with_settings(handle: GatewayHandle, transport: T, settings: &UpnpSettings) -> Self {
        Self {
            handle,
            invoker: SoapInvoker::with_user_agent(transport, settings.user_agent.clone()),
        }
    }

    /// Resolved handle
    pub fn handle(&self) -> &GatewayHandle {
        &self.handle
    }

    /// Absolute control URL of the WANIPConnection service
    pub fn control_url(&self) -> &str {
        self.handle.control_url()
    }

    /// HTTP transport used for SOAP requests
    pub fn transport(&self) -> &T {
        self.invoker.transport()
    }

    /// Send an `AddPortMapping` action
    pub fn forward_port(&self, request: &ForwardingRequest) -> Result<()> {
        info!(
            "Forwarding {} port {} -> {}:{} (lease: {}s)",
            request.protocol,
            request.external_port,
            request.internal_client,
            request.internal_port,
            request.lease_secs
        );

        let fragment = build_action(
            "AddPortMapping",
            &[
                ("NewRemoteHost", String::new()),
                ("NewExternalPort", request.external_port.to_string()),
                ("NewProtocol", request.protocol.to_string()),
                ("NewInternalPort", request.internal_port.to_string()),
                ("NewInternalClient", request.internal_client.to_string()),
                ("NewEnabled", "1".to_string()),
                ("NewPortMappingDescription", request.description.clone()),
                ("NewLeaseDuration", request.lease_secs.to_string()),
            ],
        );

        self.invoker
            .invoke(self.control_url(), "AddPortMapping", &fragment)?;
        Ok(())
    }

    /// Forward a port to this host's address on the gateway's LAN
    ///
    /// The internal client is the local IPv4 address the OS would use to
    /// reach the control URL's host.
    pub fn forward_local_port(
        &self,
        protocol: IpProtocol,
        external_port: u16,
        internal_port: u16,
        description: &str,
        lease_secs: u32,
    ) -> Result<()> {
        let local_ip = self.local_address()?;
        let request = ForwardingRequest::new(protocol, external_port, internal_port, local_ip)
            .with_description(description)
            .with_lease_secs(lease_secs);
        self.forward_port(&request)
    }

    /// Send a `DeletePortMapping` action
    pub fn delete_forwarding_rule(&self, protocol: IpProtocol, external_port: u16) -> Result<()> {
        info!("Deleting {} forwarding rule for port {}", protocol, external_port);

        let fragment = build_action(
            "DeletePortMapping",
            &[
                ("NewRemoteHost", String::new()),
                ("NewExternalPort", external_port.to_string()),
                ("NewProtocol", protocol.to_string()),
            ],
        );

        self.invoker
            .invoke(self.control_url(), "DeletePortMapping", &fragment)?;
        Ok(())
    }

    /// Query the gateway's WAN address with `GetExternalIPAddress`
    pub fn external_ip_address(&self) -> Result<IpAddr> {
        let fragment = build_action("GetExternalIPAddress", &[]);
        let body = self
            .invoker
            .invoke(self.control_url(), "GetExternalIPAddress", &fragment)?;

        let value = response_value(&body, "GetExternalIPAddress", "NewExternalIPAddress")
            .ok_or_else(|| {
                Error::InvalidResponse("NewExternalIPAddress missing from response".to_string())
            })?;

        value
            .parse()
            .map_err(|_| Error::InvalidResponse(format!("Invalid external IP: {}", value)))
    }

    /// Local IPv4 address routed toward the gateway
    pub fn local_address(&self) -> Result<Ipv4Addr> {
        local_ipv4_toward(self.control_url())
    }
}

impl<T: HttpTransport> PortForwarder for Gateway<T> {
    fn forward_port(&self, request: &ForwardingRequest) -> Result<()> {
        Gateway::<T>::forward_port(self, request)
    }

    fn delete_forwarding_rule(&self, protocol: IpProtocol, external_port: u16) -> Result<()> {
        Gateway::<T>::delete_forwarding_rule(self, protocol, external_port)
    }
}

/// Local IPv4 address the OS picks for traffic to `url`'s host
///
/// Connecting a UDP socket sends nothing; it only selects a route.
pub fn local_ipv4_toward(url: &str) -> Result<Ipv4Addr> {
    let parsed = reqwest::Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| Error::InvalidUrl(format!("No host in {}", url)))?;
    let port = parsed.port_or_known_default().unwrap_or(80);

    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.connect((host, port))?;
    let local_addr = socket.local_addr()?;

    match local_addr.ip() {
        IpAddr::V4(ipv4) => {
            debug!("Local address toward {}: {}", host, ipv4);
            Ok(ipv4)
        }
        IpAddr::V6(_) => Err(Error::Internal("UPnP requires an IPv4 address".to_string())),
    }
}
