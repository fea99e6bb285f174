//! Async port mapping helpers
//!
//! Discovery and SOAP control use blocking I/O, so these wrappers move the
//! work onto tokio's blocking pool. They map a local port to the same
//! external port on the discovered gateway.
//!
//! # Example
//!
//! ```no_run
//! use upnp_forward::try_upnp_mapping;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let result = try_upnp_mapping(8080, 3600).await?;
//! println!("External address: {}:{}", result.external_ip, result.external_port);
//! # Ok(())
//! # }
//! ```

use crate::config::UpnpSettings;
use crate::gateway::Gateway;
use crate::http::{HttpTransport, ReqwestTransport};
use crate::ssdp::discover;
use crate::types::{ForwardingRequest, IpProtocol, PortMappingResult};
use crate::{Error, Result};
use tracing::{debug, info, warn};

/// Discover the gateway without blocking the async runtime
///
/// The returned gateway performs blocking HTTP; call its methods from
/// `spawn_blocking` as well.
pub async fn discover_gateway(settings: UpnpSettings) -> Result<Gateway<ReqwestTransport>> {
    tokio::task::spawn_blocking(move || discover(&settings))
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
}

/// Map `local_port` over TCP using default settings
///
/// # Arguments
///
/// * `local_port` - The local port to map (also used as the external port)
/// * `lifetime_secs` - Requested lease in seconds (0 = until gateway reboot)
pub async fn try_upnp_mapping(local_port: u16, lifetime_secs: u32) -> Result<PortMappingResult> {
    try_upnp_mapping_with_protocol(local_port, lifetime_secs, IpProtocol::TCP).await
}

/// Map `local_port` with a specific IP protocol using default settings
pub async fn try_upnp_mapping_with_protocol(
    local_port: u16,
    lifetime_secs: u32,
    protocol: IpProtocol,
) -> Result<PortMappingResult> {
    info!(
        "Attempting UPnP mapping for port {} (lifetime: {}s, protocol: {})",
        local_port, lifetime_secs, protocol
    );

    tokio::task::spawn_blocking(move || -> Result<PortMappingResult> {
        let gateway = discover(&UpnpSettings::default())?;
        upnp_mapping_blocking(&gateway, local_port, lifetime_secs, protocol)
    })
    .await
    .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
}

/// Delete the mapping for `local_port` on the discovered gateway
pub async fn delete_upnp_mapping(local_port: u16, protocol: IpProtocol) -> Result<()> {
    info!(
        "Deleting UPnP mapping for port {} (protocol: {})",
        local_port, protocol
    );

    tokio::task::spawn_blocking(move || -> Result<()> {
        let gateway = discover(&UpnpSettings::default())?;
        gateway.delete_forwarding_rule(protocol, local_port)?;
        info!("UPnP mapping deleted successfully");
        Ok(())
    })
    .await
    .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
}

/// Map `local_port` on `gateway` and report the external endpoint
///
/// If the external address cannot be read the new mapping is removed again.
pub fn upnp_mapping_blocking<T: HttpTransport>(
    gateway: &Gateway<T>,
    local_port: u16,
    lifetime_secs: u32,
    protocol: IpProtocol,
) -> Result<PortMappingResult> {
    let local_ip = gateway.local_address()?;
    let request = ForwardingRequest::new(protocol, local_port, local_port, local_ip)
        .with_description(format!("upnp-forward-{}-{}", protocol, local_port))
        .with_lease_secs(lifetime_secs);

    debug!(
        "Adding port mapping: {}:{} ({}s)",
        local_ip, local_port, lifetime_secs
    );
    gateway.forward_port(&request)?;

    let external_ip = match gateway.external_ip_address() {
        Ok(ip) => ip,
        Err(e) => {
            warn!("GetExternalIPAddress failed, removing mapping: {}", e);
            if let Err(cleanup) = gateway.delete_forwarding_rule(protocol, local_port) {
                warn!("Failed to remove mapping for port {}: {}", local_port, cleanup);
            }
            return Err(e);
        }
    };

    let result = PortMappingResult {
        external_ip,
        external_port: local_port,
        lifetime_secs,
        protocol,
        created_at_ms: chrono::Utc::now().timestamp_millis(),
    };

    info!(
        "UPnP mapping successful: {}:{} (lifetime: {}s)",
        result.external_ip, result.external_port, result.lifetime_secs
    );

    Ok(result)
}
