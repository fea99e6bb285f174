//! Walks a device description to the WANIPConnection control URL

use crate::description::DeviceNode;
use crate::gateway::GatewayHandle;
use crate::{Error, Result};
use std::fmt;
use tracing::debug;

/// Root device type of a UPnP Internet Gateway Device
pub const IGD_DEVICE_TYPE: &str = "urn:schemas-upnp-org:device:InternetGatewayDevice:1";
/// WAN device embedded in the gateway
pub const WAN_DEVICE_TYPE: &str = "urn:schemas-upnp-org:device:WANDevice:1";
/// WAN connection device embedded in the WAN device
pub const WAN_CONNECTION_DEVICE_TYPE: &str = "urn:schemas-upnp-org:device:WANConnectionDevice:1";
/// Service handling port mappings
pub const WAN_IP_CONNECTION_SERVICE_TYPE: &str = "urn:schemas-upnp-org:service:WANIPConnection:1";

/// Level of the gateway description that was missing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaLevel {
    /// Root device is not an InternetGatewayDevice
    InternetGatewayDevice,
    /// No WANDevice under the gateway
    WanDevice,
    /// No WANConnectionDevice under the WANDevice
    WanConnectionDevice,
    /// No WANIPConnection service on the WANConnectionDevice
    WanIpConnection,
}

impl fmt::Display for SchemaLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InternetGatewayDevice => "InternetGatewayDevice",
            Self::WanDevice => "WANDevice",
            Self::WanConnectionDevice => "WANConnectionDevice",
            Self::WanIpConnection => "WANIPConnection",
        };
        f.write_str(name)
    }
}

/// Resolve the absolute WANIPConnection control URL
///
/// Follows the fixed chain InternetGatewayDevice → WANDevice →
/// WANConnectionDevice → WANIPConnection, taking the first match by list
/// order at each level. This is not a general tree search.
pub fn locate_wan_ip_control_url(root: &DeviceNode, location: &str) -> Result<GatewayHandle> {
    if root.device_type != IGD_DEVICE_TYPE {
        return Err(Error::Schema(SchemaLevel::InternetGatewayDevice));
    }

    let wan_device = root
        .child_device(WAN_DEVICE_TYPE)
        .ok_or(Error::Schema(SchemaLevel::WanDevice))?;

    let connection_device = wan_device
        .child_device(WAN_CONNECTION_DEVICE_TYPE)
        .ok_or(Error::Schema(SchemaLevel::WanConnectionDevice))?;

    let service = connection_device
        .service(WAN_IP_CONNECTION_SERVICE_TYPE)
        .ok_or(Error::Schema(SchemaLevel::WanIpConnection))?;

    let control_url = combine_url(location, &service.control_url)?;
    debug!("WANIPConnection control URL: {}", control_url);

    Ok(GatewayHandle::new(control_url))
}

/// Join a control URL onto the scheme and authority of `location`
///
/// An absolute control URL is returned unchanged; a scheme-relative one
/// (`//host/path`) takes the scheme of `location`.
pub fn combine_url(location: &str, control_url: &str) -> Result<String> {
    if is_absolute_url(control_url) {
        return Ok(control_url.to_string());
    }

    const SCHEME_END: &str = "://";
    let scheme_end = location
        .find(SCHEME_END)
        .ok_or_else(|| Error::InvalidUrl(format!("No scheme in {}", location)))?
        + SCHEME_END.len();

    if control_url.starts_with("//") {
        let scheme = &location[..scheme_end - "//".len()];
        return Ok(format!("{}{}", scheme, control_url));
    }

    let authority_end = location[scheme_end..]
        .find('/')
        .map(|i| scheme_end + i)
        .unwrap_or(location.len());

    if authority_end == scheme_end {
        return Err(Error::InvalidUrl(format!("No host in {}", location)));
    }

    let base = &location[..authority_end];
    if control_url.starts_with('/') {
        Ok(format!("{}{}", base, control_url))
    } else {
        Ok(format!("{}/{}", base, control_url))
    }
}

fn is_absolute_url(url: &str) -> bool {
    reqwest::Url::parse(url)
        .map(|parsed| parsed.has_host())
        .unwrap_or(false)
}
