//! UPnP device description retrieval and parsing
//!
//! A description document looks like:
//!
//! ```xml
//! <root xmlns="urn:schemas-upnp-org:device-1-0">
//!   <device>
//!     <deviceType>urn:schemas-upnp-org:device:InternetGatewayDevice:1</deviceType>
//!     <deviceList>
//!       <device>...</device>
//!     </deviceList>
//!     <serviceList>
//!       <service>
//!         <serviceType>...</serviceType>
//!         <controlURL>/ctl/IPConn</controlURL>
//!       </service>
//!     </serviceList>
//!   </device>
//! </root>
//! ```
//!
//! Only the elements needed to reach a control URL are kept. Missing
//! elements decode as empty strings or empty lists, so an incomplete tree is
//! reported by the locator rather than the parser.

use crate::http::HttpTransport;
use crate::{Error, Result};
use tracing::debug;
use xmltree::Element;

/// A device in the description tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceNode {
    /// `deviceType` URN
    pub device_type: String,
    /// Embedded devices from `deviceList`, in document order
    pub devices: Vec<DeviceNode>,
    /// Services from `serviceList`, in document order
    pub services: Vec<ServiceNode>,
}

/// A service offered by a device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceNode {
    /// `serviceType` URN
    pub service_type: String,
    /// `controlURL`, relative or absolute
    pub control_url: String,
}

impl DeviceNode {
    /// First direct child device of the given type
    pub fn child_device(&self, device_type: &str) -> Option<&DeviceNode> {
        self.devices.iter().find(|d| d.device_type == device_type)
    }

    /// First direct service of the given type
    pub fn service(&self, service_type: &str) -> Option<&ServiceNode> {
        self.services.iter().find(|s| s.service_type == service_type)
    }
}

/// Fetch and parse the description document at `location`
///
/// Any status >= 400 is an [`Error::Http`]; malformed XML is an
/// [`Error::Parse`]. Nothing is retried.
pub fn fetch_description<T: HttpTransport + ?Sized>(
    transport: &T,
    location: &str,
) -> Result<DeviceNode> {
    debug!("Fetching device description from {}", location);

    let response = transport.get(location)?;
    if response.is_error() {
        return Err(Error::Http {
            context: location.to_string(),
            status: response.status,
        });
    }

    parse_description(&response.body)
}

/// Parse a description document into its root device
pub fn parse_description(xml: &str) -> Result<DeviceNode> {
    let root = Element::parse(xml.as_bytes()).map_err(|e| Error::Parse(e.to_string()))?;

    let device = root
        .get_child("device")
        .map(parse_device)
        .unwrap_or_default();

    debug!(
        "Parsed description: root device {:?} with {} embedded devices",
        device.device_type,
        device.devices.len()
    );

    Ok(device)
}

fn parse_device(element: &Element) -> DeviceNode {
    let devices = element
        .get_child("deviceList")
        .map(|list| child_elements(list, "device").map(parse_device).collect())
        .unwrap_or_default();

    let services = element
        .get_child("serviceList")
        .map(|list| {
            child_elements(list, "service")
                .map(|service| ServiceNode {
                    service_type: child_text(service, "serviceType"),
                    control_url: child_text(service, "controlURL"),
                })
                .collect()
        })
        .unwrap_or_default();

    DeviceNode {
        device_type: child_text(element, "deviceType"),
        devices,
        services,
    }
}

fn child_elements<'a>(parent: &'a Element, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
    parent
        .children
        .iter()
        .filter_map(|node| node.as_element())
        .filter(move |e| e.name == name)
}

/// Trimmed text of a direct child, empty when absent
pub(crate) fn child_text(parent: &Element, name: &str) -> String {
    parent
        .get_child(name)
        .and_then(|e| e.get_text())
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}
