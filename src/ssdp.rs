//! SSDP (Simple Service Discovery Protocol) gateway search
//!
//! Sends `M-SEARCH` requests to the SSDP multicast group and waits for a
//! reply that echoes the search target and names the device description
//! location. The first usable reply wins; replies from other gateways are
//! ignored.

use crate::config::UpnpSettings;
use crate::description::fetch_description;
use crate::gateway::Gateway;
use crate::http::{HttpTransport, ReqwestTransport};
use crate::locator::locate_wan_ip_control_url;
use crate::{Error, Result};
use reqwest::Url;
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Size of the reply buffer; SSDP replies fit in a single datagram
const REPLY_BUFFER_SIZE: usize = 2048;

/// Multicast search for the gateway's description location
#[derive(Debug, Clone)]
pub struct SsdpDiscoverer {
    search_target: String,
    max_attempts: u32,
    attempt_timeout: Duration,
    mx: u8,
    destination: SocketAddr,
}

impl SsdpDiscoverer {
    /// Create a discoverer from settings
    pub fn from_settings(settings: &UpnpSettings) -> Self {
        Self {
            search_target: settings.search_target.clone(),
            max_attempts: settings.max_attempts,
            attempt_timeout: settings.attempt_timeout(),
            mx: settings.mx,
            destination: settings.multicast_addr,
        }
    }

    /// The `M-SEARCH` datagram sent on each attempt
    pub fn search_request(&self) -> String {
        build_search_request(&self.search_target, self.mx, self.destination)
    }

    /// Search until one reply yields a description location
    ///
    /// Timeouts, non-matching replies and malformed replies are misses and
    /// use up one attempt each. The socket is closed on return.
    pub fn find_location(&self) -> Result<Url> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_read_timeout(Some(self.attempt_timeout))?;

        let request = self.search_request();
        let mut buf = [0u8; REPLY_BUFFER_SIZE];
        let mut last_send_error = None;

        for attempt in 1..=self.max_attempts {
            debug!(
                "SSDP search attempt {}/{} to {}",
                attempt, self.max_attempts, self.destination
            );

            if let Err(e) = socket.send_to(request.as_bytes(), self.destination) {
                warn!("SSDP send failed: {}", e);
                last_send_error = Some(e);
                continue;
            }
            last_send_error = None;

            let (len, from) = match socket.recv_from(&mut buf) {
                Ok(received) => received,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    debug!("No SSDP reply within {:?}", self.attempt_timeout);
                    continue;
                }
                Err(e) => {
                    debug!("SSDP receive failed: {}", e);
                    continue;
                }
            };

            let reply = String::from_utf8_lossy(&buf[..len]);
            match parse_search_response(&reply, &self.search_target) {
                Ok(location) => {
                    info!("Gateway at {} announced description {}", from, location);
                    return Ok(location);
                }
                Err(e) => debug!("Ignoring SSDP reply from {}: {}", from, e),
            }
        }

        match last_send_error {
            Some(e) => Err(Error::Transport(e)),
            None => Err(Error::Timeout {
                attempts: self.max_attempts,
            }),
        }
    }
}

/// Format an `M-SEARCH` request
pub fn build_search_request(search_target: &str, mx: u8, destination: SocketAddr) -> String {
    format!(
        "M-SEARCH * HTTP/1.1\r\n\
         HOST: {}\r\n\
         ST: {}\r\n\
         MAN: \"ssdp:discover\"\r\n\
         MX: {}\r\n\r\n",
        destination, search_target, mx
    )
}

/// Extract the description location from an SSDP reply
///
/// The reply must echo `ST: <search_target>` exactly (case-sensitive) on a
/// line of its own, and carry a `Location` header holding an absolute
/// http(s) URL.
pub fn parse_search_response(reply: &str, search_target: &str) -> Result<Url> {
    let st_line = format!("\r\nST: {}\r\n", search_target);
    if !reply.contains(&st_line) {
        return Err(Error::Protocol("search target not echoed".to_string()));
    }

    // Header lines follow the status line and stop at the blank line
    let value = reply
        .split("\r\n")
        .skip(1)
        .take_while(|line| !line.is_empty())
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.trim()
                .eq_ignore_ascii_case("location")
                .then(|| value.trim())
        })
        .ok_or_else(|| Error::Protocol("missing Location header".to_string()))?;

    let url = Url::parse(value)
        .map_err(|e| Error::Protocol(format!("bad Location {:?}: {}", value, e)))?;

    if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
        return Err(Error::Protocol(format!("unusable Location {:?}", value)));
    }

    Ok(url)
}

/// Discover the gateway and resolve its WANIPConnection control URL
///
/// Uses a reqwest transport with the HTTP timeout from `settings`.
pub fn discover(settings: &UpnpSettings) -> Result<Gateway<ReqwestTransport>> {
    let transport = ReqwestTransport::from_settings(settings)?;
    discover_with_transport(settings, transport)
}

/// Discover the gateway using the given HTTP transport
///
/// Only SSDP misses are retried. Once a reply is accepted, description
/// fetch and service location errors are returned as-is.
pub fn discover_with_transport<T: HttpTransport>(
    settings: &UpnpSettings,
    transport: T,
) -> Result<Gateway<T>> {
    settings.validate()?;

    info!("Searching for UPnP gateway ({})", settings.search_target);
    let location = SsdpDiscoverer::from_settings(settings).find_location()?;

    let root = fetch_description(&transport, location.as_str())?;
    let handle = locate_wan_ip_control_url(&root, location.as_str())?;

    info!("Found UPnP gateway, control URL {}", handle.control_url());
    Ok(Gateway::with_settings(handle, transport, settings))
}
