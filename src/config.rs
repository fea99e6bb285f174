//! Discovery and control settings

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

/// SSDP multicast group and port
pub const SSDP_MULTICAST_ADDR: SocketAddrV4 =
    SocketAddrV4::new(Ipv4Addr::new(239, 255, 255, 250), 1900);

/// Search target for UPnP Internet Gateway Devices
pub const IGD_SEARCH_TARGET: &str = "urn:schemas-upnp-org:device:InternetGatewayDevice:1";

/// User-Agent sent with SOAP requests
pub const DEFAULT_USER_AGENT: &str = "Darwin/10.0.0, UPnP/1.0, MiniUPnPc/1.3";

/// Settings for gateway discovery and control
///
/// Stored as JSON; every field has a default so partial files load fine.
///
/// # Example
/// ```rust,no_run
/// use upnp_forward::UpnpSettings;
///
/// let mut settings = UpnpSettings::load("upnp.json").expect("Failed to load");
/// settings.max_attempts = 5;
/// settings.save("upnp.json").expect("Failed to save");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpnpSettings {
    /// SSDP search target (`ST` header)
    pub search_target: String,
    /// Number of M-SEARCH attempts before giving up
    pub max_attempts: u32,
    /// Receive timeout per attempt in milliseconds
    pub attempt_timeout_ms: u64,
    /// `MX` header: maximum seconds a device may delay its reply
    pub mx: u8,
    /// Destination of the search datagram
    pub multicast_addr: SocketAddr,
    /// Timeout for description and SOAP requests in milliseconds
    pub http_timeout_ms: u64,
    /// User-Agent header for HTTP requests
    pub user_agent: String,
}

impl UpnpSettings {
    /// Load settings from a JSON file
    ///
    /// Returns default settings if the file doesn't exist or is empty.
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path)
            .map_err(|e| Error::Settings(format!("Failed to read settings: {}", e)))?;

        if data.trim().is_empty() {
            return Ok(Self::default());
        }

        let settings: Self = serde_json::from_str(&data)
            .map_err(|e| Error::Settings(format!("Failed to parse settings: {}", e)))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a JSON file, creating parent directories
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Settings(format!("Failed to create settings directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Settings(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(path, json)
            .map_err(|e| Error::Settings(format!("Failed to write settings: {}", e)))?;

        Ok(())
    }

    /// Reject values that would make discovery meaningless
    pub fn validate(&self) -> Result<()> {
        if self.search_target.trim().is_empty() {
            return Err(Error::Settings("search_target must not be empty".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(Error::Settings("max_attempts must be at least 1".to_string()));
        }
        // A zero read timeout is rejected by UdpSocket::set_read_timeout
        if self.attempt_timeout_ms == 0 {
            return Err(Error::Settings("attempt_timeout_ms must be positive".to_string()));
        }
        if !self.multicast_addr.is_ipv4() {
            return Err(Error::Settings("multicast_addr must be an IPv4 address".to_string()));
        }
        Ok(())
    }

    /// Receive timeout per SSDP attempt
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    /// Timeout for a single HTTP round trip
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}

impl Default for UpnpSettings {
    fn default() -> Self {
        Self {
            search_target: IGD_SEARCH_TARGET.to_string(),
            max_attempts: 3,
            attempt_timeout_ms: 3_000,
            mx: 2,
            multicast_addr: SocketAddr::V4(SSDP_MULTICAST_ADDR),
            http_timeout_ms: 5_000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}
