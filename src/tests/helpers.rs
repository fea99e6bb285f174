// Shared fixtures: a recording HTTP transport, description documents and a
// scripted SSDP responder

use crate::config::IGD_SEARCH_TARGET;
use crate::gateway::{Gateway, GatewayHandle};
use crate::http::{HttpResponse, HttpTransport};
use crate::Result;
use std::collections::VecDeque;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Mutex;
use std::thread::JoinHandle;
use std::time::Duration;

/// A request captured by [`RecordingTransport`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Transport that replays scripted responses and records every request
#[derive(Debug, Default)]
pub struct RecordingTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl RecordingTransport {
    pub fn with_responses(responses: Vec<HttpResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn respond(&self, request: RecordedRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request);
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted response left"))
    }
}

impl HttpTransport for RecordingTransport {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        self.respond(RecordedRequest {
            method: "GET",
            url: url.to_string(),
            headers: Vec::new(),
            body: String::new(),
        })
    }

    fn post(&self, url: &str, headers: &[(&str, String)], body: Vec<u8>) -> Result<HttpResponse> {
        self.respond(RecordedRequest {
            method: "POST",
            url: url.to_string(),
            headers: headers
                .iter()
                .map(|(n, v)| (n.to_string(), v.clone()))
                .collect(),
            body: String::from_utf8(body).unwrap(),
        })
    }
}

pub fn response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        body: body.to_string(),
    }
}

pub const CONTROL_URL: &str = "http://192.168.1.1:5000/control";

/// Gateway bound to [`CONTROL_URL`] over a recording transport
pub fn recording_gateway(responses: Vec<HttpResponse>) -> Gateway<RecordingTransport> {
    Gateway::new(
        GatewayHandle::new(CONTROL_URL.to_string()),
        RecordingTransport::with_responses(responses),
    )
}

/// Empty success response for `action`
pub fn action_response(action: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">
<s:Body><u:{action}Response xmlns:u="urn:schemas-upnp-org:service:WANIPConnection:1"></u:{action}Response></s:Body>
</s:Envelope>"#
    )
}

/// UPnP error response as sent by miniupnpd
pub fn fault_response(code: u16, description: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">
<s:Body><s:Fault><faultcode>s:Client</faultcode><faultstring>UPnPError</faultstring>
<detail><UPnPError xmlns="urn:schemas-upnp-org:control-1-0"><errorCode>{code}</errorCode><errorDescription>{description}</errorDescription></UPnPError></detail>
</s:Fault></s:Body>
</s:Envelope>"#
    )
}

/// Description of a typical router
///
/// `wan_device: false` drops the WANDevice (and everything below it).
pub fn igd_description(control_url: &str, wan_device: bool) -> String {
    let wan = if wan_device {
        format!(
            r#"<device>
        <deviceType>urn:schemas-upnp-org:device:WANDevice:1</deviceType>
        <serviceList>
          <service>
            <serviceType>urn:schemas-upnp-org:service:WANCommonInterfaceConfig:1</serviceType>
            <controlURL>/ctl/CmnIfCfg</controlURL>
          </service>
        </serviceList>
        <deviceList>
          <device>
            <deviceType>urn:schemas-upnp-org:device:WANConnectionDevice:1</deviceType>
            <serviceList>
              <service>
                <serviceType>urn:schemas-upnp-org:service:WANPPPConnection:1</serviceType>
                <controlURL>/ctl/PPPConn</controlURL>
              </service>
              <service>
                <serviceType>urn:schemas-upnp-org:service:WANIPConnection:1</serviceType>
                <serviceId>urn:upnp-org:serviceId:WANIPConn1</serviceId>
                <controlURL>{control_url}</controlURL>
                <eventSubURL>/evt/IPConn</eventSubURL>
                <SCPDURL>/WANIPCn.xml</SCPDURL>
              </service>
            </serviceList>
          </device>
        </deviceList>
      </device>"#
        )
    } else {
        String::new()
    };

    format!(
        r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <specVersion><major>1</major><minor>0</minor></specVersion>
  <device>
    <deviceType>urn:schemas-upnp-org:device:InternetGatewayDevice:1</deviceType>
    <friendlyName>Test Router</friendlyName>
    <serviceList>
      <service>
        <serviceType>urn:schemas-upnp-org:service:Layer3Forwarding:1</serviceType>
        <controlURL>/ctl/L3F</controlURL>
      </service>
    </serviceList>
    <deviceList>
      <device>
        <deviceType>urn:schemas-upnp-org:device:LANDevice:1</deviceType>
      </device>
      {wan}
    </deviceList>
  </device>
</root>"#
    )
}

/// SSDP reply for the gateway search target
pub fn ssdp_reply(search_target: &str, location: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\n\
         CACHE-CONTROL: max-age=120\r\n\
         ST: {search_target}\r\n\
         USN: uuid:test::{search_target}\r\n\
         EXT:\r\n\
         SERVER: Linux UPnP/1.1 test/1.0\r\n\
         Location: {location}\r\n\r\n"
    )
}

pub fn igd_reply(location: &str) -> String {
    ssdp_reply(IGD_SEARCH_TARGET, location)
}

/// Unicast stand-in for the SSDP multicast group
///
/// Answers the n-th received search with `replies[n]`; `None` stays silent.
/// The thread returns every request it received.
pub fn spawn_ssdp_responder(replies: Vec<Option<String>>) -> (SocketAddr, JoinHandle<Vec<String>>) {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let addr = socket.local_addr().unwrap();

    let handle = std::thread::spawn(move || {
        let mut received = Vec::new();
        let mut buf = [0u8; 2048];
        for reply in replies {
            let Ok((len, from)) = socket.recv_from(&mut buf) else {
                break;
            };
            received.push(String::from_utf8_lossy(&buf[..len]).into_owned());
            if let Some(reply) = reply {
                socket.send_to(reply.as_bytes(), from).unwrap();
            }
        }
        received
    });

    (addr, handle)
}
