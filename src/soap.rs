//! SOAP-RPC invocation against the WANIPConnection service

use crate::config::DEFAULT_USER_AGENT;
use crate::description::child_text;
use crate::http::HttpTransport;
use crate::locator::WAN_IP_CONNECTION_SERVICE_TYPE;
use crate::{Error, Result};
use tracing::{debug, warn};
use xmltree::Element;

/// SOAP 1.1 envelope namespace
pub const SOAP_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
/// SOAP 1.1 encoding style
pub const SOAP_ENCODING_STYLE: &str = "http://schemas.xmlsoap.org/soap/encoding/";

/// Fault details extracted from a SOAP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapFault {
    /// UPnP `errorCode` if present, otherwise `faultcode`
    pub code: String,
    /// UPnP `errorDescription` if present, otherwise `faultstring`
    pub message: String,
}

impl From<SoapFault> for Error {
    fn from(fault: SoapFault) -> Self {
        Error::Fault {
            code: fault.code,
            message: fault.message,
        }
    }
}

/// Sends SOAP actions over an [`HttpTransport`]
#[derive(Debug, Clone)]
pub struct SoapInvoker<T> {
    transport: T,
    user_agent: String,
}

impl<T: HttpTransport> SoapInvoker<T> {
    /// Create an invoker with the default User-Agent
    pub fn new(transport: T) -> Self {
        Self::with_user_agent(transport, DEFAULT_USER_AGENT)
    }

    /// Create an invoker with a custom User-Agent
    pub fn with_user_agent(transport: T, user_agent: impl Into<String>) -> Self {
        Self {
            transport,
            user_agent: user_agent.into(),
        }
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Invoke `action` at `control_url` with the given action element
    ///
    /// Returns the raw body of a 2xx response. A status >= 400 is an
    /// [`Error::Http`] carrying the action name; a fault with any lower
    /// status is an [`Error::Fault`]. Remaining non-2xx statuses are
    /// reported as [`Error::Http`].
    pub fn invoke(&self, control_url: &str, action: &str, fragment: &str) -> Result<String> {
        let envelope = build_envelope(fragment);
        let headers = [
            ("Content-Type", "text/xml".to_string()),
            ("SOAPAction", soap_action_header(action)),
            ("Connection", "Close".to_string()),
            ("Cache-Control", "no-cache".to_string()),
            ("Pragma", "no-cache".to_string()),
            ("User-Agent", self.user_agent.clone()),
        ];

        debug!("Invoking {} at {}", action, control_url);
        let response = self
            .transport
            .post(control_url, &headers, envelope.into_bytes())?;

        if response.is_error() {
            if let Some(fault) = parse_fault(&response.body) {
                warn!(
                    "{} failed with HTTP {}: fault {} ({})",
                    action, response.status, fault.code, fault.message
                );
            }
            return Err(Error::Http {
                context: action.to_string(),
                status: response.status,
            });
        }

        if let Some(fault) = parse_fault(&response.body) {
            warn!("{} returned fault {} ({})", action, fault.code, fault.message);
            return Err(fault.into());
        }

        if !response.is_success() {
            return Err(Error::Http {
                context: action.to_string(),
                status: response.status,
            });
        }

        Ok(response.body)
    }
}

/// Wrap an action element in a SOAP 1.1 envelope
pub fn build_envelope(fragment: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?>\
         <s:Envelope xmlns:s=\"{}\" s:encodingStyle=\"{}\">\r\n\
         <s:Body>{}</s:Body></s:Envelope>",
        SOAP_ENVELOPE_NS, SOAP_ENCODING_STYLE, fragment
    )
}

/// Quoted `SOAPAction` header value for a WANIPConnection action
pub fn soap_action_header(action: &str) -> String {
    format!("\"{}#{}\"", WAN_IP_CONNECTION_SERVICE_TYPE, action)
}

/// Build a WANIPConnection action element from ordered arguments
///
/// Argument values are escaped as XML character data.
pub fn build_action(action: &str, args: &[(&str, String)]) -> String {
    let mut fragment = format!(
        "<u:{} xmlns:u=\"{}\">\r\n",
        action, WAN_IP_CONNECTION_SERVICE_TYPE
    );
    for (name, value) in args {
        fragment.push_str(&format!(
            "<{name}>{}</{name}>",
            xml::escape::escape_str_pcdata(value)
        ));
    }
    fragment.push_str(&format!("</u:{}>", action));
    fragment
}

/// Extract a SOAP fault from a response body, if it carries one
///
/// Bodies that are not XML are not faults.
pub fn parse_fault(body: &str) -> Option<SoapFault> {
    let envelope = Element::parse(body.as_bytes()).ok()?;
    let fault = envelope.get_child("Body")?.get_child("Fault")?;

    let upnp_error = fault
        .get_child("detail")
        .and_then(|detail| detail.get_child("UPnPError"));

    let (error_code, error_description) = upnp_error
        .map(|e| (child_text(e, "errorCode"), child_text(e, "errorDescription")))
        .unwrap_or_default();

    let code = if error_code.is_empty() {
        child_text(fault, "faultcode")
    } else {
        error_code
    };
    let message = if error_description.is_empty() {
        child_text(fault, "faultstring")
    } else {
        error_description
    };

    Some(SoapFault { code, message })
}

/// Text of an output argument inside the action response element
pub fn response_value(body: &str, action: &str, argument: &str) -> Option<String> {
    let envelope = Element::parse(body.as_bytes()).ok()?;
    let response = envelope
        .get_child("Body")?
        .get_child(format!("{}Response", action).as_str())?;
    let value = child_text(response, argument);
    (!value.is_empty()).then_some(value)
}
