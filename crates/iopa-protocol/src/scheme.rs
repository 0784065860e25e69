//! Scheme resolution — maps a URL scheme to protocol defaults.

use crate::constants::{PORTS, PROTOCOLS, SCHEMES};

/// Protocol defaults derived from a URL scheme.
///
/// An unrecognized scheme resolves to itself as the protocol string, with
/// TLS off and the HTTP default port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeDefaults {
    /// Protocol version string for `iopa.Protocol`
    pub protocol: String,
    /// Whether the scheme implies TLS
    pub tls: bool,
    /// Port used when the URL carries no explicit port
    pub default_port: u16,
}

impl SchemeDefaults {
    fn known(protocol: &str, tls: bool, default_port: u16) -> Self {
        Self {
            protocol: protocol.into(),
            tls,
            default_port,
        }
    }

    /// Resolve a scheme to its protocol defaults. Accepts the scheme with
    /// or without the trailing colon ("https:" and "https" are the same).
    pub fn resolve(scheme: &str) -> Self {
        let bare = scheme.trim_end_matches(':');
        match format!("{bare}:").as_str() {
            SCHEMES::HTTP => Self::known(PROTOCOLS::HTTP, false, PORTS::HTTP),
            SCHEMES::HTTPS => Self::known(PROTOCOLS::HTTP, true, PORTS::HTTPS),
            SCHEMES::COAP => Self::known(PROTOCOLS::COAP, false, PORTS::COAP),
            SCHEMES::COAPS => Self::known(PROTOCOLS::COAP, true, PORTS::COAPS),
            SCHEMES::MQTT => Self::known(PROTOCOLS::MQTT, false, PORTS::MQTT),
            SCHEMES::MQTTS => Self::known(PROTOCOLS::MQTT, true, PORTS::MQTTS),
            other => Self {
                protocol: other.into(),
                tls: false,
                default_port: PORTS::HTTP,
            },
        }
    }
}
