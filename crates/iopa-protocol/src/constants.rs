//! Context field-key constants — every string key grouped by namespace.
//!
//! Each constant is the exact key middleware use to read and write context
//! fields at the component boundary. Keys are a wire contract between
//! independently-authored middleware and must never be renamed.

/// Keys in the `iopa.*` namespace — per-request protocol metadata.
pub struct IOPA;

impl IOPA {
    pub const SCHEME: &str = "iopa.Scheme";
    pub const METHOD: &str = "iopa.Method";
    pub const PATH_BASE: &str = "iopa.PathBase";
    pub const PATH: &str = "iopa.Path";
    pub const QUERY_STRING: &str = "iopa.QueryString";
    pub const PROTOCOL: &str = "iopa.Protocol";
    pub const HEADERS: &str = "iopa.Headers";
    pub const BODY: &str = "iopa.Body";
    pub const HOST: &str = "iopa.Host";

    pub const STATUS_CODE: &str = "iopa.StatusCode";
    pub const REASON_PHRASE: &str = "iopa.ReasonPhrase";

    pub const ERROR: &str = "iopa.Error";
    pub const VERSION: &str = "iopa.Version";
    pub const SEQ: &str = "iopa.Seq";
    pub const EVENTS: &str = "iopa.Events";
    pub const CALL_CANCELLED: &str = "iopa.CallCancelled";
}

/// Keys in the `server.*` namespace — hosting and connection metadata.
pub struct SERVER;

impl SERVER {
    pub const CAPABILITIES: &str = "server.Capabilities";
    pub const LOGGER: &str = "server.Logger";
    pub const APP_ID: &str = "server.AppId";
    pub const IS_LOCAL_ORIGIN: &str = "server.IsLocalOrigin";
    pub const IS_REQUEST: &str = "server.IsRequest";
    pub const ORIGINAL_URL: &str = "server.OriginalUrl";
    pub const REMOTE_ADDRESS: &str = "server.RemoteAddress";
    pub const REMOTE_PORT: &str = "server.RemotePort";
    pub const TLS: &str = "server.TLS";
    pub const PARENT_CONTEXT: &str = "server.ParentContext";
}

/// Keys in the `app.*` namespace — app-builder properties.
pub struct APP;

impl APP {
    pub const DEFAULT_APP: &str = "app.DefaultApp";
    pub const DEFAULT_MIDDLEWARE: &str = "app.DefaultMiddleware";
}

/// Request method strings common to the supported protocols.
pub struct METHODS;

impl METHODS {
    pub const GET: &str = "GET";
    pub const PUT: &str = "PUT";
    pub const DELETE: &str = "DELETE";
    pub const POST: &str = "POST";
}

/// Protocol version strings stored in `iopa.Protocol`.
pub struct PROTOCOLS;

impl PROTOCOLS {
    pub const HTTP: &str = "HTTP/1.1";
    pub const COAP: &str = "COAP/1.0";
    pub const MQTT: &str = "MQTT/3.1.1";
}

/// URL scheme strings recognized by the request constructors.
/// The trailing colon matches the form stored in `iopa.Scheme`.
pub struct SCHEMES;

impl SCHEMES {
    pub const HTTP: &str = "http:";
    pub const HTTPS: &str = "https:";
    pub const COAP: &str = "coap:";
    pub const COAPS: &str = "coaps:";
    pub const MQTT: &str = "mqtt:";
    pub const MQTTS: &str = "mqtts:";
}

/// Default ports per scheme, applied when the URL carries no explicit port.
pub struct PORTS;

impl PORTS {
    pub const HTTP: u16 = 80;
    pub const HTTPS: u16 = 443;
    pub const COAP: u16 = 5683;
    pub const COAPS: u16 = 5684;
    pub const MQTT: u16 = 1883;
    pub const MQTTS: u16 = 8883;
}
