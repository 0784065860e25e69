//! The context record — typed fields behind the string-key boundary.

use std::collections::HashMap;
use std::sync::Weak;

use iopa_protocol::{IOPA, PipelineError, SERVER};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::Span;

use crate::cancellation::CancellationSource;
use crate::context::{Context, WeakContext};
use crate::events::ContextEvent;
use crate::pool::PoolShared;

/// One request (or response) record. Fields are typed internally; the
/// external string-key names are preserved by [`Record::get_field`] /
/// [`Record::set_field`]. Resetting to `Default` is the whole disposal
/// story — no field may survive into the next tenant.
#[derive(Default)]
pub(crate) struct Record {
    pub version: String,
    pub seq: u16,

    pub scheme: String,
    pub method: String,
    pub path: String,
    pub path_base: String,
    pub query_string: String,
    pub protocol: String,
    pub host: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,

    pub status_code: Option<u16>,
    pub reason_phrase: String,
    pub error: Option<PipelineError>,

    pub is_request: bool,
    pub is_local_origin: bool,
    pub tls: bool,
    pub remote_address: String,
    pub remote_port: Option<u16>,
    pub original_url: Option<String>,

    pub capabilities: HashMap<String, Value>,
    pub cancellation: Option<CancellationSource>,
    pub events: Option<broadcast::Sender<ContextEvent>>,
    pub span: Option<Span>,

    pub response: Option<Context>,
    pub parent: Option<WeakContext>,
    pub pool: Option<Weak<PoolShared>>,

    /// Middleware-defined keys outside the typed set.
    pub extensions: HashMap<String, Value>,
}

impl Record {
    /// Reset every field to its zero value in one step.
    pub fn reset(&mut self) {
        *self = Record::default();
    }

    /// Read a field by its verbatim boundary key. Typed fields always
    /// resolve; unknown keys fall through to the extension map.
    pub fn get_field(&self, key: &str) -> Option<Value> {
        let value = match key {
            IOPA::SCHEME => Value::from(self.scheme.as_str()),
            IOPA::METHOD => Value::from(self.method.as_str()),
            IOPA::PATH => Value::from(self.path.as_str()),
            IOPA::PATH_BASE => Value::from(self.path_base.as_str()),
            IOPA::QUERY_STRING => Value::from(self.query_string.as_str()),
            IOPA::PROTOCOL => Value::from(self.protocol.as_str()),
            IOPA::HOST => Value::from(self.host.as_str()),
            IOPA::VERSION => Value::from(self.version.as_str()),
            IOPA::SEQ => Value::from(self.seq),
            IOPA::REASON_PHRASE => Value::from(self.reason_phrase.as_str()),
            IOPA::HEADERS => serde_json::to_value(&self.headers).unwrap_or(Value::Null),
            IOPA::BODY => self.body.clone().unwrap_or(Value::Null),
            IOPA::STATUS_CODE => self.status_code.map(Value::from).unwrap_or(Value::Null),
            IOPA::ERROR => self
                .error
                .as_ref()
                .and_then(|e| serde_json::to_value(e).ok())
                .unwrap_or(Value::Null),
            IOPA::CALL_CANCELLED => Value::from(
                self.cancellation
                    .as_ref()
                    .is_some_and(|source| source.is_cancelled()),
            ),
            SERVER::CAPABILITIES => {
                serde_json::to_value(&self.capabilities).unwrap_or(Value::Null)
            }
            SERVER::IS_LOCAL_ORIGIN => Value::from(self.is_local_origin),
            SERVER::IS_REQUEST => Value::from(self.is_request),
            SERVER::TLS => Value::from(self.tls),
            SERVER::REMOTE_ADDRESS => Value::from(self.remote_address.as_str()),
            SERVER::REMOTE_PORT => self.remote_port.map(Value::from).unwrap_or(Value::Null),
            SERVER::ORIGINAL_URL => self
                .original_url
                .as_deref()
                .map(Value::from)
                .unwrap_or(Value::Null),
            _ => return self.extensions.get(key).cloned(),
        };
        Some(value)
    }

    /// Write a field by its verbatim boundary key. Unknown keys land in
    /// the extension map and round-trip through [`Record::get_field`].
    pub fn set_field(&mut self, key: &str, value: Value) {
        match key {
            IOPA::SCHEME => self.scheme = value_to_string(value),
            IOPA::METHOD => self.method = value_to_string(value),
            IOPA::PATH => self.path = value_to_string(value),
            IOPA::PATH_BASE => self.path_base = value_to_string(value),
            IOPA::QUERY_STRING => self.query_string = value_to_string(value),
            IOPA::PROTOCOL => self.protocol = value_to_string(value),
            IOPA::HOST => self.host = value_to_string(value),
            IOPA::VERSION => self.version = value_to_string(value),
            IOPA::REASON_PHRASE => self.reason_phrase = value_to_string(value),
            IOPA::SEQ => {
                if let Some(n) = value.as_u64() {
                    self.seq = n as u16;
                }
            }
            IOPA::HEADERS => {
                if let Value::Object(map) = value {
                    self.headers = map
                        .into_iter()
                        .map(|(k, v)| (k, value_to_string(v)))
                        .collect();
                }
            }
            IOPA::BODY => self.body = non_null(value),
            IOPA::STATUS_CODE => self.status_code = value.as_u64().map(|n| n as u16),
            IOPA::ERROR => self.error = serde_json::from_value(value).ok(),
            SERVER::CAPABILITIES => {
                if let Value::Object(map) = value {
                    self.capabilities = map.into_iter().collect();
                }
            }
            SERVER::IS_LOCAL_ORIGIN => self.is_local_origin = value.as_bool().unwrap_or(false),
            SERVER::IS_REQUEST => self.is_request = value.as_bool().unwrap_or(false),
            SERVER::TLS => self.tls = value.as_bool().unwrap_or(false),
            SERVER::REMOTE_ADDRESS => self.remote_address = value_to_string(value),
            SERVER::REMOTE_PORT => self.remote_port = value.as_u64().map(|n| n as u16),
            SERVER::ORIGINAL_URL => self.original_url = non_null(value).map(value_to_string),
            _ => {
                self.extensions.insert(key.to_string(), value);
            }
        }
    }
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn non_null(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        other => Some(other),
    }
}
