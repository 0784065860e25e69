//! The context pool — recyclable allocation of request/response pairs.
//!
//! Allocation never fails: the pool recycles cells from a free list and
//! constructs fresh ones when the list is empty. Capacity is a soft limit
//! on how many free cells are retained — cells released beyond it are
//! simply dropped. The sequence counter is owned by the pool instance,
//! randomly seeded, and wraps modulo 2^16 without ever emitting 0.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};

use iopa_protocol::{IOPA, METHODS, PROTOCOLS, SchemeDefaults};
use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug_span;
use url::Url;

use crate::cancellation::CancellationSource;
use crate::context::{Context, ContextCell};
use crate::events::ContextEvent;

/// Number of lifecycle events buffered per context before lagging
/// subscribers start missing them.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Pool configuration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of free cells retained for reuse.
    pub capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { capacity: 100 }
    }
}

/// Failure constructing a request context.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("invalid request url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Caller-supplied overrides for the request constructors. A bare method
/// string is shorthand for `{ "iopa.Method": method }`; a field map is
/// merged over the URL-derived defaults, options winning.
#[derive(Debug, Clone, Default)]
pub enum RequestOptions {
    #[default]
    None,
    Method(String),
    Fields(HashMap<String, Value>),
}

impl From<&str> for RequestOptions {
    fn from(method: &str) -> Self {
        Self::Method(method.to_string())
    }
}

impl From<String> for RequestOptions {
    fn from(method: String) -> Self {
        Self::Method(method)
    }
}

impl From<HashMap<String, Value>> for RequestOptions {
    fn from(fields: HashMap<String, Value>) -> Self {
        Self::Fields(fields)
    }
}

impl RequestOptions {
    fn into_fields(self) -> HashMap<String, Value> {
        match self {
            Self::None => HashMap::new(),
            Self::Method(method) => {
                HashMap::from([(IOPA::METHOD.to_string(), Value::from(method))])
            }
            Self::Fields(fields) => fields,
        }
    }
}

/// State shared between the pool handle and the disposal path reachable
/// from every pooled context.
pub(crate) struct PoolShared {
    free: Mutex<Vec<Arc<ContextCell>>>,
    capacity: usize,
    seq: AtomicU16,
}

impl PoolShared {
    /// Next sequence id — strictly increasing modulo 2^16, never 0.
    fn next_seq(&self) -> u16 {
        let mut next = self.seq.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        if next == 0 {
            next = self.seq.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        }
        next
    }

    fn take_free(&self) -> Option<Arc<ContextCell>> {
        self.free.lock().pop()
    }

    fn release(&self, cell: Arc<ContextCell>) {
        let mut free = self.free.lock();
        if free.len() < self.capacity {
            free.push(cell);
        }
    }

    /// Reset a context (and its paired response) and recycle the cells.
    /// No-op when the record was already cleared — double dispose and
    /// dispose-of-blank are silently ignored.
    pub(crate) fn dispose_cell(shared: &Arc<PoolShared>, context: &Context) {
        let response = {
            let mut record = context.cell.record.write();
            if record.cancellation.is_none() {
                return;
            }
            // Disposal is the end of this request: outstanding work derived
            // from the context observes cancellation from here on.
            if let Some(source) = &record.cancellation {
                source.cancel();
            }
            if let Some(tx) = &record.events {
                let _ = tx.send(ContextEvent::Finish);
            }
            let response = record.response.take();
            record.reset();
            response
        };

        if let Some(response) = response {
            {
                let mut record = response.cell.record.write();
                if let Some(source) = &record.cancellation {
                    source.cancel();
                }
                record.reset();
            }
            shared.release(response.cell.clone());
        }

        shared.release(context.cell.clone());
    }
}

/// Recyclable allocator for paired request/response contexts.
pub struct ContextPool {
    shared: Arc<PoolShared>,
}

impl ContextPool {
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            shared: Arc::new(PoolShared {
                free: Mutex::new(Vec::new()),
                capacity: config.capacity,
                seq: AtomicU16::new(rand::random()),
            }),
        }
    }

    /// Number of free cells currently retained.
    pub fn free_count(&self) -> usize {
        self.shared.free.lock().len()
    }

    /// Recycled or freshly constructed blank context, initialized with the
    /// generic fields common to all server types. The returned handle is
    /// not held by any other caller.
    pub fn allocate(&self) -> Context {
        let cell = self.shared.take_free().unwrap_or_else(ContextCell::blank);
        let context = Context::from_cell(cell);

        let seq = self.shared.next_seq();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        {
            let mut record = context.cell.record.write();
            record.version = "1.2".into();
            record.seq = seq;
            record.cancellation = Some(CancellationSource::new());
            record.events = Some(events);
            record.span = Some(debug_span!("context", seq));
            record.pool = Some(Arc::downgrade(&self.shared));
        }
        context
    }

    /// Fully initialized request + response pair with blank defaults:
    /// empty headers map, empty method/path/scheme strings, null body,
    /// null status code, empty reason phrase.
    pub fn create_context(&self) -> Context {
        let context = self.allocate();
        let response = self.allocate();

        {
            let mut record = response.cell.record.write();
            record.parent = Some(context.downgrade());
        }
        {
            let mut record = context.cell.record.write();
            record.response = Some(response);
        }
        context
    }

    /// Request context populated from a URL, with default options.
    pub fn create_request(&self, url: &str) -> Result<Context, ContextError> {
        self.create_request_with(url, RequestOptions::None)
    }

    /// Request context populated from a URL. The scheme resolves to
    /// {protocol, TLS, default port} through the resolution table; an
    /// explicit URL port overrides the table default; caller options win
    /// over everything derived.
    pub fn create_request_with(
        &self,
        url: &str,
        options: impl Into<RequestOptions>,
    ) -> Result<Context, ContextError> {
        let parsed = Url::parse(url).map_err(|source| ContextError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        let defaults = SchemeDefaults::resolve(parsed.scheme());

        let host = parsed.host_str().unwrap_or("").to_string();
        let context = self.allocate();
        {
            let mut record = context.cell.record.write();
            record.is_local_origin = true;
            record.is_request = true;
            record.original_url = Some(url.to_string());
            record.method = METHODS::GET.into();
            record.scheme = format!("{}:", parsed.scheme());
            record.path = parsed.path().into();
            record.path_base = String::new();
            record.query_string = parsed.query().unwrap_or("").into();
            record.host = host.clone();
            record.remote_address = host.clone();
            record.remote_port = Some(parsed.port().unwrap_or(defaults.default_port));
            record.tls = defaults.tls;
            if defaults.protocol == PROTOCOLS::HTTP {
                record.headers.insert("Host".into(), host);
            }
            record.protocol = defaults.protocol;

            for (key, value) in options.into().into_fields() {
                record.set_field(&key, value);
            }
        }
        Ok(context)
    }

    /// As [`ContextPool::create_request`], plus a paired response
    /// sub-context inheriting protocol, TLS, remote address/port and
    /// logger from the request.
    pub fn create_request_response(&self, url: &str) -> Result<Context, ContextError> {
        self.create_request_response_with(url, RequestOptions::None)
    }

    pub fn create_request_response_with(
        &self,
        url: &str,
        options: impl Into<RequestOptions>,
    ) -> Result<Context, ContextError> {
        let context = self.create_request_with(url, options)?;
        let response = self.allocate();

        {
            let request = context.cell.record.read();
            let mut record = response.cell.record.write();
            record.parent = Some(context.downgrade());
            record.protocol = request.protocol.clone();
            record.tls = request.tls;
            record.remote_address = request.remote_address.clone();
            record.remote_port = request.remote_port;
            record.span = request.span.clone();
            record.is_request = false;
            record.is_local_origin = false;
        }
        {
            let mut record = context.cell.record.write();
            record.response = Some(response);
        }
        Ok(context)
    }

    /// Set `child`'s parent back-reference and merge `parent`'s capability
    /// map into `child` as the baseline: entries the child already defines
    /// win, inherited entries are deep-cloned so later child mutations
    /// never reach the parent. Response capability maps merge the same way
    /// when both sides carry a response.
    pub fn merge_capabilities(&self, child: &Context, parent: &Context) {
        {
            let mut record = child.cell.record.write();
            record.parent = Some(parent.downgrade());
        }

        let inherited = parent.cell.record.read().capabilities.clone();
        {
            let mut record = child.cell.record.write();
            for (name, value) in inherited {
                record.capabilities.entry(name).or_insert(value);
            }
        }

        if let (Some(child_response), Some(parent_response)) =
            (child.response(), parent.response())
        {
            let inherited = parent_response.cell.record.read().capabilities.clone();
            let mut record = child_response.cell.record.write();
            for (name, value) in inherited {
                record.capabilities.entry(name).or_insert(value);
            }
        }
    }

    /// Return a context and its paired response to the pool. Already
    /// disposed (or never-initialized) contexts are ignored.
    pub fn dispose(&self, context: &Context) {
        PoolShared::dispose_cell(&self.shared, context);
    }
}

impl Default for ContextPool {
    fn default() -> Self {
        Self::new()
    }
}
