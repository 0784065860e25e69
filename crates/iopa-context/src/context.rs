//! The shared context handle — per-request state threaded through a
//! pipeline invocation.
//!
//! A [`Context`] is a cheap clone over one pooled record. Every clone sees
//! the same record, so a mutation made by one middleware is visible to all
//! downstream middleware in the same invocation. Responses and derived
//! child contexts are full contexts themselves; the parent link is
//! non-owning.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use iopa_protocol::PipelineError;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::Span;

use crate::events::ContextEvent;
use crate::pool::PoolShared;
use crate::record::Record;

/// One pooled record cell. Cells are recycled through the pool free list;
/// the record inside is reset to its zero value between tenants.
pub(crate) struct ContextCell {
    pub(crate) record: RwLock<Record>,
}

impl ContextCell {
    pub(crate) fn blank() -> Arc<Self> {
        Arc::new(Self {
            record: RwLock::new(Record::default()),
        })
    }
}

/// Shared handle over one in-flight request (or response) record.
#[derive(Clone)]
pub struct Context {
    pub(crate) cell: Arc<ContextCell>,
}

/// Non-owning handle, used for parent back-references so a child context
/// never keeps its parent's record alive.
#[derive(Clone)]
pub struct WeakContext {
    cell: Weak<ContextCell>,
}

impl WeakContext {
    pub fn upgrade(&self) -> Option<Context> {
        self.cell.upgrade().map(|cell| Context { cell })
    }
}

impl Context {
    pub(crate) fn from_cell(cell: Arc<ContextCell>) -> Self {
        Self { cell }
    }

    pub fn downgrade(&self) -> WeakContext {
        WeakContext {
            cell: Arc::downgrade(&self.cell),
        }
    }

    /// Whether two handles refer to the same record.
    pub fn same(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    // ── Boundary access by verbatim string key ────────────────────────────

    /// Read a field by its `iopa.*`/`server.*` key. Unknown keys resolve
    /// through the open extension map.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.cell.record.read().get_field(key)
    }

    /// Write a field by its `iopa.*`/`server.*` key. Unknown keys land in
    /// the open extension map.
    pub fn set(&self, key: &str, value: Value) {
        self.cell.record.write().set_field(key, value);
    }

    // ── Protocol metadata ─────────────────────────────────────────────────

    pub fn scheme(&self) -> String {
        self.cell.record.read().scheme.clone()
    }

    pub fn method(&self) -> String {
        self.cell.record.read().method.clone()
    }

    pub fn set_method(&self, method: impl Into<String>) {
        self.cell.record.write().method = method.into();
    }

    pub fn path(&self) -> String {
        self.cell.record.read().path.clone()
    }

    pub fn set_path(&self, path: impl Into<String>) {
        self.cell.record.write().path = path.into();
    }

    pub fn path_base(&self) -> String {
        self.cell.record.read().path_base.clone()
    }

    pub fn query_string(&self) -> String {
        self.cell.record.read().query_string.clone()
    }

    pub fn protocol(&self) -> String {
        self.cell.record.read().protocol.clone()
    }

    pub fn host(&self) -> String {
        self.cell.record.read().host.clone()
    }

    pub fn version(&self) -> String {
        self.cell.record.read().version.clone()
    }

    pub fn seq(&self) -> u16 {
        self.cell.record.read().seq
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.cell.record.read().headers.get(name).cloned()
    }

    pub fn set_header(&self, name: impl Into<String>, value: impl Into<String>) {
        self.cell
            .record
            .write()
            .headers
            .insert(name.into(), value.into());
    }

    pub fn remove_header(&self, name: &str) -> Option<String> {
        self.cell.record.write().headers.remove(name)
    }

    pub fn headers(&self) -> HashMap<String, String> {
        self.cell.record.read().headers.clone()
    }

    pub fn body(&self) -> Option<Value> {
        self.cell.record.read().body.clone()
    }

    pub fn set_body(&self, body: Value) {
        self.cell.record.write().body = Some(body);
    }

    /// Append a text chunk to the body, treating the body as a string.
    pub fn write(&self, chunk: &str) {
        let mut record = self.cell.record.write();
        match &mut record.body {
            Some(Value::String(s)) => s.push_str(chunk),
            slot => *slot = Some(Value::from(chunk)),
        }
    }

    // ── Response fields ───────────────────────────────────────────────────

    pub fn status_code(&self) -> Option<u16> {
        self.cell.record.read().status_code
    }

    pub fn set_status(&self, status: u16) {
        self.cell.record.write().status_code = Some(status);
    }

    pub fn reason_phrase(&self) -> String {
        self.cell.record.read().reason_phrase.clone()
    }

    pub fn set_reason_phrase(&self, reason: impl Into<String>) {
        self.cell.record.write().reason_phrase = reason.into();
    }

    // ── Error marker ──────────────────────────────────────────────────────

    pub fn error(&self) -> Option<PipelineError> {
        self.cell.record.read().error.clone()
    }

    pub fn set_error(&self, error: PipelineError) {
        self.cell.record.write().error = Some(error);
    }

    // ── Origin and connection metadata ────────────────────────────────────

    pub fn is_request(&self) -> bool {
        self.cell.record.read().is_request
    }

    pub fn is_local_origin(&self) -> bool {
        self.cell.record.read().is_local_origin
    }

    pub fn tls(&self) -> bool {
        self.cell.record.read().tls
    }

    pub fn remote_address(&self) -> String {
        self.cell.record.read().remote_address.clone()
    }

    pub fn remote_port(&self) -> Option<u16> {
        self.cell.record.read().remote_port
    }

    pub fn original_url(&self) -> Option<String> {
        self.cell.record.read().original_url.clone()
    }

    // ── Capabilities ──────────────────────────────────────────────────────

    pub fn capability(&self, name: &str) -> Option<Value> {
        self.cell.record.read().capabilities.get(name).cloned()
    }

    pub fn set_capability(&self, name: impl Into<String>, value: Value) {
        self.cell
            .record
            .write()
            .capabilities
            .insert(name.into(), value);
    }

    pub fn capabilities(&self) -> HashMap<String, Value> {
        self.cell.record.read().capabilities.clone()
    }

    // ── Pairing and lineage ───────────────────────────────────────────────

    /// The paired response sub-context, when this context carries one.
    pub fn response(&self) -> Option<Context> {
        self.cell.record.read().response.clone()
    }

    /// The parent this context was derived from, if still alive.
    pub fn parent(&self) -> Option<Context> {
        let parent = self.cell.record.read().parent.clone();
        parent.and_then(|weak| weak.upgrade())
    }

    // ── Cancellation, events, logging ─────────────────────────────────────

    /// Token downstream handlers observe to abort work early. `None` once
    /// the context has been disposed.
    pub fn cancellation_token(&self) -> Option<CancellationToken> {
        self.cell
            .record
            .read()
            .cancellation
            .as_ref()
            .map(|source| source.token())
    }

    pub fn is_cancelled(&self) -> bool {
        self.cell
            .record
            .read()
            .cancellation
            .as_ref()
            .is_some_and(|source| source.is_cancelled())
    }

    /// Subscribe to this context's lifecycle events. `None` once disposed.
    pub fn subscribe(&self) -> Option<broadcast::Receiver<ContextEvent>> {
        self.cell
            .record
            .read()
            .events
            .as_ref()
            .map(|tx| tx.subscribe())
    }

    /// Emit a lifecycle event to subscribers, if any are listening.
    pub fn emit(&self, event: ContextEvent) {
        if let Some(tx) = &self.cell.record.read().events {
            let _ = tx.send(event);
        }
    }

    /// The logger span attached to this context.
    pub fn span(&self) -> Span {
        self.cell
            .record
            .read()
            .span
            .clone()
            .unwrap_or_else(Span::none)
    }

    // ── Disposal ──────────────────────────────────────────────────────────

    /// Return this context (and its paired response) to the owning pool.
    /// A no-op if the context was already disposed or never pooled.
    pub fn dispose(&self) {
        let pool: Option<Weak<PoolShared>> = self.cell.record.read().pool.clone();
        if let Some(shared) = pool.and_then(|weak| weak.upgrade()) {
            PoolShared::dispose_cell(&shared, self);
        }
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let record = self.cell.record.read();
        f.debug_struct("Context")
            .field("seq", &record.seq)
            .field("method", &record.method)
            .field("path", &record.path)
            .field("protocol", &record.protocol)
            .field("is_request", &record.is_request)
            .finish_non_exhaustive()
    }
}
