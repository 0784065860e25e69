//! IOPA Context Layer
//!
//! Context records and their allocation. The pool hands out cheaply
//! cloneable [`Context`] handles over pooled records, builds paired
//! request/response contexts with protocol defaults derived from a URL,
//! merges capability maps across parent/child contexts, and assigns
//! monotonic sequence identifiers. Disposal resets a record in one step
//! and recycles its cell.

pub mod cancellation;
pub mod context;
pub mod events;
pub mod pool;
mod record;

pub use cancellation::CancellationSource;
pub use context::{Context, WeakContext};
pub use events::ContextEvent;
pub use pool::{ContextError, ContextPool, PoolConfig, RequestOptions};
