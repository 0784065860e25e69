//! Middleware contract — one canonical call shape, two adapters.
//!
//! The canonical shape is `invoke(context, next)`. Closures of that shape
//! are adapted through [`FnMiddleware`]; handler types implement
//! [`Middleware`] directly and are invoked as a method on the handler.
//! Both shapes observe the same context identity and mutation visibility.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use iopa_context::Context;
use iopa_protocol::PipelineError;
use serde_json::Value;

/// Completion of one pipeline invocation or chain segment.
pub type PipelineResult = Result<Value, PipelineError>;

/// Boxed completion returned by every middleware.
pub type AppFuture = Pin<Box<dyn Future<Output = PipelineResult> + Send>>;

/// One unit of request-processing logic in the chain.
///
/// A middleware may short-circuit by resolving without invoking `next`;
/// downstream middleware then never execute.
pub trait Middleware: Send + Sync + 'static {
    fn invoke(&self, context: Context, next: Next) -> AppFuture;
}

/// The downstream continuation handed to a middleware — invoking it runs
/// the rest of the chain for the same context.
#[derive(Clone)]
pub struct Next {
    inner: Arc<dyn Fn() -> AppFuture + Send + Sync>,
}

impl Next {
    pub(crate) fn new(f: impl Fn() -> AppFuture + Send + Sync + 'static) -> Self {
        Self { inner: Arc::new(f) }
    }

    /// The trivial continuation past the end of the chain — resolves
    /// immediately with no value.
    pub(crate) fn end() -> Self {
        Self::new(|| Box::pin(async { Ok(Value::Null) }))
    }

    pub fn invoke(&self) -> AppFuture {
        (self.inner)()
    }
}

/// Adapter folding closure middleware onto the canonical shape.
pub(crate) struct FnMiddleware<F> {
    f: F,
}

impl<F> FnMiddleware<F> {
    pub(crate) fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F, Fut> Middleware for FnMiddleware<F>
where
    F: Fn(Context, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = PipelineResult> + Send + 'static,
{
    fn invoke(&self, context: Context, next: Next) -> AppFuture {
        Box::pin((self.f)(context, next))
    }
}
