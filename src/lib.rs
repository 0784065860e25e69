//! IOPA — protocol-agnostic request-processing runtime.
//!
//! Composes an ordered list of middleware into a single callable pipeline
//! operating on pooled, mutable context records. One context represents
//! one in-flight request (HTTP, CoAP, MQTT, WebSocket or another framed
//! protocol already decoded into fields); the pool recycles the paired
//! request/response records between requests.
//!
//! The pool and the pipeline are independent: a caller obtains a context
//! from [`ContextPool`], passes it into a pipeline compiled by
//! [`AppBuilder`], and disposes the context back into the pool when the
//! invocation completes. Transport I/O and wire decoding live outside
//! this crate.
//!
//! ```no_run
//! use iopa::{AppBuilder, ContextPool};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let mut app = AppBuilder::new();
//! app.use_fn(|context, next| {
//!     context.set_header("X-Powered-By", "iopa");
//!     async move { next.invoke().await }
//! });
//! let pipeline = app.build();
//!
//! let pool = ContextPool::new();
//! let context = pool.create_request_response("http://example.com/a")?;
//! pipeline.invoke(context.clone()).await?;
//! pool.dispose(&context);
//! # Ok(())
//! # }
//! ```

pub use iopa_context as context;
pub use iopa_pipeline as pipeline;
pub use iopa_protocol as protocol;

pub use iopa_context::{
    CancellationSource, Context, ContextError, ContextEvent, ContextPool, PoolConfig,
    RequestOptions, WeakContext,
};
pub use iopa_pipeline::{
    AppBuilder, AppFuture, AppProperties, DefaultApp, Middleware, Next, Pipeline, PipelineResult,
    RespondMiddleware,
};
pub use iopa_protocol::{
    APP, IOPA, METHODS, PORTS, PROTOCOLS, PipelineError, SCHEMES, SERVER, SchemeDefaults,
};
