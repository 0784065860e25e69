//! IOPA Pipeline Layer
//!
//! Compiles an ordered middleware list into one callable pipeline. The
//! builder accumulates middleware in registration order; `build` wraps the
//! list with a default error-boundary middleware on the outside and a
//! default terminal app on the inside, and the compiled pipeline folds the
//! chain right-to-left into a single continuation per invocation.
//!
//! The pipeline only consumes contexts — it never creates them.

pub mod builder;
pub mod defaults;
pub mod middleware;

pub use builder::{AppBuilder, AppProperties, Pipeline};
pub use defaults::{DefaultApp, RespondMiddleware};
pub use middleware::{AppFuture, Middleware, Next, PipelineResult};
