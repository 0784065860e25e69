//! App builder — accumulates middleware and compiles the pipeline.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use iopa_context::Context;
use serde_json::Value;
use uuid::Uuid;

use crate::defaults::{DefaultApp, RespondMiddleware};
use crate::middleware::{AppFuture, FnMiddleware, Middleware, Next, PipelineResult};

/// Builder properties. The default app and default middleware slots can be
/// replaced before `build` to change the pipeline's terminal behavior or
/// its outer boundary.
pub struct AppProperties {
    /// Unique id for this app instance (`server.AppId`).
    pub app_id: String,
    /// App-level capability announcements (`server.Capabilities`).
    pub capabilities: HashMap<String, Value>,
    /// Innermost link of every compiled chain (`app.DefaultApp`).
    pub default_app: Arc<dyn Middleware>,
    /// Links prepended before user middleware (`app.DefaultMiddleware`).
    pub default_middleware: Vec<Arc<dyn Middleware>>,
}

impl Default for AppProperties {
    fn default() -> Self {
        Self {
            app_id: Uuid::new_v4().to_string(),
            capabilities: HashMap::new(),
            default_app: Arc::new(DefaultApp),
            default_middleware: vec![Arc::new(RespondMiddleware)],
        }
    }
}

/// Accumulates middleware in registration order and compiles them into a
/// single pipeline. The first middleware registered runs first.
pub struct AppBuilder {
    properties: AppProperties,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self::with_properties(AppProperties::default())
    }

    pub fn with_properties(properties: AppProperties) -> Self {
        Self {
            properties,
            middleware: Vec::new(),
        }
    }

    pub fn app_id(&self) -> &str {
        &self.properties.app_id
    }

    pub fn properties(&self) -> &AppProperties {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut AppProperties {
        &mut self.properties
    }

    /// Append a handler-type middleware (invoked as a method on the
    /// handler).
    pub fn use_middleware(&mut self, middleware: impl Middleware) -> &mut Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Append a closure middleware of the canonical `(context, next)`
    /// shape.
    pub fn use_fn<F, Fut>(&mut self, f: F) -> &mut Self
    where
        F: Fn(Context, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PipelineResult> + Send + 'static,
    {
        self.middleware.push(Arc::new(FnMiddleware::new(f)));
        self
    }

    /// Compile `[default middleware…, user middleware…, default app]` into
    /// one callable pipeline. The builder can keep accumulating middleware
    /// afterwards; the compiled chain is a snapshot.
    pub fn build(&self) -> Pipeline {
        let mut chain: Vec<Arc<dyn Middleware>> =
            Vec::with_capacity(self.properties.default_middleware.len() + self.middleware.len() + 1);
        chain.extend(self.properties.default_middleware.iter().cloned());
        chain.extend(self.middleware.iter().cloned());
        chain.push(self.properties.default_app.clone());

        Pipeline {
            chain: chain.into(),
        }
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The compiled pipeline. Holds no mutable state — one compiled pipeline
/// may serve any number of concurrent invocations.
#[derive(Clone)]
pub struct Pipeline {
    chain: Arc<[Arc<dyn Middleware>]>,
}

impl Pipeline {
    /// Run one context through the chain.
    ///
    /// The chain is folded right-to-left: starting from a trivial
    /// continuation that resolves with no value, each middleware is closed
    /// over the context and the downstream continuation. Invoking the
    /// result runs the first middleware, which advances by calling its
    /// `next`.
    pub fn invoke(&self, context: Context) -> AppFuture {
        let mut next = Next::end();
        for middleware in self.chain.iter().rev() {
            let middleware = Arc::clone(middleware);
            let context = context.clone();
            let downstream = next;
            next = Next::new(move || middleware.invoke(context.clone(), downstream.clone()));
        }
        next.invoke()
    }

    /// Number of links in the compiled chain, defaults included.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }
}
