//! Default pipeline links — the outer error boundary and the terminal app.

use iopa_context::Context;
use iopa_protocol::{PROTOCOLS, PipelineError};
use serde_json::Value;
use tracing::{error, warn};

use crate::middleware::{AppFuture, Middleware, Next, PipelineResult};

/// Outermost default middleware. Awaits the rest of the chain and routes a
/// rejection: under HTTP/1.1 the error is rendered into the response
/// sub-context and the invocation resolves normally; under any other
/// protocol it is logged and re-raised to the pipeline's caller.
pub struct RespondMiddleware;

impl Middleware for RespondMiddleware {
    fn invoke(&self, context: Context, next: Next) -> AppFuture {
        Box::pin(async move {
            match next.invoke().await {
                Ok(value) => Ok(value),
                Err(err) => respond_with_error(&context, err),
            }
        })
    }
}

/// Innermost link of every chain. Rejects with the context's error marker
/// when one is set; resolves with no value otherwise.
pub struct DefaultApp;

impl Middleware for DefaultApp {
    fn invoke(&self, context: Context, _next: Next) -> AppFuture {
        Box::pin(async move {
            match context.error() {
                Some(err) => Err(err),
                None => Ok(Value::Null),
            }
        })
    }
}

fn respond_with_error(context: &Context, err: PipelineError) -> PipelineResult {
    if context.protocol() == PROTOCOLS::HTTP {
        render_http_error(context, &err);
        Ok(Value::Null)
    } else {
        error!(%err, protocol = %context.protocol(), "middleware error");
        Err(err)
    }
}

/// Default HTTP error rendering — 404 for `NotFound`, 500 with the
/// serialized detail for everything else.
fn render_http_error(context: &Context, err: &PipelineError) {
    error!(%err, path = %context.path(), "request failed");

    let Some(response) = context.response() else {
        warn!("no response context to render the error into");
        return;
    };

    response.set_status(err.status_code());
    response.set_reason_phrase(err.reason_phrase());
    response.set_header("Content-Type", "text/html");
    match err {
        PipelineError::NotFound { path } => {
            response.write("<h1>404 Not Found</h1><p>Could not find resource:</p>");
            response.write(&format!("<pre>{path}</pre>"));
        }
        PipelineError::Internal { detail } => {
            response.write("<h1>500 Server Error</h1><p>An error has occurred:</p>");
            response.write(&format!("<pre>{detail}</pre>"));
        }
    }
}
