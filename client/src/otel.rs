use http::Extensions;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next};
use std::str::FromStr;
use tracing::Span;

/// Injects the current span's OpenTelemetry context into the request headers so the
/// receiving component can continue the same trace.
pub fn inject_opentelemetry_context_into_request(request: &mut Request) {
    opentelemetry::global::get_text_map_propagator(|injector| {
        use tracing_opentelemetry::OpenTelemetrySpanExt;
        let context = Span::current().context();
        injector.inject_context(&context, &mut RequestCarrier::new(request))
    });
}

/// Middleware that runs [`inject_opentelemetry_context_into_request`] on every outgoing request.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceContextPropagation;

#[async_trait::async_trait]
impl Middleware for TraceContextPropagation {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        inject_opentelemetry_context_into_request(&mut req);
        next.run(req, extensions).await
    }
}

// "traceparent" => https://www.w3.org/TR/trace-context/#trace-context-http-headers-format

/// Injector used by the propagator to write "traceparent"/"tracestate" into the request headers.
struct RequestCarrier<'a> {
    request: &'a mut Request,
}

impl<'a> RequestCarrier<'a> {
    fn new(request: &'a mut Request) -> Self {
        RequestCarrier { request }
    }
}

impl opentelemetry::propagation::Injector for RequestCarrier<'_> {
    fn set(&mut self, key: &str, value: String) {
        match (HeaderName::from_str(key), HeaderValue::from_str(&value)) {
            (Ok(name), Ok(value)) => {
                self.request.headers_mut().insert(name, value);
            }
            _ => tracing::debug!(key, "Skipping trace header that is not a valid HTTP header"),
        }
    }
}
