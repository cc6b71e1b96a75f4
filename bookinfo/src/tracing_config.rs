use axum::http::Request;
use opentelemetry::trace::TracerProvider;
use opentelemetry_http::HeaderExtractor;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use tower_http::trace::MakeSpan;
use tracing::{Level, Span};
use tracing_opentelemetry::OpenTelemetrySpanExt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Installs the global subscriber: stdout logs always, OTLP trace export when
/// `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
///
/// The returned provider must be shut down on exit to flush pending spans.
pub fn init_tracing(service_name: &str) -> anyhow::Result<Option<SdkTracerProvider>> {
    opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());

    // Configure the stdout fmt layer
    let format = tracing_subscriber::fmt::format()
        .with_level(true)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .compact();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .event_format(format)
        .with_filter(env_filter);

    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .ok()
        .filter(|endpoint| !endpoint.is_empty());
    let Some(endpoint) = endpoint else {
        tracing_subscriber::registry().with(fmt_layer).try_init()?;
        return Ok(None);
    };

    // Assumes a GRPC endpoint (e.g port 4317)
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let tracer_provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(
            Resource::builder()
                .with_service_name(service_name.to_string())
                .build(),
        )
        .build();

    opentelemetry::global::set_tracer_provider(tracer_provider.clone());

    // Only affects what is exported, stdout keeps the EnvFilter
    let tracing_level_filter = tracing_subscriber::filter::Targets::new()
        .with_target("bookinfo", Level::TRACE)
        .with_target("client", Level::TRACE)
        .with_target("sqlx", Level::DEBUG)
        .with_target("mongodb", Level::INFO)
        .with_target("tower_http", Level::INFO)
        .with_target("reqwest_tracing", Level::INFO)
        .with_target("hyper_util", Level::INFO)
        .with_target("h2", Level::WARN)
        .with_default(Level::INFO);

    let tracing_opentelemetry_layer = tracing_opentelemetry::layer()
        .with_tracer(tracer_provider.tracer("bookinfo"))
        .with_filter(tracing_level_filter);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(tracing_opentelemetry_layer)
        .try_init()?;

    Ok(Some(tracer_provider))
}

/// Request span for `TraceLayer`, parented on the `traceparent` of the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct OtelMakeSpan;

impl<B> MakeSpan<B> for OtelMakeSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let span = tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            otel.kind = "server"
        );
        let parent = opentelemetry::global::get_text_map_propagator(|propagator| {
            propagator.extract(&HeaderExtractor(request.headers()))
        });
        let _ = span.set_parent(parent);
        span
    }
}

