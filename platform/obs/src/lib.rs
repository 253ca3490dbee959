use anyhow::{Context, Result, anyhow};
use once_cell::sync::OnceCell;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{Protocol, SpanExporter, WithExportConfig};
use opentelemetry_sdk::{self as sdk, Resource};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: OnceCell<()> = OnceCell::new();

const DEFAULT_FILTER: &str = "info,tower_http=warn";

#[derive(Clone, Debug)]
pub struct ObsConfig {
    pub service_name: &'static str,
    pub env_filter: Option<String>,
    pub otlp_endpoint: Option<String>,
    /// Include the module target in each line. Off for the interactive CLI.
    pub with_target: bool,
}

impl Default for ObsConfig {
    fn default() -> Self {
        Self {
            service_name: "staff-dashboard",
            env_filter: None,
            otlp_endpoint: None,
            with_target: false,
        }
    }
}

impl ObsConfig {
    /// Fills unset fields from `RUST_LOG` and `OTLP_ENDPOINT`.
    pub fn with_env_defaults(self) -> Self {
        Self {
            env_filter: self.env_filter.or_else(|| std::env::var("RUST_LOG").ok()),
            otlp_endpoint: self
                .otlp_endpoint
                .or_else(|| std::env::var("OTLP_ENDPOINT").ok())
                .filter(|endpoint| !endpoint.trim().is_empty()),
            ..self
        }
    }

    fn filter(&self) -> Result<EnvFilter> {
        let directives = self.env_filter.as_deref().unwrap_or(DEFAULT_FILTER);
        EnvFilter::try_new(directives).with_context(|| format!("invalid log filter `{directives}`"))
    }
}

/// Installs the global subscriber once; later calls are no-ops.
pub fn init_tracing(config: ObsConfig) -> Result<()> {
    if INIT.get().is_some() {
        return Ok(());
    }
    let config = config.with_env_defaults();

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(config.with_target);
    let registry = tracing_subscriber::registry()
        .with(config.filter()?)
        .with(fmt_layer);

    match config.otlp_endpoint.as_deref() {
        Some(endpoint) => {
            let provider = otlp_provider(config.service_name, endpoint)?;
            let tracer = provider.tracer(config.service_name);
            registry
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .try_init()?;
        }
        None => registry.try_init()?,
    }

    INIT.set(())
        .map_err(|_| anyhow!("tracing already initialized"))?;
    Ok(())
}

fn otlp_provider(service_name: &'static str, endpoint: &str) -> Result<sdk::trace::SdkTracerProvider> {
    let exporter = SpanExporter::builder()
        .with_http()
        .with_protocol(Protocol::HttpBinary)
        .with_endpoint(endpoint)
        .build()
        .context("failed to build OTLP span exporter")?;

    let resource = Resource::builder().with_service_name(service_name).build();

    Ok(sdk::trace::SdkTracerProvider::builder()
        .with_resource(resource)
        .with_batch_exporter(exporter)
        .build())
}
