use opentelemetry::{
	global,
	metrics::{MetricsError, Unit},
	trace::TraceError,
	KeyValue,
};
use opentelemetry_sdk::{
	metrics::{
		reader::{DefaultAggregationSelector, DefaultTemporalitySelector},
		Aggregation, Instrument, MeterProviderBuilder, PeriodicReader, SdkMeterProvider, Stream,
	},
	runtime,
	trace::{BatchConfig, Sampler, Tracer},
	Resource,
};
use opentelemetry_semantic_conventions::{
	resource::{DEPLOYMENT_ENVIRONMENT, SERVICE_NAME, SERVICE_VERSION},
	SCHEMA_URL,
};
use tracing_opentelemetry::MetricsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// An error raised while installing the OpenTelemetry exporters.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("metrics exporter error: {0}")]
	Metrics(#[from] MetricsError),
	#[error("trace exporter error: {0}")]
	Trace(#[from] TraceError),
}

/// Name of the request latency histogram, recorded by the trace layer.
const LATENCY_METRIC: &str = "latency_ms";

/// Bucket boundaries of [`LATENCY_METRIC`], in milliseconds.
const LATENCY_BUCKETS_MS: [f64; 10] = [
	5.0, 10.0, 25.0, 50.0, 75.0, 100.0, 250.0, 500.0, 1000.0, 2500.0,
];

fn environment() -> &'static str {
	if cfg!(debug_assertions) {
		"development"
	} else {
		"production"
	}
}

/// Describes this service to the exporters.
fn resource() -> Resource {
	Resource::from_schema_url(
		[
			KeyValue::new(SERVICE_NAME, env!("CARGO_PKG_NAME")),
			KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
			KeyValue::new(DEPLOYMENT_ENVIRONMENT, environment()),
		],
		SCHEMA_URL,
	)
}

/// Aggregates [`LATENCY_METRIC`] into [`LATENCY_BUCKETS_MS`].
fn latency_view(instrument: &Instrument) -> Option<Stream> {
	(instrument.name == LATENCY_METRIC).then(|| {
		Stream::new()
			.name(LATENCY_METRIC)
			.description("Time taken to answer an HTTP request")
			.unit(Unit::new("ms"))
			.aggregation(Aggregation::ExplicitBucketHistogram {
				boundaries: LATENCY_BUCKETS_MS.to_vec(),
				record_min_max: true,
			})
	})
}

/// Exports metrics over OTLP every five seconds (and to stdout in debug builds).
fn init_meter_provider() -> Result<SdkMeterProvider, MetricsError> {
	let exporter = opentelemetry_otlp::new_exporter()
		.tonic()
		.build_metrics_exporter(
			Box::new(DefaultAggregationSelector::new()),
			Box::new(DefaultTemporalitySelector::new()),
		)?;

	let reader = PeriodicReader::builder(exporter, runtime::Tokio)
		.with_interval(std::time::Duration::from_secs(5))
		.build();

	// For debugging in development
	#[cfg(debug_assertions)]
	let stdout_reader = PeriodicReader::builder(
		opentelemetry_stdout::MetricsExporter::default(),
		runtime::Tokio,
	)
	.build();

	let meter_provider = MeterProviderBuilder::default();
	#[cfg(debug_assertions)]
	let meter_provider = meter_provider.with_reader(stdout_reader);

	let meter_provider = meter_provider
		.with_resource(resource())
		.with_reader(reader)
		.with_view(latency_view)
		.build();

	global::set_meter_provider(meter_provider.clone());

	Ok(meter_provider)
}

/// Constructs a [`Tracer`] with a custom sampling strategy and exporter.
fn init_tracer() -> Result<Tracer, TraceError> {
	opentelemetry_otlp::new_pipeline()
		.tracing()
		.with_trace_config(
			opentelemetry_sdk::trace::Config::default()
				.with_sampler(Sampler::TraceIdRatioBased(1.0))
				.with_resource(resource()),
		)
		.with_batch_config(BatchConfig::default())
		.with_exporter(opentelemetry_otlp::new_exporter().tonic())
		.install_batch(runtime::Tokio)
}

/// Initializes the tracing subscriber, filtered by `RUST_LOG` (defaulting to `info`).
///
/// With `otel` set, traces and metrics are also exported over OTLP. The returned
/// guard cleans up the global tracer and meter provider when dropped.
pub fn init_tracing_subscriber(otel: bool) -> Result<OtelGuard, Error> {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	let registry = tracing_subscriber::registry()
		.with(filter)
		.with(tracing_subscriber::fmt::layer().with_ansi(true));

	if !otel {
		registry.init();

		return Ok(OtelGuard {
			meter_provider: None,
		});
	}

	let meter_provider = init_meter_provider()?;

	registry
		.with(MetricsLayer::new(meter_provider.clone()))
		.with(tracing_opentelemetry::layer().with_tracer(init_tracer()?))
		.init();

	Ok(OtelGuard {
		meter_provider: Some(meter_provider),
	})
}

pub struct OtelGuard {
	meter_provider: Option<SdkMeterProvider>,
}

impl Drop for OtelGuard {
	fn drop(&mut self) {
		let Some(meter_provider) = self.meter_provider.take() else {
			return;
		};

		if let Err(err) = meter_provider.shutdown() {
			eprintln!("{err:?}");
		}

		opentelemetry::global::shutdown_tracer_provider();
	}
}

#[cfg(test)]
mod test {
	use opentelemetry::{Key, Value};

	use super::*;

	#[test]
	fn test_resource_names_service() {
		let resource = resource();

		assert_eq!(
			resource.get(Key::new(SERVICE_NAME)),
			Some(Value::from("learnit-api"))
		);
		assert_eq!(
			resource.get(Key::new(DEPLOYMENT_ENVIRONMENT)),
			Some(Value::from(environment()))
		);
	}

	#[test]
	fn test_latency_view_only_matches_latency() {
		assert!(latency_view(&Instrument::new().name(LATENCY_METRIC)).is_some());
		assert!(latency_view(&Instrument::new().name("requests")).is_none());
		assert!(LATENCY_BUCKETS_MS.windows(2).all(|pair| pair[0] < pair[1]));
	}
}
