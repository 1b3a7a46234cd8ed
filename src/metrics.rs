//! Metrics and tracing hooks.
//!
//! With the `metrics` feature a Prometheus-backed OpenTelemetry meter records
//! query counts, query errors, query latency and dynamic key lookups. With the
//! `tracing` feature [`tracing_helpers`] provides the spans opened around query
//! execution and relation resolution.

#[cfg(feature = "metrics")]
pub use self::otel::{RelationMetrics, METRICS};

#[cfg(feature = "metrics")]
mod otel {
    use once_cell::sync::Lazy;
    use opentelemetry::metrics::{Counter, Histogram, MeterProvider as _};
    use opentelemetry_sdk::metrics::SdkMeterProvider;
    use prometheus::{Encoder, Registry, TextEncoder};

    pub static METRICS: Lazy<RelationMetrics> = Lazy::new(RelationMetrics::init);

    pub struct RelationMetrics {
        /// Registry the Prometheus exporter reports into
        pub registry: Registry,
        provider: SdkMeterProvider,
        pub queries_total: Counter<u64>,
        pub query_errors_total: Counter<u64>,
        pub query_duration: Histogram<f64>,
        pub relation_lookups_total: Counter<u64>,
    }

    impl RelationMetrics {
        pub fn init() -> Self {
            let registry = Registry::new();
            let mut builder = SdkMeterProvider::builder();
            match opentelemetry_prometheus::exporter()
                .with_registry(registry.clone())
                .build()
            {
                Ok(exporter) => builder = builder.with_reader(exporter),
                Err(err) => log::warn!("failed to build prometheus exporter, metrics will not be exported: {err}"),
            }
            let provider = builder.build();
            let meter = provider.meter("belongs_to_dynamic");

            let queries_total = meter
                .u64_counter("belongs_to_dynamic_queries_total")
                .with_description("Total queries executed")
                .build();

            let query_errors_total = meter
                .u64_counter("belongs_to_dynamic_query_errors_total")
                .with_description("Queries that returned an error")
                .build();

            let query_duration = meter
                .f64_histogram("belongs_to_dynamic_query_duration_seconds")
                .with_description("Duration of queries")
                .build();

            let relation_lookups_total = meter
                .u64_counter("belongs_to_dynamic_relation_lookups_total")
                .with_description("Foreign keys resolved through a lookup query")
                .build();

            Self {
                registry,
                provider,
                queries_total,
                query_errors_total,
                query_duration,
                relation_lookups_total,
            }
        }

        pub fn record_query(&self, elapsed: std::time::Duration) {
            self.queries_total.add(1, &[]);
            self.query_duration.record(elapsed.as_secs_f64(), &[]);
        }

        pub fn record_query_error(&self) {
            self.query_errors_total.add(1, &[]);
        }

        pub fn record_relation_lookup(&self) {
            self.relation_lookups_total.add(1, &[]);
        }

        /// The meter provider backing these instruments
        pub fn provider(&self) -> &SdkMeterProvider {
            &self.provider
        }

        /// Render every collected metric in the Prometheus text format
        pub fn render(&self) -> Result<String, prometheus::Error> {
            let mut buffer = Vec::new();
            TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
            String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
        }
    }
}

#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::Span;

    /// Span around a single statement
    pub fn execute_query_span(query: &str) -> Span {
        tracing::info_span!("execute_query", db.system = "postgresql", db.statement = query)
    }

    /// Span around a relation load; `mode` is `"single"` or `"batch"`
    pub fn resolve_relation_span(relation: &str, mode: &str) -> Span {
        tracing::info_span!("resolve_relation", relation = relation, mode = mode)
    }

    /// Span around connection establishment
    pub fn acquire_connection_span() -> Span {
        tracing::info_span!("acquire_connection", db.system = "postgresql")
    }
}
