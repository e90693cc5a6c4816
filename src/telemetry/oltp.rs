use anyhow::{bail, Context};
use log::info;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::{self, Protocol, WithExportConfig, WithHttpConfig};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::Resource;
use std::collections::HashMap;
use std::time::Duration;

/// Creates an OpenTelemetry Resource from environment variables following semantic conventions,
/// including OTEL_RESOURCE_ATTRIBUTES for additional key-value pairs.
pub fn create_resource_from_env() -> Resource {
    let mut attributes = Vec::new();

    let service_name =
        dotenvy::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "mc-honeypot".to_string());
    attributes.push(KeyValue::new("service.name", service_name));

    if let Ok(service_instance_id) = dotenvy::var("OTEL_SERVICE_INSTANCE_ID") {
        attributes.push(KeyValue::new("service.instance.id", service_instance_id));
    }

    if let Ok(deployment_environment) = dotenvy::var("OTEL_DEPLOYMENT_ENVIRONMENT") {
        attributes.push(KeyValue::new(
            "deployment.environment",
            deployment_environment,
        ));
    }

    // comma-separated key=value pairs
    if let Ok(resource_attributes) = dotenvy::var("OTEL_RESOURCE_ATTRIBUTES") {
        for (key, value) in parse_pairs(&resource_attributes) {
            if !attributes.iter().any(|kv| kv.key.as_str() == key) {
                attributes.push(KeyValue::new(key, value));
            }
        }
    }

    Resource::builder().with_attributes(attributes).build()
}

fn parse_pairs(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|kv| kv.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, v)| !k.is_empty() && !v.is_empty())
        .collect()
}

fn parse_headers() -> HashMap<String, String> {
    dotenvy::var("OTEL_EXPORTER_OTLP_HEADERS")
        .map(|raw| parse_pairs(&raw).into_iter().collect())
        .unwrap_or_default()
}

fn build_metric_exporter() -> anyhow::Result<opentelemetry_otlp::MetricExporter> {
    let endpoint = dotenvy::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .context("OTEL_EXPORTER_OTLP_ENDPOINT is not set")?;
    let protocol = dotenvy::var("OTEL_EXPORTER_OTLP_PROTOCOL")
        .unwrap_or_else(|_| "http/protobuf".into())
        .to_lowercase();

    info!("Sending metric to {}", endpoint);

    let timeout = dotenvy::var("OTEL_EXPORTER_OTLP_TIMEOUT")
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(3));

    let protocol = match protocol.as_str() {
        "http/protobuf" => Protocol::HttpBinary,
        "http/json" => Protocol::HttpJson,
        other => bail!("Unsupported OTLP_PROTOCOL: {}", other),
    };

    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_http()
        .with_protocol(protocol)
        .with_endpoint(endpoint)
        .with_timeout(timeout)
        .with_headers(parse_headers())
        .build()?;
    Ok(exporter)
}

/// Installs a global OTLP meter provider; callers shut it down on exit.
pub fn init_meter() -> anyhow::Result<SdkMeterProvider> {
    let metric_exporter = build_metric_exporter()?;
    let resource = create_resource_from_env();

    let meter_provider = SdkMeterProvider::builder()
        .with_periodic_exporter(metric_exporter)
        .with_resource(resource);

    #[cfg(feature = "verbose")]
    let meter_provider = meter_provider
        .with_periodic_exporter(opentelemetry_stdout::MetricExporter::builder().build());

    let meter_provider = meter_provider.build();
    global::set_meter_provider(meter_provider.clone());
    Ok(meter_provider)
}
