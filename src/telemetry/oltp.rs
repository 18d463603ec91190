use std::{collections::HashMap, env, time::Duration};

use anyhow::{Context, bail};
use log::info;
use opentelemetry::{KeyValue, global};
use opentelemetry_otlp::{Protocol, WithExportConfig, WithHttpConfig};
use opentelemetry_sdk::{Resource, metrics::SdkMeterProvider};

/// Resource attributes from the standard `OTEL_*` variables.
pub fn create_resource_from_env() -> Resource {
    let mut attributes = Vec::new();

    let service_name = env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "lure-session".to_string());
    attributes.push(KeyValue::new("service.name", service_name));

    if let Ok(service_instance_id) = env::var("OTEL_SERVICE_INSTANCE_ID") {
        attributes.push(KeyValue::new("service.instance.id", service_instance_id));
    }

    if let Ok(resource_attributes) = env::var("OTEL_RESOURCE_ATTRIBUTES") {
        for kv in resource_attributes.split(',') {
            if let Some((key, value)) = kv.split_once('=') {
                let key = key.trim().to_string();
                let value = value.trim().to_string();
                if !key.is_empty()
                    && !value.is_empty()
                    && !attributes.iter().any(|kv| kv.key.as_str() == key)
                {
                    attributes.push(KeyValue::new(key, value));
                }
            }
        }
    }

    Resource::builder().with_attributes(attributes).build()
}

fn parse_headers() -> HashMap<String, String> {
    dotenvy::var("OTEL_EXPORTER_OTLP_HEADERS")
        .map(|raw| {
            raw.split(',')
                .filter_map(|pair| pair.split_once('='))
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                .collect()
        })
        .unwrap_or_default()
}

fn build_metric_exporter() -> anyhow::Result<opentelemetry_otlp::MetricExporter> {
    let endpoint = dotenvy::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .unwrap_or_else(|_| "http://localhost:4318/v1/metrics".into());
    let protocol = dotenvy::var("OTEL_EXPORTER_OTLP_PROTOCOL")
        .unwrap_or_else(|_| "http/protobuf".into())
        .to_lowercase();
    let timeout = dotenvy::var("OTEL_EXPORTER_OTLP_TIMEOUT")
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(3));

    info!("Sending metric to {}", endpoint);

    let protocol = match protocol.as_str() {
        "http/protobuf" => Protocol::HttpBinary,
        "http/json" => Protocol::HttpJson,
        other => bail!("unsupported OTEL_EXPORTER_OTLP_PROTOCOL: {other}"),
    };

    opentelemetry_otlp::MetricExporter::builder()
        .with_http()
        .with_protocol(protocol)
        .with_endpoint(endpoint)
        .with_timeout(timeout)
        .with_headers(parse_headers())
        .build()
        .context("failed to build OTLP metric exporter")
}

pub fn init_meter() -> anyhow::Result<SdkMeterProvider> {
    let builder = SdkMeterProvider::builder()
        .with_periodic_exporter(build_metric_exporter()?)
        .with_resource(create_resource_from_env());

    #[cfg(feature = "verbose")]
    let builder =
        builder.with_periodic_exporter(opentelemetry_stdout::MetricExporter::builder().build());

    let meter_provider = builder.build();
    global::set_meter_provider(meter_provider.clone());
    Ok(meter_provider)
}
