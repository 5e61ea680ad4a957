//! CloudWatch metric sink.

use std::collections::BTreeMap;

use aws_sdk_cloudwatch::error::DisplayErrorContext;
use aws_sdk_cloudwatch::primitives::DateTime;
use aws_sdk_cloudwatch::types::{Dimension, MetricDatum, StandardUnit};
use aws_sdk_cloudwatch::Client;
use tracing::debug;

use pulse_core::{MetricPoint, MetricUnit, MetricsSink, PulseError, PulseResult};

/// PutMetricData accepts at most this many datums per call.
const MAX_DATUMS_PER_CALL: usize = 1000;

/// Publishes [`MetricPoint`]s with PutMetricData.
#[derive(Clone)]
pub struct CloudWatchSink {
    client: Client,
}

impl CloudWatchSink {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self::from_client(Client::new(sdk_config))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl MetricsSink for CloudWatchSink {
    async fn publish(&self, points: &[MetricPoint]) -> PulseResult<()> {
        for (namespace, data) in group_by_namespace(points) {
            for chunk in data.chunks(MAX_DATUMS_PER_CALL) {
                self.client
                    .put_metric_data()
                    .namespace(namespace)
                    .set_metric_data(Some(chunk.to_vec()))
                    .send()
                    .await
                    .map_err(|e| PulseError::Publish(DisplayErrorContext(&e).to_string()))?;
                debug!(namespace, datums = chunk.len(), "metric data published");
            }
        }
        Ok(())
    }
}

/// Convert points into datums, one batch per namespace.
pub(crate) fn group_by_namespace(points: &[MetricPoint]) -> BTreeMap<&str, Vec<MetricDatum>> {
    let mut grouped: BTreeMap<&str, Vec<MetricDatum>> = BTreeMap::new();
    for point in points {
        grouped
            .entry(point.namespace.as_str())
            .or_default()
            .push(to_datum(point));
    }
    grouped
}

pub(crate) fn to_datum(point: &MetricPoint) -> MetricDatum {
    let dimensions = point
        .dimensions
        .iter()
        .map(|(name, value)| Dimension::builder().name(name).value(value).build())
        .collect();

    MetricDatum::builder()
        .metric_name(&point.metric_name)
        .value(point.value)
        .unit(to_standard_unit(point.unit))
        .timestamp(DateTime::from(point.timestamp))
        .set_dimensions(Some(dimensions))
        .build()
}

fn to_standard_unit(unit: MetricUnit) -> StandardUnit {
    match unit {
        MetricUnit::Count => StandardUnit::Count,
    }
}
