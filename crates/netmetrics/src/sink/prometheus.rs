/*
 * SPDX-FileCopyrightText: Copyright (c) 2026 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
 * SPDX-License-Identifier: Apache-2.0
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 * http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use std::collections::HashMap;
use std::sync::Arc;

use prometheus::{GaugeVec, Opts};

use super::{CollectorEvent, DataSink, EventContext, MetricSample};
use crate::NetmetricsError;
use crate::metrics::{CollectorRegistry, MetricsManager, NetMetric};

/// Writes device samples into one `GaugeVec` per [`NetMetric`]. Values are
/// never swept, the last write for a label set wins.
pub struct PrometheusSink {
    _collector_registry: Arc<CollectorRegistry>, // keeps the registry exported while the sink lives
    gauges: HashMap<NetMetric, GaugeVec>,
}

impl PrometheusSink {
    pub fn new(
        metrics_manager: Arc<MetricsManager>,
        metrics_prefix: &str,
    ) -> Result<Self, NetmetricsError> {
        let collector_registry = Arc::new(metrics_manager.create_collector_registry(
            "sink_prometheus_collector".to_string(),
            metrics_prefix,
        )?);

        let registry = collector_registry.registry();
        let mut gauges = HashMap::with_capacity(NetMetric::ALL.len());
        for metric in NetMetric::ALL {
            let gauge = GaugeVec::new(
                Opts::new(metric.name(), metric.help()),
                metric.label_names(),
            )?;
            registry.register(Box::new(gauge.clone()))?;
            gauges.insert(metric, gauge);
        }

        Ok(Self {
            _collector_registry: collector_registry,
            gauges,
        })
    }

    fn record(&self, sample: &MetricSample) -> Result<(), NetmetricsError> {
        if !sample.has_canonical_labels() {
            return Err(NetmetricsError::GenericError(format!(
                "{}: label keys do not match {:?}",
                sample.metric.name(),
                sample.metric.label_names()
            )));
        }
        let gauge = self.gauges.get(&sample.metric).ok_or_else(|| {
            NetmetricsError::GenericError(format!("{}: gauge not registered", sample.metric.name()))
        })?;
        gauge
            .get_metric_with_label_values(&sample.label_values())?
            .set(sample.value);
        Ok(())
    }
}

impl DataSink for PrometheusSink {
    fn handle_event(&self, context: &EventContext, event: &CollectorEvent) {
        match event {
            CollectorEvent::Metric(sample) => {
                if let Err(error) = self.record(sample) {
                    tracing::warn!(
                        ?error,
                        hostname = %context.hostname,
                        collector = context.collector_type,
                        metric = sample.metric.name(),
                        "Failed to record Prometheus metric sample"
                    );
                }
            }
            CollectorEvent::MetricCollectionStart | CollectorEvent::MetricCollectionEnd => {}
        }
    }
}
