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

mod composite;
mod events;
mod memory;
mod prometheus;
mod tracing;

pub use composite::CompositeDataSink;
pub use events::{CollectorEvent, EventContext, MetricSample};
pub use memory::{InMemorySink, RecordedSample};
pub use prometheus::PrometheusSink;
pub use tracing::TracingSink;

pub trait DataSink: Send + Sync {
    fn handle_event(&self, context: &EventContext, event: &CollectorEvent);
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::{
        CollectorEvent, CompositeDataSink, DataSink, EventContext, InMemorySink, MetricSample,
        PrometheusSink,
    };
    use crate::inventory::Vendor;
    use crate::metrics::{MetricsManager, NetMetric};

    struct CountingSink {
        counter: Arc<AtomicUsize>,
    }

    impl DataSink for CountingSink {
        fn handle_event(&self, _context: &EventContext, _event: &CollectorEvent) {
            self.counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct NoopSink;

    impl DataSink for NoopSink {
        fn handle_event(&self, _context: &EventContext, _event: &CollectorEvent) {}
    }

    fn context() -> EventContext {
        EventContext {
            hostname: "ceos1".to_string(),
            address: "172.20.20.2".to_string(),
            vendor: Vendor::Arista,
            collector_type: "test",
        }
    }

    fn bgp_sample(value: f64) -> CollectorEvent {
        CollectorEvent::Metric(MetricSample {
            metric: NetMetric::BgpNeighbors,
            labels: vec![
                (Cow::Borrowed("hostname"), "ceos1".to_string()),
                (Cow::Borrowed("vendor"), "arista".to_string()),
            ],
            value,
        })
    }

    #[test]
    fn test_composite_sink_fanout_with_noop_sink() {
        let success_counter = Arc::new(AtomicUsize::new(0));

        let composite = CompositeDataSink::new(vec![
            Arc::new(CountingSink {
                counter: success_counter.clone(),
            }),
            Arc::new(NoopSink),
            Arc::new(CountingSink {
                counter: success_counter.clone(),
            }),
        ]);

        composite.handle_event(&context(), &bgp_sample(1.0));

        assert_eq!(composite.len(), 3);
        assert_eq!(success_counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_prometheus_sink_registers_every_gauge() {
        let metrics_manager = Arc::new(MetricsManager::new());
        let sink =
            PrometheusSink::new(metrics_manager.clone(), "netmetrics").expect("sink should initialize");

        sink.handle_event(&context(), &bgp_sample(3.0));

        let export = metrics_manager
            .export_all()
            .expect("metrics export should work");
        assert!(export.contains("# TYPE netmetrics_bgp_neighbors_total gauge"));
        assert!(
            export.contains(r#"netmetrics_bgp_neighbors_total{hostname="ceos1",vendor="arista"} 3"#)
        );
    }

    #[test]
    fn test_prometheus_sink_last_write_wins() {
        let metrics_manager = Arc::new(MetricsManager::new());
        let sink = PrometheusSink::new(metrics_manager.clone(), "netmetrics").expect("sink");

        sink.handle_event(&context(), &CollectorEvent::MetricCollectionStart);
        sink.handle_event(&context(), &bgp_sample(3.0));
        sink.handle_event(&context(), &CollectorEvent::MetricCollectionEnd);
        sink.handle_event(&context(), &CollectorEvent::MetricCollectionStart);
        sink.handle_event(&context(), &bgp_sample(5.0));
        sink.handle_event(&context(), &CollectorEvent::MetricCollectionEnd);

        let export = metrics_manager.export_all().expect("export");
        assert!(
            export.contains(r#"netmetrics_bgp_neighbors_total{hostname="ceos1",vendor="arista"} 5"#)
        );
        assert!(!export.contains("} 3"));
    }

    #[test]
    fn test_prometheus_sink_rejects_non_canonical_labels() {
        let metrics_manager = Arc::new(MetricsManager::new());
        let sink = PrometheusSink::new(metrics_manager.clone(), "netmetrics").expect("sink");

        let reordered = CollectorEvent::Metric(MetricSample {
            metric: NetMetric::BgpNeighbors,
            labels: vec![
                (Cow::Borrowed("vendor"), "arista".to_string()),
                (Cow::Borrowed("hostname"), "ceos1".to_string()),
            ],
            value: 1.0,
        });
        sink.handle_event(&context(), &reordered);

        let export = metrics_manager.export_all().expect("export");
        assert!(!export.contains("netmetrics_bgp_neighbors_total{"));
    }

    #[test]
    fn test_in_memory_sink_enumerates_triples() {
        let sink = InMemorySink::new();
        sink.handle_event(&context(), &bgp_sample(2.0));
        sink.handle_event(&context(), &bgp_sample(4.0));
        sink.handle_event(&context(), &CollectorEvent::MetricCollectionEnd);

        let samples = sink.samples();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].name, "netmetrics_bgp_neighbors_total");
        assert_eq!(
            samples[0].labels,
            vec![
                ("hostname".to_string(), "ceos1".to_string()),
                ("vendor".to_string(), "arista".to_string()),
            ]
        );
        assert_eq!(
            sink.value("netmetrics_bgp_neighbors_total", &["ceos1", "arista"]),
            Some(4.0)
        );
        assert_eq!(sink.value("netmetrics_bgp_neighbors_total", &["other", "arista"]), None);
    }
}
