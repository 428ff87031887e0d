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

use std::sync::Arc;

use super::client::{
    BgpStateData, CpuUsage, Interfaces, LldpEntries, MemoryStatistics, OspfOperData,
    RestconfCategory, RestconfClient, parse_category,
};
use crate::collectors::{CategoryRun, CollectionReport, DeviceCollector, DeviceMetrics, HttpTransport};
use crate::inventory::Device;
use crate::{BoxFuture, NetmetricsError};

const COLLECTOR_NAME: &str = "restconf";

pub struct RestconfCollector {
    transport: Arc<HttpTransport>,
}

impl RestconfCollector {
    pub fn new(transport: Arc<HttpTransport>) -> Self {
        Self { transport }
    }
}

impl DeviceCollector for RestconfCollector {
    fn collector_type(&self) -> &'static str {
        COLLECTOR_NAME
    }

    fn collect<'a>(
        &'a self,
        device: &'a Device,
        metrics: &'a DeviceMetrics,
    ) -> BoxFuture<'a, Result<CollectionReport, NetmetricsError>> {
        Box::pin(async move {
            let client = RestconfClient::new(&self.transport, device)?;
            let mut run = CategoryRun::new(COLLECTOR_NAME);

            for category in RestconfCategory::ALL {
                match client.fetch(category).await {
                    Ok(body) => {
                        run.succeeded();
                        apply_category(category, &body, metrics);
                    }
                    Err(e) => run.failed(&device.hostname, category.name(), e),
                }
            }

            let report = run.finish(metrics)?;
            tracing::debug!(
                hostname = %device.hostname,
                samples = report.sample_count,
                failed = ?report.failed_categories,
                "restconf: collection complete"
            );
            Ok(report)
        })
    }
}

/// Maps one category body onto samples. A body that does not parse writes
/// nothing for that category.
pub(crate) fn apply_category(category: RestconfCategory, body: &str, metrics: &DeviceMetrics) {
    match category {
        RestconfCategory::Interfaces => {
            if let Some(data) = parse_category::<Interfaces>(category, body) {
                // Admin state only, oper-status is not consulted.
                for interface in &data.interface {
                    metrics.interface_up(&interface.name, interface.enabled);
                }
            }
        }
        RestconfCategory::Bgp => {
            if let Some(data) = parse_category::<BgpStateData>(category, body) {
                metrics.bgp_neighbors(data.neighbor_count() as f64);
            }
        }
        RestconfCategory::Lldp => {
            if let Some(data) = parse_category::<LldpEntries>(category, body) {
                metrics.lldp_neighbors(data.entries.len() as f64);
            }
        }
        RestconfCategory::Cpu => {
            if let Some(data) = parse_category::<CpuUsage>(category, body) {
                metrics.cpu_usage_percent(data.five_seconds().unwrap_or(0.0));
            }
        }
        RestconfCategory::Memory => {
            if let Some(data) = parse_category::<MemoryStatistics>(category, body)
                && let Some(first) = data.statistics.first()
            {
                match (first.used, first.total) {
                    (Some(used), Some(total)) if total > 0 => {
                        metrics.memory_usage_percent(used as f64 / total as f64 * 100.0);
                    }
                    _ => tracing::debug!(
                        hostname = %metrics.hostname(),
                        pool = ?first.name,
                        "restconf: memory statistic without usable totals"
                    ),
                }
            }
        }
        RestconfCategory::Ospf => {
            if let Some(data) = parse_category::<OspfOperData>(category, body) {
                let count: usize = data.instances.iter().map(|i| i.neighbors.len()).sum();
                metrics.ospf_neighbors(count as f64);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{basic_auth, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::HttpConfig;
    use crate::inventory::{Vendor, VendorTag, test_device};
    use crate::sink::{EventContext, InMemorySink};

    fn metrics_for(sink: Arc<InMemorySink>) -> DeviceMetrics {
        DeviceMetrics::new(
            EventContext {
                hostname: "csr1".to_string(),
                address: "127.0.0.1".to_string(),
                vendor: Vendor::Cisco,
                collector_type: COLLECTOR_NAME,
            },
            sink,
        )
    }

    #[test]
    fn test_interfaces_use_admin_state_only() {
        let sink = Arc::new(InMemorySink::new());
        let metrics = metrics_for(sink.clone());

        let body = json!({"ietf-interfaces:interfaces": {"interface": [
            {"name": "GigabitEthernet1", "enabled": true, "oper-status": "down"},
            {"name": "GigabitEthernet2", "enabled": false},
            {"name": "Loopback0"}
        ]}})
        .to_string();
        apply_category(RestconfCategory::Interfaces, &body, &metrics);

        assert_eq!(
            sink.value("netmetrics_interface_up", &["csr1", "GigabitEthernet1", "cisco"]),
            Some(1.0)
        );
        assert_eq!(
            sink.value("netmetrics_interface_up", &["csr1", "GigabitEthernet2", "cisco"]),
            Some(0.0)
        );
        assert_eq!(
            sink.value("netmetrics_interface_up", &["csr1", "Loopback0", "cisco"]),
            Some(0.0)
        );
    }

    #[test]
    fn test_empty_bgp_neighbor_list_is_zero() {
        let sink = Arc::new(InMemorySink::new());
        let metrics = metrics_for(sink.clone());

        apply_category(RestconfCategory::Bgp, r#"{"neighbors": []}"#, &metrics);

        assert_eq!(
            sink.value("netmetrics_bgp_neighbors_total", &["csr1", "cisco"]),
            Some(0.0)
        );
    }

    #[test]
    fn test_bgp_accepts_wrapped_container() {
        let sink = Arc::new(InMemorySink::new());
        let metrics = metrics_for(sink.clone());

        let body = json!({"Cisco-IOS-XE-bgp-oper:bgp-state-data": {
            "neighbors": {"neighbor": [{"neighbor-id": "10.0.0.2"}, {"neighbor-id": "10.0.0.3"}]}
        }})
        .to_string();
        apply_category(RestconfCategory::Bgp, &body, &metrics);

        assert_eq!(
            sink.value("netmetrics_bgp_neighbors_total", &["csr1", "cisco"]),
            Some(2.0)
        );
    }

    #[test]
    fn test_cpu_lldp_and_ospf() {
        let sink = Arc::new(InMemorySink::new());
        let metrics = metrics_for(sink.clone());

        apply_category(
            RestconfCategory::Cpu,
            r#"{"Cisco-IOS-XE-process-cpu-oper:cpu-usage": {"cpu-utilization": {"five-seconds": 7}}}"#,
            &metrics,
        );
        apply_category(
            RestconfCategory::Lldp,
            r#"{"lldp-entry": [{"local-interface": "Gi1"}, {"local-interface": "Gi2"}]}"#,
            &metrics,
        );
        apply_category(
            RestconfCategory::Ospf,
            r#"{"ospf-state/neighbors": [{"ospfv2-neighbor": [{}, {}]}, {"ospfv2-neighbor": [{}]}, {}]}"#,
            &metrics,
        );

        assert_eq!(
            sink.value("netmetrics_cpu_usage_percent", &["csr1", "cisco"]),
            Some(7.0)
        );
        assert_eq!(
            sink.value("netmetrics_lldp_neighbors_total", &["csr1", "cisco"]),
            Some(2.0)
        );
        assert_eq!(
            sink.value("netmetrics_ospf_neighbors_total", &["csr1", "cisco"]),
            Some(3.0)
        );
    }

    #[test]
    fn test_memory_uses_first_entry() {
        let sink = Arc::new(InMemorySink::new());
        let metrics = metrics_for(sink.clone());

        let body = json!({"memory-statistic": [
            {"name": "Processor", "total-memory": "2000", "used-memory": "500"},
            {"name": "lsmpi_io", "total-memory": 100, "used-memory": 100}
        ]})
        .to_string();
        apply_category(RestconfCategory::Memory, &body, &metrics);

        assert_eq!(
            sink.value("netmetrics_memory_usage_percent", &["csr1", "cisco"]),
            Some(25.0)
        );
    }

    #[test]
    fn test_lldp_counts_entries_of_any_shape() {
        let sink = Arc::new(InMemorySink::new());
        let metrics = metrics_for(sink.clone());

        let body = json!({"lldp-entry": [
            {"device-id": "spine1", "local-interface": "Gi1"},
            {"device-id": "spine2"},
            {}
        ]})
        .to_string();
        apply_category(RestconfCategory::Lldp, &body, &metrics);

        assert_eq!(
            sink.value("netmetrics_lldp_neighbors_total", &["csr1", "cisco"]),
            Some(3.0)
        );
    }

    #[test]
    fn test_zero_total_memory_and_malformed_bodies_write_nothing() {
        let sink = Arc::new(InMemorySink::new());
        let metrics = metrics_for(sink.clone());

        apply_category(
            RestconfCategory::Memory,
            r#"{"memory-statistic": [{"total-memory": 0, "used-memory": 0}]}"#,
            &metrics,
        );
        apply_category(RestconfCategory::Bgp, "not json", &metrics);
        apply_category(RestconfCategory::Lldp, r#"{"lldp-entry": "oops"}"#, &metrics);
        apply_category(RestconfCategory::Interfaces, "", &metrics);

        assert!(sink.is_empty());
    }

    fn transport() -> Arc<HttpTransport> {
        Arc::new(
            HttpTransport::new(
                &HttpConfig {
                    request_timeout_secs: 5,
                    insecure_skip_verify: false,
                },
                false,
            )
            .expect("transport"),
        )
    }

    fn device_for(server: &MockServer) -> Device {
        let mut device = test_device("csr1", "127.0.0.1", VendorTag::Supported(Vendor::Cisco));
        device.http.port = Some(server.address().port());
        device.http.use_ssl = Some(false);
        device
    }

    async fn mount(server: &MockServer, category: RestconfCategory, status: u16, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(format!("/restconf/data/{}", category.resource())))
            .and(header("accept", "application/yang-data+json"))
            .and(basic_auth("admin", "admin"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_failed_category_does_not_stop_the_others() {
        let server = MockServer::start().await;
        mount(
            &server,
            RestconfCategory::Interfaces,
            200,
            json!({"ietf-interfaces:interfaces": {"interface": [{"name": "Gi1", "enabled": true}]}}),
        )
        .await;
        mount(&server, RestconfCategory::Bgp, 500, json!({"errors": {}})).await;
        mount(&server, RestconfCategory::Lldp, 200, json!({"lldp-entry": [{}]})).await;
        mount(&server, RestconfCategory::Cpu, 200, json!({"five-seconds": 3})).await;
        mount(
            &server,
            RestconfCategory::Memory,
            200,
            json!({"memory-statistic": [{"total-memory": 4, "used-memory": 1}]}),
        )
        .await;
        mount(&server, RestconfCategory::Ospf, 404, json!({})).await;

        let sink = Arc::new(InMemorySink::new());
        let metrics = metrics_for(sink.clone());
        let report = RestconfCollector::new(transport())
            .collect(&device_for(&server), &metrics)
            .await
            .expect("partial collection is ok");

        assert_eq!(report.failed_categories, vec!["bgp", "ospf"]);
        assert_eq!(
            sink.value("netmetrics_interface_up", &["csr1", "Gi1", "cisco"]),
            Some(1.0)
        );
        assert_eq!(
            sink.value("netmetrics_cpu_usage_percent", &["csr1", "cisco"]),
            Some(3.0)
        );
        assert_eq!(
            sink.value("netmetrics_memory_usage_percent", &["csr1", "cisco"]),
            Some(25.0)
        );
        assert!(sink.values_named("netmetrics_bgp_neighbors_total").is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_device_fails_collection() {
        let server = MockServer::start().await;
        let device = device_for(&server);
        drop(server);

        let sink = Arc::new(InMemorySink::new());
        let metrics = metrics_for(sink.clone());
        let err = RestconfCollector::new(transport())
            .collect(&device, &metrics)
            .await
            .expect_err("nothing answers");

        assert!(matches!(err, NetmetricsError::HttpError(_)));
        assert!(sink.is_empty());
    }
}
