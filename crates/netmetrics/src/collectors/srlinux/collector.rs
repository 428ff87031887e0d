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

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::client::{
    BGP_NEIGHBORS, INTERFACE_STATISTICS, INTERFACES, LLDP_INTERFACES, OSPF_AREAS,
    SYSTEM_INFORMATION, SrLinuxClient,
};
use crate::clock::{Clock, SystemClock};
use crate::collectors::json;
use crate::collectors::{
    CategoryRun, CollectionReport, DeviceCollector, DeviceMetrics, HttpTransport, SENTINEL,
};
use crate::inventory::Device;
use crate::{BoxFuture, NetmetricsError};

const COLLECTOR_NAME: &str = "srlinux";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Category {
    System,
    Interfaces,
    InterfaceStatistics,
    Bgp,
    Ospf,
    Lldp,
}

impl Category {
    const ALL: [Category; 6] = [
        Category::System,
        Category::Interfaces,
        Category::InterfaceStatistics,
        Category::Bgp,
        Category::Ospf,
        Category::Lldp,
    ];

    fn path(self) -> &'static str {
        match self {
            Category::System => SYSTEM_INFORMATION,
            Category::Interfaces => INTERFACES,
            Category::InterfaceStatistics => INTERFACE_STATISTICS,
            Category::Bgp => BGP_NEIGHBORS,
            Category::Ospf => OSPF_AREAS,
            Category::Lldp => LLDP_INTERFACES,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Category::System => "system",
            Category::Interfaces => "interfaces",
            Category::InterfaceStatistics => "interface_errors",
            Category::Bgp => "bgp",
            Category::Ospf => "ospf",
            Category::Lldp => "lldp",
        }
    }
}

pub struct SrLinuxCollector {
    transport: Arc<HttpTransport>,
    clock: Arc<dyn Clock>,
}

impl SrLinuxCollector {
    pub fn new(transport: Arc<HttpTransport>) -> Self {
        Self::with_clock(transport, Arc::new(SystemClock))
    }

    pub fn with_clock(transport: Arc<HttpTransport>, clock: Arc<dyn Clock>) -> Self {
        Self { transport, clock }
    }
}

impl DeviceCollector for SrLinuxCollector {
    fn collector_type(&self) -> &'static str {
        COLLECTOR_NAME
    }

    fn collect<'a>(
        &'a self,
        device: &'a Device,
        metrics: &'a DeviceMetrics,
    ) -> BoxFuture<'a, Result<CollectionReport, NetmetricsError>> {
        Box::pin(async move {
            let client = SrLinuxClient::new(&self.transport, device)?;
            let now = self.clock.now();
            let mut run = CategoryRun::new(COLLECTOR_NAME);

            for category in Category::ALL {
                match client.get(category.path()).await {
                    Ok(payload) => {
                        run.succeeded();
                        apply_category(category, Some(&payload), metrics, now);
                    }
                    // The device answered but has nothing at this path.
                    Err(NetmetricsError::ProtocolError(message)) => {
                        tracing::debug!(
                            hostname = %device.hostname,
                            category = category.name(),
                            %message,
                            "srlinux: no data for path"
                        );
                        run.succeeded();
                        apply_category(category, None, metrics, now);
                    }
                    Err(e) => run.failed(&device.hostname, category.name(), e),
                }
            }

            let report = run.finish(metrics)?;
            tracing::debug!(
                hostname = %device.hostname,
                samples = report.sample_count,
                failed = ?report.failed_categories,
                "srlinux: collection complete"
            );
            Ok(report)
        })
    }
}

/// Maps an `ethernet.port-speed` identity onto Mbps. Unknown speeds are 0.
pub fn port_speed_mbps(speed: &str) -> f64 {
    match speed {
        "speed-10M" => 10.0,
        "speed-100M" => 100.0,
        "speed-1G" => 1_000.0,
        "speed-2.5G" => 2_500.0,
        "speed-5G" => 5_000.0,
        "speed-10G" => 10_000.0,
        "speed-25G" => 25_000.0,
        "speed-40G" => 40_000.0,
        "speed-50G" => 50_000.0,
        "speed-100G" => 100_000.0,
        "speed-200G" => 200_000.0,
        "speed-400G" => 400_000.0,
        "speed-800G" => 800_000.0,
        _ => 0.0,
    }
}

fn apply_category(
    category: Category,
    payload: Option<&Value>,
    metrics: &DeviceMetrics,
    now: DateTime<Utc>,
) {
    match category {
        Category::System => map_system(payload, metrics, now),
        Category::Interfaces => map_interfaces(payload, metrics),
        Category::InterfaceStatistics => map_statistics(payload, metrics),
        Category::Bgp => {
            let count = list(payload, "neighbor").map_or(0, <[Value]>::len);
            metrics.bgp_neighbors(count as f64);
        }
        Category::Ospf => metrics.ospf_neighbors(ospf_neighbor_count(payload) as f64),
        Category::Lldp => metrics.lldp_neighbors(lldp_neighbor_interfaces(payload) as f64),
    }
}

fn list<'a>(payload: Option<&'a Value>, name: &str) -> Option<&'a [Value]> {
    payload
        .and_then(|p| json::field(p, name))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
}

fn map_system(payload: Option<&Value>, metrics: &DeviceMetrics, now: DateTime<Utc>) {
    let Some(info) = payload else {
        return;
    };

    let version = json::str_field(info, "version").unwrap_or("unknown");
    let model = json::str_field(info, "description").unwrap_or("unknown");
    metrics.device_info(model, version);

    if let Some(last_booted) = json::field(info, "last-booted") {
        let uptime = last_booted
            .as_str()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map_or(SENTINEL, |booted| {
                (now - booted.with_timezone(&Utc)).num_milliseconds() as f64 / 1000.0
            });
        metrics.device_uptime_seconds(uptime);
    }
}

fn map_interfaces(payload: Option<&Value>, metrics: &DeviceMetrics) {
    let Some(interfaces) = list(payload, "interface") else {
        return;
    };

    for interface in interfaces {
        let name = json::str_field(interface, "name").unwrap_or("unknown");

        let up = json::str_field(interface, "admin-state") == Some("enable")
            && json::str_field(interface, "oper-state") == Some("up");
        metrics.interface_up(name, up);

        let ethernet = json::field(interface, "ethernet");
        let speed = ethernet
            .and_then(|eth| json::str_field(eth, "port-speed"))
            .map_or(0.0, port_speed_mbps);
        metrics.interface_speed_mbps(name, speed);

        let duplex = json::str_field(interface, "duplex-mode")
            .or_else(|| ethernet.and_then(|eth| json::str_field(eth, "duplex-mode")));
        if let Some(duplex) = duplex
            && duplex != "unknown"
        {
            metrics.interface_duplex(name, duplex);
        }
    }
}

fn map_statistics(payload: Option<&Value>, metrics: &DeviceMetrics) {
    let Some(statistics) = list(payload, "statistics") else {
        return;
    };

    for entry in statistics {
        let name = json::str_field(entry, "interface")
            .or_else(|| json::str_field(entry, "name"))
            .unwrap_or("unknown");
        let input = json::f64_field(entry, "in-errors")
            .or_else(|| json::f64_field(entry, "in-error-packets"))
            .unwrap_or(SENTINEL);
        let output = json::f64_field(entry, "out-errors")
            .or_else(|| json::f64_field(entry, "out-error-packets"))
            .unwrap_or(SENTINEL);
        metrics.interface_input_errors(name, input);
        metrics.interface_output_errors(name, output);
    }
}

fn ospf_neighbor_count(payload: Option<&Value>) -> usize {
    list(payload, "area")
        .unwrap_or_default()
        .iter()
        .flat_map(|area| list(Some(area), "interface").unwrap_or_default())
        .map(|interface| list(Some(interface), "neighbor").map_or(0, <[Value]>::len))
        .sum()
}

/// Interfaces reporting at least one neighbor, not the neighbor total.
fn lldp_neighbor_interfaces(payload: Option<&Value>) -> usize {
    list(payload, "interface")
        .unwrap_or_default()
        .iter()
        .filter(|interface| match json::field(interface, "neighbor") {
            None | Some(Value::Null) => false,
            Some(Value::Array(neighbors)) => !neighbors.is_empty(),
            Some(_) => true,
        })
        .count()
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{basic_auth, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::clock::FixedClock;
    use crate::config::HttpConfig;
    use crate::inventory::{Vendor, VendorTag, test_device};
    use crate::sink::{EventContext, InMemorySink};

    fn metrics_for(sink: Arc<InMemorySink>) -> DeviceMetrics {
        DeviceMetrics::new(
            EventContext {
                hostname: "leaf1".to_string(),
                address: "127.0.0.1".to_string(),
                vendor: Vendor::SrLinux,
                collector_type: COLLECTOR_NAME,
            },
            sink,
        )
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .expect("valid timestamp")
            .with_timezone(&Utc)
    }

    #[test]
    fn test_port_speed_table() {
        assert_eq!(port_speed_mbps("speed-10G"), 10_000.0);
        assert_eq!(port_speed_mbps("speed-1G"), 1_000.0);
        assert_eq!(port_speed_mbps("speed-100G"), 100_000.0);
        assert_eq!(port_speed_mbps("speed-3G"), 0.0);
        assert_eq!(port_speed_mbps(""), 0.0);
    }

    #[test]
    fn test_system_information_uptime_and_identity() {
        let sink = Arc::new(InMemorySink::new());
        let metrics = metrics_for(sink.clone());

        let payload = json!({
            "srl_nokia-system-info:version": "v23.10.1",
            "description": "7220 IXR-D2",
            "last-booted": "2024-05-01T11:00:00Z"
        });
        apply_category(Category::System, Some(&payload), &metrics, now());

        assert_eq!(
            sink.value("netmetrics_device_info", &["leaf1", "7220 IXR-D2", "v23.10.1"]),
            Some(1.0)
        );
        assert_eq!(
            sink.value("netmetrics_device_uptime_seconds", &["leaf1"]),
            Some(3600.0)
        );
    }

    #[test]
    fn test_unparsable_boot_time_is_sentinel() {
        let sink = Arc::new(InMemorySink::new());
        let metrics = metrics_for(sink.clone());

        let payload = json!({"last-booted": "yesterday"});
        apply_category(Category::System, Some(&payload), &metrics, now());

        assert_eq!(
            sink.value("netmetrics_device_uptime_seconds", &["leaf1"]),
            Some(-1.0)
        );
        assert_eq!(
            sink.value("netmetrics_device_info", &["leaf1", "unknown", "unknown"]),
            Some(1.0)
        );
    }

    #[test]
    fn test_interfaces_require_admin_and_oper_up() {
        let sink = Arc::new(InMemorySink::new());
        let metrics = metrics_for(sink.clone());

        let payload = json!({"srl_nokia-interfaces:interface": [
            {"name": "ethernet-1/1", "admin-state": "enable", "oper-state": "up",
             "ethernet": {"port-speed": "speed-10G", "duplex-mode": "full"}},
            {"name": "ethernet-1/2", "admin-state": "enable", "oper-state": "down",
             "ethernet": {"port-speed": "speed-3G"}},
            {"name": "mgmt0", "admin-state": "disable", "oper-state": "up"}
        ]});
        apply_category(Category::Interfaces, Some(&payload), &metrics, now());

        assert_eq!(
            sink.value("netmetrics_interface_up", &["leaf1", "ethernet-1/1", "srlinux"]),
            Some(1.0)
        );
        assert_eq!(
            sink.value("netmetrics_interface_up", &["leaf1", "ethernet-1/2", "srlinux"]),
            Some(0.0)
        );
        assert_eq!(
            sink.value("netmetrics_interface_up", &["leaf1", "mgmt0", "srlinux"]),
            Some(0.0)
        );
        assert_eq!(
            sink.value("netmetrics_interface_speed_mbps", &["leaf1", "ethernet-1/1", "srlinux"]),
            Some(10_000.0)
        );
        assert_eq!(
            sink.value("netmetrics_interface_speed_mbps", &["leaf1", "ethernet-1/2", "srlinux"]),
            Some(0.0)
        );
        assert_eq!(
            sink.value("netmetrics_interface_speed_mbps", &["leaf1", "mgmt0", "srlinux"]),
            Some(0.0)
        );
        assert_eq!(sink.values_named("netmetrics_interface_duplex").len(), 1);
    }

    #[test]
    fn test_statistics_missing_counters_are_sentinel() {
        let sink = Arc::new(InMemorySink::new());
        let metrics = metrics_for(sink.clone());

        let payload = json!({"statistics": [
            {"interface": "ethernet-1/1", "in-errors": 3, "out-errors": "5"},
            {"interface": "ethernet-1/2"}
        ]});
        apply_category(Category::InterfaceStatistics, Some(&payload), &metrics, now());

        assert_eq!(
            sink.value("netmetrics_interface_input_errors_total", &["leaf1", "ethernet-1/1"]),
            Some(3.0)
        );
        assert_eq!(
            sink.value("netmetrics_interface_output_errors_total", &["leaf1", "ethernet-1/1"]),
            Some(5.0)
        );
        assert_eq!(
            sink.value("netmetrics_interface_input_errors_total", &["leaf1", "ethernet-1/2"]),
            Some(-1.0)
        );
    }

    #[test]
    fn test_neighbor_counts_and_absent_defaults() {
        let sink = Arc::new(InMemorySink::new());
        let metrics = metrics_for(sink.clone());

        let ospf = json!({"area": [
            {"interface": [{"neighbor": [{}, {}]}, {"neighbor": [{}]}]},
            {"interface": [{}]},
            {}
        ]});
        let lldp = json!({"interface": [
            {"name": "ethernet-1/1", "neighbor": [{}, {}, {}]},
            {"name": "ethernet-1/2", "neighbor": []},
            {"name": "ethernet-1/3"}
        ]});
        apply_category(Category::Ospf, Some(&ospf), &metrics, now());
        apply_category(Category::Lldp, Some(&lldp), &metrics, now());
        apply_category(Category::Bgp, None, &metrics, now());

        assert_eq!(
            sink.value("netmetrics_ospf_neighbors_total", &["leaf1", "srlinux"]),
            Some(3.0)
        );
        assert_eq!(
            sink.value("netmetrics_lldp_neighbors_total", &["leaf1", "srlinux"]),
            Some(1.0)
        );
        assert_eq!(
            sink.value("netmetrics_bgp_neighbors_total", &["leaf1", "srlinux"]),
            Some(0.0)
        );
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

    async fn mount_path(server: &MockServer, rpc_path: &str, response: Value) {
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .and(basic_auth("admin", "admin"))
            .and(body_partial_json(json!({
                "jsonrpc": "2.0",
                "method": "get",
                "params": {"commands": [{"path": rpc_path, "datastore": "state", "recursive": true}]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(response))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_collect_issues_one_path_per_call() {
        let server = MockServer::start().await;
        mount_path(
            &server,
            SYSTEM_INFORMATION,
            json!({"jsonrpc": "2.0", "id": 1, "result": [{
                "version": "v23.10.1", "description": "7220 IXR-D2",
                "last-booted": "2024-05-01T10:00:00Z"
            }]}),
        )
        .await;
        mount_path(
            &server,
            INTERFACES,
            json!({"jsonrpc": "2.0", "id": 2, "result": [{"interface": [
                {"name": "ethernet-1/1", "admin-state": "enable", "oper-state": "up",
                 "ethernet": {"port-speed": "speed-25G"}}
            ]}]}),
        )
        .await;
        mount_path(
            &server,
            INTERFACE_STATISTICS,
            json!({"jsonrpc": "2.0", "id": 3, "result": []}),
        )
        .await;
        mount_path(
            &server,
            BGP_NEIGHBORS,
            json!({"jsonrpc": "2.0", "id": 4, "result": [{"neighbor": [{}, {}]}]}),
        )
        .await;
        mount_path(
            &server,
            OSPF_AREAS,
            json!({"jsonrpc": "2.0", "id": 5, "error": {"code": -1, "message": "Path not found"}}),
        )
        .await;
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .and(body_partial_json(json!({
                "params": {"commands": [{"path": LLDP_INTERFACES}]}
            })))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let mut device = test_device("leaf1", "127.0.0.1", VendorTag::Supported(Vendor::SrLinux));
        device.http.port = Some(server.address().port());

        let sink = Arc::new(InMemorySink::new());
        let metrics = metrics_for(sink.clone());
        let collector = SrLinuxCollector::with_clock(transport(), Arc::new(FixedClock(now())));
        let report = collector
            .collect(&device, &metrics)
            .await
            .expect("partial collection is ok");

        assert_eq!(report.failed_categories, vec!["lldp"]);
        assert_eq!(
            sink.value("netmetrics_device_uptime_seconds", &["leaf1"]),
            Some(7200.0)
        );
        assert_eq!(
            sink.value("netmetrics_interface_speed_mbps", &["leaf1", "ethernet-1/1", "srlinux"]),
            Some(25_000.0)
        );
        assert_eq!(
            sink.value("netmetrics_bgp_neighbors_total", &["leaf1", "srlinux"]),
            Some(2.0)
        );
        assert_eq!(
            sink.value("netmetrics_ospf_neighbors_total", &["leaf1", "srlinux"]),
            Some(0.0)
        );
        assert!(sink.values_named("netmetrics_lldp_neighbors_total").is_empty());
        assert!(sink.values_named("netmetrics_interface_input_errors_total").is_empty());
    }
}
