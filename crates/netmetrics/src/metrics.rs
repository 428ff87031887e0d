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

use std::borrow::Cow;
use std::sync::Arc;

use dashmap::DashMap;
use prometheus::{Encoder, Registry, TextEncoder};

use crate::NetmetricsError;

pub type MetricLabel = (Cow<'static, str>, String);

pub const METRICS_PREFIX: &str = "netmetrics";

/// Closed set of device gauges. Names and label keys (including their order)
/// are part of the exposition contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NetMetric {
    InterfaceUp,
    InterfaceSpeedMbps,
    InterfaceDuplex,
    InterfaceInputErrors,
    InterfaceOutputErrors,
    DeviceUptimeSeconds,
    DeviceInfo,
    BgpNeighbors,
    OspfNeighbors,
    LldpNeighbors,
    CpuUsagePercent,
    MemoryUsagePercent,
}

impl NetMetric {
    pub const ALL: [NetMetric; 12] = [
        NetMetric::InterfaceUp,
        NetMetric::InterfaceSpeedMbps,
        NetMetric::InterfaceDuplex,
        NetMetric::InterfaceInputErrors,
        NetMetric::InterfaceOutputErrors,
        NetMetric::DeviceUptimeSeconds,
        NetMetric::DeviceInfo,
        NetMetric::BgpNeighbors,
        NetMetric::OspfNeighbors,
        NetMetric::LldpNeighbors,
        NetMetric::CpuUsagePercent,
        NetMetric::MemoryUsagePercent,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NetMetric::InterfaceUp => "netmetrics_interface_up",
            NetMetric::InterfaceSpeedMbps => "netmetrics_interface_speed_mbps",
            NetMetric::InterfaceDuplex => "netmetrics_interface_duplex",
            NetMetric::InterfaceInputErrors => "netmetrics_interface_input_errors_total",
            NetMetric::InterfaceOutputErrors => "netmetrics_interface_output_errors_total",
            NetMetric::DeviceUptimeSeconds => "netmetrics_device_uptime_seconds",
            NetMetric::DeviceInfo => "netmetrics_device_info",
            NetMetric::BgpNeighbors => "netmetrics_bgp_neighbors_total",
            NetMetric::OspfNeighbors => "netmetrics_ospf_neighbors_total",
            NetMetric::LldpNeighbors => "netmetrics_lldp_neighbors_total",
            NetMetric::CpuUsagePercent => "netmetrics_cpu_usage_percent",
            NetMetric::MemoryUsagePercent => "netmetrics_memory_usage_percent",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            NetMetric::InterfaceUp => "Interface status: 1=up, 0=down (admin state on RESTCONF devices)",
            NetMetric::InterfaceSpeedMbps => "Interface speed in Mbps, -1 when unknown",
            NetMetric::InterfaceDuplex => "Interface duplex mode, always 1 for the reported mode",
            NetMetric::InterfaceInputErrors => "Interface input error count, -1 when unknown",
            NetMetric::InterfaceOutputErrors => "Interface output error count, -1 when unknown",
            NetMetric::DeviceUptimeSeconds => "Device uptime in seconds, -1 when unknown",
            NetMetric::DeviceInfo => "Device model and software version, always 1",
            NetMetric::BgpNeighbors => "Number of BGP neighbors",
            NetMetric::OspfNeighbors => "Number of OSPF neighbors, -1 when unknown",
            NetMetric::LldpNeighbors => "Number of LLDP neighbors, -1 when unknown",
            NetMetric::CpuUsagePercent => "CPU utilization in percent",
            NetMetric::MemoryUsagePercent => "Memory utilization in percent",
        }
    }

    pub fn label_names(self) -> &'static [&'static str] {
        match self {
            NetMetric::InterfaceUp | NetMetric::InterfaceSpeedMbps => {
                &["hostname", "interface", "vendor"]
            }
            NetMetric::InterfaceDuplex => &["hostname", "interface", "vendor", "duplex"],
            NetMetric::InterfaceInputErrors | NetMetric::InterfaceOutputErrors => {
                &["hostname", "interface"]
            }
            NetMetric::DeviceUptimeSeconds => &["hostname"],
            NetMetric::DeviceInfo => &["hostname", "model", "version"],
            NetMetric::BgpNeighbors
            | NetMetric::OspfNeighbors
            | NetMetric::LldpNeighbors
            | NetMetric::CpuUsagePercent
            | NetMetric::MemoryUsagePercent => &["hostname", "vendor"],
        }
    }
}

/// A prometheus registry owned by one component, exported together with all
/// other registries by [`MetricsManager::export_all`].
pub struct CollectorRegistry {
    id: String,
    prefix: String,
    registry: Arc<Registry>,
}

impl CollectorRegistry {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn prefix(&self) -> &String {
        &self.prefix
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

pub struct MetricsManager {
    registries: DashMap<String, Arc<Registry>>,
}

impl Default for MetricsManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsManager {
    pub fn new() -> Self {
        Self {
            registries: DashMap::new(),
        }
    }

    pub fn create_collector_registry(
        &self,
        id: String,
        prefix: &str,
    ) -> Result<CollectorRegistry, NetmetricsError> {
        if prefix.is_empty() {
            return Err(NetmetricsError::ConfigError(format!(
                "collector registry {id}: empty metrics prefix"
            )));
        }

        let registry = Arc::new(Registry::new());
        if self
            .registries
            .insert(id.clone(), registry.clone())
            .is_some()
        {
            tracing::debug!(registry_id = %id, "Replaced existing collector registry");
        }

        Ok(CollectorRegistry {
            id,
            prefix: prefix.to_string(),
            registry,
        })
    }

    pub fn remove_collector_registry(&self, id: &str) {
        self.registries.remove(id);
    }

    /// Renders every registry in Prometheus text exposition format.
    pub fn export_all(&self) -> Result<String, NetmetricsError> {
        let mut families = Vec::new();
        for entry in self.registries.iter() {
            families.extend(entry.value().gather());
        }
        families.sort_by(|a, b| a.get_name().cmp(b.get_name()));

        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&families, &mut buffer)?;

        String::from_utf8(buffer)
            .map_err(|e| NetmetricsError::GenericError(format!("metrics export is not UTF-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use prometheus::{Gauge, Opts};

    use super::*;

    #[test]
    fn test_metric_names_share_prefix() {
        for metric in NetMetric::ALL {
            assert!(
                metric.name().starts_with(&format!("{METRICS_PREFIX}_")),
                "{} lacks prefix",
                metric.name()
            );
            assert_eq!(metric.label_names()[0], "hostname");
        }
    }

    #[test]
    fn test_export_all_includes_every_registry() {
        let manager = MetricsManager::new();
        let first = manager
            .create_collector_registry("first".to_string(), "netmetrics")
            .expect("registry");
        let second = manager
            .create_collector_registry("second".to_string(), "netmetrics")
            .expect("registry");

        let a = Gauge::with_opts(Opts::new("netmetrics_a", "a")).expect("gauge");
        a.set(1.0);
        first.registry().register(Box::new(a)).expect("register");
        let b = Gauge::with_opts(Opts::new("netmetrics_b", "b")).expect("gauge");
        b.set(2.0);
        second.registry().register(Box::new(b)).expect("register");

        let output = manager.export_all().expect("export");
        assert!(output.contains("netmetrics_a 1"));
        assert!(output.contains("netmetrics_b 2"));

        manager.remove_collector_registry("second");
        let output = manager.export_all().expect("export");
        assert!(!output.contains("netmetrics_b"));
    }

    #[test]
    fn test_empty_prefix_is_rejected() {
        let manager = MetricsManager::new();
        assert!(
            manager
                .create_collector_registry("x".to_string(), "")
                .is_err()
        );
    }
}
