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

use serde_json::Value;

use super::client::{CommandResults, EapiClient, EapiCommand};
use crate::collectors::{
    CollectionReport, DeviceCollector, DeviceMetrics, HttpTransport, SENTINEL,
};
use crate::inventory::Device;
use crate::{BoxFuture, NetmetricsError};

const COLLECTOR_NAME: &str = "eapi";

pub struct EapiCollector {
    transport: Arc<HttpTransport>,
}

impl EapiCollector {
    pub fn new(transport: Arc<HttpTransport>) -> Self {
        Self { transport }
    }
}

impl DeviceCollector for EapiCollector {
    fn collector_type(&self) -> &'static str {
        COLLECTOR_NAME
    }

    fn collect<'a>(
        &'a self,
        device: &'a Device,
        metrics: &'a DeviceMetrics,
    ) -> BoxFuture<'a, Result<CollectionReport, NetmetricsError>> {
        Box::pin(async move {
            let client = EapiClient::new(&self.transport, device)?;
            let results = client.run_cmds(&EapiCommand::ALL).await?;
            let report = apply_results(&results, metrics);

            tracing::debug!(
                hostname = %device.hostname,
                samples = report.sample_count,
                failed = ?report.failed_categories,
                "eapi: collection complete"
            );
            Ok(report)
        })
    }
}

pub(crate) fn apply_results(results: &CommandResults, metrics: &DeviceMetrics) -> CollectionReport {
    let mut failed_categories = Vec::new();
    for command in EapiCommand::ALL {
        let Some(output) = results.get(command) else {
            failed_categories.push(command.category());
            continue;
        };
        match command {
            EapiCommand::InterfacesStatus => map_interfaces_status(output, metrics),
            EapiCommand::BgpSummary => map_bgp_summary(output, metrics),
            EapiCommand::Version => map_version(output, metrics),
            EapiCommand::OspfNeighbors => map_ospf_neighbors(output, metrics),
            EapiCommand::InterfaceErrors => map_interface_errors(output, metrics),
            EapiCommand::LldpNeighbors => map_lldp_neighbors(output, metrics),
        }
    }
    CollectionReport {
        failed_categories,
        sample_count: metrics.sample_count(),
    }
}

fn map_interfaces_status(output: &Value, metrics: &DeviceMetrics) {
    let Some(interfaces) = output.get("interfaceStatuses").and_then(Value::as_object) else {
        return;
    };

    for (name, status) in interfaces {
        let up = match status.get("lineProtocolStatus").and_then(Value::as_str) {
            Some(line_protocol) => line_protocol == "connected",
            None => status.get("linkStatus").and_then(Value::as_str) == Some("connected"),
        };
        metrics.interface_up(name, up);

        let speed = status
            .get("bandwidth")
            .and_then(Value::as_f64)
            .map_or(SENTINEL, |bps| bps / 1_000_000.0);
        metrics.interface_speed_mbps(name, speed);

        let duplex = status
            .get("duplex")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        metrics.interface_duplex(name, duplex);
    }
}

fn map_bgp_summary(output: &Value, metrics: &DeviceMetrics) {
    let peers = output
        .pointer("/vrfs/default/peers")
        .and_then(Value::as_object)
        .map_or(0, |peers| peers.len());
    metrics.bgp_neighbors(peers as f64);
}

fn map_version(output: &Value, metrics: &DeviceMetrics) {
    if let Some(uptime) = output.get("uptime").and_then(Value::as_f64) {
        metrics.device_uptime_seconds(uptime);
    }
    if let Some(model) = output.get("modelName").and_then(Value::as_str)
        && let Some(version) = output.get("version").and_then(Value::as_str)
    {
        metrics.device_info(model, version);
    }
}

fn map_ospf_neighbors(output: &Value, metrics: &DeviceMetrics) {
    let count = output
        .pointer("/vrfs/default/instList/1/ospfNeighborEntries")
        .and_then(Value::as_array)
        .map_or(SENTINEL, |entries| entries.len() as f64);
    metrics.ospf_neighbors(count);
}

fn map_interface_errors(output: &Value, metrics: &DeviceMetrics) {
    let Some(counters) = output.get("interfaceCounters").and_then(Value::as_object) else {
        return;
    };

    for (name, counter) in counters {
        let input = counter
            .get("inputErrors")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        let output = counter
            .get("outputErrors")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        metrics.interface_input_errors(name, input);
        metrics.interface_output_errors(name, output);
    }
}

fn map_lldp_neighbors(output: &Value, metrics: &DeviceMetrics) {
    let count = output
        .get("lldpNeighbors")
        .and_then(Value::as_array)
        .map_or(SENTINEL, |neighbors| neighbors.len() as f64);
    metrics.lldp_neighbors(count);
}
