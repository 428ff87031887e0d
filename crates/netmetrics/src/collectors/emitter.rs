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
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::metrics::{MetricLabel, NetMetric};
use crate::sink::{CollectorEvent, DataSink, EventContext, MetricSample};

/// Value written for a metric that was queried but could not be determined.
pub const SENTINEL: f64 = -1.0;

/// Per-device handle adapters write through. Every sample it emits carries
/// this device's hostname and the label keys `NetMetric::label_names` fixes.
pub struct DeviceMetrics {
    context: EventContext,
    sink: Arc<dyn DataSink>,
    samples: AtomicUsize,
}

impl DeviceMetrics {
    pub fn new(context: EventContext, sink: Arc<dyn DataSink>) -> Self {
        Self {
            context,
            sink,
            samples: AtomicUsize::new(0),
        }
    }

    pub fn context(&self) -> &EventContext {
        &self.context
    }

    pub fn hostname(&self) -> &str {
        &self.context.hostname
    }

    pub fn sample_count(&self) -> usize {
        self.samples.load(Ordering::Relaxed)
    }

    pub fn begin(&self) {
        self.sink
            .handle_event(&self.context, &CollectorEvent::MetricCollectionStart);
    }

    pub fn end(&self) {
        self.sink
            .handle_event(&self.context, &CollectorEvent::MetricCollectionEnd);
    }

    pub fn interface_up(&self, interface: &str, up: bool) {
        let value = if up { 1.0 } else { 0.0 };
        self.emit(NetMetric::InterfaceUp, self.interface_vendor(interface), value);
    }

    pub fn interface_speed_mbps(&self, interface: &str, mbps: f64) {
        self.emit(
            NetMetric::InterfaceSpeedMbps,
            self.interface_vendor(interface),
            mbps,
        );
    }

    pub fn interface_duplex(&self, interface: &str, duplex: &str) {
        let mut labels = self.interface_vendor(interface);
        labels.push((Cow::Borrowed("duplex"), duplex.to_string()));
        self.emit(NetMetric::InterfaceDuplex, labels, 1.0);
    }

    pub fn interface_input_errors(&self, interface: &str, count: f64) {
        self.emit(
            NetMetric::InterfaceInputErrors,
            self.interface_only(interface),
            count,
        );
    }

    pub fn interface_output_errors(&self, interface: &str, count: f64) {
        self.emit(
            NetMetric::InterfaceOutputErrors,
            self.interface_only(interface),
            count,
        );
    }

    pub fn device_uptime_seconds(&self, seconds: f64) {
        self.emit(
            NetMetric::DeviceUptimeSeconds,
            vec![self.hostname_label()],
            seconds,
        );
    }

    pub fn device_info(&self, model: &str, version: &str) {
        self.emit(
            NetMetric::DeviceInfo,
            vec![
                self.hostname_label(),
                (Cow::Borrowed("model"), model.to_string()),
                (Cow::Borrowed("version"), version.to_string()),
            ],
            1.0,
        );
    }

    pub fn bgp_neighbors(&self, count: f64) {
        self.emit(NetMetric::BgpNeighbors, self.device_vendor(), count);
    }

    pub fn ospf_neighbors(&self, count: f64) {
        self.emit(NetMetric::OspfNeighbors, self.device_vendor(), count);
    }

    pub fn lldp_neighbors(&self, count: f64) {
        self.emit(NetMetric::LldpNeighbors, self.device_vendor(), count);
    }

    pub fn cpu_usage_percent(&self, percent: f64) {
        self.emit(NetMetric::CpuUsagePercent, self.device_vendor(), percent);
    }

    pub fn memory_usage_percent(&self, percent: f64) {
        self.emit(NetMetric::MemoryUsagePercent, self.device_vendor(), percent);
    }

    fn hostname_label(&self) -> MetricLabel {
        (Cow::Borrowed("hostname"), self.context.hostname.clone())
    }

    fn vendor_label(&self) -> MetricLabel {
        (Cow::Borrowed("vendor"), self.context.vendor.as_str().to_string())
    }

    fn interface_vendor(&self, interface: &str) -> Vec<MetricLabel> {
        vec![
            self.hostname_label(),
            (Cow::Borrowed("interface"), interface.to_string()),
            self.vendor_label(),
        ]
    }

    fn interface_only(&self, interface: &str) -> Vec<MetricLabel> {
        vec![
            self.hostname_label(),
            (Cow::Borrowed("interface"), interface.to_string()),
        ]
    }

    fn device_vendor(&self) -> Vec<MetricLabel> {
        vec![self.hostname_label(), self.vendor_label()]
    }

    fn emit(&self, metric: NetMetric, labels: Vec<MetricLabel>, value: f64) {
        debug_assert_eq!(labels.len(), metric.label_names().len());
        self.samples.fetch_add(1, Ordering::Relaxed);
        self.sink.handle_event(
            &self.context,
            &CollectorEvent::Metric(MetricSample {
                metric,
                labels,
                value,
            }),
        );
    }
}
