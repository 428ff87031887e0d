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

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::SchedulerMetrics;
use super::backoff::CircuitBreaker;
use crate::NetmetricsError;
use crate::bootstrap::{BootstrapSet, BootstrapTracker};
use crate::collectors::{CollectionOutcome, CollectorSet, DeviceMetrics};
use crate::inventory::{Device, Vendor, VendorTag};
use crate::sink::{DataSink, EventContext};

/// Everything a single device poll needs. Shared by all tasks of a sweep.
pub(crate) struct DevicePoller {
    pub(crate) collectors: CollectorSet,
    pub(crate) sink: Arc<dyn DataSink>,
    pub(crate) bootstraps: BootstrapSet,
    pub(crate) tracker: BootstrapTracker,
    pub(crate) breaker: CircuitBreaker,
    pub(crate) device_timeout: Duration,
    pub(crate) metrics: SchedulerMetrics,
}

impl DevicePoller {
    /// Drops backoff and bootstrap state for devices missing from `devices`.
    pub(crate) fn forget_missing(&self, devices: &[Arc<Device>]) {
        let current: HashSet<&str> = devices.iter().map(|d| d.hostname.as_str()).collect();
        self.breaker.retain_devices(&current);
        self.tracker.retain_devices(&current);
    }

    pub(crate) async fn poll_device(
        &self,
        device: &Device,
        cancel: &CancellationToken,
    ) -> CollectionOutcome {
        let vendor = match &device.vendor {
            VendorTag::Supported(vendor) => *vendor,
            VendorTag::Unsupported(tag) => {
                tracing::warn!(
                    hostname = %device.hostname,
                    vendor = %tag,
                    "scheduler: unsupported vendor, skipping device"
                );
                let outcome = CollectionOutcome::Unsupported;
                self.metrics
                    .record_outcome(&device.hostname, tag, &outcome, None);
                return outcome;
            }
        };

        if !self.breaker.should_poll(&device.hostname, Instant::now()) {
            tracing::debug!(
                hostname = %device.hostname,
                failures = self.breaker.consecutive_failures(&device.hostname),
                "scheduler: device backing off, skipping"
            );
            let outcome = CollectionOutcome::Skipped;
            self.metrics
                .record_outcome(&device.hostname, vendor.as_str(), &outcome, None);
            return outcome;
        }

        let start = Instant::now();
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => CollectionOutcome::Cancelled,
            outcome = self.bootstrap_and_collect(device, vendor) => outcome,
        };
        let elapsed = start.elapsed();

        match &outcome {
            CollectionOutcome::Success | CollectionOutcome::Partial { .. } => {
                self.breaker.record_success(&device.hostname);
                self.tracker.mark_ready(&device.hostname);
            }
            CollectionOutcome::Failed { .. } | CollectionOutcome::TimedOut => {
                let delay = self.breaker.record_failure(&device.hostname, Instant::now());
                tracing::debug!(
                    hostname = %device.hostname,
                    retry_in_secs = delay.as_secs(),
                    "scheduler: device held back after failure"
                );
            }
            CollectionOutcome::Unsupported
            | CollectionOutcome::Skipped
            | CollectionOutcome::Cancelled => {}
        }

        self.metrics
            .record_outcome(&device.hostname, vendor.as_str(), &outcome, Some(elapsed));
        outcome
    }

    /// A poll task that panicked counts as a failed poll of its device.
    pub(crate) fn record_panic(&self, hostname: &str, vendor: &str) -> CollectionOutcome {
        let outcome = CollectionOutcome::Failed { kind: "panic" };
        self.breaker.record_failure(hostname, Instant::now());
        self.metrics.record_outcome(hostname, vendor, &outcome, None);
        outcome
    }

    async fn bootstrap_and_collect(&self, device: &Device, vendor: Vendor) -> CollectionOutcome {
        self.bootstrap(device, vendor).await;

        let collector = self.collectors.collector_for(vendor);
        let metrics = DeviceMetrics::new(
            EventContext::from_device(device, vendor, collector.collector_type()),
            self.sink.clone(),
        );

        metrics.begin();
        let result = match tokio::time::timeout(
            self.device_timeout,
            collector.collect(device, &metrics),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(NetmetricsError::Timeout(format!(
                "{} did not finish within {:?}",
                device.hostname, self.device_timeout
            ))),
        };
        metrics.end();

        match &result {
            Ok(report) => tracing::debug!(
                hostname = %device.hostname,
                vendor = %vendor,
                samples = report.sample_count,
                "scheduler: device polled"
            ),
            Err(e) => tracing::warn!(
                error = ?e,
                hostname = %device.hostname,
                vendor = %vendor,
                kind = e.kind(),
                "scheduler: device poll failed"
            ),
        }
        CollectionOutcome::from_result(&result)
    }

    /// Runs the vendor's bootstrapper until the device has answered once.
    /// Failures are logged and never stop the poll.
    async fn bootstrap(&self, device: &Device, vendor: Vendor) {
        let Some(bootstrap) = self.bootstraps.bootstrap_for(vendor) else {
            return;
        };
        if !self.tracker.needs_bootstrap(&device.hostname) {
            return;
        }

        match tokio::time::timeout(self.device_timeout, bootstrap.enable(device)).await {
            Ok(Ok(())) => self.tracker.mark_ready(&device.hostname),
            Ok(Err(e)) => tracing::warn!(
                error = ?e,
                hostname = %device.hostname,
                bootstrap = bootstrap.name(),
                "scheduler: bootstrap failed, polling anyway"
            ),
            Err(_) => tracing::warn!(
                hostname = %device.hostname,
                bootstrap = bootstrap.name(),
                "scheduler: bootstrap timed out, polling anyway"
            ),
        }
    }
}
