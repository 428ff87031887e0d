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

//! Periodic sweeps over the inventory with a bounded worker pool.

mod backoff;
mod iteration;
mod poll;

use std::sync::Arc;
use std::time::Duration;

use prometheus::{CounterVec, Gauge, GaugeVec, Histogram, HistogramOpts, Opts};
use tokio_util::sync::CancellationToken;

pub use backoff::{CircuitBreaker, ExponentialBackoff};
pub use iteration::SweepStats;

use self::iteration::run_sweep_iteration;
use self::poll::DevicePoller;
use crate::NetmetricsError;
use crate::bootstrap::{BootstrapSet, BootstrapTracker};
use crate::collectors::{CollectionOutcome, CollectorSet};
use crate::config::SchedulerConfig;
use crate::inventory::InventorySource;
use crate::metrics::{CollectorRegistry, METRICS_PREFIX, MetricsManager};
use crate::sink::DataSink;

/// Self-observability of the sweep loop.
pub struct SchedulerMetrics {
    sweep_duration: Histogram,
    sweep_devices: Gauge,
    outcomes: CounterVec,
    success: GaugeVec,
    duration: GaugeVec,
}

impl SchedulerMetrics {
    pub fn new(collector_registry: &CollectorRegistry) -> Result<Self, NetmetricsError> {
        let prefix = collector_registry.prefix();
        let registry = collector_registry.registry();

        let sweep_duration = Histogram::with_opts(
            HistogramOpts::new(
                format!("{prefix}_sweep_duration_seconds"),
                "Time taken for one sweep over all devices",
            )
            .buckets(vec![0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        )?;
        registry.register(Box::new(sweep_duration.clone()))?;

        let sweep_devices = Gauge::with_opts(Opts::new(
            format!("{prefix}_sweep_devices"),
            "Devices visited by the most recent sweep",
        ))?;
        registry.register(Box::new(sweep_devices.clone()))?;

        let outcomes = CounterVec::new(
            Opts::new(
                format!("{prefix}_collection_outcomes_total"),
                "Device collection outcomes",
            ),
            &["hostname", "vendor", "outcome"],
        )?;
        registry.register(Box::new(outcomes.clone()))?;

        let success = GaugeVec::new(
            Opts::new(
                format!("{prefix}_collection_success"),
                "Whether the last collection reached the device: 1=yes, 0=no",
            ),
            &["hostname", "vendor"],
        )?;
        registry.register(Box::new(success.clone()))?;

        let duration = GaugeVec::new(
            Opts::new(
                format!("{prefix}_collection_duration_seconds"),
                "Duration of the last collection",
            ),
            &["hostname", "vendor"],
        )?;
        registry.register(Box::new(duration.clone()))?;

        Ok(Self {
            sweep_duration,
            sweep_devices,
            outcomes,
            success,
            duration,
        })
    }

    pub(crate) fn record_outcome(
        &self,
        hostname: &str,
        vendor: &str,
        outcome: &CollectionOutcome,
        elapsed: Option<Duration>,
    ) {
        self.outcomes
            .with_label_values(&[hostname, vendor, outcome.label()])
            .inc();

        match outcome {
            CollectionOutcome::Success | CollectionOutcome::Partial { .. } => {
                self.success.with_label_values(&[hostname, vendor]).set(1.0)
            }
            CollectionOutcome::Failed { .. } | CollectionOutcome::TimedOut => {
                self.success.with_label_values(&[hostname, vendor]).set(0.0)
            }
            CollectionOutcome::Unsupported
            | CollectionOutcome::Skipped
            | CollectionOutcome::Cancelled => {}
        }

        if let Some(elapsed) = elapsed {
            self.duration
                .with_label_values(&[hostname, vendor])
                .set(elapsed.as_secs_f64());
        }
    }
}

pub struct PollScheduler {
    source: Arc<dyn InventorySource>,
    poller: Arc<DevicePoller>,
    poll_interval: Duration,
    max_concurrent: usize,
}

impl PollScheduler {
    pub fn new(
        source: Arc<dyn InventorySource>,
        collectors: CollectorSet,
        sink: Arc<dyn DataSink>,
        bootstraps: BootstrapSet,
        config: &SchedulerConfig,
        metrics_manager: &MetricsManager,
    ) -> Result<Self, NetmetricsError> {
        let registry =
            metrics_manager.create_collector_registry("scheduler".to_string(), METRICS_PREFIX)?;
        let metrics = SchedulerMetrics::new(&registry)?;

        let poller = DevicePoller {
            collectors,
            sink,
            bootstraps,
            tracker: BootstrapTracker::new(),
            breaker: CircuitBreaker::new(&config.backoff),
            device_timeout: config.device_timeout(),
            metrics,
        };

        Ok(Self {
            source,
            poller: Arc::new(poller),
            poll_interval: config.poll_interval(),
            max_concurrent: config.max_concurrent_polls.max(1),
        })
    }

    /// Runs exactly one sweep.
    pub async fn run_sweep(&self, cancel: &CancellationToken) -> Result<SweepStats, NetmetricsError> {
        run_sweep_iteration(self.source.as_ref(), &self.poller, self.max_concurrent, cancel).await
    }

    /// Sweeps, then waits `poll_interval`, until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            poll_interval_secs = self.poll_interval.as_secs(),
            max_concurrent = self.max_concurrent,
            "scheduler: started"
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }
            // Fetch errors are logged in the iteration; the next sweep retries.
            let _ = self.run_sweep(&cancel).await;

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        tracing::info!("scheduler: stopped");
    }
}
