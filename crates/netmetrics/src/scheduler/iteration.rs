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

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::poll::DevicePoller;
use crate::NetmetricsError;
use crate::collectors::CollectionOutcome;
use crate::inventory::InventorySource;

/// Outcome tally of one sweep.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub devices: usize,
    pub succeeded: usize,
    pub partial: usize,
    pub failed: usize,
    pub unsupported: usize,
    pub skipped: usize,
    pub cancelled: usize,
}

impl SweepStats {
    fn record(&mut self, outcome: &CollectionOutcome) {
        match outcome {
            CollectionOutcome::Success => self.succeeded += 1,
            CollectionOutcome::Partial { .. } => self.partial += 1,
            CollectionOutcome::Failed { .. } | CollectionOutcome::TimedOut => self.failed += 1,
            CollectionOutcome::Unsupported => self.unsupported += 1,
            CollectionOutcome::Skipped => self.skipped += 1,
            CollectionOutcome::Cancelled => self.cancelled += 1,
        }
    }
}

/// Visits every device from `source` once, at most `max_concurrent` at a
/// time. Devices are dispatched in inventory order.
pub(crate) async fn run_sweep_iteration(
    source: &dyn InventorySource,
    poller: &Arc<DevicePoller>,
    max_concurrent: usize,
    cancel: &CancellationToken,
) -> Result<SweepStats, NetmetricsError> {
    let sweep_start = Instant::now();

    let devices = match source.fetch_devices().await {
        Ok(devices) => devices,
        Err(e) => {
            tracing::error!(error = ?e, "scheduler: could not fetch devices");
            return Err(e);
        }
    };
    poller.metrics.sweep_devices.set(devices.len() as f64);
    poller.forget_missing(&devices);

    let mut stats = SweepStats {
        devices: devices.len(),
        ..SweepStats::default()
    };

    let semaphore = Arc::new(Semaphore::new(max_concurrent));
    let mut tasks = JoinSet::new();
    let mut dispatched = 0;

    for device in devices {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            permit = semaphore.clone().acquire_owned() => permit,
        };
        let Ok(permit) = permit else {
            break;
        };
        dispatched += 1;

        let poller = poller.clone();
        let cancel = cancel.clone();
        tasks.spawn(async move {
            let _permit = permit;
            let hostname = device.hostname.clone();
            let vendor = device.vendor.as_str().to_string();

            let inner_poller = poller.clone();
            let polled = tokio::spawn(async move {
                inner_poller.poll_device(&device, &cancel).await
            })
            .await;

            match polled {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(error = ?e, hostname = %hostname, "scheduler: device poll task panicked");
                    poller.record_panic(&hostname, &vendor)
                }
            }
        });
    }

    stats.cancelled += stats.devices - dispatched;

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => stats.record(&outcome),
            Err(e) => {
                tracing::error!(error = ?e, "scheduler: sweep task failed");
                stats.failed += 1;
            }
        }
    }

    let elapsed = sweep_start.elapsed();
    poller.metrics.sweep_duration.observe(elapsed.as_secs_f64());

    tracing::info!(
        devices = stats.devices,
        succeeded = stats.succeeded,
        partial = stats.partial,
        failed = stats.failed,
        unsupported = stats.unsupported,
        skipped = stats.skipped,
        duration_ms = elapsed.as_millis() as u64,
        "scheduler: sweep complete"
    );
    Ok(stats)
}
