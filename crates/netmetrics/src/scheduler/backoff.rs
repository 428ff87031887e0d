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
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use crate::config::BackoffConfig;

#[derive(Clone, Debug)]
pub struct ExponentialBackoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl ExponentialBackoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            current: initial,
        }
    }

    /// Returns the delay to wait now and doubles the next one, up to `max`.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current.min(self.max);
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

#[derive(Debug)]
struct DeviceHealth {
    consecutive_failures: u32,
    backoff: ExponentialBackoff,
    next_attempt: Instant,
}

/// Per-device failure tracking. A failing device is retried after an
/// exponential delay; once `failure_threshold` failures in a row are reached
/// the circuit opens and the device is only re-probed every
/// `reprobe_interval`. A success clears the entry.
pub struct CircuitBreaker {
    initial: Duration,
    max: Duration,
    failure_threshold: u32,
    reprobe_interval: Duration,
    devices: DashMap<String, DeviceHealth>,
}

impl CircuitBreaker {
    pub fn new(config: &BackoffConfig) -> Self {
        Self {
            initial: Duration::from_secs(config.initial_secs),
            max: Duration::from_secs(config.max_secs),
            failure_threshold: config.failure_threshold,
            reprobe_interval: Duration::from_secs(config.reprobe_interval_secs),
            devices: DashMap::new(),
        }
    }

    pub fn should_poll(&self, hostname: &str, now: Instant) -> bool {
        self.devices
            .get(hostname)
            .is_none_or(|health| now >= health.next_attempt)
    }

    pub fn is_open(&self, hostname: &str) -> bool {
        self.consecutive_failures(hostname) >= self.failure_threshold
    }

    pub fn consecutive_failures(&self, hostname: &str) -> u32 {
        self.devices
            .get(hostname)
            .map_or(0, |health| health.consecutive_failures)
    }

    pub fn record_success(&self, hostname: &str) {
        if let Some((_, health)) = self.devices.remove(hostname)
            && health.consecutive_failures >= self.failure_threshold
        {
            tracing::info!(hostname, "scheduler: device recovered, circuit closed");
        }
    }

    /// Drops state kept for hostnames that left the inventory.
    pub fn retain_devices(&self, hostnames: &HashSet<&str>) {
        self.devices
            .retain(|hostname, _| hostnames.contains(hostname.as_str()));
    }

    /// Returns how long the device is held back.
    pub fn record_failure(&self, hostname: &str, now: Instant) -> Duration {
        let mut health = self
            .devices
            .entry(hostname.to_string())
            .or_insert_with(|| DeviceHealth {
                consecutive_failures: 0,
                backoff: ExponentialBackoff::new(self.initial, self.max),
                next_attempt: now,
            });

        health.consecutive_failures += 1;
        let delay = if health.consecutive_failures >= self.failure_threshold {
            if health.consecutive_failures == self.failure_threshold {
                tracing::warn!(
                    hostname,
                    failures = health.consecutive_failures,
                    reprobe_secs = self.reprobe_interval.as_secs(),
                    "scheduler: circuit open"
                );
            }
            self.reprobe_interval
        } else {
            health.backoff.next_delay()
        };
        health.next_attempt = now + delay;
        delay
    }
}
