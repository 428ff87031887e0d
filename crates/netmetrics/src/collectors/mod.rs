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

pub mod eapi;
mod emitter;
pub mod json;
pub mod restconf;
pub mod srlinux;
mod transport;

use std::sync::Arc;

pub use emitter::{DeviceMetrics, SENTINEL};
pub use transport::HttpTransport;

use crate::inventory::{Device, Vendor};
use crate::{BoxFuture, NetmetricsError};

/// Protocol adapter for one vendor. Implementations hold no per-device state
/// and report all samples through the given [`DeviceMetrics`].
///
/// `Ok` covers full and partial collection (see
/// [`CollectionReport::failed_categories`]); `Err` means no session to the
/// device could be established.
pub trait DeviceCollector: Send + Sync {
    fn collector_type(&self) -> &'static str;

    fn collect<'a>(
        &'a self,
        device: &'a Device,
        metrics: &'a DeviceMetrics,
    ) -> BoxFuture<'a, Result<CollectionReport, NetmetricsError>>;
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollectionReport {
    pub failed_categories: Vec<&'static str>,
    pub sample_count: usize,
}

impl CollectionReport {
    pub fn is_complete(&self) -> bool {
        self.failed_categories.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CollectionOutcome {
    Success,
    Partial { failed: Vec<&'static str> },
    Failed { kind: &'static str },
    Unsupported,
    Skipped,
    TimedOut,
    Cancelled,
}

impl CollectionOutcome {
    pub fn from_result(result: &Result<CollectionReport, NetmetricsError>) -> Self {
        match result {
            Ok(report) if report.is_complete() => CollectionOutcome::Success,
            Ok(report) => CollectionOutcome::Partial {
                failed: report.failed_categories.clone(),
            },
            Err(NetmetricsError::Timeout(_)) => CollectionOutcome::TimedOut,
            Err(e) => CollectionOutcome::Failed { kind: e.kind() },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CollectionOutcome::Success => "success",
            CollectionOutcome::Partial { .. } => "partial",
            CollectionOutcome::Failed { .. } => "failed",
            CollectionOutcome::Unsupported => "unsupported",
            CollectionOutcome::Skipped => "skipped",
            CollectionOutcome::TimedOut => "timeout",
            CollectionOutcome::Cancelled => "cancelled",
        }
    }

    /// Whether the device answered at all. Drives backoff and bootstrap.
    pub fn is_reachable(&self) -> bool {
        matches!(
            self,
            CollectionOutcome::Success | CollectionOutcome::Partial { .. }
        )
    }
}

/// Tracks independent categories within one collection. When every attempted
/// category failed at the transport level the collection as a whole fails.
pub(crate) struct CategoryRun {
    collector: &'static str,
    attempted: usize,
    failed: Vec<&'static str>,
    last_error: Option<NetmetricsError>,
}

impl CategoryRun {
    pub(crate) fn new(collector: &'static str) -> Self {
        Self {
            collector,
            attempted: 0,
            failed: Vec::new(),
            last_error: None,
        }
    }

    pub(crate) fn succeeded(&mut self) {
        self.attempted += 1;
    }

    pub(crate) fn failed(&mut self, hostname: &str, category: &'static str, error: NetmetricsError) {
        tracing::warn!(
            error = ?error,
            hostname = %hostname,
            category,
            "{}: failed to collect {category}",
            self.collector
        );
        self.attempted += 1;
        self.failed.push(category);
        self.last_error = Some(error);
    }

    pub(crate) fn finish(self, metrics: &DeviceMetrics) -> Result<CollectionReport, NetmetricsError> {
        if self.attempted > 0
            && self.failed.len() == self.attempted
            && let Some(error) = self.last_error
        {
            return Err(error);
        }
        Ok(CollectionReport {
            failed_categories: self.failed,
            sample_count: metrics.sample_count(),
        })
    }
}

/// One adapter per supported vendor. Adding a [`Vendor`] variant fails to
/// compile until it gets a collector here.
#[derive(Clone)]
pub struct CollectorSet {
    pub arista: Arc<dyn DeviceCollector>,
    pub cisco: Arc<dyn DeviceCollector>,
    pub srlinux: Arc<dyn DeviceCollector>,
}

impl CollectorSet {
    pub fn collector_for(&self, vendor: Vendor) -> &Arc<dyn DeviceCollector> {
        match vendor {
            Vendor::Arista => &self.arista,
            Vendor::Cisco => &self.cisco,
            Vendor::SrLinux => &self.srlinux,
        }
    }

    pub fn from_transport(transport: Arc<HttpTransport>) -> Self {
        Self {
            arista: Arc::new(eapi::EapiCollector::new(transport.clone())),
            cisco: Arc::new(restconf::RestconfCollector::new(transport.clone())),
            srlinux: Arc::new(srlinux::SrLinuxCollector::new(transport)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::Vendor;
    use crate::sink::{EventContext, InMemorySink};

    fn metrics() -> DeviceMetrics {
        DeviceMetrics::new(
            EventContext {
                hostname: "r1".to_string(),
                address: "10.0.0.1".to_string(),
                vendor: Vendor::Cisco,
                collector_type: "test",
            },
            Arc::new(InMemorySink::new()),
        )
    }

    #[test]
    fn test_outcome_from_result() {
        assert_eq!(
            CollectionOutcome::from_result(&Ok(CollectionReport::default())),
            CollectionOutcome::Success
        );
        assert_eq!(
            CollectionOutcome::from_result(&Ok(CollectionReport {
                failed_categories: vec!["bgp"],
                sample_count: 3,
            }))
            .label(),
            "partial"
        );
        assert_eq!(
            CollectionOutcome::from_result(&Err(NetmetricsError::HttpError("x".into()))),
            CollectionOutcome::Failed { kind: "transport" }
        );
        assert_eq!(
            CollectionOutcome::from_result(&Err(NetmetricsError::Timeout("x".into()))),
            CollectionOutcome::TimedOut
        );
        assert!(!CollectionOutcome::Unsupported.is_reachable());
    }

    #[test]
    fn test_category_run_partial_and_total_failure() {
        let metrics = metrics();

        let mut run = CategoryRun::new("test");
        run.succeeded();
        run.failed("r1", "bgp", NetmetricsError::HttpError("down".into()));
        let report = run.finish(&metrics).expect("partial is ok");
        assert_eq!(report.failed_categories, vec!["bgp"]);

        let mut run = CategoryRun::new("test");
        run.failed("r1", "bgp", NetmetricsError::HttpError("down".into()));
        run.failed("r1", "lldp", NetmetricsError::HttpError("still down".into()));
        let err = run.finish(&metrics).expect_err("all categories failed");
        assert!(err.to_string().contains("still down"));
    }
}
