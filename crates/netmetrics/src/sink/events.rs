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

use crate::inventory::{Device, Vendor};
use crate::metrics::{MetricLabel, NetMetric};

#[derive(Clone, Debug)]
pub struct EventContext {
    pub hostname: String,
    pub address: String,
    pub vendor: Vendor,
    pub collector_type: &'static str,
}

impl EventContext {
    pub fn from_device(device: &Device, vendor: Vendor, collector_type: &'static str) -> Self {
        Self {
            hostname: device.hostname.clone(),
            address: device.address.clone(),
            vendor,
            collector_type,
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }
}

/// One gauge write. `labels` follows `metric.label_names()` key for key.
#[derive(Clone, Debug)]
pub struct MetricSample {
    pub metric: NetMetric,
    pub labels: Vec<MetricLabel>,
    pub value: f64,
}

impl MetricSample {
    pub fn label_values(&self) -> Vec<&str> {
        self.labels.iter().map(|(_, v)| v.as_str()).collect()
    }

    pub fn has_canonical_labels(&self) -> bool {
        let names = self.metric.label_names();
        names.len() == self.labels.len()
            && names
                .iter()
                .zip(&self.labels)
                .all(|(expected, (key, _))| *expected == key.as_ref())
    }
}

#[derive(Clone, Debug)]
pub enum CollectorEvent {
    MetricCollectionStart,
    Metric(MetricSample),
    MetricCollectionEnd,
}
