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

use dashmap::DashMap;

use super::{CollectorEvent, DataSink, EventContext};

#[derive(Clone, Debug, PartialEq)]
pub struct RecordedSample {
    pub name: &'static str,
    pub labels: Vec<(String, String)>,
    pub value: f64,
}

type SampleKey = (&'static str, Vec<(String, String)>);

/// Keeps the latest value per (metric, label set) so the stored samples can be
/// enumerated directly instead of parsing the text exposition.
#[derive(Default)]
pub struct InMemorySink {
    samples: DashMap<SampleKey, f64>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> Vec<RecordedSample> {
        let mut samples: Vec<RecordedSample> = self
            .samples
            .iter()
            .map(|entry| RecordedSample {
                name: entry.key().0,
                labels: entry.key().1.clone(),
                value: *entry.value(),
            })
            .collect();
        samples.sort_by(|a, b| a.name.cmp(b.name).then_with(|| a.labels.cmp(&b.labels)));
        samples
    }

    /// Looks up one sample by metric name and label values given in label
    /// key order.
    pub fn value(&self, name: &str, label_values: &[&str]) -> Option<f64> {
        self.samples.iter().find_map(|entry| {
            let (sample_name, labels) = entry.key();
            let matches = *sample_name == name
                && labels.len() == label_values.len()
                && labels
                    .iter()
                    .zip(label_values)
                    .all(|((_, value), expected)| value == expected);
            matches.then(|| *entry.value())
        })
    }

    pub fn values_named(&self, name: &str) -> Vec<RecordedSample> {
        self.samples()
            .into_iter()
            .filter(|sample| sample.name == name)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl DataSink for InMemorySink {
    fn handle_event(&self, _context: &EventContext, event: &CollectorEvent) {
        if let CollectorEvent::Metric(sample) = event {
            let labels = sample
                .labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect();
            self.samples
                .insert((sample.metric.name(), labels), sample.value);
        }
    }
}
