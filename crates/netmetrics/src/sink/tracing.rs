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

use super::{CollectorEvent, DataSink, EventContext};

/// Mirrors every sample into the debug log. Installed with `--verbose`.
pub struct TracingSink;

impl DataSink for TracingSink {
    fn handle_event(&self, context: &EventContext, event: &CollectorEvent) {
        match event {
            CollectorEvent::MetricCollectionStart => {
                tracing::debug!(
                    hostname = %context.hostname,
                    vendor = %context.vendor,
                    collector = %context.collector_type,
                    "Metric collection start"
                );
            }
            CollectorEvent::Metric(sample) => {
                tracing::debug!(
                    hostname = %context.hostname,
                    collector = %context.collector_type,
                    metric = sample.metric.name(),
                    labels = ?sample.label_values(),
                    value = sample.value,
                    "Metric event"
                );
            }
            CollectorEvent::MetricCollectionEnd => {
                tracing::debug!(
                    hostname = %context.hostname,
                    vendor = %context.vendor,
                    collector = %context.collector_type,
                    "Metric collection end"
                );
            }
        }
    }
}
