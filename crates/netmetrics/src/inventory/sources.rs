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

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::loader::{InventoryFormat, load_inventory};
use super::model::{Device, InventorySource};
use crate::{BoxFuture, NetmetricsError};

pub struct StaticInventorySource {
    devices: Vec<Arc<Device>>,
}

impl StaticInventorySource {
    pub fn new(devices: Vec<Device>) -> Self {
        Self {
            devices: devices.into_iter().map(Arc::new).collect(),
        }
    }
}

impl InventorySource for StaticInventorySource {
    fn fetch_devices<'a>(&'a self) -> BoxFuture<'a, Result<Vec<Arc<Device>>, NetmetricsError>> {
        Box::pin(async move { Ok(self.devices.clone()) })
    }
}

/// Re-reads the inventory file on every fetch. A file that stops parsing
/// keeps the last good device set in place.
pub struct FileInventorySource {
    path: PathBuf,
    format: InventoryFormat,
    last_good: RwLock<Vec<Arc<Device>>>,
}

impl FileInventorySource {
    /// Fails when the initial load fails, so a broken inventory is fatal at
    /// startup only.
    pub fn new(path: PathBuf, format: InventoryFormat) -> Result<Self, NetmetricsError> {
        let devices = load_inventory(&path, format)?;
        Ok(Self {
            path,
            format,
            last_good: RwLock::new(devices.into_iter().map(Arc::new).collect()),
        })
    }
}

impl InventorySource for FileInventorySource {
    fn fetch_devices<'a>(&'a self) -> BoxFuture<'a, Result<Vec<Arc<Device>>, NetmetricsError>> {
        Box::pin(async move {
            let path = self.path.clone();
            let format = self.format;
            let loaded = tokio::task::spawn_blocking(move || load_inventory(&path, format))
                .await
                .map_err(|e| NetmetricsError::GenericError(format!("inventory reload task: {e}")))?;

            match loaded {
                Ok(devices) => {
                    let mut last_good = self.last_good.write().await;
                    // Unchanged entries keep their Arc so in-flight state stays shared.
                    let reloaded: Vec<Arc<Device>> = devices
                        .into_iter()
                        .map(|device| {
                            last_good
                                .iter()
                                .find(|existing| existing.as_ref() == &device)
                                .cloned()
                                .unwrap_or_else(|| Arc::new(device))
                        })
                        .collect();
                    *last_good = reloaded.clone();
                    Ok(reloaded)
                }
                Err(error) => {
                    tracing::warn!(
                        ?error,
                        path = %self.path.display(),
                        "Inventory reload failed, keeping previous devices"
                    );
                    Ok(self.last_good.read().await.clone())
                }
            }
        })
    }
}

pub struct CompositeInventorySource {
    sources: Vec<Arc<dyn InventorySource>>,
}

impl CompositeInventorySource {
    pub fn new(sources: Vec<Arc<dyn InventorySource>>) -> Self {
        Self { sources }
    }
}

impl InventorySource for CompositeInventorySource {
    fn fetch_devices<'a>(&'a self) -> BoxFuture<'a, Result<Vec<Arc<Device>>, NetmetricsError>> {
        Box::pin(async move {
            let mut all = Vec::new();
            for source in &self.sources {
                all.append(&mut source.fetch_devices().await?);
            }
            Ok(all)
        })
    }
}
