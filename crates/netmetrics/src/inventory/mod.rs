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

mod loader;
mod model;
mod sources;
mod vendor;

pub use loader::{InventoryFormat, load_inventory, parse_inventory};
pub use model::{
    Credentials, Device, HttpOptions, InventorySource, Protocol, Vendor, VendorTag,
};
pub use sources::{CompositeInventorySource, FileInventorySource, StaticInventorySource};
pub use vendor::normalize_network_os;

#[cfg(test)]
pub(crate) fn test_device(hostname: &str, address: &str, vendor: VendorTag) -> Device {
    Device {
        hostname: hostname.to_string(),
        address: address.to_string(),
        credentials: Credentials {
            username: "admin".to_string(),
            password: "admin".to_string(),
        },
        vendor,
        http: HttpOptions::default(),
    }
}
