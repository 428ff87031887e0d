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

use super::model::{Vendor, VendorTag};

/// Maps an Ansible `network_os` value onto a short vendor name. Values outside
/// the alias table pass through unchanged.
pub fn normalize_network_os(os: &str) -> String {
    let os = os.trim().to_ascii_lowercase();
    match os.as_str() {
        "eos" | "arista.eos.eos" => "arista".to_string(),
        "ios" | "iosxe" | "cisco.ios.ios" => "cisco".to_string(),
        "junos" | "junipernetworks.junos.junos" => "juniper".to_string(),
        "nokia.srlinux.srlinux" | "srlinux" => "srlinux".to_string(),
        _ => os,
    }
}

impl VendorTag {
    pub fn from_network_os(os: &str) -> Self {
        let normalized = normalize_network_os(os);
        match normalized.as_str() {
            "arista" => VendorTag::Supported(Vendor::Arista),
            "cisco" => VendorTag::Supported(Vendor::Cisco),
            "srlinux" => VendorTag::Supported(Vendor::SrLinux),
            _ => VendorTag::Unsupported(normalized),
        }
    }
}
