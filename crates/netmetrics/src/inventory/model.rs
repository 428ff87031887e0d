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

use std::fmt;
use std::sync::Arc;

use crate::{BoxFuture, NetmetricsError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Vendor {
    Arista,
    Cisco,
    SrLinux,
}

impl Vendor {
    pub fn as_str(self) -> &'static str {
        match self {
            Vendor::Arista => "arista",
            Vendor::Cisco => "cisco",
            Vendor::SrLinux => "srlinux",
        }
    }

    pub fn protocol(self) -> Protocol {
        match self {
            Vendor::Arista => Protocol::Eapi,
            Vendor::Cisco => Protocol::Restconf,
            Vendor::SrLinux => Protocol::JsonRpc,
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VendorTag {
    Supported(Vendor),
    /// Normalized OS string with no adapter behind it.
    Unsupported(String),
}

impl VendorTag {
    pub fn as_str(&self) -> &str {
        match self {
            VendorTag::Supported(vendor) => vendor.as_str(),
            VendorTag::Unsupported(raw) => raw,
        }
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            VendorTag::Supported(vendor) => vendor.protocol(),
            VendorTag::Unsupported(_) => Protocol::Unknown,
        }
    }
}

impl fmt::Display for VendorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Protocol {
    Eapi,
    Restconf,
    JsonRpc,
    Unknown,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Eapi => "eapi",
            Protocol::Restconf => "restconf",
            Protocol::JsonRpc => "jsonrpc",
            Protocol::Unknown => "unknown",
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Per-device overrides for the HTTP based adapters. `None` falls back to the
/// adapter default (scheme, port) or the global TLS setting.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpOptions {
    pub port: Option<u16>,
    pub use_ssl: Option<bool>,
    pub validate_certs: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Device {
    pub hostname: String,
    pub address: String,
    pub credentials: Credentials,
    pub vendor: VendorTag,
    pub http: HttpOptions,
}

impl Device {
    pub fn protocol(&self) -> Protocol {
        self.vendor.protocol()
    }
}

pub trait InventorySource: Send + Sync {
    fn fetch_devices<'a>(&'a self) -> BoxFuture<'a, Result<Vec<Arc<Device>>, NetmetricsError>>;
}
