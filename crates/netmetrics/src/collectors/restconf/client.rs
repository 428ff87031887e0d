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

use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::NetmetricsError;
use crate::collectors::json::{lenient_f64, lenient_u64};
use crate::collectors::transport::{HttpTransport, join_path, send_for_text};
use crate::inventory::Device;

const RESTCONF_DATA: &str = "/restconf/data/";
const YANG_JSON: &str = "application/yang-data+json";

/// Independently fetched RESTCONF resources.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestconfCategory {
    Interfaces,
    Bgp,
    Lldp,
    Cpu,
    Memory,
    Ospf,
}

impl RestconfCategory {
    pub const ALL: [RestconfCategory; 6] = [
        RestconfCategory::Interfaces,
        RestconfCategory::Bgp,
        RestconfCategory::Lldp,
        RestconfCategory::Cpu,
        RestconfCategory::Memory,
        RestconfCategory::Ospf,
    ];

    /// Module-qualified resource path under `/restconf/data`. Also the
    /// top-level key a device may wrap the response in.
    pub fn resource(self) -> &'static str {
        match self {
            RestconfCategory::Interfaces => "ietf-interfaces:interfaces",
            RestconfCategory::Bgp => "Cisco-IOS-XE-bgp-oper:bgp-state-data",
            RestconfCategory::Lldp => "Cisco-IOS-XE-lldp-oper:lldp-entries",
            RestconfCategory::Cpu => "Cisco-IOS-XE-process-cpu-oper:cpu-usage",
            RestconfCategory::Memory => "Cisco-IOS-XE-memory-oper:memory-statistics",
            RestconfCategory::Ospf => "Cisco-IOS-XE-ospf-oper:ospf-oper-data",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RestconfCategory::Interfaces => "interfaces",
            RestconfCategory::Bgp => "bgp",
            RestconfCategory::Lldp => "lldp",
            RestconfCategory::Cpu => "cpu",
            RestconfCategory::Memory => "memory",
            RestconfCategory::Ospf => "ospf",
        }
    }
}

/// RESTCONF session to one IOS-XE device.
pub struct RestconfClient<'a> {
    transport: &'a HttpTransport,
    device: &'a Device,
    client: &'a Client,
    base_url: Url,
}

impl<'a> RestconfClient<'a> {
    pub fn new(transport: &'a HttpTransport, device: &'a Device) -> Result<Self, NetmetricsError> {
        let base_url = transport.base_url(device, true)?;
        Ok(Self {
            transport,
            device,
            client: transport.client_for(device),
            base_url,
        })
    }

    pub fn url_for(&self, category: RestconfCategory) -> Result<Url, NetmetricsError> {
        join_path(
            &self.base_url,
            &format!("{RESTCONF_DATA}{}", category.resource()),
        )
    }

    pub async fn fetch(&self, category: RestconfCategory) -> Result<String, NetmetricsError> {
        let url = self.url_for(category)?;
        let request = self
            .client
            .get(url.as_str())
            .basic_auth(
                &self.device.credentials.username,
                Some(&self.device.credentials.password),
            )
            .header("Accept", YANG_JSON);
        send_for_text(self.transport, self.device, &url, request).await
    }
}

/// Parses a category body, descending into the module-qualified root
/// container when present. Returns `None` for anything that does not parse.
pub fn parse_category<T: DeserializeOwned>(category: RestconfCategory, body: &str) -> Option<T> {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(error) => {
            tracing::debug!(?error, category = category.name(), "restconf: response is not JSON");
            return None;
        }
    };
    let value = match value {
        Value::Object(mut object) => match object.remove(category.resource()) {
            Some(inner) => inner,
            None => Value::Object(object),
        },
        other => other,
    };
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(error) => {
            tracing::debug!(?error, category = category.name(), "restconf: unexpected response shape");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// RESTCONF response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Interfaces {
    #[serde(default)]
    pub interface: Vec<Interface>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Interface {
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BgpStateData {
    #[serde(default)]
    pub neighbors: Option<BgpNeighbors>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BgpNeighbors {
    List(Vec<Value>),
    Container {
        #[serde(default)]
        neighbor: Vec<Value>,
    },
}

impl BgpStateData {
    pub fn neighbor_count(&self) -> usize {
        match &self.neighbors {
            Some(BgpNeighbors::List(list)) => list.len(),
            Some(BgpNeighbors::Container { neighbor }) => neighbor.len(),
            None => 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LldpEntries {
    #[serde(rename = "lldp-entry", default)]
    pub entries: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CpuUsage {
    #[serde(rename = "five-seconds", default, deserialize_with = "lenient_f64")]
    pub five_seconds: Option<f64>,
    #[serde(rename = "cpu-utilization")]
    pub cpu_utilization: Option<CpuUtilization>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CpuUtilization {
    #[serde(rename = "five-seconds", default, deserialize_with = "lenient_f64")]
    pub five_seconds: Option<f64>,
}

impl CpuUsage {
    pub fn five_seconds(&self) -> Option<f64> {
        self.five_seconds.or_else(|| {
            self.cpu_utilization
                .as_ref()
                .and_then(|utilization| utilization.five_seconds)
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemoryStatistics {
    #[serde(rename = "memory-statistic", default)]
    pub statistics: Vec<MemoryStatistic>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemoryStatistic {
    pub name: Option<String>,
    #[serde(rename = "total-memory", default, deserialize_with = "lenient_u64")]
    pub total: Option<u64>,
    #[serde(rename = "used-memory", default, deserialize_with = "lenient_u64")]
    pub used: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OspfOperData {
    #[serde(rename = "ospf-state/neighbors", default)]
    pub instances: Vec<OspfNeighborInstance>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OspfNeighborInstance {
    #[serde(rename = "ospfv2-neighbor", default)]
    pub neighbors: Vec<Value>,
}
