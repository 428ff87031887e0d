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

use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::NetmetricsError;
use crate::collectors::transport::{HttpTransport, join_path, send_for_text};
use crate::inventory::Device;

const JSONRPC_PATH: &str = "/jsonrpc";

pub const SYSTEM_INFORMATION: &str = "/system/information";
pub const INTERFACES: &str = "/interface";
pub const INTERFACE_STATISTICS: &str = "/interface/statistics";
pub const BGP_NEIGHBORS: &str = "/network-instance[name=default]/protocols/bgp/neighbor";
pub const OSPF_AREAS: &str =
    "/network-instance[name=default]/protocols/ospf/instance[name=ospf-default]/area";
pub const LLDP_INTERFACES: &str = "/system/lldp/interface";
pub const JSONRPC_SERVER: &str = "/system/management/interface/json-rpc";

#[derive(Debug, Serialize)]
struct RpcRequest<P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: P,
}

#[derive(Debug, Serialize)]
struct GetParams<'a> {
    commands: Vec<GetCommand<'a>>,
}

#[derive(Debug, Serialize)]
struct GetCommand<'a> {
    path: &'a str,
    datastore: &'static str,
    recursive: bool,
}

#[derive(Debug, Serialize)]
struct PatchParams<'a> {
    updates: Vec<PatchUpdate<'a>>,
}

#[derive(Debug, Serialize)]
struct PatchUpdate<'a> {
    path: &'a str,
    value: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Vec<Value>>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// JSON-RPC session to one SR Linux device.
pub struct SrLinuxClient<'a> {
    transport: &'a HttpTransport,
    device: &'a Device,
    client: &'a Client,
    url: Url,
    next_id: AtomicU64,
}

impl<'a> SrLinuxClient<'a> {
    pub fn new(transport: &'a HttpTransport, device: &'a Device) -> Result<Self, NetmetricsError> {
        let base_url = transport.base_url(device, false)?;
        let url = join_path(&base_url, JSONRPC_PATH)?;
        Ok(Self {
            transport,
            device,
            client: transport.client_for(device),
            url,
            next_id: AtomicU64::new(1),
        })
    }

    /// Fetches one state-datastore path and returns the first result entry.
    pub async fn get(&self, path: &str) -> Result<Value, NetmetricsError> {
        let params = GetParams {
            commands: vec![GetCommand {
                path,
                datastore: "state",
                recursive: true,
            }],
        };
        let mut results = self.call("get", params).await?;
        if results.is_empty() {
            return Err(NetmetricsError::ProtocolError(format!(
                "{}: no result returned for {path} on {}",
                self.url, self.device.hostname
            )));
        }
        Ok(results.swap_remove(0))
    }

    pub async fn patch(&self, path: &str, value: Value) -> Result<(), NetmetricsError> {
        let params = PatchParams {
            updates: vec![PatchUpdate { path, value }],
        };
        self.call("patch", params).await.map(|_| ())
    }

    async fn call<P: Serialize>(
        &self,
        method: &'static str,
        params: P,
    ) -> Result<Vec<Value>, NetmetricsError> {
        let body = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        let request = self
            .client
            .post(self.url.as_str())
            .basic_auth(
                &self.device.credentials.username,
                Some(&self.device.credentials.password),
            )
            .json(&body);
        let text = send_for_text(self.transport, self.device, &self.url, request).await?;

        let response: RpcResponse = serde_json::from_str(&text).map_err(|e| {
            NetmetricsError::ProtocolError(format!(
                "{}: failed to parse JSON-RPC response for {}: {e}",
                self.url, self.device.hostname
            ))
        })?;

        if let Some(error) = response.error {
            return Err(NetmetricsError::ProtocolError(format!(
                "{}: JSON-RPC {method} error {} for {}: {}",
                self.url, error.code, self.device.hostname, error.message
            )));
        }
        Ok(response.result.unwrap_or_default())
    }
}
