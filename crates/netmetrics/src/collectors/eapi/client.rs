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

use std::collections::HashMap;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::NetmetricsError;
use crate::collectors::transport::{HttpTransport, join_path, send_for_text};
use crate::inventory::Device;

const EAPI_PATH: &str = "/command-api";

/// Show commands issued in one `runCmds` batch. The position in
/// [`EapiCommand::ALL`] is the position in the request and in the response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EapiCommand {
    InterfacesStatus,
    BgpSummary,
    Version,
    OspfNeighbors,
    InterfaceErrors,
    LldpNeighbors,
}

impl EapiCommand {
    pub const ALL: [EapiCommand; 6] = [
        EapiCommand::InterfacesStatus,
        EapiCommand::BgpSummary,
        EapiCommand::Version,
        EapiCommand::OspfNeighbors,
        EapiCommand::InterfaceErrors,
        EapiCommand::LldpNeighbors,
    ];

    pub fn cli(self) -> &'static str {
        match self {
            EapiCommand::InterfacesStatus => "show interfaces status",
            EapiCommand::BgpSummary => "show ip bgp summary",
            EapiCommand::Version => "show version",
            EapiCommand::OspfNeighbors => "show ip ospf neighbor",
            EapiCommand::InterfaceErrors => "show interfaces counters errors",
            EapiCommand::LldpNeighbors => "show lldp neighbors",
        }
    }

    pub fn category(self) -> &'static str {
        match self {
            EapiCommand::InterfacesStatus => "interfaces",
            EapiCommand::BgpSummary => "bgp",
            EapiCommand::Version => "version",
            EapiCommand::OspfNeighbors => "ospf",
            EapiCommand::InterfaceErrors => "interface_errors",
            EapiCommand::LldpNeighbors => "lldp",
        }
    }
}

/// Command outputs keyed by the command that produced them.
#[derive(Debug, Default)]
pub struct CommandResults {
    outputs: HashMap<EapiCommand, Value>,
}

impl CommandResults {
    /// Pairs each output with the command at the same request position. A
    /// short response leaves the trailing commands without output.
    pub fn correlate(commands: &[EapiCommand], outputs: Vec<Value>) -> Self {
        if outputs.len() != commands.len() {
            tracing::warn!(
                requested = commands.len(),
                received = outputs.len(),
                "eapi: response length does not match command batch"
            );
        }
        Self {
            outputs: commands.iter().copied().zip(outputs).collect(),
        }
    }

    pub fn get(&self, command: EapiCommand) -> Option<&Value> {
        self.outputs.get(&command)
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

#[derive(Debug, Serialize)]
struct RunCmdsRequest<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    params: RunCmdsParams<'a>,
    id: String,
}

#[derive(Debug, Serialize)]
struct RunCmdsParams<'a> {
    version: u32,
    cmds: Vec<&'a str>,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct RunCmdsResponse {
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
    /// Per-command outputs up to and including the failing command.
    #[serde(default)]
    data: Option<Vec<Value>>,
}

/// eAPI session to one Arista device.
pub struct EapiClient<'a> {
    transport: &'a HttpTransport,
    device: &'a Device,
    client: &'a Client,
    url: Url,
}

impl<'a> EapiClient<'a> {
    pub fn new(transport: &'a HttpTransport, device: &'a Device) -> Result<Self, NetmetricsError> {
        let base_url = transport.base_url(device, true)?;
        let url = join_path(&base_url, EAPI_PATH)?;
        Ok(Self {
            transport,
            device,
            client: transport.client_for(device),
            url,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Runs `commands` as one batch. A command error inside the batch still
    /// returns the outputs of the commands that ran; only commands with no
    /// usable output are missing from the result.
    pub async fn run_cmds(&self, commands: &[EapiCommand]) -> Result<CommandResults, NetmetricsError> {
        let body = RunCmdsRequest {
            jsonrpc: "2.0",
            method: "runCmds",
            params: RunCmdsParams {
                version: 1,
                cmds: commands.iter().map(|c| c.cli()).collect(),
                format: "json",
            },
            id: format!("netmetrics-{}", self.device.hostname),
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

        let response: RunCmdsResponse = serde_json::from_str(&text).map_err(|e| {
            NetmetricsError::ProtocolError(format!(
                "{}: failed to parse eAPI response for {}: {e}",
                self.url, self.device.hostname
            ))
        })?;

        match (response.result, response.error) {
            (Some(outputs), _) => Ok(CommandResults::correlate(commands, outputs)),
            (None, Some(error)) => {
                let usable: Vec<Value> = error
                    .data
                    .unwrap_or_default()
                    .into_iter()
                    .take_while(|output| output.get("errors").is_none())
                    .collect();
                if usable.is_empty() {
                    return Err(NetmetricsError::ProtocolError(format!(
                        "{}: eAPI error {} for {}: {}",
                        self.url, error.code, self.device.hostname, error.message
                    )));
                }
                tracing::warn!(
                    hostname = %self.device.hostname,
                    code = error.code,
                    message = %error.message,
                    completed = usable.len(),
                    "eapi: command batch partially failed"
                );
                let completed = &commands[..usable.len().min(commands.len())];
                Ok(CommandResults::correlate(completed, usable))
            }
            (None, None) => Err(NetmetricsError::ProtocolError(format!(
                "{}: eAPI response for {} has neither result nor error",
                self.url, self.device.hostname
            ))),
        }
    }
}
