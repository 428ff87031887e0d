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

use std::sync::Arc;

use serde_json::json;

use super::CapabilityBootstrap;
use crate::collectors::HttpTransport;
use crate::collectors::srlinux::{JSONRPC_SERVER, SrLinuxClient};
use crate::inventory::Device;
use crate::{BoxFuture, NetmetricsError};

/// Sets the JSON-RPC management server admin-state to enable. This can only
/// succeed when the endpoint already answers.
pub struct JsonRpcEnableBootstrap {
    transport: Arc<HttpTransport>,
}

impl JsonRpcEnableBootstrap {
    pub fn new(transport: Arc<HttpTransport>) -> Self {
        Self { transport }
    }
}

impl CapabilityBootstrap for JsonRpcEnableBootstrap {
    fn name(&self) -> &'static str {
        "srlinux_jsonrpc"
    }

    fn enable<'a>(&'a self, device: &'a Device) -> BoxFuture<'a, Result<(), NetmetricsError>> {
        Box::pin(async move {
            let client = SrLinuxClient::new(&self.transport, device)?;
            client
                .patch(JSONRPC_SERVER, json!({"admin-state": "enable"}))
                .await?;
            tracing::info!(
                hostname = %device.hostname,
                "srlinux_jsonrpc: management server enabled"
            );
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::HttpConfig;
    use crate::inventory::{Vendor, VendorTag, test_device};

    fn bootstrap() -> JsonRpcEnableBootstrap {
        JsonRpcEnableBootstrap::new(Arc::new(
            HttpTransport::new(&HttpConfig::default(), false).expect("transport"),
        ))
    }

    fn device(port: u16) -> Device {
        let mut device = test_device("leaf1", "127.0.0.1", VendorTag::Supported(Vendor::SrLinux));
        device.http.port = Some(port);
        device
    }

    #[tokio::test]
    async fn test_enable_sends_patch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .and(body_partial_json(json!({
                "jsonrpc": "2.0",
                "method": "patch",
                "params": {"updates": [{
                    "path": "/system/management/interface/json-rpc",
                    "value": {"admin-state": "enable"}
                }]}
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": [{}]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        bootstrap()
            .enable(&device(server.address().port()))
            .await
            .expect("patch accepted");
    }

    #[tokio::test]
    async fn test_enable_fails_on_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = bootstrap()
            .enable(&device(server.address().port()))
            .await
            .expect_err("401 is an error");
        assert!(matches!(err, NetmetricsError::HttpError(_)));
    }
}
