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

use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::NetmetricsError;
use crate::config::HttpConfig;
use crate::inventory::Device;

/// Shared HTTP clients for the device adapters. Certificate validation is on
/// unless the global setting or the device itself turns it off.
pub struct HttpTransport {
    strict: Client,
    insecure: Client,
    insecure_by_default: bool,
    log_payloads: bool,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig, log_payloads: bool) -> Result<Self, NetmetricsError> {
        let strict = Self::build_client(config.request_timeout(), false)?;
        let insecure = Self::build_client(config.request_timeout(), true)?;
        Ok(Self {
            strict,
            insecure,
            insecure_by_default: config.insecure_skip_verify,
            log_payloads,
        })
    }

    fn build_client(request_timeout: Duration, accept_invalid_certs: bool) -> Result<Client, NetmetricsError> {
        let mut builder = Client::builder().timeout(request_timeout);
        if accept_invalid_certs {
            // ! dangerously accept self-signed and mismatched certificates.
            builder = builder.danger_accept_invalid_certs(true);
        }
        builder
            .build()
            .map_err(|e| NetmetricsError::HttpError(format!("failed to create HTTP client: {e}")))
    }

    pub fn skip_verify(&self, device: &Device) -> bool {
        match device.http.validate_certs {
            Some(validate) => !validate,
            None => self.insecure_by_default,
        }
    }

    pub fn client_for(&self, device: &Device) -> &Client {
        if self.skip_verify(device) {
            &self.insecure
        } else {
            &self.strict
        }
    }

    pub fn log_payloads(&self) -> bool {
        self.log_payloads
    }

    /// Base URL for a device, honoring its scheme and port overrides.
    pub fn base_url(&self, device: &Device, default_tls: bool) -> Result<Url, NetmetricsError> {
        let scheme = if device.http.use_ssl.unwrap_or(default_tls) {
            "https"
        } else {
            "http"
        };
        let host = if device.address.contains(':') && !device.address.starts_with('[') {
            format!("[{}]", device.address)
        } else {
            device.address.clone()
        };
        let raw = match device.http.port {
            Some(port) => format!("{scheme}://{host}:{port}"),
            None => format!("{scheme}://{host}"),
        };
        Url::parse(&raw)
            .map_err(|e| NetmetricsError::HttpError(format!("{raw}: invalid base URL: {e}")))
    }

    pub fn log_payload(&self, device: &Device, url: &Url, body: &str) {
        if self.log_payloads {
            tracing::debug!(
                hostname = %device.hostname,
                url = %url,
                body,
                "Raw device response"
            );
        }
    }
}

pub fn join_path(base_url: &Url, path: &str) -> Result<Url, NetmetricsError> {
    base_url
        .join(path)
        .map_err(|e| NetmetricsError::HttpError(format!("{base_url}: failed to join path {path}: {e}")))
}

/// Sends a prepared request and returns the body text of a 2xx response.
pub async fn send_for_text(
    transport: &HttpTransport,
    device: &Device,
    url: &Url,
    request: reqwest::RequestBuilder,
) -> Result<String, NetmetricsError> {
    let response = request.send().await.map_err(|e| {
        NetmetricsError::HttpError(format!(
            "{url}: request failed for {}: {e}",
            device.hostname
        ))
    })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| {
        NetmetricsError::HttpError(format!(
            "{url}: failed to read response for {}: {e}",
            device.hostname
        ))
    })?;
    transport.log_payload(device, url, &body);

    if !status.is_success() {
        return Err(NetmetricsError::HttpError(format!(
            "{url}: HTTP {status} for {}: {body}",
            device.hostname
        )));
    }
    Ok(body)
}
