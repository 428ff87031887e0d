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

pub mod bootstrap;
pub mod clock;
pub mod collectors;
pub mod config;
pub mod inventory;
pub mod metrics;
pub mod scheduler;
pub mod server;
pub mod sink;

use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(thiserror::Error, Debug)]
pub enum NetmetricsError {
    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("SSH error: {0}")]
    SshError(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Inventory error: {0}")]
    InventoryError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Prometheus error: {0}")]
    PrometheusError(#[from] prometheus::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    GenericError(String),
}

impl NetmetricsError {
    /// Stable label used for logging and the collection outcome metric.
    pub fn kind(&self) -> &'static str {
        match self {
            NetmetricsError::HttpError(_) => "transport",
            NetmetricsError::ProtocolError(_) => "protocol",
            NetmetricsError::SshError(_) => "bootstrap",
            NetmetricsError::Timeout(_) => "timeout",
            NetmetricsError::InventoryError(_) => "inventory",
            NetmetricsError::ConfigError(_) => "config",
            NetmetricsError::PrometheusError(_) => "metrics",
            NetmetricsError::IoError(_) => "io",
            NetmetricsError::GenericError(_) => "generic",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::NetmetricsError;

    #[test]
    fn test_error_kind_is_stable() {
        assert_eq!(
            NetmetricsError::HttpError("x".to_string()).kind(),
            "transport"
        );
        assert_eq!(
            NetmetricsError::ProtocolError("x".to_string()).kind(),
            "protocol"
        );
        assert_eq!(NetmetricsError::Timeout("x".to_string()).kind(), "timeout");
    }

    #[test]
    fn test_error_display_carries_context() {
        let err = NetmetricsError::HttpError("https://10.0.0.1/command-api: HTTP 401".to_string());
        assert_eq!(
            err.to_string(),
            "HTTP error: https://10.0.0.1/command-api: HTTP 401"
        );
    }
}
