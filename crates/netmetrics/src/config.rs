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

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::{Deserialize, Deserializer};

use crate::NetmetricsError;
use crate::inventory::InventoryFormat;

pub const ENV_PREFIX: &str = "NETMETRICS_";

/// Optional feature block. In TOML it is written as a table with an
/// `enabled` key next to the feature's own settings.
#[derive(Clone, Debug, PartialEq)]
pub enum Configurable<T> {
    Enabled(T),
    Disabled,
}

impl<T> Configurable<T> {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Configurable::Enabled(_))
    }

    pub fn as_option(&self) -> Option<&T> {
        match self {
            Configurable::Enabled(cfg) => Some(cfg),
            Configurable::Disabled => None,
        }
    }
}

impl<'de, T> Deserialize<'de> for Configurable<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Toggle<T> {
            #[serde(default = "default_true")]
            enabled: bool,
            #[serde(flatten)]
            config: T,
        }

        let toggle = Toggle::<T>::deserialize(deserializer)?;
        Ok(if toggle.enabled {
            Configurable::Enabled(toggle.config)
        } else {
            Configurable::Disabled
        })
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub inventory: InventoryConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    /// Debug logging plus raw protocol payloads in the log.
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct InventoryConfig {
    #[serde(default = "default_inventory_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub format: InventoryFormat,
    /// Re-read the inventory file at the start of every sweep.
    #[serde(default)]
    pub reload_each_sweep: bool,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            path: default_inventory_path(),
            format: InventoryFormat::default(),
            reload_each_sweep: false,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SchedulerConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_max_concurrent_polls")]
    pub max_concurrent_polls: usize,
    #[serde(default = "default_device_timeout_secs")]
    pub device_timeout_secs: u64,
    #[serde(default)]
    pub backoff: BackoffConfig,
}

impl SchedulerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn device_timeout(&self) -> Duration {
        Duration::from_secs(self.device_timeout_secs)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            max_concurrent_polls: default_max_concurrent_polls(),
            device_timeout_secs: default_device_timeout_secs(),
            backoff: BackoffConfig::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct BackoffConfig {
    #[serde(default = "default_backoff_initial_secs")]
    pub initial_secs: u64,
    #[serde(default = "default_backoff_max_secs")]
    pub max_secs: u64,
    /// Consecutive failures before the circuit opens.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_reprobe_interval_secs")]
    pub reprobe_interval_secs: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_secs: default_backoff_initial_secs(),
            max_secs: default_backoff_max_secs(),
            failure_threshold: default_failure_threshold(),
            reprobe_interval_secs: default_reprobe_interval_secs(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct HttpConfig {
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Skip TLS certificate and SSH host key validation for every device
    /// unless a device overrides it.
    #[serde(default)]
    pub insecure_skip_verify: bool,
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            insecure_skip_verify: false,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct BootstrapConfig {
    #[serde(default = "default_ssh_bootstrap")]
    pub eapi_ssh: Configurable<SshBootstrapConfig>,
    #[serde(default = "default_jsonrpc_bootstrap")]
    pub srlinux_jsonrpc: Configurable<JsonRpcBootstrapConfig>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            eapi_ssh: default_ssh_bootstrap(),
            srlinux_jsonrpc: default_jsonrpc_bootstrap(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SshBootstrapConfig {
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    #[serde(default = "default_ssh_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Bound for the whole session: connect, auth, and command run.
    #[serde(default = "default_ssh_session_timeout_secs")]
    pub session_timeout_secs: u64,
    #[serde(default)]
    pub known_hosts_path: Option<PathBuf>,
}

impl SshBootstrapConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }
}

impl Default for SshBootstrapConfig {
    fn default() -> Self {
        Self {
            port: default_ssh_port(),
            connect_timeout_secs: default_ssh_connect_timeout_secs(),
            session_timeout_secs: default_ssh_session_timeout_secs(),
            known_hosts_path: None,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct JsonRpcBootstrapConfig {}

fn default_true() -> bool {
    true
}

fn default_inventory_path() -> PathBuf {
    PathBuf::from("configs/inventory.yaml")
}

fn default_listen_address() -> String {
    "0.0.0.0:9200".to_string()
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_max_concurrent_polls() -> usize {
    8
}

fn default_device_timeout_secs() -> u64 {
    60
}

fn default_backoff_initial_secs() -> u64 {
    30
}

fn default_backoff_max_secs() -> u64 {
    600
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_reprobe_interval_secs() -> u64 {
    300
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_ssh_port() -> u16 {
    22
}

fn default_ssh_connect_timeout_secs() -> u64 {
    5
}

fn default_ssh_session_timeout_secs() -> u64 {
    30
}

fn default_ssh_bootstrap() -> Configurable<SshBootstrapConfig> {
    Configurable::Enabled(SshBootstrapConfig::default())
}

fn default_jsonrpc_bootstrap() -> Configurable<JsonRpcBootstrapConfig> {
    Configurable::Enabled(JsonRpcBootstrapConfig::default())
}

impl Config {
    /// Layers the optional TOML file and `NETMETRICS_*` environment variables
    /// (`__` separates nested keys) over the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, NetmetricsError> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            if !path.exists() {
                return Err(NetmetricsError::ConfigError(format!(
                    "{}: config file not found",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Self = figment
            .extract()
            .map_err(|e| NetmetricsError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), NetmetricsError> {
        if self.scheduler.poll_interval_secs == 0 {
            return Err(NetmetricsError::ConfigError(
                "scheduler.poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.scheduler.max_concurrent_polls == 0 {
            return Err(NetmetricsError::ConfigError(
                "scheduler.max_concurrent_polls must be greater than zero".to_string(),
            ));
        }
        if self.scheduler.device_timeout_secs == 0 {
            return Err(NetmetricsError::ConfigError(
                "scheduler.device_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.scheduler.backoff.failure_threshold == 0 {
            return Err(NetmetricsError::ConfigError(
                "scheduler.backoff.failure_threshold must be greater than zero".to_string(),
            ));
        }
        if self.scheduler.backoff.initial_secs > self.scheduler.backoff.max_secs {
            return Err(NetmetricsError::ConfigError(
                "scheduler.backoff.initial_secs must not exceed max_secs".to_string(),
            ));
        }
        if self.http.request_timeout_secs == 0 {
            return Err(NetmetricsError::ConfigError(
                "http.request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if let Some(ssh) = self.bootstrap.eapi_ssh.as_option() {
            if ssh.connect_timeout_secs == 0 {
                return Err(NetmetricsError::ConfigError(
                    "bootstrap.eapi_ssh.connect_timeout_secs must be greater than zero"
                        .to_string(),
                ));
            }
            if ssh.session_timeout_secs == 0 {
                return Err(NetmetricsError::ConfigError(
                    "bootstrap.eapi_ssh.session_timeout_secs must be greater than zero"
                        .to_string(),
                ));
            }
        }
        Ok(())
    }
}
