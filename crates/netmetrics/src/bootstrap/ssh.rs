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

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use russh::client::{self, Handle, KeyboardInteractiveAuthResponse};
use russh::{ChannelMsg, Disconnect};
use russh_keys::key::PublicKey;

use super::CapabilityBootstrap;
use crate::config::SshBootstrapConfig;
use crate::inventory::{Credentials, Device};
use crate::{BoxFuture, NetmetricsError};

const EAPI_ENABLE_COMMANDS: [&str; 8] = [
    "enable",
    "configure terminal",
    "management api http-commands",
    "protocol http",
    "protocol https",
    "no shutdown",
    "end",
    "write memory",
];

const MAX_KEYBOARD_INTERACTIVE_ROUNDS: usize = 4;

/// The EOS CLI script that turns on the HTTP/HTTPS command API.
pub fn eapi_enable_script() -> String {
    EAPI_ENABLE_COMMANDS.join("\n")
}

/// Enables eAPI on Arista devices over SSH.
pub struct SshEapiBootstrap {
    config: SshBootstrapConfig,
    insecure_by_default: bool,
}

impl SshEapiBootstrap {
    pub fn new(config: SshBootstrapConfig, insecure_by_default: bool) -> Self {
        Self {
            config,
            insecure_by_default,
        }
    }

    /// Host keys are not checked when certificate validation is off for the
    /// device, either explicitly or through the global setting.
    fn accept_any_host_key(&self, device: &Device) -> bool {
        match device.http.validate_certs {
            Some(validate) => !validate,
            None => self.insecure_by_default,
        }
    }

    async fn run_session(&self, device: &Device) -> Result<(), NetmetricsError> {
        let policy = HostKeyPolicy {
            host: device.address.clone(),
            port: self.config.port,
            accept_any: self.accept_any_host_key(device),
            known_hosts: self.config.known_hosts_path.clone(),
        };
        let ssh_config = Arc::new(client::Config::default());

        let connect = client::connect(
            ssh_config,
            (device.address.as_str(), self.config.port),
            policy,
        );
        let mut session = tokio::time::timeout(self.config.connect_timeout(), connect)
            .await
            .map_err(|_| {
                NetmetricsError::Timeout(format!(
                    "ssh connect to {}:{} timed out",
                    device.address, self.config.port
                ))
            })?
            .map_err(|e| ssh_error(device, "connect", e))?;

        let result = self.authenticate_and_exec(&mut session, device).await;

        if let Err(e) = session
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
        {
            tracing::debug!(error = ?e, hostname = %device.hostname, "eapi_ssh: disconnect failed");
        }
        result
    }

    async fn authenticate_and_exec(
        &self,
        session: &mut Handle<HostKeyPolicy>,
        device: &Device,
    ) -> Result<(), NetmetricsError> {
        if !authenticate(session, device).await? {
            return Err(NetmetricsError::SshError(format!(
                "ssh authentication rejected for {}@{}",
                device.credentials.username, device.address
            )));
        }

        let mut channel = session
            .channel_open_session()
            .await
            .map_err(|e| ssh_error(device, "open channel", e))?;
        channel
            .exec(true, eapi_enable_script())
            .await
            .map_err(|e| ssh_error(device, "exec", e))?;

        let mut output = Vec::new();
        let mut exit_status = None;
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => output.extend_from_slice(data),
                ChannelMsg::ExtendedData { ref data, .. } => output.extend_from_slice(data),
                ChannelMsg::ExitStatus {
                    exit_status: status,
                } => exit_status = Some(status),
                _ => {}
            }
        }

        let output = String::from_utf8_lossy(&output);
        tracing::debug!(
            hostname = %device.hostname,
            exit_status = ?exit_status,
            %output,
            "eapi_ssh: command output"
        );

        match exit_status {
            Some(0) | None => Ok(()),
            Some(status) => Err(NetmetricsError::SshError(format!(
                "eapi enable script exited with {status} on {}: {}",
                device.hostname,
                output.trim()
            ))),
        }
    }
}

impl CapabilityBootstrap for SshEapiBootstrap {
    fn name(&self) -> &'static str {
        "eapi_ssh"
    }

    fn enable<'a>(&'a self, device: &'a Device) -> BoxFuture<'a, Result<(), NetmetricsError>> {
        Box::pin(async move {
            tokio::time::timeout(self.config.session_timeout(), self.run_session(device))
                .await
                .map_err(|_| {
                    NetmetricsError::Timeout(format!(
                        "ssh session to {} exceeded {:?}",
                        device.hostname,
                        self.config.session_timeout()
                    ))
                })??;
            tracing::info!(hostname = %device.hostname, "eapi_ssh: eAPI enabled");
            Ok(())
        })
    }
}

struct HostKeyPolicy {
    host: String,
    port: u16,
    accept_any: bool,
    known_hosts: Option<PathBuf>,
}

#[async_trait]
impl client::Handler for HostKeyPolicy {
    type Error = russh::Error;

    async fn check_server_key(&mut self, server_public_key: &PublicKey) -> Result<bool, Self::Error> {
        if self.accept_any {
            return Ok(true);
        }
        let known = match &self.known_hosts {
            Some(path) => {
                russh_keys::check_known_hosts_path(&self.host, self.port, server_public_key, path)?
            }
            None => russh_keys::check_known_hosts(&self.host, self.port, server_public_key)?,
        };
        if !known {
            tracing::warn!(host = %self.host, port = self.port, "eapi_ssh: unknown host key");
        }
        Ok(known)
    }
}

/// Password first, then the SSH agent, then keyboard-interactive with the
/// password as every answer.
async fn authenticate(
    session: &mut Handle<HostKeyPolicy>,
    device: &Device,
) -> Result<bool, NetmetricsError> {
    let Credentials { username, password } = &device.credentials;

    match session.authenticate_password(username, password).await {
        Ok(true) => return Ok(true),
        Ok(false) => {}
        Err(e) => tracing::debug!(error = ?e, hostname = %device.hostname, "eapi_ssh: password auth failed"),
    }

    if std::env::var_os("SSH_AUTH_SOCK").is_some() {
        match authenticate_with_agent(session, username).await {
            Ok(true) => return Ok(true),
            Ok(false) => {}
            Err(e) => tracing::debug!(error = ?e, hostname = %device.hostname, "eapi_ssh: agent auth failed"),
        }
    }

    let mut response = session
        .authenticate_keyboard_interactive_start(username, None::<String>)
        .await
        .map_err(|e| ssh_error(device, "keyboard-interactive", e))?;
    for _ in 0..MAX_KEYBOARD_INTERACTIVE_ROUNDS {
        match response {
            KeyboardInteractiveAuthResponse::Success => return Ok(true),
            KeyboardInteractiveAuthResponse::Failure => return Ok(false),
            KeyboardInteractiveAuthResponse::InfoRequest { prompts, .. } => {
                let answers = prompts.iter().map(|_| password.clone()).collect();
                response = session
                    .authenticate_keyboard_interactive_respond(answers)
                    .await
                    .map_err(|e| ssh_error(device, "keyboard-interactive", e))?;
            }
        }
    }
    Ok(false)
}

#[cfg(unix)]
async fn authenticate_with_agent(
    session: &mut Handle<HostKeyPolicy>,
    username: &str,
) -> Result<bool, NetmetricsError> {
    let mut agent = russh_keys::agent::client::AgentClient::connect_env()
        .await
        .map_err(|e| NetmetricsError::SshError(format!("ssh agent unavailable: {e}")))?;
    let identities = agent
        .request_identities()
        .await
        .map_err(|e| NetmetricsError::SshError(format!("ssh agent identities: {e}")))?;

    for key in identities {
        let (returned, result) = session.authenticate_future(username, key, agent).await;
        agent = returned;
        if result.map_err(|e| NetmetricsError::SshError(format!("ssh agent signing: {e}")))? {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(not(unix))]
async fn authenticate_with_agent(
    _session: &mut Handle<HostKeyPolicy>,
    _username: &str,
) -> Result<bool, NetmetricsError> {
    Ok(false)
}

fn ssh_error(device: &Device, stage: &str, error: russh::Error) -> NetmetricsError {
    NetmetricsError::SshError(format!(
        "ssh {stage} failed for {}:{}: {error}",
        device.hostname, device.address
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{Vendor, VendorTag, test_device};

    #[test]
    fn test_enable_script_order() {
        let script = eapi_enable_script();
        let lines: Vec<&str> = script.lines().collect();
        assert_eq!(lines.first(), Some(&"enable"));
        assert_eq!(lines.last(), Some(&"write memory"));
        let http = lines.iter().position(|l| *l == "protocol http");
        let https = lines.iter().position(|l| *l == "protocol https");
        let api = lines.iter().position(|l| *l == "management api http-commands");
        assert!(api < http && http < https);
        assert!(lines.contains(&"no shutdown"));
    }

    #[test]
    fn test_host_key_policy_follows_tls_validation() {
        let mut device = test_device("ceos1", "10.0.0.1", VendorTag::Supported(Vendor::Arista));

        let strict = SshEapiBootstrap::new(SshBootstrapConfig::default(), false);
        assert!(!strict.accept_any_host_key(&device));

        let lab = SshEapiBootstrap::new(SshBootstrapConfig::default(), true);
        assert!(lab.accept_any_host_key(&device));

        device.http.validate_certs = Some(true);
        assert!(!lab.accept_any_host_key(&device));
        device.http.validate_certs = Some(false);
        assert!(strict.accept_any_host_key(&device));
    }

    #[tokio::test]
    async fn test_enable_fails_when_nothing_listens() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);

        let bootstrap = SshEapiBootstrap::new(
            SshBootstrapConfig {
                port,
                connect_timeout_secs: 2,
                session_timeout_secs: 5,
                known_hosts_path: None,
            },
            true,
        );
        let device = test_device("ceos1", "127.0.0.1", VendorTag::Supported(Vendor::Arista));
        let err = bootstrap.enable(&device).await.expect_err("connection refused");
        assert!(matches!(
            err,
            NetmetricsError::SshError(_) | NetmetricsError::Timeout(_)
        ));
    }
}
