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

//! One-time enablement of a device's management API before it is polled.

mod jsonrpc;
mod ssh;

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashSet;

pub use jsonrpc::JsonRpcEnableBootstrap;
pub use ssh::{SshEapiBootstrap, eapi_enable_script};

use crate::collectors::HttpTransport;
use crate::config::{BootstrapConfig, HttpConfig};
use crate::inventory::{Device, Vendor};
use crate::{BoxFuture, NetmetricsError};

pub trait CapabilityBootstrap: Send + Sync {
    fn name(&self) -> &'static str;

    fn enable<'a>(&'a self, device: &'a Device) -> BoxFuture<'a, Result<(), NetmetricsError>>;
}

/// Bootstrappers per vendor. Cisco devices have none.
#[derive(Clone, Default)]
pub struct BootstrapSet {
    pub arista: Option<Arc<dyn CapabilityBootstrap>>,
    pub srlinux: Option<Arc<dyn CapabilityBootstrap>>,
}

impl BootstrapSet {
    pub fn from_config(
        config: &BootstrapConfig,
        http: &HttpConfig,
        transport: Arc<HttpTransport>,
    ) -> Self {
        let arista = config.eapi_ssh.as_option().map(|ssh| {
            Arc::new(SshEapiBootstrap::new(ssh.clone(), http.insecure_skip_verify))
                as Arc<dyn CapabilityBootstrap>
        });
        let srlinux = config.srlinux_jsonrpc.as_option().map(|_| {
            Arc::new(JsonRpcEnableBootstrap::new(transport)) as Arc<dyn CapabilityBootstrap>
        });
        Self { arista, srlinux }
    }

    pub fn bootstrap_for(&self, vendor: Vendor) -> Option<&Arc<dyn CapabilityBootstrap>> {
        match vendor {
            Vendor::Arista => self.arista.as_ref(),
            Vendor::Cisco => None,
            Vendor::SrLinux => self.srlinux.as_ref(),
        }
    }
}

/// Hostnames that no longer need bootstrapping: one bootstrap or one poll
/// has succeeded for them.
#[derive(Default)]
pub struct BootstrapTracker {
    ready: DashSet<String>,
}

impl BootstrapTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn needs_bootstrap(&self, hostname: &str) -> bool {
        !self.ready.contains(hostname)
    }

    pub fn mark_ready(&self, hostname: &str) {
        if !self.ready.contains(hostname) {
            self.ready.insert(hostname.to_string());
        }
    }

    pub fn retain_devices(&self, hostnames: &HashSet<&str>) {
        self.ready
            .retain(|hostname| hostnames.contains(hostname.as_str()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Configurable, JsonRpcBootstrapConfig, SshBootstrapConfig};

    fn transport() -> Arc<HttpTransport> {
        Arc::new(HttpTransport::new(&HttpConfig::default(), false).expect("transport"))
    }

    #[test]
    fn test_bootstrap_set_follows_config() {
        let config = BootstrapConfig {
            eapi_ssh: Configurable::Disabled,
            srlinux_jsonrpc: Configurable::Enabled(JsonRpcBootstrapConfig {}),
        };
        let set = BootstrapSet::from_config(&config, &HttpConfig::default(), transport());

        assert!(set.bootstrap_for(Vendor::Arista).is_none());
        assert!(set.bootstrap_for(Vendor::Cisco).is_none());
        assert_eq!(
            set.bootstrap_for(Vendor::SrLinux).map(|b| b.name()),
            Some("srlinux_jsonrpc")
        );

        let config = BootstrapConfig {
            eapi_ssh: Configurable::Enabled(SshBootstrapConfig::default()),
            srlinux_jsonrpc: Configurable::Disabled,
        };
        let set = BootstrapSet::from_config(&config, &HttpConfig::default(), transport());
        assert_eq!(
            set.bootstrap_for(Vendor::Arista).map(|b| b.name()),
            Some("eapi_ssh")
        );
        assert!(set.bootstrap_for(Vendor::SrLinux).is_none());
    }

    #[test]
    fn test_tracker_marks_hosts_ready() {
        let tracker = BootstrapTracker::new();
        assert!(tracker.needs_bootstrap("ceos1"));

        tracker.mark_ready("ceos1");
        tracker.mark_ready("ceos1");
        assert!(!tracker.needs_bootstrap("ceos1"));
        assert!(tracker.needs_bootstrap("leaf1"));
    }

    #[test]
    fn test_tracker_forgets_removed_devices() {
        let tracker = BootstrapTracker::new();
        tracker.mark_ready("ceos1");
        tracker.mark_ready("ceos2");

        tracker.retain_devices(&HashSet::from(["ceos2"]));

        assert!(tracker.needs_bootstrap("ceos1"));
        assert!(!tracker.needs_bootstrap("ceos2"));
        assert_eq!(tracker.ready.len(), 1);
    }
}
