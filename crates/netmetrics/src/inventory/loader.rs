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

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use super::model::{Credentials, Device, HttpOptions, VendorTag};
use crate::NetmetricsError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InventoryFormat {
    /// Grouped when the document has a top-level `all` key, flat otherwise.
    #[default]
    Auto,
    Flat,
    Grouped,
}

pub fn load_inventory(path: &Path, format: InventoryFormat) -> Result<Vec<Device>, NetmetricsError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        NetmetricsError::InventoryError(format!("{}: failed to read inventory: {e}", path.display()))
    })?;
    parse_inventory(&text, format).map_err(|e| match e {
        NetmetricsError::InventoryError(msg) => {
            NetmetricsError::InventoryError(format!("{}: {msg}", path.display()))
        }
        other => other,
    })
}

pub fn parse_inventory(text: &str, format: InventoryFormat) -> Result<Vec<Device>, NetmetricsError> {
    let document: Value = serde_yaml::from_str(text)
        .map_err(|e| NetmetricsError::InventoryError(format!("invalid YAML: {e}")))?;

    let format = match format {
        InventoryFormat::Auto if document.get("all").is_some() => InventoryFormat::Grouped,
        InventoryFormat::Auto => InventoryFormat::Flat,
        explicit => explicit,
    };

    let devices = match format {
        InventoryFormat::Grouped => parse_grouped(document)?,
        InventoryFormat::Flat | InventoryFormat::Auto => parse_flat(document)?,
    };

    Ok(dedupe_hostnames(devices))
}

fn dedupe_hostnames(devices: Vec<Device>) -> Vec<Device> {
    let mut seen = HashSet::new();
    devices
        .into_iter()
        .filter(|device| {
            let first = seen.insert(device.hostname.clone());
            if !first {
                tracing::warn!(
                    hostname = %device.hostname,
                    "Duplicate hostname in inventory, keeping the first entry"
                );
            }
            first
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Flat format: `devices: [...]`
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FlatInventory {
    #[serde(default)]
    devices: Vec<FlatDevice>,
}

#[derive(Debug, Deserialize)]
struct FlatDevice {
    hostname: String,
    #[serde(alias = "address")]
    ip: String,
    #[serde(default)]
    username: String,
    #[serde(default, alias = "secret")]
    password: String,
    vendor: String,
    #[serde(default)]
    protocol: Option<String>,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    use_ssl: Option<bool>,
    #[serde(default)]
    validate_certs: Option<bool>,
}

fn parse_flat(document: Value) -> Result<Vec<Device>, NetmetricsError> {
    let inventory: FlatInventory = serde_yaml::from_value(document)
        .map_err(|e| NetmetricsError::InventoryError(format!("invalid flat inventory: {e}")))?;

    Ok(inventory
        .devices
        .into_iter()
        .map(|raw| {
            let vendor = VendorTag::from_network_os(&raw.vendor);
            if let Some(protocol) = &raw.protocol
                && protocol != vendor.protocol().as_str()
            {
                tracing::debug!(
                    hostname = %raw.hostname,
                    configured = %protocol,
                    derived = vendor.protocol().as_str(),
                    "Ignoring configured protocol, it is derived from the vendor"
                );
            }
            Device {
                hostname: raw.hostname,
                address: raw.ip,
                credentials: Credentials {
                    username: raw.username,
                    password: raw.password,
                },
                vendor,
                http: HttpOptions {
                    port: raw.port,
                    use_ssl: raw.use_ssl,
                    validate_certs: raw.validate_certs,
                },
            }
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Grouped (Ansible) format: `all: {vars, hosts, children}`
// ---------------------------------------------------------------------------

fn parse_grouped(document: Value) -> Result<Vec<Device>, NetmetricsError> {
    let Some(all) = document.get("all") else {
        return Err(NetmetricsError::InventoryError(
            "grouped inventory has no top-level `all` key".to_string(),
        ));
    };

    let mut devices = Vec::new();
    collect_group("all", all, &Mapping::new(), &mut devices)?;
    Ok(devices)
}

/// Walks one group: its own hosts first, then its children. `inherited` holds
/// the vars of every enclosing group, closer groups already layered on top.
fn collect_group(
    name: &str,
    group: &Value,
    inherited: &Mapping,
    devices: &mut Vec<Device>,
) -> Result<(), NetmetricsError> {
    if group.is_null() {
        return Ok(());
    }
    let group = group.as_mapping().ok_or_else(|| {
        NetmetricsError::InventoryError(format!("group {name}: expected a mapping"))
    })?;

    let vars = optional_mapping(group.get("vars"), name, "vars")?;
    let group_vars = merge_vars(inherited, vars);

    if let Some(hosts) = optional_mapping(group.get("hosts"), name, "hosts")? {
        for (host, host_vars) in hosts {
            let hostname = scalar_to_string(host).ok_or_else(|| {
                NetmetricsError::InventoryError(format!("group {name}: host name must be a scalar"))
            })?;
            let host_vars = optional_mapping(Some(host_vars), &hostname, "host vars")?;
            let merged = merge_vars(&group_vars, host_vars);
            devices.push(device_from_vars(hostname, &merged));
        }
    }

    if let Some(children) = optional_mapping(group.get("children"), name, "children")? {
        for (child_name, child) in children {
            let child_name = scalar_to_string(child_name).unwrap_or_default();
            collect_group(&child_name, child, &group_vars, devices)?;
        }
    }

    Ok(())
}

fn optional_mapping<'a>(
    value: Option<&'a Value>,
    owner: &str,
    field: &str,
) -> Result<Option<&'a Mapping>, NetmetricsError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Mapping(mapping)) => Ok(Some(mapping)),
        Some(_) => Err(NetmetricsError::InventoryError(format!(
            "{owner}: `{field}` must be a mapping"
        ))),
    }
}

fn merge_vars(base: &Mapping, overlay: Option<&Mapping>) -> Mapping {
    let mut merged = base.clone();
    if let Some(overlay) = overlay {
        for (key, value) in overlay {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

fn device_from_vars(hostname: String, vars: &Mapping) -> Device {
    let var = |key: &str| vars.get(key).and_then(scalar_to_string);

    let network_os = var("ansible_network_os").unwrap_or_default();
    let port = var("ansible_httpapi_port")
        .or_else(|| var("ansible_port"))
        .and_then(|p| p.parse().ok());

    Device {
        address: var("ansible_host").unwrap_or_else(|| hostname.clone()),
        credentials: Credentials {
            username: var("ansible_user").unwrap_or_default(),
            password: var("ansible_password").unwrap_or_default(),
        },
        vendor: VendorTag::from_network_os(&network_os),
        http: HttpOptions {
            port,
            use_ssl: vars.get("ansible_httpapi_use_ssl").and_then(yaml_bool),
            validate_certs: vars.get("ansible_httpapi_validate_certs").and_then(yaml_bool),
        },
        hostname,
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn yaml_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "yes" | "true" | "on" | "1" => Some(true),
            "no" | "false" | "off" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::inventory::Vendor;

    const GROUPED: &str = r#"
all:
  vars:
    ansible_user: global-user
    ansible_password: global-pass
  hosts:
    standalone:
      ansible_host: 10.0.0.9
      ansible_network_os: eos
  children:
    spines:
      vars:
        ansible_user: group-user
        ansible_network_os: eos
      hosts:
        spine1:
          ansible_host: 10.0.0.1
          ansible_user: host-user
        spine2:
          ansible_host: 10.0.0.2
          ansible_password: spine2-pass
    leaves:
      vars:
        ansible_network_os: nokia.srlinux.srlinux
        ansible_httpapi_use_ssl: "yes"
        ansible_httpapi_port: 8443
      hosts:
        leaf1:
    edge:
      children:
        juniper:
          vars:
            ansible_network_os: junos
          hosts:
            mx1:
              ansible_host: 10.0.0.30
"#;

    fn find<'a>(devices: &'a [Device], hostname: &str) -> &'a Device {
        devices
            .iter()
            .find(|d| d.hostname == hostname)
            .expect("device present")
    }

    #[test]
    fn test_grouped_precedence_host_over_group_over_global() {
        let devices = parse_inventory(GROUPED, InventoryFormat::Auto).expect("parse");

        assert_eq!(find(&devices, "spine1").credentials.username, "host-user");
        assert_eq!(find(&devices, "spine2").credentials.username, "group-user");
        assert_eq!(find(&devices, "standalone").credentials.username, "global-user");
        assert_eq!(find(&devices, "spine1").credentials.password, "global-pass");
    }

    #[test]
    fn test_host_overrides_only_the_secret() {
        let devices = parse_inventory(GROUPED, InventoryFormat::Grouped).expect("parse");
        let spine2 = find(&devices, "spine2");

        assert_eq!(spine2.credentials.username, "group-user");
        assert_eq!(spine2.credentials.password, "spine2-pass");
        assert_eq!(spine2.address, "10.0.0.2");
        assert_eq!(spine2.vendor, VendorTag::Supported(Vendor::Arista));
    }

    #[test]
    fn test_grouped_keeps_document_order() {
        let devices = parse_inventory(GROUPED, InventoryFormat::Grouped).expect("parse");
        let names: Vec<_> = devices.iter().map(|d| d.hostname.as_str()).collect();
        assert_eq!(names, ["standalone", "spine1", "spine2", "leaf1", "mx1"]);
    }

    #[test]
    fn test_grouped_null_host_and_address_fallback() {
        let devices = parse_inventory(GROUPED, InventoryFormat::Grouped).expect("parse");
        let leaf = find(&devices, "leaf1");

        assert_eq!(leaf.address, "leaf1");
        assert_eq!(leaf.vendor, VendorTag::Supported(Vendor::SrLinux));
        assert_eq!(leaf.http.use_ssl, Some(true));
        assert_eq!(leaf.http.port, Some(8443));
        assert_eq!(leaf.http.validate_certs, None);
    }

    #[test]
    fn test_grouped_nested_children_and_unsupported_vendor() {
        let devices = parse_inventory(GROUPED, InventoryFormat::Grouped).expect("parse");
        let mx = find(&devices, "mx1");

        assert_eq!(mx.vendor, VendorTag::Unsupported("juniper".to_string()));
        assert_eq!(mx.credentials.username, "global-user");
    }

    #[test]
    fn test_flat_inventory_with_aliases() {
        let text = r#"
devices:
  - hostname: ceos1
    ip: 172.20.20.2
    username: admin
    password: admin
    vendor: arista
    protocol: eapi
  - hostname: csr1
    address: 172.20.20.3
    username: admin
    secret: cisco
    vendor: ios
    validate_certs: false
"#;
        let devices = parse_inventory(text, InventoryFormat::Auto).expect("parse");

        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].vendor, VendorTag::Supported(Vendor::Arista));
        assert_eq!(devices[1].address, "172.20.20.3");
        assert_eq!(devices[1].credentials.password, "cisco");
        assert_eq!(devices[1].vendor, VendorTag::Supported(Vendor::Cisco));
        assert_eq!(devices[1].http.validate_certs, Some(false));
    }

    #[test]
    fn test_duplicate_hostnames_keep_first() {
        let text = r#"
devices:
  - {hostname: a, ip: 10.0.0.1, vendor: eos}
  - {hostname: a, ip: 10.0.0.2, vendor: eos}
"#;
        let devices = parse_inventory(text, InventoryFormat::Flat).expect("parse");
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].address, "10.0.0.1");
    }

    #[test]
    fn test_invalid_documents_are_inventory_errors() {
        let err = parse_inventory("devices: [", InventoryFormat::Auto).expect_err("bad yaml");
        assert!(matches!(err, NetmetricsError::InventoryError(_)));

        let err = parse_inventory("foo: 1", InventoryFormat::Grouped).expect_err("no all key");
        assert!(matches!(err, NetmetricsError::InventoryError(_)));

        let err =
            parse_inventory("all:\n  hosts: [a, b]\n", InventoryFormat::Grouped).expect_err("list");
        assert!(matches!(err, NetmetricsError::InventoryError(_)));
    }

    #[test]
    fn test_load_inventory_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(GROUPED.as_bytes()).expect("write");

        let devices = load_inventory(file.path(), InventoryFormat::Auto).expect("load");
        assert_eq!(devices.len(), 5);

        let missing = load_inventory(Path::new("/nonexistent/inventory.yaml"), InventoryFormat::Auto);
        assert!(matches!(missing, Err(NetmetricsError::InventoryError(_))));
    }
}
