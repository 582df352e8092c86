use anyhow::Context;
use az_control::{AzError, ControlPlane};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::config::TunnelsConfig;

const LOOPBACK: &str = "127.0.0.1";

/// Variables attached to one inventory host. Field names are the
/// Ansible connection variables; `ansible_user` is only emitted when
/// configured.
#[derive(Debug, Serialize)]
struct HostVars {
    ansible_host: String,
    ansible_port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    ansible_user: Option<String>,
}

/// The dynamic inventory document: one array of host names per group
/// plus `_meta.hostvars`. Rendering goes through `serde_json::Map`
/// (BTreeMap backed), so keys always serialize sorted and equal
/// logical content yields identical bytes.
#[derive(Debug, Default)]
pub(crate) struct InventoryDocument {
    groups: Map<String, Value>,
    hostvars: Map<String, Value>,
}

impl InventoryDocument {
    fn add_host(&mut self, group: &str, host: &str, vars: HostVars) -> anyhow::Result<()> {
        let entry = self
            .groups
            .entry(group.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(names) = entry {
            names.push(Value::String(host.to_string()));
        }
        let vars = serde_json::to_value(&vars)
            .with_context(|| format!("failed to serialize hostvars for {host}"))?;
        self.hostvars.insert(host.to_string(), vars);
        Ok(())
    }

    pub(crate) fn render(&self, pretty: bool) -> anyhow::Result<String> {
        let mut meta = Map::new();
        meta.insert("hostvars".to_string(), Value::Object(self.hostvars.clone()));
        let mut root = self.groups.clone();
        root.insert("_meta".to_string(), Value::Object(meta));
        let root = Value::Object(root);
        let rendered = if pretty {
            serde_json::to_string_pretty(&root)
        } else {
            serde_json::to_string(&root)
        };
        rendered.context("failed to serialize inventory")
    }
}

/// Resolves and tunnels every configured host, in declaration order.
/// A resource group without a tunneling-enabled bastion aborts the
/// whole build; a host whose VM cannot be found is skipped.
pub(crate) async fn build<C: ControlPlane>(
    control: &C,
    config: &TunnelsConfig,
) -> anyhow::Result<InventoryDocument> {
    let mut doc = InventoryDocument::default();
    for (group_name, group) in config {
        for (host_name, host) in &group.hosts {
            let bastion = control
                .resolve_bastion(&host.resource_group)
                .await?
                .ok_or_else(|| AzError::BastionNotFound(host.resource_group.clone()))?;
            let Some(resource_id) = control
                .resolve_vm_id(&host.resource_group, host_name)
                .await?
            else {
                warn!(
                    host = %host_name,
                    resource_group = %host.resource_group,
                    "vm not found, host left out of the inventory"
                );
                continue;
            };
            control
                .launch_tunnel(&bastion, &host.resource_group, &resource_id, host.ansible_port)
                .await?;
            info!(
                host = %host_name,
                group = %group_name,
                bastion = %bastion,
                port = host.ansible_port,
                "host added to inventory"
            );
            doc.add_host(
                group_name,
                host_name,
                HostVars {
                    ansible_host: host
                        .ansible_host
                        .clone()
                        .unwrap_or_else(|| LOOPBACK.to_string()),
                    ansible_port: host.ansible_port,
                    ansible_user: host.ansible_user.clone(),
                },
            )?;
        }
    }
    Ok(doc)
}
