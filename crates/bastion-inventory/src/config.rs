use anyhow::Context;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

/// Group name -> group, in declaration order. The inventory's host
/// arrays preserve this order, so the maps must too.
pub(crate) type TunnelsConfig = IndexMap<String, GroupSpec>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct GroupSpec {
    pub(crate) hosts: IndexMap<String, HostSpec>,
}

/// One managed host. The map key doubles as the Azure VM name.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct HostSpec {
    pub(crate) resource_group: String,
    pub(crate) ansible_port: u16,
    #[serde(default)]
    pub(crate) ansible_user: Option<String>,
    #[serde(default)]
    pub(crate) ansible_host: Option<String>,
}

pub(crate) fn load_tunnels_config(path: &Path) -> anyhow::Result<TunnelsConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: TunnelsConfig = serde_yaml::from_str(&raw)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    validate_tunnels_config(&config)?;
    Ok(config)
}

fn validate_tunnels_config(config: &TunnelsConfig) -> anyhow::Result<()> {
    if config.is_empty() {
        anyhow::bail!("config declares no host groups");
    }
    for (group, spec) in config {
        if spec.hosts.is_empty() {
            anyhow::bail!("group {group} declares no hosts");
        }
    }
    Ok(())
}
