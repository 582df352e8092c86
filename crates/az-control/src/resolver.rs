use serde::Deserialize;
use tracing::debug;

use crate::error::AzError;
use crate::run::{failure_detail, parse_json, require_success, run_az};
use crate::tunnel::spawn_tunnel;

#[derive(Debug, Deserialize)]
struct Extension {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Subscription {
    id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Bastion {
    pub(crate) name: String,
    #[serde(rename = "enableTunneling", default)]
    pub(crate) enable_tunneling: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct VirtualMachine {
    id: String,
}

/// Handle on the Azure CLI after preflight: the bastion extension is
/// installed, a credential is available, and a subscription is picked.
pub struct AzCli {
    subscription_id: String,
}

impl AzCli {
    /// Verifies the CLI is usable and resolves the subscription id.
    /// Every error here is fatal for the caller.
    pub async fn preflight() -> Result<Self, AzError> {
        ensure_bastion_extension().await?;
        ensure_credential().await?;
        let subscription_id = current_subscription_id().await?;
        debug!(subscription = %subscription_id, "azure cli preflight complete");
        Ok(Self { subscription_id })
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// Name of the bastion host serving `resource_group`, or `None`
    /// when no usable one exists. Keeps the first listed entry but
    /// refuses the whole listing if any entry has tunneling disabled.
    pub async fn bastion_name(&self, resource_group: &str) -> Result<Option<String>, AzError> {
        let output = run_az(&[
            "network",
            "bastion",
            "list",
            "--resource-group",
            resource_group,
            "--subscription",
            &self.subscription_id,
            "--output",
            "json",
        ])
        .await?;
        require_success(&output, "network bastion list")?;
        let bastions: Vec<Bastion> = parse_json(&output, "network bastion list")?;
        Ok(select_bastion(bastions))
    }

    /// Control-plane resource id of one VM. `None` for a not-found
    /// class failure (the caller skips the host); anything else is
    /// fatal.
    pub async fn vm_resource_id(
        &self,
        resource_group: &str,
        vm_name: &str,
    ) -> Result<Option<String>, AzError> {
        let output = run_az(&[
            "vm",
            "show",
            "--resource-group",
            resource_group,
            "--name",
            vm_name,
            "--subscription",
            &self.subscription_id,
            "--output",
            "json",
        ])
        .await?;
        if !output.status.success() {
            let detail = failure_detail(&output);
            if is_not_found(&detail) {
                return Ok(None);
            }
            return Err(AzError::Command {
                command: "vm show".to_string(),
                detail,
            });
        }
        let vm: VirtualMachine = parse_json(&output, "vm show")?;
        Ok(Some(vm.id))
    }

    pub fn spawn_tunnel(
        &self,
        bastion_name: &str,
        resource_group: &str,
        target_resource_id: &str,
        local_port: u16,
    ) -> Result<(), AzError> {
        spawn_tunnel(bastion_name, resource_group, target_resource_id, local_port)
    }
}

async fn ensure_bastion_extension() -> Result<(), AzError> {
    let output = run_az(&["extension", "list", "--output", "json"]).await?;
    require_success(&output, "extension list")?;
    let extensions: Vec<Extension> = parse_json(&output, "extension list")?;
    if extensions.iter().any(|ext| ext.name == "bastion") {
        Ok(())
    } else {
        Err(AzError::ExtensionMissing)
    }
}

async fn ensure_credential() -> Result<(), AzError> {
    let output = run_az(&["account", "get-access-token", "--output", "none"]).await?;
    if output.status.success() {
        Ok(())
    } else {
        debug!(detail = %failure_detail(&output), "access token refused");
        Err(AzError::CredentialUnavailable)
    }
}

/// Subscription id of the last entry in the account listing. Matches
/// the historical behavior: not configurable, multiple subscriptions
/// are not validated against each other.
async fn current_subscription_id() -> Result<String, AzError> {
    let output = run_az(&["account", "list", "--output", "json"]).await?;
    require_success(&output, "account list")?;
    let subscriptions: Vec<Subscription> = parse_json(&output, "account list")?;
    subscriptions
        .into_iter()
        .last()
        .map(|sub| sub.id)
        .ok_or(AzError::NoSubscription)
}

pub(crate) fn select_bastion(bastions: Vec<Bastion>) -> Option<String> {
    let mut first = None;
    for bastion in bastions {
        // Any entry without tunneling support disqualifies the whole
        // resource group, even if another entry would have worked.
        if !bastion.enable_tunneling.unwrap_or(false) {
            return None;
        }
        if first.is_none() {
            first = Some(bastion.name);
        }
    }
    first
}

fn is_not_found(detail: &str) -> bool {
    detail.contains("ResourceNotFound")
        || detail.contains("ResourceGroupNotFound")
        || detail.contains("was not found")
}
