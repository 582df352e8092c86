//! Azure CLI plumbing for the bastion tunnel inventory: preflight
//! checks, control-plane lookups, and detached tunnel launches. All
//! remote work is delegated to the `az` binary.

mod error;
mod resolver;
mod run;
mod tunnel;

pub use error::AzError;
pub use resolver::AzCli;

use async_trait::async_trait;

/// The per-host operations the inventory builder needs. `AzCli` is the
/// real implementation; tests substitute a stub.
#[async_trait]
pub trait ControlPlane {
    /// Bastion host name for a resource group, `None` when no
    /// tunneling-enabled bastion exists there.
    async fn resolve_bastion(&self, resource_group: &str) -> Result<Option<String>, AzError>;

    /// Resource id of a VM, `None` when the control plane reports a
    /// not-found class error.
    async fn resolve_vm_id(
        &self,
        resource_group: &str,
        vm_name: &str,
    ) -> Result<Option<String>, AzError>;

    /// Fire-and-forget launch of one tunnel subprocess.
    async fn launch_tunnel(
        &self,
        bastion_name: &str,
        resource_group: &str,
        target_resource_id: &str,
        local_port: u16,
    ) -> Result<(), AzError>;
}

#[async_trait]
impl ControlPlane for AzCli {
    async fn resolve_bastion(&self, resource_group: &str) -> Result<Option<String>, AzError> {
        self.bastion_name(resource_group).await
    }

    async fn resolve_vm_id(
        &self,
        resource_group: &str,
        vm_name: &str,
    ) -> Result<Option<String>, AzError> {
        self.vm_resource_id(resource_group, vm_name).await
    }

    async fn launch_tunnel(
        &self,
        bastion_name: &str,
        resource_group: &str,
        target_resource_id: &str,
        local_port: u16,
    ) -> Result<(), AzError> {
        self.spawn_tunnel(bastion_name, resource_group, target_resource_id, local_port)
    }
}
