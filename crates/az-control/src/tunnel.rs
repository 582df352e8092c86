use std::process::{Command, Stdio};

use tracing::info;

use crate::error::AzError;

/// Starts one detached `az network bastion tunnel` child forwarding
/// `local_port` to the target's SSH port. The child is not awaited and
/// its pid is not recorded; later invocations find it again by scanning
/// the process table. The tunnel is not necessarily ready when this
/// returns.
pub(crate) fn spawn_tunnel(
    bastion_name: &str,
    resource_group: &str,
    target_resource_id: &str,
    local_port: u16,
) -> Result<(), AzError> {
    let port = local_port.to_string();
    let mut cmd = Command::new("az");
    cmd.arg("network")
        .arg("bastion")
        .arg("tunnel")
        .arg("--name")
        .arg(bastion_name)
        .arg("--resource-group")
        .arg(resource_group)
        .arg("--target-resource-id")
        .arg(target_resource_id)
        .arg("--resource-port")
        .arg("22")
        .arg("--port")
        .arg(&port);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    let child = cmd.spawn().map_err(AzError::from_spawn)?;
    info!(
        event = "tunnel.spawned",
        pid = child.id(),
        bastion = bastion_name,
        resource_group,
        local_port,
        "bastion tunnel started"
    );
    // Dropping the handle leaves the child running past this process.
    Ok(())
}
