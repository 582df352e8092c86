use thiserror::Error;

/// Failures talking to the Azure CLI, split into the classes the
/// inventory command reports distinctly.
#[derive(Debug, Error)]
pub enum AzError {
    #[error("the Azure CLI (az) was not found on PATH")]
    CliNotFound,
    #[error("the Azure CLI bastion extension is not installed, run `az extension add --name bastion`")]
    ExtensionMissing,
    #[error("Azure credentials are unavailable, run `az login` first")]
    CredentialUnavailable,
    #[error("the Azure CLI has no subscription to work with")]
    NoSubscription,
    #[error("no tunneling-enabled bastion host found in resource group {0}")]
    BastionNotFound(String),
    #[error("az {command} failed: {detail}")]
    Command { command: String, detail: String },
    #[error("unexpected output from az {command}: {detail}")]
    Output { command: String, detail: String },
    #[error("failed to run az: {0}")]
    Spawn(std::io::Error),
}

impl AzError {
    pub(crate) fn from_spawn(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            AzError::CliNotFound
        } else {
            AzError::Spawn(err)
        }
    }
}
