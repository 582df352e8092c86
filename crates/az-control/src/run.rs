use std::process::{Output, Stdio};

use serde::de::DeserializeOwned;
use tokio::process::Command;

use crate::error::AzError;

/// Runs an `az` subcommand to completion, capturing both streams.
/// No timeout on purpose: control-plane calls block on the CLI's own
/// transport defaults.
pub(crate) async fn run_az(args: &[&str]) -> Result<Output, AzError> {
    let mut cmd = Command::new("az");
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd.output().await.map_err(AzError::from_spawn)
}

pub(crate) fn require_success(output: &Output, command: &str) -> Result<(), AzError> {
    if output.status.success() {
        return Ok(());
    }
    Err(AzError::Command {
        command: command.to_string(),
        detail: failure_detail(output),
    })
}

pub(crate) fn parse_json<T: DeserializeOwned>(output: &Output, command: &str) -> Result<T, AzError> {
    serde_json::from_slice(&output.stdout).map_err(|err| AzError::Output {
        command: command.to_string(),
        detail: err.to_string(),
    })
}

/// First non-empty stderr line, falling back to stdout, then to the
/// exit status. az prints its error as a single leading line.
pub(crate) fn failure_detail(output: &Output) -> String {
    for stream in [&output.stderr, &output.stdout] {
        let text = String::from_utf8_lossy(stream);
        if let Some(line) = text.lines().find(|line| !line.trim().is_empty()) {
            return line.trim().to_string();
        }
    }
    format!("exited with {}", output.status)
}
