//! Finds bastion tunnel subprocesses in the OS process table.
//!
//! Nothing about a tunnel child is persisted between invocations, so
//! ownership is re-derived from command-line shape: a process counts as
//! one of ours when every marker below appears somewhere in its argv.
//! The process table is a best-effort snapshot; entries can vanish
//! between enumeration and use.

use sysinfo::{Pid, Signal, System};
use tracing::debug;

/// Argv markers of an `az network bastion tunnel` child. A marker
/// matches when it is a substring of any single argv token.
pub const TUNNEL_MARKERS: [&str; 5] = [
    "network",
    "bastion",
    "tunnel",
    "--resource-group",
    "--target-resource-id",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelProcess {
    pub pid: u32,
    pub cmdline: Vec<String>,
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminateOutcome {
    Terminated,
    /// Gone from the process table before the signal was sent. Not an
    /// error for the overall kill command.
    Vanished,
    Failed,
}

pub fn is_tunnel_cmdline(cmdline: &[String]) -> bool {
    !cmdline.is_empty()
        && TUNNEL_MARKERS
            .iter()
            .all(|marker| cmdline.iter().any(|arg| arg.contains(marker)))
}

/// One pass over the process table, qualifying matches only, sorted by
/// pid so repeated calls over an unchanged table agree byte for byte.
pub fn snapshot() -> Vec<TunnelProcess> {
    let mut sys = System::new();
    sys.refresh_processes();

    let entries = sys.processes().values().map(|process| TunnelProcess {
        pid: process.pid().as_u32(),
        cmdline: process.cmd().to_vec(),
        status: process.status().to_string(),
    });
    let tunnels = select_tunnels(entries);
    debug!(count = tunnels.len(), "scanned process table for tunnels");
    tunnels
}

/// Keeps the qualifying entries and orders them by pid. The process
/// map iterates in hash order, so the sort is what makes repeated
/// scans over an unchanged table agree.
fn select_tunnels(entries: impl IntoIterator<Item = TunnelProcess>) -> Vec<TunnelProcess> {
    let mut tunnels: Vec<TunnelProcess> = entries
        .into_iter()
        .filter(|entry| is_tunnel_cmdline(&entry.cmdline))
        .collect();
    tunnels.sort_by_key(|tunnel| tunnel.pid);
    tunnels
}

/// Sends SIGTERM to one previously snapshotted pid.
pub fn terminate(pid: u32) -> TerminateOutcome {
    let mut sys = System::new();
    let pid = Pid::from_u32(pid);
    if !sys.refresh_process(pid) {
        return TerminateOutcome::Vanished;
    }
    let Some(process) = sys.process(pid) else {
        return TerminateOutcome::Vanished;
    };
    let delivered = process
        .kill_with(Signal::Term)
        .unwrap_or_else(|| process.kill());
    if delivered {
        TerminateOutcome::Terminated
    } else {
        TerminateOutcome::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn matches_a_real_tunnel_argv() {
        let cmdline = argv(&[
            "/usr/bin/python3",
            "/usr/bin/az",
            "network",
            "bastion",
            "tunnel",
            "--name",
            "bst1",
            "--resource-group",
            "rg1",
            "--target-resource-id",
            "/subscriptions/s/resourceGroups/rg1/providers/Microsoft.Compute/virtualMachines/db1",
            "--resource-port",
            "22",
            "--port",
            "50001",
        ]);
        assert!(is_tunnel_cmdline(&cmdline));
    }

    #[test]
    fn marker_order_does_not_matter() {
        let cmdline = argv(&[
            "az",
            "--target-resource-id",
            "/sub/x",
            "--resource-group",
            "rg1",
            "tunnel",
            "bastion",
            "network",
        ]);
        assert!(is_tunnel_cmdline(&cmdline));
    }

    #[test]
    fn markers_match_inside_tokens() {
        // az on some platforms reports a single wrapper token carrying
        // the full invocation.
        let cmdline = argv(&[
            "az network bastion tunnel --resource-group rg1 --target-resource-id /sub/x",
        ]);
        assert!(is_tunnel_cmdline(&cmdline));
    }

    fn tunnel_entry(pid: u32, port: &str) -> TunnelProcess {
        TunnelProcess {
            pid,
            cmdline: argv(&[
                "az",
                "network",
                "bastion",
                "tunnel",
                "--resource-group",
                "rg1",
                "--target-resource-id",
                "/sub/x",
                "--port",
                port,
            ]),
            status: "Sleep".to_string(),
        }
    }

    #[test]
    fn selection_is_stable_across_enumeration_order() {
        let mut shell = tunnel_entry(40, "50003");
        shell.cmdline = argv(&["bash"]);

        let forward = vec![
            tunnel_entry(30, "50001"),
            shell.clone(),
            tunnel_entry(10, "50002"),
            tunnel_entry(20, "50003"),
        ];
        let mut shuffled = forward.clone();
        shuffled.reverse();

        let first = select_tunnels(forward);
        let second = select_tunnels(shuffled);
        assert_eq!(first, second);
        let pids: Vec<u32> = first.iter().map(|tunnel| tunnel.pid).collect();
        assert_eq!(pids, [10, 20, 30]);
    }

    #[test]
    fn rejects_non_tunnel_processes() {
        assert!(!is_tunnel_cmdline(&argv(&["ssh", "-L", "50001:host:22", "jump"])));
        assert!(!is_tunnel_cmdline(&argv(&[
            "az", "network", "bastion", "list", "--resource-group", "rg1",
        ])));
        assert!(!is_tunnel_cmdline(&argv(&[])));
    }
}
