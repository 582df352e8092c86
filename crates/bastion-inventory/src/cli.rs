use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "bastion-inventory",
    version,
    about = "Ansible dynamic inventory over Azure Bastion tunnels"
)]
pub(crate) struct Args {
    /// YAML host declaration to build the inventory from
    #[arg(short = 'c', long, default_value = "ansible_bastion_tunnels.yml")]
    pub(crate) config_file: PathBuf,
    /// Pretty-print the inventory JSON (the flag Ansible passes to
    /// dynamic inventory scripts)
    #[arg(short = 'l', long)]
    pub(crate) list: bool,
    /// List active tunnel processes instead of building the inventory
    #[arg(short = 't', long)]
    pub(crate) list_tunnels: bool,
    /// Terminate active tunnel processes instead of building the inventory
    #[arg(short = 'k', long, conflicts_with = "list_tunnels")]
    pub(crate) kill_tunnels: bool,
}
