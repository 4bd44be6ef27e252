use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::docker::DEFAULT_PROXY_URL;

/// Toggle Docker client and daemon proxy settings for Clash.
#[derive(Parser, Debug)]
#[command(name = "clash-docker", version, about, long_about = None)]
pub struct DockerConfig {
    /// Docker client config directory
    #[arg(long, global = true, env = "DOCKER_CONFIG")]
    pub docker_config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        hide = true,
        default_value = "/etc/systemd/system/docker.service.d"
    )]
    pub systemd_dir: PathBuf,

    #[command(subcommand)]
    pub command: DockerCommands,
}

#[derive(Subcommand, Debug)]
pub enum DockerCommands {
    /// Enable Docker proxy
    Enable(EnableCommandArgs),
    /// Disable Docker proxy
    Disable,
    /// Check Docker proxy status
    Status,
    /// Reset all Docker proxy configurations
    Reset,
}

#[derive(Args, Debug)]
pub struct EnableCommandArgs {
    /// Proxy URL used for both HTTP and HTTPS
    #[arg(short, long, default_value = DEFAULT_PROXY_URL)]
    pub proxy: String,
}

/// Print shell exports for the proxy ports in config.yaml.
///
/// Usage: eval "$(clash-proxy)"
#[derive(Parser, Debug)]
#[command(name = "clash-proxy", version, about, long_about = None)]
pub struct ExportConfig {
    #[command(flatten)]
    pub dir: ToolDirArgs,
}

/// Clash service management tool.
#[derive(Parser, Debug)]
#[command(name = "clash-serve", version, about, long_about = None)]
pub struct ServeConfig {
    #[command(flatten)]
    pub dir: ToolDirArgs,

    #[command(subcommand)]
    pub command: ServeCommands,
}

#[derive(Subcommand, Debug)]
pub enum ServeCommands {
    /// Run 'sudo ./clash -d ./' in the tool directory
    Run,
    /// Manage the config.yaml file
    Config(ConfigCommandArgs),
}

#[derive(Args, Debug)]
pub struct ConfigCommandArgs {
    /// Open config file in $EDITOR
    #[arg(short, long)]
    pub edit: bool,
}

#[derive(Args, Debug)]
pub struct ToolDirArgs {
    /// Directory holding the clash binary and config.yaml
    #[arg(long = "dir", global = true, env = "CLASH_HOME")]
    pub path: Option<PathBuf>,
}
