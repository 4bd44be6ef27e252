use anyhow::Context;
use clap::Parser;
use clash_tools::args::{DockerCommands, DockerConfig};
use clash_tools::docker::{DockerPaths, DockerProxyManager, ProxySettings};
use clash_tools::logging;
use clash_tools::privilege::EffectiveUid;
use clash_tools::runner::SystemRunner;

fn main() -> anyhow::Result<()> {
    let config = DockerConfig::parse();
    logging::init();

    let paths = DockerPaths::resolve(config.docker_config, config.systemd_dir)
        .context("Cannot resolve Docker config locations")?;
    let settings = match &config.command {
        DockerCommands::Enable(args) => ProxySettings::default().with_proxy_url(&args.proxy),
        _ => ProxySettings::default(),
    };
    let manager = DockerProxyManager::new(paths, settings, SystemRunner, EffectiveUid);
    log::debug!("proxy settings: {:?}", manager.settings());

    let outcome = match config.command {
        DockerCommands::Enable(_) => manager.enable_proxy(),
        DockerCommands::Disable => manager.disable_proxy(),
        DockerCommands::Reset => manager.reset(),
        DockerCommands::Status => {
            manager.print_status();
            return Ok(());
        }
    };

    if !outcome.success() {
        std::process::exit(1);
    }
    Ok(())
}
