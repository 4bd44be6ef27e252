use anyhow::Context;
use clap::Parser;
use clash_tools::args::{ServeCommands, ServeConfig};
use clash_tools::logging;
use clash_tools::runner::SystemRunner;
use clash_tools::serve::ServiceRunner;
use clash_tools::tool_dir::ToolDir;

fn main() -> anyhow::Result<()> {
    let config = ServeConfig::parse();
    logging::init();

    let dir = ToolDir::resolve(config.dir.path).context("Cannot resolve clash directory")?;
    let service = ServiceRunner::new(dir, SystemRunner);

    match config.command {
        ServeCommands::Run => {
            let status = service.run()?;
            if let Some(code) = status.code.filter(|&code| code != 0) {
                std::process::exit(code);
            }
        }
        ServeCommands::Config(args) => service.config(args.edit, std::env::var("EDITOR").ok())?,
    }

    Ok(())
}
