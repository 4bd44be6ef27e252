use std::io::Write;

use clap::Parser;
use clash_tools::args::ExportConfig;
use clash_tools::env_export;
use clash_tools::logging;
use clash_tools::tool_dir::ToolDir;

fn main() -> anyhow::Result<()> {
    let config = ExportConfig::parse();
    logging::init();

    let mut stdout = std::io::stdout().lock();

    let failed = match ToolDir::resolve(config.dir.path) {
        Ok(dir) => env_export::write_exports(&dir.config_file(), &mut stdout)?,
        Err(e) => {
            writeln!(stdout, "{}", env_export::error_line(&e))?;
            Some(e)
        }
    };
    stdout.flush()?;

    if let Some(e) = failed {
        log::debug!("export failed: {e}");
        std::process::exit(1);
    }
    Ok(())
}
