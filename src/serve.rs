use std::path::{Path, PathBuf};

use crate::error::{Result, ToolError};
use crate::output;
use crate::runner::{command_line, CommandRunner, RunStatus};
use crate::tool_dir::ToolDir;

const CLASH_PROGRAM: &str = "sudo";
const CLASH_ARGS: &[&str] = &["./clash", "-d", "./"];
const DEFAULT_EDITOR: &str = "nano";

/// Changes the working directory and restores the previous one on drop.
struct WorkingDirGuard {
    original: PathBuf,
}

impl WorkingDirGuard {
    fn enter(dir: &Path) -> Result<Self> {
        let original = std::env::current_dir().map_err(|e| ToolError::io(".", e))?;
        std::env::set_current_dir(dir).map_err(|e| ToolError::io(dir, e))?;
        Ok(WorkingDirGuard { original })
    }
}

impl Drop for WorkingDirGuard {
    fn drop(&mut self) {
        if let Err(e) = std::env::set_current_dir(&self.original) {
            log::error!(
                "failed to restore working directory {}: {e}",
                self.original.display()
            );
        }
    }
}

pub struct ServiceRunner<R> {
    dir: ToolDir,
    runner: R,
}

impl<R: CommandRunner> ServiceRunner<R> {
    pub fn new(dir: ToolDir, runner: R) -> Self {
        ServiceRunner { dir, runner }
    }

    /// Runs `sudo ./clash -d ./` from the tool directory in the foreground.
    pub fn run(&self) -> Result<RunStatus> {
        let _guard = WorkingDirGuard::enter(self.dir.path())?;

        println!(
            "Running: {} in {}",
            command_line(CLASH_PROGRAM, CLASH_ARGS),
            self.dir.path().display()
        );

        let status = self
            .runner
            .run(CLASH_PROGRAM, CLASH_ARGS)
            .map_err(|e| ToolError::Service {
                command: command_line(CLASH_PROGRAM, CLASH_ARGS),
                status: format!("spawn error: {e}"),
            })?;

        if !status.success() {
            output::warning(format!("clash exited with {status}"));
        }

        Ok(status)
    }

    /// Prints the config path and optionally opens it in `editor`
    /// (falling back to nano).
    pub fn config(&self, edit: bool, editor: Option<String>) -> Result<()> {
        let config_file = self.dir.config_file();
        println!("Config file: {}", config_file.display());

        if !config_file.exists() {
            eprintln!("❌ Config file not found!");
            return Ok(());
        }

        if edit {
            let editor = editor
                .filter(|editor| !editor.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_EDITOR.to_string());
            let path = config_file.to_string_lossy();

            match self.runner.run(&editor, &[&*path]) {
                Ok(status) if !status.success() => {
                    log::warn!("editor {editor} exited with {status}");
                }
                Ok(_) => {}
                Err(e) => eprintln!("❌ Error opening editor: {e}"),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::RecordingRunner;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn tool_dir() -> (TempDir, ToolDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().canonicalize().unwrap();
        (dir, ToolDir::new(path))
    }

    #[test]
    #[serial]
    fn run_executes_clash_in_tool_dir() {
        let (_dir, tool_dir) = tool_dir();
        let before = std::env::current_dir().unwrap();
        let service = ServiceRunner::new(tool_dir.clone(), RecordingRunner::default());

        let status = service.run().unwrap();

        assert!(status.success());
        assert_eq!(service.runner.calls(), ["sudo ./clash -d ./"]);
        assert_eq!(*service.runner.cwds.borrow(), vec![tool_dir.path().to_path_buf()]);
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[test]
    #[serial]
    fn run_restores_cwd_after_failure() {
        let (_dir, tool_dir) = tool_dir();
        let before = std::env::current_dir().unwrap();
        let service = ServiceRunner::new(tool_dir, RecordingRunner::with_codes(&[1]));

        let status = service.run().unwrap();

        assert_eq!(status, RunStatus { code: Some(1) });
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[test]
    #[serial]
    fn run_restores_cwd_after_spawn_error() {
        let (_dir, tool_dir) = tool_dir();
        let before = std::env::current_dir().unwrap();
        let runner = RecordingRunner::default();
        runner.push(Err(std::io::Error::other("sudo missing")));
        let service = ServiceRunner::new(tool_dir, runner);

        assert!(matches!(service.run(), Err(ToolError::Service { .. })));
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[test]
    #[serial]
    fn run_fails_for_missing_dir() {
        let service = ServiceRunner::new(
            ToolDir::new("/nonexistent/clash-tools"),
            RecordingRunner::default(),
        );

        assert!(matches!(service.run(), Err(ToolError::Io { .. })));
        assert!(service.runner.calls().is_empty());
    }

    #[test]
    fn config_opens_editor() {
        let (_dir, tool_dir) = tool_dir();
        fs::write(tool_dir.config_file(), "port: 7890\n").unwrap();
        let service = ServiceRunner::new(tool_dir.clone(), RecordingRunner::default());

        service.config(true, Some("vim".into())).unwrap();

        assert_eq!(
            service.runner.calls(),
            [format!("vim {}", tool_dir.config_file().display())]
        );
    }

    #[test]
    fn config_defaults_to_nano() {
        let (_dir, tool_dir) = tool_dir();
        fs::write(tool_dir.config_file(), "port: 7890\n").unwrap();
        let service = ServiceRunner::new(tool_dir.clone(), RecordingRunner::default());

        service.config(true, None).unwrap();

        assert_eq!(
            service.runner.calls(),
            [format!("nano {}", tool_dir.config_file().display())]
        );
    }

    #[test]
    fn config_without_edit_only_prints() {
        let (_dir, tool_dir) = tool_dir();
        fs::write(tool_dir.config_file(), "port: 7890\n").unwrap();
        let service = ServiceRunner::new(tool_dir, RecordingRunner::default());

        service.config(false, Some("vim".into())).unwrap();

        assert!(service.runner.calls().is_empty());
    }

    #[test]
    fn editor_launch_failure_is_not_fatal() {
        let (_dir, tool_dir) = tool_dir();
        fs::write(tool_dir.config_file(), "port: 7890\n").unwrap();
        let runner = RecordingRunner::default();
        runner.push(Err(std::io::Error::other("no such editor")));
        let service = ServiceRunner::new(tool_dir, runner);

        assert!(service.config(true, Some("missing-editor".into())).is_ok());
    }

    #[test]
    fn missing_config_skips_editor() {
        let (_dir, tool_dir) = tool_dir();
        let service = ServiceRunner::new(tool_dir, RecordingRunner::default());

        service.config(true, None).unwrap();

        assert!(service.runner.calls().is_empty());
    }
}
