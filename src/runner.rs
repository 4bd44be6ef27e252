use std::fmt;
use std::io;
use std::process::Command;

/// Exit status of a finished subprocess. `code` is `None` when it was killed
/// by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStatus {
    pub code: Option<i32>,
}

impl RunStatus {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit status {code}"),
            None => write!(f, "termination by signal"),
        }
    }
}

/// Runs a program to completion in the current working directory.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<RunStatus>;
}

/// Spawns real processes with inherited stdio.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<RunStatus> {
        log::debug!("running {}", command_line(program, args));
        let status = Command::new(program).args(args).status()?;
        Ok(RunStatus {
            code: status.code(),
        })
    }
}

pub fn command_line(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::path::PathBuf;

    use super::*;

    /// Records every invocation and replays queued exit codes (default 0).
    #[derive(Default)]
    pub(crate) struct RecordingRunner {
        pub calls: RefCell<Vec<Vec<String>>>,
        pub cwds: RefCell<Vec<PathBuf>>,
        codes: RefCell<VecDeque<io::Result<RunStatus>>>,
    }

    impl RecordingRunner {
        pub fn with_codes(codes: &[i32]) -> Self {
            let runner = Self::default();
            for &code in codes {
                runner.push(Ok(RunStatus { code: Some(code) }));
            }
            runner
        }

        pub fn push(&self, result: io::Result<RunStatus>) {
            self.codes.borrow_mut().push_back(result);
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|c| c.join(" ")).collect()
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, program: &str, args: &[&str]) -> io::Result<RunStatus> {
            let mut call = vec![program.to_string()];
            call.extend(args.iter().map(|a| a.to_string()));
            self.calls.borrow_mut().push(call);
            self.cwds.borrow_mut().push(std::env::current_dir()?);
            self.codes
                .borrow_mut()
                .pop_front()
                .unwrap_or(Ok(RunStatus { code: Some(0) }))
        }
    }
}
