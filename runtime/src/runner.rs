//! Injected capability for shelling out to external tools.
//!
//! Everything the tool delegates to the host (docker/podman, compose,
//! certbot, apt/dnf, fuser) goes through [`CommandRunner`] so the
//! provisioning flows can be exercised in tests with scripted fakes.

use std::process::Command;

use valhalla_core::error::Result;

/// Captured result of an external command.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    pub fn ok(stdout: &str) -> Self {
        Self {
            success: true,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    pub fn failed(stderr: &str) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }
}

/// Capability interface over external process invocation.
pub trait CommandRunner {
    /// Run a command and capture its output.
    ///
    /// A command that cannot be spawned at all (binary not on PATH)
    /// reports `success: false` rather than an error, so probing for
    /// optional tools stays a plain boolean check.
    fn run(&self, program: &str, args: &[&str]) -> Result<RunOutput>;

    /// Run a command, caring only about success.
    fn succeeds(&self, program: &str, args: &[&str]) -> bool {
        self.run(program, args).map(|o| o.success).unwrap_or(false)
    }
}

/// Real runner backed by `std::process::Command`.
#[derive(Debug, Default, Clone)]
pub struct HostRunner;

impl CommandRunner for HostRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<RunOutput> {
        match Command::new(program).args(args).output() {
            Ok(output) => Ok(RunOutput {
                success: output.status.success(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(RunOutput::failed(&format!("{program}: not found")))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! Scripted runner for tests: maps a command line to its output.

    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    pub struct FakeRunner {
        responses: HashMap<String, RunOutput>,
        pub calls: RefCell<Vec<String>>,
    }

    impl FakeRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(mut self, cmdline: &str, output: RunOutput) -> Self {
            self.responses.insert(cmdline.to_string(), output);
            self
        }

        pub fn called(&self, cmdline: &str) -> bool {
            self.calls.borrow().iter().any(|c| c == cmdline)
        }
    }

    impl CommandRunner for FakeRunner {
        fn run(&self, program: &str, args: &[&str]) -> Result<RunOutput> {
            let cmdline = std::iter::once(program)
                .chain(args.iter().copied())
                .collect::<Vec<_>>()
                .join(" ");
            self.calls.borrow_mut().push(cmdline.clone());
            Ok(self
                .responses
                .get(&cmdline)
                .cloned()
                .unwrap_or_else(|| RunOutput::failed("not scripted")))
        }
    }
}
