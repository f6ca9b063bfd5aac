//! Container engine and compose front-end detection.
//!
//! The host may carry Docker or Podman, each with either the native
//! `compose` subcommand or the legacy standalone binary. Detection
//! probes a fixed priority order and takes the first front-end that
//! answers a version invocation.

use std::fmt;
use std::str::FromStr;

use crate::runner::CommandRunner;

/// The container engine chosen for this host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerRuntime {
    Docker,
    Podman,
}

impl ContainerRuntime {
    /// Engine binary name.
    pub fn binary(&self) -> &'static str {
        match self {
            ContainerRuntime::Docker => "docker",
            ContainerRuntime::Podman => "podman",
        }
    }

    /// Package name to install when the engine is missing.
    pub fn package(&self) -> &'static str {
        match self {
            ContainerRuntime::Docker => "docker.io",
            ContainerRuntime::Podman => "podman",
        }
    }
}

impl fmt::Display for ContainerRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary())
    }
}

impl FromStr for ContainerRuntime {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "docker" => Ok(ContainerRuntime::Docker),
            "podman" => Ok(ContainerRuntime::Podman),
            _ => Err(()),
        }
    }
}

/// How compose is invoked for a given engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeKind {
    /// `<engine> compose ...`
    Native,
    /// `<engine>-compose ...`
    Legacy,
}

/// A usable compose front-end discovered on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposeFrontEnd {
    pub runtime: ContainerRuntime,
    pub kind: ComposeKind,
}

impl ComposeFrontEnd {
    /// Command prefix for compose invocations, e.g. `["docker", "compose"]`.
    pub fn command_prefix(&self) -> Vec<String> {
        match self.kind {
            ComposeKind::Native => {
                vec![self.runtime.binary().to_string(), "compose".to_string()]
            }
            ComposeKind::Legacy => vec![format!("{}-compose", self.runtime.binary())],
        }
    }

    /// Run a compose subcommand (e.g. `pull`, `up -d`) via the runner.
    pub fn invoke(&self, runner: &dyn CommandRunner, args: &[&str]) -> bool {
        let prefix = self.command_prefix();
        let mut full: Vec<&str> = prefix.iter().skip(1).map(|s| s.as_str()).collect();
        full.extend_from_slice(args);
        runner.succeeds(&prefix[0], &full)
    }
}

impl fmt::Display for ComposeFrontEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_prefix().join(" "))
    }
}

/// Check whether an engine binary is installed and answering.
pub fn runtime_installed(runner: &dyn CommandRunner, runtime: ContainerRuntime) -> bool {
    runner.succeeds(runtime.binary(), &["--version"])
}

/// Probe for a usable compose front-end.
///
/// Priority order: docker native, docker legacy binary, podman native,
/// podman legacy binary. Returns `None` when nothing answers; callers
/// treat that as a reported condition and fall back to manual
/// instructions.
pub fn detect_compose(runner: &dyn CommandRunner) -> Option<ComposeFrontEnd> {
    use ComposeKind::*;
    use ContainerRuntime::*;

    const CANDIDATES: [ComposeFrontEnd; 4] = [
        ComposeFrontEnd {
            runtime: Docker,
            kind: Native,
        },
        ComposeFrontEnd {
            runtime: Docker,
            kind: Legacy,
        },
        ComposeFrontEnd {
            runtime: Podman,
            kind: Native,
        },
        ComposeFrontEnd {
            runtime: Podman,
            kind: Legacy,
        },
    ];

    CANDIDATES.into_iter().find(|candidate| {
        let prefix = candidate.command_prefix();
        let mut args: Vec<&str> = prefix.iter().skip(1).map(|s| s.as_str()).collect();
        args.push("version");
        runner.succeeds(&prefix[0], &args)
    })
}
