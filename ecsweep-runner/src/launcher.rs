//! Process boundary: run one invocation and capture its standard output.

use std::io;
use std::process::{Command, Stdio};

use thiserror::Error;

use ecsweep_core::Invocation;

/// The OS could not start an invocation.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("invocation has an empty command line")]
    EmptyCommand,

    #[error("failed to launch '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
}

/// What a finished process left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captured {
    /// Standard output, decoded as UTF-8 (invalid sequences replaced).
    pub stdout: String,
    /// Exit code; `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl Captured {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs invocations. Implementations block until the process has exited.
pub trait Launcher {
    fn launch(&self, invocation: &Invocation) -> Result<Captured, LaunchError>;
}

impl<L: Launcher + ?Sized> Launcher for &L {
    fn launch(&self, invocation: &Invocation) -> Result<Captured, LaunchError> {
        (**self).launch(invocation)
    }
}

/// Launches invocations as child processes of this one.
///
/// The command line is split on whitespace; the first token is the program.
/// The child inherits the environment and stderr, gets a null stdin, and its
/// stdout is read to the end before `launch` returns.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessLauncher;

impl ProcessLauncher {
    pub fn new() -> Self {
        Self
    }
}

impl Launcher for ProcessLauncher {
    fn launch(&self, invocation: &Invocation) -> Result<Captured, LaunchError> {
        let argv = invocation.argv();
        let (program, args) = argv.split_first().ok_or(LaunchError::EmptyCommand)?;

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|source| LaunchError::Spawn {
                command: invocation.line().to_string(),
                source,
            })?;

        Ok(Captured {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            exit_code: output.status.code(),
        })
    }
}

/// Split captured output into lines.
///
/// A final newline does not produce a trailing empty entry; `\r\n` endings
/// are treated as line breaks. No other normalization is applied.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_owned).collect()
}
