//! Subprocess execution

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::errors::AgentError;

/// Captured result of a finished subprocess
#[derive(Debug, Clone)]
pub struct CmdOutput {
    /// Exit code; -1 when the process was killed by a signal
    pub code: i32,

    /// Combined stdout and stderr
    pub output: String,
}

impl CmdOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Runs external commands and captures their output.
///
/// The seam between the executor and the operating system; tests substitute
/// a scripted implementation.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion, rooted at `cwd` when given.
    ///
    /// There is deliberately no timeout here: a hung deploy script blocks
    /// the queue (known limitation of the serialized drain design).
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        cwd: Option<&Path>,
    ) -> Result<CmdOutput, AgentError>;
}

/// Real subprocess runner backed by tokio
pub struct ShellRunner;

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        cwd: Option<&Path>,
    ) -> Result<CmdOutput, AgentError> {
        debug!("Running command: {} {:?} (cwd: {:?})", program, args, cwd);

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let result = command.output().await?;

        let mut output = String::from_utf8_lossy(&result.stdout).into_owned();
        output.push_str(&String::from_utf8_lossy(&result.stderr));

        Ok(CmdOutput {
            code: result.status.code().unwrap_or(-1),
            output,
        })
    }
}
