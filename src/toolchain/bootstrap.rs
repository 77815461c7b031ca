//! External toolchain bootstrap: run a script, scrape the environment it leaves behind
//!
//! The script is run in a shell that afterwards prints its whole environment
//! between two sentinel lines. Anything the script itself prints is discarded, so
//! only the block between the sentinels is parsed.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

use super::ToolchainEnvironmentSnapshot;
use crate::compdb::entry::split_command_line;
use crate::config::ToolchainConfig;
use crate::error::{ToolchainError, ToolchainResult};

pub const BEGIN_MARKER: &str = "----- CCDB ENVIRONMENT BEGIN -----";
pub const END_MARKER: &str = "----- CCDB ENVIRONMENT END -----";

/// A program and its arguments
///
/// `raw_args` is appended to the command line verbatim on Windows, bypassing the
/// argv quoting `args` goes through. cmd.exe parses its own `/c` line and does not
/// understand `\"` escapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
    pub raw_args: Option<String>,
}

impl ProcessCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            raw_args: None,
        }
    }

    pub fn with_raw_args(mut self, raw: impl Into<String>) -> Self {
        self.raw_args = Some(raw.into());
        self
    }
}

/// Runs a process to completion and returns its stdout lines
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn spawn_and_capture(
        &self,
        command: &ProcessCommand,
        timeout: Duration,
    ) -> ToolchainResult<Vec<String>>;
}

/// [`ProcessRunner`] backed by `tokio::process`
///
/// On timeout the child is killed; a kill racing with a normal exit is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner;

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn spawn_and_capture(
        &self,
        command: &ProcessCommand,
        timeout: Duration,
    ) -> ToolchainResult<Vec<String>> {
        let mut process = Command::new(&command.program);
        process.args(&command.args);
        if let Some(raw) = &command.raw_args {
            #[cfg(windows)]
            process.raw_arg(raw);
            #[cfg(not(windows))]
            process.arg(raw);
        }

        let mut child = process
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ToolchainError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ToolchainError::MissingOutput {
                reason: "stdout was not captured".to_string(),
            })?;

        let capture = async {
            let mut reader = BufReader::new(stdout);
            let mut lines = Vec::new();
            let mut buf = Vec::new();
            loop {
                buf.clear();
                if reader.read_until(b'\n', &mut buf).await? == 0 {
                    break;
                }
                let line = String::from_utf8_lossy(&buf);
                lines.push(line.trim_end_matches(['\r', '\n']).to_string());
            }
            let status = child.wait().await?;
            debug!("{} exited with {status}", command.program);
            Ok::<_, std::io::Error>(lines)
        };

        let outcome = tokio::time::timeout(timeout, capture).await;
        match outcome {
            Ok(result) => Ok(result?),
            Err(_) => {
                // Already exited is fine, there is nothing left to kill
                let _ = child.start_kill();
                Err(ToolchainError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }
}

/// Produces a toolchain environment for a script parameter string
#[async_trait]
pub trait EnvironmentBootstrap: Send + Sync {
    async fn fetch(&self, script_params: &str) -> ToolchainResult<ToolchainEnvironmentSnapshot>;
}

/// Stand-in used when no bootstrap script is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredBootstrap;

#[async_trait]
impl EnvironmentBootstrap for UnconfiguredBootstrap {
    async fn fetch(&self, _script_params: &str) -> ToolchainResult<ToolchainEnvironmentSnapshot> {
        Err(ToolchainError::NotConfigured)
    }
}

/// Sources a bootstrap script in the system shell and captures the resulting environment
pub struct ScriptBootstrap {
    script: PathBuf,
    timeout: Duration,
    runner: Arc<dyn ProcessRunner>,
}

impl ScriptBootstrap {
    pub fn new(script: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self::with_runner(script, timeout, Arc::new(TokioProcessRunner))
    }

    pub fn with_runner(
        script: impl Into<PathBuf>,
        timeout: Duration,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        Self {
            script: script.into(),
            timeout,
            runner,
        }
    }

    /// Bootstrap for the configured script, or [`UnconfiguredBootstrap`]
    pub fn from_config(config: &ToolchainConfig) -> Arc<dyn EnvironmentBootstrap> {
        match &config.bootstrap_script {
            Some(script) => Arc::new(Self::new(script, config.timeout())),
            None => Arc::new(UnconfiguredBootstrap),
        }
    }

    /// Shell invocation that runs the script and then dumps the environment
    pub fn command(&self, script_params: &str) -> ProcessCommand {
        if cfg!(windows) {
            self.cmd_command(script_params)
        } else {
            self.sh_command(script_params)
        }
    }

    /// `sh -c` with the script path and parameters passed as positional arguments,
    /// so neither is ever parsed as shell text
    pub fn sh_command(&self, script_params: &str) -> ProcessCommand {
        let script = if self.script.is_absolute() {
            self.script.clone()
        } else {
            // `.` searches PATH for names without a slash
            Path::new(".").join(&self.script)
        };

        let mut args = vec![
            "-c".to_string(),
            format!(
                ". \"$0\" >/dev/null 2>&1 && echo '{BEGIN_MARKER}' && env && echo '{END_MARKER}'"
            ),
            script.to_string_lossy().into_owned(),
        ];
        args.extend(split_command_line(script_params));
        ProcessCommand::new("sh", args)
    }

    /// `cmd.exe /s /c ""script" params ..."`, passed through as a raw command line
    pub fn cmd_command(&self, script_params: &str) -> ProcessCommand {
        let script = self.script.display();
        let params = script_params.trim();
        let call = if params.is_empty() {
            format!("\"{script}\"")
        } else {
            format!("\"{script}\" {params}")
        };

        ProcessCommand::new("cmd.exe", Vec::new()).with_raw_args(format!(
            "/d /s /c \"{call} >nul 2>&1 && echo {BEGIN_MARKER} && set && echo {END_MARKER}\""
        ))
    }
}

#[async_trait]
impl EnvironmentBootstrap for ScriptBootstrap {
    async fn fetch(&self, script_params: &str) -> ToolchainResult<ToolchainEnvironmentSnapshot> {
        let command = self.command(script_params);
        debug!(
            "Running toolchain bootstrap: {} {:?} {}",
            command.program,
            command.args,
            command.raw_args.as_deref().unwrap_or_default()
        );

        let lines = self.runner.spawn_and_capture(&command, self.timeout).await?;
        parse_environment_block(&lines)
    }
}

/// Collect `NAME=VALUE` lines between the sentinel markers
pub fn parse_environment_block(lines: &[String]) -> ToolchainResult<ToolchainEnvironmentSnapshot> {
    let begin = lines
        .iter()
        .position(|line| line.trim() == BEGIN_MARKER)
        .ok_or_else(|| ToolchainError::MissingOutput {
            reason: "begin marker not found".to_string(),
        })?;

    let block = &lines[begin + 1..];
    let end = block
        .iter()
        .position(|line| line.trim() == END_MARKER)
        .ok_or_else(|| ToolchainError::MissingOutput {
            reason: "end marker not found".to_string(),
        })?;

    Ok(block[..end]
        .iter()
        .filter_map(|line| line.split_once('='))
        // cmd.exe lists per-drive directories as `=C:=C:\...`
        .filter(|(name, _)| !name.is_empty())
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect())
}
