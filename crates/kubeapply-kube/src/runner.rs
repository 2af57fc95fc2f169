//! Subprocess execution
//!
//! All kubectl calls go through the [`CommandRunner`] trait so orchestration
//! logic never spawns processes itself. [`KubectlRunner`] runs the real
//! binary; [`FakeRunner`](crate::FakeRunner) scripts responses for tests.
//!
//! Cancellation follows the usual async contract: dropping the future
//! returned by [`CommandRunner::run`] kills the child process.

use std::borrow::Cow;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tracing::info;

use crate::error::{KubeError, Result};

/// Arguments and extra environment for one command execution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub args: Vec<String>,
    /// Added on top of the inherited process environment
    pub env: Vec<(String, String)>,
}

impl Invocation {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn envs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.env.extend(pairs);
        self
    }

    /// Whether `flag` appears among the arguments
    pub fn has_arg(&self, flag: &str) -> bool {
        self.args.iter().any(|a| a == flag)
    }

    /// Value of an environment entry set on this invocation
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Arguments joined for logs and error messages
    pub fn command_line(&self, program: &str) -> String {
        let mut line = program.to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Exit status and interleaved stdout/stderr of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub status: Option<i32>,
    pub combined: Vec<u8>,
}

impl CommandOutput {
    pub fn new(status: Option<i32>, combined: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            combined: combined.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.combined)
    }

    pub fn status_text(&self) -> String {
        match self.status {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        }
    }

    /// Turn an unsuccessful exit into [`KubeError::CommandFailed`]
    pub fn into_result(self, command: String) -> Result<Vec<u8>> {
        if self.success() {
            Ok(self.combined)
        } else {
            Err(self.into_error(command))
        }
    }

    pub fn into_error(self, command: String) -> KubeError {
        KubeError::CommandFailed {
            command,
            status: self.status_text(),
            output: self.text().into_owned(),
        }
    }
}

/// Executes kubectl-style commands
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Name of the executable, for logs and error messages
    fn program(&self) -> String;

    /// Run to completion and capture combined output
    ///
    /// A non-zero exit is not an error here; callers decide what an exit
    /// status means (for `kubectl diff`, 1 means "differences found").
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput>;
}

/// Runs the real kubectl binary
#[derive(Debug, Clone)]
pub struct KubectlRunner {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl KubectlRunner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    /// Kill commands that run longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CommandRunner for KubectlRunner {
    fn program(&self) -> String {
        self.program.display().to_string()
    }

    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        info!("Running {}", invocation.command_line(&self.program()));

        let child = Command::new(&self.program)
            .args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| KubeError::Spawn {
                program: self.program(),
                source,
            })?;

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, collect_combined(child))
                .await
                .map_err(|_| KubeError::Timeout(format!("{:?}", limit)))?,
            None => collect_combined(child).await,
        }
    }
}

/// Read stdout and stderr into one buffer in arrival order, then reap the child
async fn collect_combined(mut child: Child) -> Result<CommandOutput> {
    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();
    let mut combined = Vec::new();
    let mut out_buf = [0u8; 8192];
    let mut err_buf = [0u8; 8192];

    loop {
        tokio::select! {
            read = read_some(&mut stdout, &mut out_buf), if stdout.is_some() => {
                match read? {
                    0 => stdout = None,
                    n => combined.extend_from_slice(&out_buf[..n]),
                }
            }
            read = read_some(&mut stderr, &mut err_buf), if stderr.is_some() => {
                match read? {
                    0 => stderr = None,
                    n => combined.extend_from_slice(&err_buf[..n]),
                }
            }
            else => break,
        }
    }

    let status = child.wait().await?;
    Ok(CommandOutput {
        status: status.code(),
        combined,
    })
}

async fn read_some<R>(reader: &mut Option<R>, buf: &mut [u8]) -> std::io::Result<usize>
where
    R: tokio::io::AsyncRead + Unpin,
{
    match reader {
        Some(reader) => reader.read(buf).await,
        None => Ok(0),
    }
}
