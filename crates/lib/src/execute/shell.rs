//! Shell selection and subprocess invocation.
//!
//! Every phase of a script lowers to one interpreter call of the form
//! `<shell> <flags> <command line>`. This module picks the interpreter,
//! renders the shell-ready form shown to users, and spawns the process.

use std::future::Future;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::debug;

use super::sink::OutputSink;
use super::types::{ExecuteError, Invocation};

/// Quoting rules of an interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellFamily {
  Posix,
  PowerShell,
  Cmd,
}

impl ShellFamily {
  /// Family of the interpreter at `program`, judged by its file name.
  pub fn of(program: &str) -> Self {
    let name = program
      .rsplit(['/', '\\'])
      .next()
      .unwrap_or(program)
      .to_ascii_lowercase();
    let name = name.strip_suffix(".exe").unwrap_or(&name);

    match name {
      "powershell" | "pwsh" => ShellFamily::PowerShell,
      "cmd" => ShellFamily::Cmd,
      _ => ShellFamily::Posix,
    }
  }

  fn flags(self) -> Vec<String> {
    match self {
      ShellFamily::Posix => vec!["-c".to_string()],
      ShellFamily::PowerShell => vec!["-NoProfile".to_string(), "-Command".to_string()],
      ShellFamily::Cmd => vec!["/C".to_string()],
    }
  }

  /// Quote `s` as one argument for a command line typed into this family.
  pub fn quote(self, s: &str) -> String {
    match self {
      ShellFamily::Posix => quote(s),
      ShellFamily::PowerShell => format!("'{}'", s.replace('\'', "''")),
      // cmd /C strips the outer quotes and keeps the rest verbatim
      ShellFamily::Cmd => format!("\"{}\"", s),
    }
  }

  fn quote_word(self, s: &str) -> String {
    let plain = !s.is_empty()
      && s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '-' | '_' | '=' | ':' | ',' | '+' | '@' | '%') || (c == '\\' && self != ShellFamily::Posix));
    if plain { s.to_string() } else { self.quote(s) }
  }
}

/// The interpreter used to run joined command lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
  pub program: String,
  pub args: Vec<String>,
}

impl ShellConfig {
  /// Resolve the shell for a target.
  ///
  /// `override_shell` selects a specific interpreter; its flags are picked
  /// by family. Without an override the platform shell is used, never
  /// `$SHELL`, since interactive shells may source profile files.
  pub fn detect(override_shell: Option<&str>) -> Self {
    if let Some(shell) = override_shell {
      return Self {
        program: shell.to_string(),
        args: ShellFamily::of(shell).flags(),
      };
    }

    #[cfg(unix)]
    {
      Self {
        program: "/bin/sh".to_string(),
        args: ShellFamily::Posix.flags(),
      }
    }

    #[cfg(windows)]
    {
      Self {
        program: "powershell.exe".to_string(),
        args: ShellFamily::PowerShell.flags(),
      }
    }
  }

  pub fn family(&self) -> ShellFamily {
    ShellFamily::of(&self.program)
  }

  /// Argument vector executing `command_line`.
  pub fn argv(&self, command_line: &str) -> Vec<String> {
    let mut argv = Vec::with_capacity(self.args.len() + 2);
    argv.push(self.program.clone());
    argv.extend(self.args.iter().cloned());
    argv.push(command_line.to_string());
    argv
  }

  /// Shell-ready rendering of [`ShellConfig::argv`], e.g. `/bin/sh -c 'make all'`.
  ///
  /// Quoting follows the interpreter's own family, so pasting the result
  /// into that kind of shell runs the same argument vector.
  pub fn render(&self, command_line: &str) -> String {
    let family = self.family();
    let mut parts: Vec<String> = Vec::with_capacity(self.args.len() + 2);
    parts.push(family.quote_word(&self.program));
    parts.extend(self.args.iter().map(|a| family.quote_word(a)));
    parts.push(family.quote(command_line));
    parts.join(" ")
  }
}

impl Default for ShellConfig {
  fn default() -> Self {
    Self::detect(None)
  }
}

/// Single-quote `s` for a POSIX shell.
pub fn quote(s: &str) -> String {
  format!("'{}'", s.replace('\'', r"'\''"))
}

/// Spawns the subprocess of one phase.
///
/// Implementations must run `invocation.argv` in `invocation.cwd` with
/// exactly `invocation.env`, forward output lines to `sink`, and map a
/// failed exit to [`ExecuteError::CmdFailed`]. No retries.
pub trait ShellInvoker {
  fn invoke(
    &self,
    invocation: &Invocation,
    target: &str,
    sink: &dyn OutputSink,
  ) -> impl Future<Output = Result<(), ExecuteError>> + Send;
}

/// Runs invocations as real processes through tokio.
#[derive(Debug, Default, Clone, Copy)]
pub struct SubprocessInvoker;

impl ShellInvoker for SubprocessInvoker {
  async fn invoke(&self, invocation: &Invocation, target: &str, sink: &dyn OutputSink) -> Result<(), ExecuteError> {
    let phase = invocation.phase;
    let cmd = invocation.command_line().to_string();

    let Some((program, args)) = invocation.argv.split_first() else {
      return Err(ExecuteError::Spawn {
        phase,
        cmd,
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty argument vector"),
      });
    };

    let mut command = Command::new(program);
    command
      .args(args)
      .current_dir(&invocation.cwd)
      .env_clear()
      .envs(&invocation.env)
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true);

    debug!(target_name = %target, %phase, program = %program, working_dir = ?invocation.cwd, env_vars = invocation.env.len(), "spawning process");

    let mut child = command.spawn().map_err(|source| ExecuteError::Spawn {
      phase,
      cmd: cmd.clone(),
      source,
    })?;

    let stdout = child
      .stdout
      .take()
      .ok_or_else(|| std::io::Error::other("failed to capture stdout"))?;
    let stderr = child
      .stderr
      .take()
      .ok_or_else(|| std::io::Error::other("failed to capture stderr"))?;

    let forward_stdout = forward_lines(stdout, |line| sink.stdout_line(target, line));
    let forward_stderr = forward_lines(stderr, |line| sink.stderr_line(target, line));

    let (status, stdout_result, stderr_result) = tokio::join!(child.wait(), forward_stdout, forward_stderr);
    let status = status?;
    stdout_result?;
    stderr_result?;

    if status.success() {
      debug!(%phase, "command succeeded");
      return Ok(());
    }

    Err(ExecuteError::CmdFailed {
      phase,
      cmd,
      code: status.code(),
      signal: exit_signal(&status),
    })
  }
}

/// Forward each line of `reader` to `emit`.
///
/// Output is decoded lossily; bytes that are not UTF-8 never fail a phase.
async fn forward_lines<R>(reader: R, mut emit: impl FnMut(&str)) -> std::io::Result<()>
where
  R: AsyncRead + Unpin,
{
  let mut reader = BufReader::new(reader);
  let mut buf = Vec::new();

  loop {
    buf.clear();
    if reader.read_until(b'\n', &mut buf).await? == 0 {
      return Ok(());
    }

    let decoded = String::from_utf8_lossy(&buf);
    let line = decoded.strip_suffix('\n').unwrap_or(&decoded);
    let line = line.strip_suffix('\r').unwrap_or(line);
    emit(line);
  }
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<i32> {
  use std::os::unix::process::ExitStatusExt;
  status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<i32> {
  None
}
