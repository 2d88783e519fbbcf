use std::io::{ErrorKind, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use wait_timeout::ChildExt;

use crate::config::Config;

pub const ALT_TOOL_TIMEOUT: Duration = Duration::from_millis(5_000);
const WORKSPACE_FILE_MARKER: &str = ".code-workspace";
const FILE_SCHEME: &str = "file://";

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to start `{command}`: {message}")]
    Spawn { command: String, message: String },
    #[error("command failed ({status}): {command}\n{stderr}{stdout}")]
    Exit {
        command: String,
        status: String,
        stdout: String,
        stderr: String,
    },
    #[error("{stderr}{stdout}")]
    Stderr { stdout: String, stderr: String },
    #[error("failed to wait for `{command}`: {message}")]
    Wait { command: String, message: String },
    #[error("command timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AltTool {
    DirectoryOpus,
    TotalCommander,
}

impl AltTool {
    pub fn command_line(self, path: &str) -> String {
        match self {
            Self::DirectoryOpus => format!("dopusrt.exe /cmd Go {} NEWTAB", quote_arg(path)),
            Self::TotalCommander => format!("TOTALCMD64.EXE /O /T {}", quote_arg(path)),
        }
    }
}

/// Runs one shell command line and returns its stdout.
pub trait CommandRunner {
    fn run(&self, command_line: &str, timeout: Duration) -> Result<String, ProcessError>;
}

/// Builds `<editor> --file-uri|--folder-uri "<payload>"`, shell-wrapped when configured.
pub fn editor_command(cfg: &Config, payload: &str) -> String {
    let mut executable = cfg.command.trim().to_string();
    if executable.contains(char::is_whitespace) {
        executable = format!("\"{executable}\"");
    }

    let flag = if payload.contains(WORKSPACE_FILE_MARKER) {
        "--file-uri"
    } else {
        "--folder-uri"
    };

    wrap_login_shell(&cfg.terminal, &format!("{executable} {flag} {}", quote_arg(payload)))
}

pub fn alt_tool_command(cfg: &Config, tool: AltTool, decoded_path: &str) -> String {
    wrap_login_shell(&cfg.terminal, &tool.command_line(&local_path_from_uri(decoded_path)))
}

/// Passes `command_line` to `shell` as one double-quoted argument, escaped for
/// the shell that runs the wrapper.
pub fn wrap_login_shell(shell: &str, command_line: &str) -> String {
    let shell = shell.trim();
    if shell.is_empty() {
        return command_line.to_string();
    }
    format!("{shell} \"{}\"", escape_double_quoted(command_line))
}

/// Double-quotes a path or URI argument. Off Windows every command line goes
/// through `sh`, so `$`, backticks, `"` and `\` are escaped and a path holding
/// `$(...)` reaches the program literally. `cmd` gives none of them meaning.
pub fn quote_arg(value: &str) -> String {
    if cfg!(target_os = "windows") {
        format!("\"{value}\"")
    } else {
        format!("\"{}\"", escape_double_quoted(value))
    }
}

fn escape_double_quoted(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        if matches!(ch, '\\' | '"' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Strips the `file://` scheme, and the leading slash of a `/c:/` drive path.
pub fn local_path_from_uri(decoded: &str) -> String {
    let Some(rest) = decoded.strip_prefix(FILE_SCHEME) else {
        return decoded.to_string();
    };

    let bytes = rest.as_bytes();
    let is_drive_path = bytes.len() >= 3
        && bytes[0] == b'/'
        && bytes[1].is_ascii_alphabetic()
        && bytes[2] == b':';
    if is_drive_path {
        rest[1..].to_string()
    } else {
        rest.to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, command_line: &str, timeout: Duration) -> Result<String, ProcessError> {
        tracing::debug!(command = command_line, timeout_ms = timeout.as_millis() as u64, "spawning");
        let deadline = Instant::now() + timeout;
        let mut child = shell_command(command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|error| ProcessError::Spawn {
                command: command_line.to_string(),
                message: error.to_string(),
            })?;

        let (sender, receiver) = mpsc::channel();
        spawn_reader(child.stdout.take(), Stream::Stdout, sender.clone());
        spawn_reader(child.stderr.take(), Stream::Stderr, sender);

        let Some(status) = wait_or_kill(&mut child, command_line, timeout)? else {
            tracing::warn!(command = command_line, "command timed out");
            return Err(ProcessError::Timeout(timeout));
        };
        let output = collect_until(&receiver, deadline);
        if !output.complete {
            tracing::debug!(
                command = command_line,
                "output pipes still held after exit; using what was captured"
            );
        }
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !status.success() {
            tracing::warn!(command = command_line, %status, "command failed");
            return Err(ProcessError::Exit {
                command: command_line.to_string(),
                status: status.to_string(),
                stdout,
                stderr,
            });
        }
        if !stderr.is_empty() {
            tracing::warn!(command = command_line, "command wrote to stderr");
            return Err(ProcessError::Stderr { stdout, stderr });
        }
        Ok(stdout)
    }
}

fn wait_or_kill(
    child: &mut Child,
    command_line: &str,
    timeout: Duration,
) -> Result<Option<ExitStatus>, ProcessError> {
    let waited = child
        .wait_timeout(timeout)
        .map_err(|error| ProcessError::Wait {
            command: command_line.to_string(),
            message: error.to_string(),
        })?;
    if waited.is_none() {
        if let Err(error) = child.kill() {
            tracing::warn!(command = command_line, %error, "failed to kill timed out command");
        }
        if let Err(error) = child.wait() {
            tracing::warn!(command = command_line, %error, "failed to reap timed out command");
        }
    }
    Ok(waited)
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

#[derive(Debug, Default)]
struct Captured {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    /// Both pipes reached end of file before the deadline.
    complete: bool,
}

/// Reads `pipe` in chunks on its own thread. The thread is never joined: a
/// detached grandchild may keep the pipe open long after the command exits.
fn spawn_reader<R>(pipe: Option<R>, stream: Stream, sender: Sender<(Stream, Vec<u8>)>)
where
    R: Read + Send + 'static,
{
    let Some(mut pipe) = pipe else {
        return;
    };
    std::thread::spawn(move || {
        let mut buffer = [0u8; 4096];
        loop {
            match pipe.read(&mut buffer) {
                Ok(0) => break,
                Ok(read) => {
                    if sender.send((stream, buffer[..read].to_vec())).is_err() {
                        break;
                    }
                }
                Err(error) if error.kind() == ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
    });
}

/// Gathers chunks until every reader hangs up or `deadline` passes.
fn collect_until(receiver: &Receiver<(Stream, Vec<u8>)>, deadline: Instant) -> Captured {
    let mut captured = Captured::default();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match receiver.recv_timeout(remaining) {
            Ok((Stream::Stdout, chunk)) => captured.stdout.extend_from_slice(&chunk),
            Ok((Stream::Stderr, chunk)) => captured.stderr.extend_from_slice(&chunk),
            Err(RecvTimeoutError::Disconnected) => {
                captured.complete = true;
                return captured;
            }
            Err(RecvTimeoutError::Timeout) => return captured,
        }
    }
}

#[cfg(target_os = "windows")]
fn shell_command(command_line: &str) -> Command {
    use std::os::windows::process::CommandExt;
    use windows_sys::Win32::System::Threading::CREATE_NO_WINDOW;

    let mut command = Command::new("cmd");
    command
        .arg("/D")
        .arg("/S")
        .arg("/C")
        .raw_arg(format!("\"{command_line}\""))
        .creation_flags(CREATE_NO_WINDOW);
    command
}

#[cfg(not(target_os = "windows"))]
fn shell_command(command_line: &str) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(command_line);
    command
}
