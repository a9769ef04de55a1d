use std::{
    path::Path,
    process::{ExitStatus, Stdio},
};

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::{Child, ChildStderr, ChildStdout},
};
use tracing::{trace, warn};

use crate::{
    error::{ExecError, ExecResult},
    util::{cmd_program, isolate_group, kill_group},
};

/// How task scripts are invoked.
#[derive(Clone, Debug)]
pub struct ProcConfig {
    /// Program the script is handed to, e.g. `bash`.
    pub interpreter: String,
}

impl Default for ProcConfig {
    fn default() -> Self {
        Self {
            interpreter: "bash".to_string(),
        }
    }
}

impl ProcConfig {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }

    /// Full command line: interpreter, script, then the caller's arguments verbatim.
    pub fn argv(&self, script: &Path, args: &[String]) -> Vec<String> {
        let mut argv = Vec::with_capacity(args.len() + 2);
        argv.push(self.interpreter.clone());
        argv.push(script.display().to_string());
        argv.extend(args.iter().cloned());
        argv
    }
}

/// One live OS process: id, termination and completion.
///
/// Output lives in the [`ProcessOutput`] returned alongside, so reading and waiting can be
/// raced against each other.
#[derive(Debug)]
pub struct ProcessHandle {
    child: Child,
    pid: Option<u32>,
}

impl ProcessHandle {
    /// Spawn `argv` with stdout and stderr captured, in its own process group.
    pub fn spawn(argv: &[String]) -> ExecResult<(Self, ProcessOutput)> {
        let mut cmd = cmd_program(argv).ok_or(ExecError::MissingInterpreter)?;
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);
        isolate_group(&mut cmd);

        let mut child = cmd.spawn().map_err(|e| ExecError::Spawn(e.to_string()))?;
        let pid = child.id();
        trace!(target: "sdci.exec.proc", ?pid, ?argv, "spawned");

        let output = ProcessOutput {
            stdout: child.stdout.take().map(PipeReader::new),
            stderr: child.stderr.take().map(PipeReader::new),
        };
        Ok((Self { child, pid }, output))
    }

    #[inline]
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Wait for the process to exit. Cancel safe.
    pub async fn wait(&mut self) -> ExecResult<ExitStatus> {
        Ok(self.child.wait().await?)
    }

    /// SIGKILL the process group, then reap the leader.
    pub async fn kill(&mut self) -> ExecResult<ExitStatus> {
        self.kill_group();
        if let Err(e) = self.child.start_kill() {
            trace!(target: "sdci.exec.proc", error = %e, "start_kill on exited child");
        }
        Ok(self.child.wait().await?)
    }

    /// Best-effort SIGKILL of whatever is left in the process group.
    fn kill_group(&self) {
        let Some(pid) = self.pid else { return };
        if let Err(e) = kill_group(pid) {
            trace!(target: "sdci.exec.proc", pid, error = %e, "killpg");
        }
    }
}

/// Merged line reader over a child's stdout and stderr.
#[derive(Debug)]
pub struct ProcessOutput {
    stdout: Option<PipeReader<ChildStdout>>,
    stderr: Option<PipeReader<ChildStderr>>,
}

impl ProcessOutput {
    /// Next line from whichever pipe has one, without its line terminator.
    ///
    /// Returns `Ok(None)` once both pipes are closed. A failing pipe is closed and its error
    /// returned; the other pipe stays readable. Cancel safe.
    pub async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        loop {
            let (pipe, res) = match (self.stdout.as_mut(), self.stderr.as_mut()) {
                (None, None) => return Ok(None),
                (Some(out), None) => (Pipe::Stdout, out.next_line().await),
                (None, Some(err)) => (Pipe::Stderr, err.next_line().await),
                (Some(out), Some(err)) => tokio::select! {
                    res = out.next_line() => (Pipe::Stdout, res),
                    res = err.next_line() => (Pipe::Stderr, res),
                },
            };

            match res {
                Ok(Some(line)) => return Ok(Some(line)),
                Ok(None) => self.close(pipe),
                Err(e) => {
                    warn!(target: "sdci.exec.proc", ?pipe, error = %e, "pipe read failed");
                    self.close(pipe);
                    return Err(e);
                }
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.stdout.is_none() && self.stderr.is_none()
    }

    fn close(&mut self, pipe: Pipe) {
        match pipe {
            Pipe::Stdout => self.stdout = None,
            Pipe::Stderr => self.stderr = None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Pipe {
    Stdout,
    Stderr,
}

/// Byte-level line splitter; partial lines survive cancellation in `buf`.
#[derive(Debug)]
struct PipeReader<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> PipeReader<R> {
    fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            buf: Vec::new(),
        }
    }

    async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        let n = self.reader.read_until(b'\n', &mut self.buf).await?;
        if n == 0 && self.buf.is_empty() {
            return Ok(None);
        }

        let mut raw = std::mem::take(&mut self.buf);
        if raw.last() == Some(&b'\n') {
            raw.pop();
            if raw.last() == Some(&b'\r') {
                raw.pop();
            }
        }
        Ok(Some(String::from_utf8_lossy(&raw).into_owned()))
    }
}
