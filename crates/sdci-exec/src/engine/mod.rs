use sdci_core::{
    ExecutionGuard, RunContext, RunOutcome, RunStream, Runner, RunnerError, Task,
};
use sdci_model::{RunPhase, RunRecord};
use tokio::{
    sync::mpsc::{self, Receiver, Sender},
    time::{Instant, sleep_until, timeout_at},
};
use tracing::{debug, info, warn};

use crate::{
    marker,
    proc::{ProcConfig, ProcessHandle, ProcessOutput},
    util::exit_code,
};

/// Execution engine for `<interpreter> <script> <args...>` runs.
///
/// Each launch spawns a supervisor task that owns the child, the execution guard and every
/// status write, so a run reaches its terminal record whether or not anyone reads its output.
pub struct ScriptRunner {
    cfg: ProcConfig,
}

impl ScriptRunner {
    pub fn new(cfg: ProcConfig) -> Self {
        Self { cfg }
    }
}

impl Runner for ScriptRunner {
    fn name(&self) -> &'static str {
        "script"
    }

    fn launch(
        &self,
        task: Task,
        args: Vec<String>,
        guard: ExecutionGuard,
        ctx: RunContext,
    ) -> Result<RunStream, RunnerError> {
        let argv = self.cfg.argv(&task.script, &args);
        info!(target: "sdci.exec.engine", task = %task.name, cmd = ?argv, "running task");

        let (sink, rx) = OutputSink::new(ctx.output_capacity);
        sink.marker(marker::SEPARATOR.to_string());
        sink.marker(marker::running(&argv));

        let (proc, output) = match ProcessHandle::spawn(&argv) {
            Ok(spawned) => spawned,
            Err(e) => {
                warn!(target: "sdci.exec.engine", task = %task.name, error = %e, "spawn failed");
                ctx.metrics.record_spawn_failed(task.name.as_str());
                return Err(RunnerError::Spawn(e.to_string()));
            }
        };
        let started = Instant::now();
        let pid = proc.pid();

        ctx.store.publish(&task.name, RunRecord::running(pid));
        ctx.metrics.record_run_started(task.name.as_str());
        debug!(target: "sdci.exec.engine", task = %task.name, ?pid, "run record published");

        let run = Supervised {
            task,
            proc,
            output,
            guard,
            ctx,
            sink,
            started,
        };
        let done = tokio::spawn(run.supervise());
        Ok(RunStream::new(pid, rx, done))
    }
}

/// Everything a single run owns after spawn.
struct Supervised {
    task: Task,
    proc: ProcessHandle,
    output: ProcessOutput,
    guard: ExecutionGuard,
    ctx: RunContext,
    sink: OutputSink,
    started: Instant,
}

impl Supervised {
    async fn supervise(mut self) -> RunRecord {
        let deadline = self.started + self.ctx.timeout;

        let (phase, status) = loop {
            tokio::select! {
                biased;

                _ = sleep_until(deadline) => {
                    warn!(target: "sdci.exec.engine", task = %self.task.name, "deadline reached");
                    let status = self.proc.kill().await;
                    self.sink.marker(marker::TIMEOUT_REACHED.to_string());
                    break (RunPhase::Timeout, status);
                }
                line = self.output.next_line(), if !self.output.is_closed() => match line {
                    Ok(Some(line)) => self.sink.line(line),
                    Ok(None) => debug!(target: "sdci.exec.engine", "output closed"),
                    Err(e) => self.sink.line(marker::read_failed(&e)),
                },
                status = self.proc.wait() => {
                    self.drain(deadline).await;
                    break (RunPhase::Finished, status);
                }
            }
        };

        let code = match status {
            Ok(status) => exit_code(&status),
            Err(e) => {
                warn!(target: "sdci.exec.engine", error = %e, "exit status unavailable");
                None
            }
        };

        let record = RunRecord::concluded(self.proc.pid(), code, phase);
        self.ctx.store.publish(&self.task.name, record);

        let outcome = match phase {
            RunPhase::Timeout => RunOutcome::Timeout,
            _ => RunOutcome::Finished,
        };
        self.ctx.metrics.record_run_completed(
            self.task.name.as_str(),
            outcome,
            self.started.elapsed(),
        );
        info!(
            target: "sdci.exec.engine",
            task = %self.task.name,
            status = phase.as_str(),
            exit_code = ?code,
            "run concluded"
        );

        let Self { guard, sink, task, .. } = self;
        drop(guard);
        let dropped = sink.close(code);
        if dropped > 0 {
            warn!(target: "sdci.exec.engine", task = %task.name, dropped, "output truncated");
        }
        record
    }

    /// Read what the exited process left in its pipes, bounded by the deadline.
    ///
    /// The leader is already reaped here, so its group id may belong to someone else:
    /// leftovers still holding the pipes are abandoned, not signalled.
    async fn drain(&mut self, deadline: Instant) {
        while !self.output.is_closed() {
            match timeout_at(deadline, self.output.next_line()).await {
                Ok(Ok(Some(line))) => self.sink.line(line),
                Ok(Ok(None)) => break,
                Ok(Err(e)) => self.sink.line(marker::read_failed(&e)),
                Err(_) => {
                    warn!(target: "sdci.exec.engine", "pipes still held at deadline; closing");
                    break;
                }
            }
        }
    }
}

/// Slots reserved for the announcement markers sent before spawn.
const HEAD_SLOTS: usize = 2;

/// Slots reserved for the timeout, truncation and exit markers.
const TAIL_SLOTS: usize = 3;

/// Bounded, non-blocking output queue of a run.
///
/// Output lines only take the slots left over after [`TAIL_SLOTS`]; once the reader falls
/// that far behind further lines are counted and dropped, so markers always fit and the
/// producer never waits.
struct OutputSink {
    tx: Sender<String>,
    dropped: u64,
}

impl OutputSink {
    fn new(capacity: usize) -> (Self, Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity.max(1) + HEAD_SLOTS + TAIL_SLOTS);
        (Self { tx, dropped: 0 }, rx)
    }

    fn line(&mut self, chunk: String) {
        if self.tx.is_closed() {
            return;
        }
        if self.tx.capacity() <= TAIL_SLOTS {
            self.dropped += 1;
            return;
        }
        let _ = self.tx.try_send(chunk);
    }

    /// A gone receiver is not an error: the run carries on.
    fn marker(&self, chunk: String) {
        let _ = self.tx.try_send(chunk);
    }

    /// Send the truncation notice, if any, and the closing marker. Returns the dropped count.
    fn close(self, code: Option<i32>) -> u64 {
        let dropped = self.dropped;
        if dropped > 0 {
            self.marker(marker::truncated(dropped));
        }
        self.marker(marker::exited(code));
        dropped
    }
}
