use std::{
    fs::File,
    io,
    process::{ExitStatus, Stdio},
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWriteExt},
    process::Command,
    task::JoinHandle,
    time::Instant,
};

/// Slack added on top of a nominal time limit to absorb process-spawn overhead.
pub const DEFAULT_TIME_OUT_DELTA: Duration = Duration::from_millis(25);

/// How long to keep draining stdout/stderr after the process group is gone.
/// Descendants that left the group may keep the pipes open indefinitely.
const PIPE_DRAIN_GRACE: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum ExecStatus {
    #[strum(serialize = "OK")]
    Ok,

    #[strum(serialize = "TO")]
    TimedOut,
}

#[derive(Debug)]
pub enum Input {
    Null,
    File(File),
    Bytes(Vec<u8>),
}

#[derive(Debug)]
pub enum Output {
    Null,
    File(File),
    Capture,
}

#[derive(Debug)]
pub struct ProcessIo {
    pub stdin: Input,
    pub stdout: Output,
}

impl ProcessIo {
    pub fn captured(stdin: Input) -> Self {
        Self {
            stdin,
            stdout: Output::Capture,
        }
    }

    pub fn into_file(stdin: Input, stdout: File) -> Self {
        Self {
            stdin,
            stdout: Output::File(stdout),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Execution {
    pub status: ExecStatus,

    /// `None` iff the process was killed on timeout.
    pub exit_status: Option<ExitStatus>,
    pub elapsed: Duration,
    pub pid: Option<u32>,

    /// Empty unless stdout was `Output::Capture`.
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,

    /// `false` if a pipe was still held open after the process group was
    /// killed; `stdout`/`stderr` then hold only what was read before that.
    pub pipes_closed: bool,
}

impl Execution {
    pub fn is_timed_out(&self) -> bool {
        self.status == ExecStatus::TimedOut
    }

    /// Describes why the process did not exit cleanly, if it ran to completion.
    pub fn exit_error(&self) -> Option<String> {
        match self.exit_status {
            Some(st) if !st.success() => Some(st.to_string()),
            Some(_) if !self.pipes_closed => {
                Some("output pipe held open by an escaped descendant".to_owned())
            }
            _ => None,
        }
    }

    pub fn success(&self) -> bool {
        self.status == ExecStatus::Ok
            && self.pipes_closed
            && self.exit_status.map_or(false, |st| st.success())
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Runs `cmd` to completion, or kills it once `limit` has elapsed.
///
/// Neither the process nor anything it spawned in its group is left running
/// when this returns: on timeout the group is killed and the child reaped
/// before the result is built.
pub async fn execute_with_timeout(
    cmd: Command,
    io: ProcessIo,
    limit: Duration,
) -> io::Result<Execution> {
    self::spawn_and_wait(cmd, io, Some(limit)).await
}

pub async fn execute(cmd: Command, io: ProcessIo) -> io::Result<Execution> {
    self::spawn_and_wait(cmd, io, None).await
}

async fn spawn_and_wait(
    mut cmd: Command,
    io: ProcessIo,
    limit: Option<Duration>,
) -> io::Result<Execution> {
    let ProcessIo { stdin, stdout } = io;

    let mut feed = None;
    match stdin {
        Input::Null => cmd.stdin(Stdio::null()),
        Input::File(f) => cmd.stdin(Stdio::from(f)),
        Input::Bytes(bytes) => {
            feed = Some(bytes);
            cmd.stdin(Stdio::piped())
        }
    };
    match stdout {
        Output::Null => cmd.stdout(Stdio::null()),
        Output::File(f) => cmd.stdout(Stdio::from(f)),
        Output::Capture => cmd.stdout(Stdio::piped()),
    };
    // Own process group, so descendants can be killed along with the child.
    cmd.stderr(Stdio::piped()).process_group(0).kill_on_drop(true);

    log::debug!("Spawning {:?}", cmd.as_std());
    let mut proc = cmd.spawn()?;
    let start_at = Instant::now();
    let pid = proc.id();

    let stdin_writer = match (feed, proc.stdin.take()) {
        (Some(bytes), Some(mut pipe)) => Some(tokio::spawn(async move {
            // A program may exit without consuming its whole input.
            if let Err(e) = pipe.write_all(&bytes).await {
                log::debug!("stdin closed early: {}", e);
            }
        })),
        _ => None,
    };
    let stdout_reader = proc.stdout.take().map(PipeReader::spawn);
    let stderr_reader = proc.stderr.take().map(PipeReader::spawn);

    let waited = match limit {
        Some(limit) => tokio::time::timeout(limit, proc.wait()).await.ok(),
        None => Some(proc.wait().await),
    };
    let elapsed = start_at.elapsed();

    // Background descendants outlive a clean exit too; none may keep running.
    if let Some(pgid) = pid {
        self::kill_process_group(pgid);
    }

    let (status, exit_status) = match waited {
        Some(res) => (ExecStatus::Ok, Some(res?)),
        None => {
            // Reaps the group leader.
            proc.kill()
                .await
                .unwrap_or_else(|e| log::warn!("Failed to kill TLE process: {:#}", e));
            (ExecStatus::TimedOut, None)
        }
    };

    if let Some(writer) = stdin_writer {
        writer.abort();
    }
    let (stdout, stdout_closed) = PipeReader::finish(stdout_reader).await;
    let (stderr, stderr_closed) = PipeReader::finish(stderr_reader).await;
    let pipes_closed = stdout_closed && stderr_closed;
    if !pipes_closed {
        log::warn!(
            "Output of pid {:?} is incomplete: a pipe was still held open after exit",
            pid
        );
    }

    Ok(Execution {
        status,
        exit_status,
        elapsed,
        pid,
        stdout,
        stderr,
        pipes_closed,
    })
}

fn kill_process_group(pgid: u32) {
    use nix::{
        errno::Errno,
        sys::signal::{killpg, Signal},
        unistd::Pid,
    };

    match killpg(Pid::from_raw(pgid as i32), Signal::SIGKILL) {
        // ESRCH: the group is already empty.
        Ok(()) | Err(Errno::ESRCH) => (),
        Err(e) => log::warn!("Failed to kill process group {}: {}", pgid, e),
    }
}

/// Drains a pipe chunk by chunk into a shared buffer, so whatever was read
/// survives even if the pipe never reaches EOF.
struct PipeReader {
    task: JoinHandle<()>,
    buf: Arc<Mutex<Vec<u8>>>,
}

impl PipeReader {
    fn spawn<R>(mut reader: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let sink = buf.clone();
        let task = tokio::spawn(async move {
            let mut chunk = [0u8; 8192];
            loop {
                match reader.read(&mut chunk).await {
                    Ok(0) => break,
                    Ok(n) => sink
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .extend_from_slice(&chunk[..n]),
                    Err(e) => {
                        log::debug!("Failed to read from subprocess pipe: {}", e);
                        break;
                    }
                }
            }
        });
        Self { task, buf }
    }

    /// Bytes read so far, and whether the pipe reached EOF within the grace period.
    async fn finish(reader: Option<Self>) -> (Vec<u8>, bool) {
        let Some(Self { mut task, buf }) = reader else {
            return (Vec::new(), true)
        };
        let closed = tokio::time::timeout(PIPE_DRAIN_GRACE, &mut task)
            .await
            .is_ok();
        if !closed {
            task.abort();
        }
        let bytes = std::mem::take(&mut *buf.lock().unwrap_or_else(PoisonError::into_inner));
        (bytes, closed)
    }
}
