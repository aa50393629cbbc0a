//! Process-based job launcher: runs each job's `command` as a child process.
//!
//! Stdout is read line by line and fed to the job's event sink, which is how
//! tiered jobs drive the inflight tracker. Stderr is forwarded to the log.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use pacer_core::error::JobError;
use pacer_core::event::Event;
use pacer_core::job::{JobEntry, JobFuture, JobOutput, JobRunner};
use pacer_core::tracker::EventSink;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};

#[derive(Debug, Clone, Default)]
pub struct ProcessLauncher {
    workdir: Option<PathBuf>,
}

impl ProcessLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every job from `dir` instead of the current directory.
    pub fn with_workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }
}

impl JobRunner for ProcessLauncher {
    fn launch(&self, job: JobEntry, sink: EventSink) -> JobFuture {
        let workdir = self.workdir.clone();
        Box::pin(async move { run_process(job, sink, workdir).await })
    }
}

fn build_command(job: &JobEntry, workdir: Option<&PathBuf>) -> Result<Command, JobError> {
    let (program, args) = job
        .command
        .split_first()
        .ok_or_else(|| JobError::Spawn(format!("job {} has no command", job.id)))?;
    let mut cmd = Command::new(program);
    cmd.args(args)
        .env("PACER_JOB_ID", &job.id)
        .env("PACER_TARGET", &job.target)
        .env("PACER_PROVIDER", &job.provider)
        .env("PACER_MODEL", &job.model)
        .env("PACER_ITERATIONS", job.iterations.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(category) = job.category {
        cmd.env("PACER_CATEGORY", category.as_str());
    }
    if let Some(dir) = workdir {
        cmd.current_dir(dir);
    }
    Ok(cmd)
}

async fn run_process(
    job: JobEntry,
    sink: EventSink,
    workdir: Option<PathBuf>,
) -> Result<JobOutput, JobError> {
    let mut cmd = build_command(&job, workdir.as_ref())?;
    let mut child = cmd.spawn().map_err(|e| {
        let program = cmd.as_std().get_program().to_string_lossy().into_owned();
        JobError::Spawn(format!("{program}: {e}"))
    })?;
    tracing::debug!(job = %job.id, pid = ?child.id(), "spawned job process");

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| JobError::Spawn("stdout not captured".to_string()))?;
    if let Some(stderr) = child.stderr.take() {
        let id = job.id.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::debug!(job = %id, "stderr: {}", line);
            }
        });
    }

    match job.timeout() {
        Some(limit) => {
            let result = tokio::time::timeout(limit, drive(&mut child, stdout, &job, &sink)).await;
            match result {
                Ok(result) => result,
                Err(_) => {
                    kill(&mut child, &job, limit).await;
                    Err(JobError::Timeout(limit))
                }
            }
        }
        None => drive(&mut child, stdout, &job, &sink).await,
    }
}

/// Feed stdout to the sink until EOF, then reap the child.
async fn drive(
    child: &mut Child,
    stdout: ChildStdout,
    job: &JobEntry,
    sink: &EventSink,
) -> Result<JobOutput, JobError> {
    let mut output = JobOutput::default();
    let mut lines = BufReader::new(stdout).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(job = %job.id, "stopped reading output: {}", e);
                break;
            }
        };
        tracing::trace!(job = %job.id, "{}", line);
        for event in sink.observe(&line) {
            if let Event::RunComplete(done) = event {
                if let (true, Some(path)) = (done.ok, done.output_path) {
                    output.paths.push(path);
                }
            }
        }
    }

    let status = child
        .wait()
        .await
        .map_err(|e| JobError::Failed(format!("waiting for process: {e}")))?;
    if status.success() {
        Ok(output)
    } else {
        Err(JobError::ExitStatus(status.code()))
    }
}

async fn kill(child: &mut Child, job: &JobEntry, limit: Duration) {
    tracing::warn!(job = %job.id, limit_secs = limit.as_secs_f64(), "job timed out; killing process");
    if let Err(e) = child.start_kill() {
        tracing::warn!(job = %job.id, "kill failed: {}", e);
        return;
    }
    if let Err(e) = child.wait().await {
        tracing::warn!(job = %job.id, "reaping killed process failed: {}", e);
    }
}
