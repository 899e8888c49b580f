//! Restarting the database under test between workload phases.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::executor::QueryExecutor;

/// Lifecycle control over the database under test.
#[async_trait]
pub trait ClusterController: Send + Sync {
    async fn stop(&self) -> Result<()>;

    async fn start(&self) -> Result<()>;

    /// Polls until the database answers queries, sleeping `poll_interval` between attempts.
    /// Gives up with [`Error::NotReady`] after `max_wait`, or never if it is `None`.
    async fn wait_until_ready(
        &self,
        poll_interval: Duration,
        max_wait: Option<Duration>,
    ) -> Result<()>;

    async fn restart(&self, poll_interval: Duration, max_wait: Option<Duration>) -> Result<()> {
        info!("Running STOP command");
        self.stop().await?;
        info!("Running START command");
        self.start().await?;
        info!("Waiting for the cluster to start");
        self.wait_until_ready(poll_interval, max_wait).await
    }
}

/// Runs `argv`, logging each non-empty line of its output at debug. Fails on a non-zero exit.
pub async fn run_command(argv: &[String]) -> Result<()> {
    let Some((program, args)) = argv.split_first() else {
        return Err(Error::InvalidWorkload("empty command".into()));
    };
    let command = argv.join(" ");

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let stdout = child.stdout.take().map(|s| log_lines(BufReader::new(s)));
    let stderr = child.stderr.take().map(|s| log_lines(BufReader::new(s)));
    let (status, _, _) = tokio::join!(
        child.wait(),
        async {
            if let Some(f) = stdout {
                f.await
            }
        },
        async {
            if let Some(f) = stderr {
                f.await
            }
        },
    );

    let status = status?;
    if status.success() {
        Ok(())
    } else {
        Err(Error::CommandFailed {
            command,
            status: status.to_string(),
        })
    }
}

async fn log_lines<R: tokio::io::AsyncBufRead + Unpin>(reader: R) {
    let mut lines = reader.lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if !line.is_empty() {
            debug!(target: "shopalot_bench::command", "{line}");
        }
    }
}

/// Restarts the cluster through shell commands and probes readiness with `SELECT 1;`.
pub struct ShellClusterController {
    stop_command: Vec<String>,
    start_command: Vec<String>,
    executor: Arc<dyn QueryExecutor>,
}

impl ShellClusterController {
    pub fn new(
        stop_command: Vec<String>,
        start_command: Vec<String>,
        executor: Arc<dyn QueryExecutor>,
    ) -> Self {
        Self {
            stop_command,
            start_command,
            executor,
        }
    }
}

#[async_trait]
impl ClusterController for ShellClusterController {
    async fn stop(&self) -> Result<()> {
        run_command(&self.stop_command).await
    }

    async fn start(&self) -> Result<()> {
        run_command(&self.start_command).await
    }

    async fn wait_until_ready(
        &self,
        poll_interval: Duration,
        max_wait: Option<Duration>,
    ) -> Result<()> {
        let started = Instant::now();
        loop {
            tokio::time::sleep(poll_interval).await;
            match self.executor.execute("SELECT 1;", Some(poll_interval)).await {
                Ok(response) if response.is_success() => {
                    info!("Cluster ready");
                    return Ok(());
                }
                Ok(response) => info!(
                    status = %response.status,
                    "Cluster not ready, trying again in {poll_interval:?}"
                ),
                Err(error) => info!(%error, "Connection failed, trying again in {poll_interval:?}"),
            }

            if let Some(max_wait) = max_wait {
                if started.elapsed() >= max_wait {
                    return Err(Error::NotReady(max_wait));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::executor::QueryResponse;

    /// Fails the first `failures` probes, then answers `success`.
    struct Flaky {
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl QueryExecutor for Flaky {
        async fn execute(&self, _: &str, _: Option<Duration>) -> Result<QueryResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Ok(QueryResponse {
                    status: "starting".into(),
                    ..QueryResponse::default()
                })
            } else {
                Ok(QueryResponse::success(vec![]))
            }
        }
    }

    fn controller(failures: usize) -> (ShellClusterController, Arc<Flaky>) {
        let flaky = Arc::new(Flaky {
            failures,
            calls: AtomicUsize::new(0),
        });
        (
            ShellClusterController::new(
                vec!["true".into()],
                vec!["sh".into(), "-c".into(), "echo started".into()],
                flaky.clone(),
            ),
            flaky,
        )
    }

    #[tokio::test]
    async fn waits_through_unready_statuses() {
        let (controller, flaky) = controller(3);
        controller
            .restart(Duration::from_millis(1), Some(Duration::from_secs(5)))
            .await
            .unwrap();
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn gives_up_after_max_wait() {
        let (controller, _) = controller(usize::MAX);
        let err = controller
            .wait_until_ready(Duration::from_millis(5), Some(Duration::from_millis(20)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotReady(_)));
    }

    #[tokio::test]
    async fn failing_command_is_an_error() {
        let err = run_command(&["sh".into(), "-c".into(), "exit 3".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CommandFailed { .. }));
        assert!(run_command(&[]).await.is_err());
    }
}
