//! Abstractions and data types required for the definition and execution of a ShopALot workload.
//!
//! Each workload implements `WorkloadControl`, an async trait with the functions [`Harness`]
//! needs to execute it. Every workload is a variant of the `Workload` enum, which dispatches
//! `WorkloadControl`'s functions to its variants.
//!
//! Each new workload implemented should:
//!     - Create a type that implements `WorkloadControl`,
//!     - Add the type's name as a variant of `Workload`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use enum_dispatch::enum_dispatch;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use shopalot_datagen::{Representation, ShopALotConfig};
use tracing::{debug, error, info};

use crate::cluster::{run_command, ClusterController};
use crate::error::Result;
use crate::executor::{QueryExecutor, QueryResponse};
use crate::reporting::ResultSink;
use crate::workload::{EqualityPredicate, InsertUpsertDelete, Marker};

#[enum_dispatch(WorkloadControl)]
#[derive(Debug, Clone, clap::Subcommand)]
pub enum Workload {
    /// Times batched inserts, upserts of partially changed records and chunk deletes
    InsertUpsertDelete,
    /// Times equality-predicate lookups on nested fields
    EqualityPredicate,
    /// Records a marker entry on the analysis cluster
    Marker,
}

impl Workload {
    pub fn name_label(&self) -> &'static str {
        match self {
            Self::InsertUpsertDelete(_) => "insert_upsert_delete",
            Self::EqualityPredicate(_) => "equality_predicate",
            Self::Marker(_) => "marker",
        }
    }
}

/// The set of control functions needed to execute a workload in the [`Harness`].
#[async_trait]
#[enum_dispatch]
pub trait WorkloadControl {
    /// The dataverse the workload runs against, stamped on every result entry.
    fn dataverse(&self) -> Option<Representation>;

    /// Whether the cluster is restarted before the workload runs.
    fn restarts_cluster(&self) -> bool;

    /// Runs the timed statements, recording an entry per statement.
    async fn benchmark(&self, ctx: &mut BenchContext<'_>) -> Result<()>;

    /// Cleans up after [`benchmark`](Self::benchmark), whether or not it succeeded.
    async fn post(&self, ctx: &mut BenchContext<'_>) -> Result<()>;
}

/// How the harness waits for the cluster after a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Readiness {
    pub poll_interval: Duration,
    /// `None` waits forever.
    pub max_wait: Option<Duration>,
}

impl Default for Readiness {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            max_wait: None,
        }
    }
}

/// Everything a workload may touch while it runs.
pub struct BenchContext<'a> {
    pub executor: &'a dyn QueryExecutor,
    pub cluster: &'a dyn ClusterController,
    pub sink: &'a mut dyn ResultSink,
    pub shopalot: &'a ShopALotConfig,
    pub readiness: Readiness,
    /// Source of every random choice a workload makes.
    pub rng: StdRng,
}

impl BenchContext<'_> {
    /// Executes `statement`, failing unless the service answers `success`.
    pub async fn execute(
        &self,
        statement: &str,
        phase: &'static str,
        run: usize,
    ) -> Result<QueryResponse> {
        debug!(phase, run, %statement, "Executing statement");
        self.executor
            .execute(statement, None)
            .await?
            .into_success(phase, run)
    }

    /// Records `response`, without its results, together with `fields`.
    pub async fn record<I>(&mut self, response: QueryResponse, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'static str, Value)> + Send,
    {
        let mut entry = response.into_entry()?;
        for (key, value) in fields {
            entry.insert(key.to_owned(), value);
        }
        self.sink.record(entry).await
    }

    pub async fn restart_cluster(&self) -> Result<()> {
        self.cluster
            .restart(self.readiness.poll_interval, self.readiness.max_wait)
            .await
    }
}

/// Owns the capabilities of one harness run and drives a workload through its lifecycle.
pub struct Harness {
    pub executor: Arc<dyn QueryExecutor>,
    pub cluster: Arc<dyn ClusterController>,
    pub sink: Box<dyn ResultSink>,
    pub shopalot: ShopALotConfig,
    pub readiness: Readiness,
    /// Run after the workload with `results_dir` as its only argument.
    pub post_command: Option<String>,
    pub results_dir: PathBuf,
    pub seed: u64,
}

impl Harness {
    /// Restarts the cluster if the workload asks for it, runs the workload, then runs the post
    /// command, the workload's cleanup and closes the sink. Cleanup runs even if the workload
    /// failed; the first error is returned.
    pub async fn run(mut self, workload: &Workload) -> Result<()> {
        info!(workload = workload.name_label(), seed = self.seed, "Starting workload");
        let mut ctx = BenchContext {
            executor: self.executor.as_ref(),
            cluster: self.cluster.as_ref(),
            sink: self.sink.as_mut(),
            shopalot: &self.shopalot,
            readiness: self.readiness,
            rng: StdRng::seed_from_u64(self.seed),
        };

        let mut outcome = Self::benchmark(workload, &mut ctx).await;
        if let Err(error) = &outcome {
            error!(workload = workload.name_label(), %error, "Workload failed");
        }

        if let Some(command) = &self.post_command {
            info!(%command, "Running post command");
            let argv = [command.clone(), self.results_dir.display().to_string()];
            keep_first_error(&mut outcome, run_command(&argv).await, "post command");
        }
        keep_first_error(&mut outcome, workload.post(&mut ctx).await, "workload cleanup");
        keep_first_error(&mut outcome, ctx.sink.close().await, "closing the result sink");

        if outcome.is_ok() {
            info!(workload = workload.name_label(), "Workload finished");
        }
        outcome
    }

    async fn benchmark(workload: &Workload, ctx: &mut BenchContext<'_>) -> Result<()> {
        if workload.restarts_cluster() {
            ctx.restart_cluster().await?;
        }
        workload.benchmark(ctx).await
    }
}

fn keep_first_error(outcome: &mut Result<()>, next: Result<()>, step: &str) {
    if let Err(error) = next {
        error!(%error, "{step} failed");
        if outcome.is_ok() {
            *outcome = Err(error);
        }
    }
}
