use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueHint};
use rand::Rng;
use shopalot_bench::asterixdb::{statements, AsterixExecutor};
use shopalot_bench::benchmark::{Harness, Readiness, Workload, WorkloadControl};
use shopalot_bench::cluster::ShellClusterController;
use shopalot_bench::config::BenchmarkConfig;
use shopalot_bench::executor::QueryExecutor;
use shopalot_bench::reporting::ResultLog;
use shopalot_datagen::ShopALotConfig;
use tracing::info;
use uuid::Uuid;

/// Run ShopALot workloads against an AsterixDB cluster
#[derive(Parser)]
#[command(name = "shopalot_bench")]
struct BenchmarkRunner {
    /// Benchmark config: the cluster under test, its restart commands and the result outputs.
    #[arg(long, default_value = "config/asterixdb.json", value_hint = ValueHint::FilePath)]
    config: PathBuf,

    /// Dataset config the loaded data was generated with.
    #[arg(long, default_value = "config/shopalot.json", value_hint = ValueHint::FilePath)]
    shopalot_config: PathBuf,

    /// Seed for every random choice a workload makes. A seed is drawn and logged if unset.
    #[arg(long, env = "SHOPALOT_SEED")]
    seed: Option<u64>,

    /// Seconds between readiness probes after a restart.
    #[arg(long, default_value = "2")]
    poll_interval: u64,

    /// Give up waiting for a restarted cluster after this many seconds. Waits forever if unset.
    #[arg(long)]
    ready_timeout: Option<u64>,

    #[command(flatten)]
    tracing: shopalot_tracing::Options,

    #[command(subcommand)]
    workload: Workload,
}

impl BenchmarkRunner {
    fn readiness(&self) -> Readiness {
        Readiness {
            poll_interval: Duration::from_secs(self.poll_interval),
            max_wait: self.ready_timeout.map(Duration::from_secs),
        }
    }

    async fn run(self) -> anyhow::Result<()> {
        let config = BenchmarkConfig::from_path(&self.config)
            .with_context(|| format!("loading {}", self.config.display()))?;
        let shopalot = ShopALotConfig::from_path(&self.shopalot_config)?;
        let seed = self.seed.unwrap_or_else(|| rand::thread_rng().gen());
        let execution_id = Uuid::new_v4();
        info!(%execution_id, seed, workload = self.workload.name_label(), "Starting run");

        let executor: Arc<dyn QueryExecutor> =
            Arc::new(AsterixExecutor::from_config(&config.benchmark));
        let cluster = Arc::new(ShellClusterController::new(
            config.benchmark.stop_command.clone(),
            config.benchmark.start_command.clone(),
            Arc::clone(&executor),
        ));
        let dataverse = self
            .workload
            .dataverse()
            .map(statements::dataverse)
            .unwrap_or_default();
        let sink = ResultLog::open(&config, execution_id, dataverse)
            .await
            .context("opening result outputs")?;

        let harness = Harness {
            executor,
            cluster,
            sink: Box::new(sink),
            shopalot,
            readiness: self.readiness(),
            post_command: config.benchmark.post_command.clone(),
            results_dir: config.results_dir.clone(),
            seed,
        };
        harness.run(&self.workload).await?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let runner = BenchmarkRunner::parse();
    let _guard = runner.tracing.init("shopalot_bench")?;

    runner.run().await
}
