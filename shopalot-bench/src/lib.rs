//! Benchmark harness for the ShopALot workloads.
//!
//! A run drives one [`Workload`](benchmark::Workload) through a
//! [`Harness`](benchmark::Harness): the cluster under test is restarted through a
//! [`ClusterController`](cluster::ClusterController), statements go through a
//! [`QueryExecutor`](executor::QueryExecutor) and every timed statement's response is handed to
//! a [`ResultSink`](reporting::ResultSink). Records are regenerated on demand with
//! [`shopalot_datagen`], so the harness never reads the dataset files.
//!
//! New workloads implement [`WorkloadControl`](benchmark::WorkloadControl):
//!
//! ```
//! use async_trait::async_trait;
//! use shopalot_bench::benchmark::{BenchContext, WorkloadControl};
//! use shopalot_bench::Result;
//! use shopalot_datagen::Representation;
//!
//! #[derive(Clone, Debug)]
//! pub struct Ping;
//!
//! #[async_trait]
//! impl WorkloadControl for Ping {
//!     fn dataverse(&self) -> Option<Representation> {
//!         None
//!     }
//!
//!     fn restarts_cluster(&self) -> bool {
//!         false
//!     }
//!
//!     async fn benchmark(&self, ctx: &mut BenchContext<'_>) -> Result<()> {
//!         let response = ctx.execute("SELECT 1;", "ping", 1).await?;
//!         ctx.record(response, [("runNumber", serde_json::Value::from(1))]).await
//!     }
//!
//!     async fn post(&self, _: &mut BenchContext<'_>) -> Result<()> {
//!         Ok(())
//!     }
//! }
//! ```

pub mod asterixdb;
pub mod benchmark;
pub mod cluster;
pub mod config;
mod error;
pub mod executor;
pub mod reporting;
pub mod workload;

pub use error::{Error, Result};
