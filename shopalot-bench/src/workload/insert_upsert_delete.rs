use async_trait::async_trait;
use clap::Parser;
use serde_json::Value;
use shopalot_datagen::{EntityKind, KeySource, Record, RecordGenerator, Representation};
use tracing::{debug, info, warn};

use super::plan::{epochs, DeletePlan, InsertPlan, UpsertPlan, UPSERT_ALPHAS};
use super::{check_indexes, generate_batch, record_generator};
use crate::asterixdb::statements::{self, WriteOperation};
use crate::benchmark::{BenchContext, WorkloadControl};
use crate::error::Result;

/// Grows the dataset with sequential inserts, rewrites random batches with upserts, then
/// deletes whole chunks. The cluster is restarted between phases.
#[derive(Parser, Clone, Debug)]
pub struct InsertUpsertDelete {
    /// Dataset to write to
    #[arg(value_enum)]
    pub dataset: EntityKind,

    /// Dataverse holding the dataset
    #[arg(long, value_enum, default_value = "atom")]
    pub dataverse: Representation,

    /// Mutated upserts keep the chunk of the record they were copied from instead of their own
    #[arg(long)]
    pub retarget_chunks: bool,

    /// Number of insert batches. Defaults to 0.5% of the dataset in chunk sized batches.
    #[arg(long)]
    pub insert_epochs: Option<u64>,

    /// Number of upsert batches per alpha. Defaults as `--insert-epochs`.
    #[arg(long)]
    pub upsert_epochs: Option<u64>,

    /// Number of chunks to delete. Defaults as `--insert-epochs`.
    #[arg(long)]
    pub delete_epochs: Option<u64>,
}

impl InsertUpsertDelete {
    fn default_epochs(&self, ctx: &BenchContext<'_>) -> u64 {
        let dataset = ctx.shopalot.dataset(self.dataset);
        epochs(dataset.id_range.end, dataset.chunk_size)
    }

    /// Buffers `records`, moves them into the dataset with `operation`, then clears the buffer.
    /// Only the move is recorded.
    async fn write_batch(
        &self,
        ctx: &mut BenchContext<'_>,
        operation: WriteOperation,
        run: usize,
        records: &[Record],
        alpha: Option<f64>,
    ) -> Result<()> {
        let (kind, representation) = (self.dataset, self.dataverse);
        let phase = operation.phase();
        ctx.execute(
            &statements::buffer_insert(kind, representation, records)?,
            "buffer insert",
            run,
        )
        .await?;
        let response = ctx
            .execute(
                &statements::write_from_buffer(operation, kind, representation),
                phase,
                run,
            )
            .await?;
        ctx.execute(
            &statements::clear_buffer(kind, representation),
            "buffer clear",
            run,
        )
        .await?;

        debug!(
            phase,
            run,
            elapsed = response.elapsed_time().unwrap_or("unknown"),
            "Write succeeded"
        );
        let mut fields = vec![("runNumber", Value::from(run)), ("phase", Value::from(phase))];
        if let Some(alpha) = alpha {
            fields.push(("alpha", Value::from(alpha)));
        }
        ctx.record(response, fields).await
    }

    async fn insert(
        &self,
        ctx: &mut BenchContext<'_>,
        generator: &RecordGenerator,
    ) -> Result<()> {
        let dataset = ctx.shopalot.dataset(self.dataset);
        let plan = InsertPlan {
            dataset: dataset.id_range,
            chunk_size: dataset.chunk_size,
            epochs: self.insert_epochs.unwrap_or_else(|| self.default_epochs(ctx)),
        };
        info!(epochs = plan.epochs, "Running inserts");
        for (i, range) in plan.ranges().enumerate() {
            let records = generate_batch(
                generator,
                self.dataset,
                self.dataverse,
                KeySource::sequential(range),
            )?;
            self.write_batch(ctx, WriteOperation::Insert, i + 1, &records, None)
                .await?;
        }
        Ok(())
    }

    async fn upsert(
        &self,
        ctx: &mut BenchContext<'_>,
        generator: &RecordGenerator,
    ) -> Result<()> {
        let dataset = ctx.shopalot.dataset(self.dataset);
        let plan = UpsertPlan {
            dataset: dataset.id_range,
            chunk_size: dataset.chunk_size,
            epochs: self.upsert_epochs.unwrap_or_else(|| self.default_epochs(ctx)),
            retarget_chunks: self.retarget_chunks,
        };
        for alpha in UPSERT_ALPHAS {
            info!(alpha, epochs = plan.epochs, "Running upserts");
            for i in 0..plan.epochs {
                let ids = plan.sample(&mut ctx.rng)?;
                let records =
                    plan.batch(generator, self.dataset, self.dataverse, ids, alpha)?;
                self.write_batch(
                    ctx,
                    WriteOperation::Upsert,
                    i as usize + 1,
                    &records,
                    Some(alpha),
                )
                .await?;
            }
        }
        Ok(())
    }

    async fn delete(&self, ctx: &mut BenchContext<'_>) -> Result<()> {
        let (kind, representation) = (self.dataset, self.dataverse);
        let partitioner = ctx.shopalot.generator_config(kind).partitioner()?;
        let plan = DeletePlan {
            chunk_size: partitioner.chunk_size(),
            epochs: self.delete_epochs.unwrap_or_else(|| self.default_epochs(ctx)),
        };
        let chunks = plan.chunks(&mut ctx.rng)?;

        info!(epochs = plan.epochs, "Running deletes");
        for (i, bucket) in chunks.into_iter().enumerate() {
            let run = i + 1;
            let chunk = partitioner.bucket_key(bucket)?;
            debug!(run, %chunk, "Deleting chunk");
            let response = ctx
                .execute(
                    &statements::delete_chunk(kind, representation, &chunk),
                    "delete",
                    run,
                )
                .await?;
            debug!(
                run,
                elapsed = response.elapsed_time().unwrap_or("unknown"),
                "Delete succeeded"
            );
            ctx.record(
                response,
                [
                    ("runNumber", Value::from(run)),
                    ("phase", Value::from("delete")),
                    ("chunkId", Value::from(chunk)),
                ],
            )
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl WorkloadControl for InsertUpsertDelete {
    fn dataverse(&self) -> Option<Representation> {
        Some(self.dataverse)
    }

    fn restarts_cluster(&self) -> bool {
        true
    }

    async fn benchmark(&self, ctx: &mut BenchContext<'_>) -> Result<()> {
        let generator = record_generator(ctx, self.dataset)?;
        check_indexes(ctx, self.dataset).await?;

        info!(dataset = %self.dataset, dataverse = %self.dataverse, "Running insert phase");
        self.insert(ctx, &generator).await?;
        ctx.restart_cluster().await?;

        info!(dataset = %self.dataset, dataverse = %self.dataverse, "Running upsert phase");
        self.upsert(ctx, &generator).await?;
        ctx.restart_cluster().await?;

        info!("Indexing chunk_id");
        ctx.execute(
            &statements::create_chunk_index(self.dataset, self.dataverse),
            "create chunk index",
            0,
        )
        .await?;

        info!(dataset = %self.dataset, dataverse = %self.dataverse, "Running delete phase");
        self.delete(ctx).await
    }

    /// Drops the chunk index. A failing drop is only logged.
    async fn post(&self, ctx: &mut BenchContext<'_>) -> Result<()> {
        info!("Removing the index on chunk_id");
        let statement = statements::drop_chunk_index(self.dataset, self.dataverse);
        match ctx.executor.execute(&statement, None).await {
            Ok(response) if !response.is_success() => warn!(
                status = %response.status,
                error = %response.error_message(),
                "Could not drop the index on chunk_id"
            ),
            Ok(_) => {}
            Err(error) => warn!(%error, "Could not drop the index on chunk_id"),
        }
        Ok(())
    }
}
