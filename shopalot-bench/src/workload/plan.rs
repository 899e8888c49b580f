//! Key-space planning for the insert, upsert and delete phases.
//!
//! Planners only decide which ids and chunks a phase touches. They never talk to the database,
//! and every random choice comes from the RNG handle the caller passes in.

use rand::seq::index;
use rand::Rng;
use shopalot_datagen::{
    generate_pair, ChunkPartitioner, EntityKind, IdRange, KeySource, Record, RecordGenerator,
    Representation,
};

use crate::error::{Error, Result};

/// Share of the dataset each phase inserts, upserts or deletes in total.
pub const GROWTH_FRACTION: f64 = 0.005;

/// Fractions of an upsert batch that carry a changed payload.
pub const UPSERT_ALPHAS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

/// Number of `chunk_size` batches needed to touch [`GROWTH_FRACTION`] of the dataset, at
/// least one.
pub fn epochs(dataset_size: u64, chunk_size: u64) -> u64 {
    if chunk_size == 0 {
        return 1;
    }
    let epochs = (dataset_size as f64 * GROWTH_FRACTION / chunk_size as f64).floor() as u64;
    epochs.max(1)
}

/// Appends `epochs` sequential batches after the loaded dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertPlan {
    pub dataset: IdRange,
    pub chunk_size: u64,
    pub epochs: u64,
}

impl InsertPlan {
    /// The id range of every batch: `[end + i * chunk, end + (i + 1) * chunk)`.
    pub fn ranges(&self) -> impl Iterator<Item = IdRange> + '_ {
        (0..self.epochs).map(|i| {
            let start = self.dataset.end + i * self.chunk_size;
            IdRange::new(start, start + self.chunk_size)
        })
    }
}

/// Rewrites random batches of already loaded records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertPlan {
    pub dataset: IdRange,
    pub chunk_size: u64,
    pub epochs: u64,
    /// Keep the `chunk_id` of the payload a mutated record was copied from, moving it to another
    /// bucket. Off by default, so chunk deletes stay complete.
    pub retarget_chunks: bool,
}

impl UpsertPlan {
    /// Number of leading records of a batch that get a changed payload.
    pub fn mutated(&self, alpha: f64) -> usize {
        (self.chunk_size as f64 * alpha).round() as usize
    }

    /// Draws the ids of one batch, without replacement.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<KeySource> {
        Ok(KeySource::random_sample(
            self.dataset,
            self.chunk_size,
            rng,
        )?)
    }

    /// Builds one batch in `representation`. The first [`mutated`](Self::mutated) records
    /// carry the payload generated for `id + 1` under their own primary key.
    pub fn batch(
        &self,
        generator: &RecordGenerator,
        kind: EntityKind,
        representation: Representation,
        ids: KeySource,
        alpha: f64,
    ) -> Result<Vec<Record>> {
        let partitioner = generator.config().partitioner()?;
        let mutated = self.mutated(alpha);
        ids.into_iter()
            .enumerate()
            .map(|(position, id)| {
                if position < mutated {
                    self.mutated_record(generator, &partitioner, kind, representation, id)
                } else {
                    Ok(pick(generate_pair(generator, &partitioner, kind, id)?, representation))
                }
            })
            .collect()
    }

    fn mutated_record(
        &self,
        generator: &RecordGenerator,
        partitioner: &ChunkPartitioner,
        kind: EntityKind,
        representation: Representation,
        id: u64,
    ) -> Result<Record> {
        let mut record = pick(
            generate_pair(generator, partitioner, kind, id + 1)?,
            representation,
        );
        record.insert(kind.primary_key(), generator.key_format().format(id)?);
        if !self.retarget_chunks {
            record.insert("chunk_id", partitioner.chunk_key(id)?);
        }
        Ok(record)
    }
}

fn pick((atom, sarr): (Record, Record), representation: Representation) -> Record {
    match representation {
        Representation::Atom => atom,
        Representation::Sarr => sarr,
    }
}

/// Deletes whole chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletePlan {
    pub chunk_size: u64,
    pub epochs: u64,
}

impl DeletePlan {
    /// Chooses `epochs` distinct buckets uniformly from `[0, chunk_size)`.
    pub fn chunks<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<u64>> {
        if self.epochs > self.chunk_size {
            return Err(Error::InvalidWorkload(format!(
                "cannot delete {} distinct chunks out of {}",
                self.epochs, self.chunk_size
            )));
        }
        let (Ok(buckets), Ok(epochs)) = (
            usize::try_from(self.chunk_size),
            usize::try_from(self.epochs),
        ) else {
            return Err(Error::InvalidWorkload("chunk size does not fit in memory".into()));
        };
        Ok(index::sample(rng, buckets, epochs)
            .into_iter()
            .map(|b| b as u64)
            .collect())
    }
}
